//! Detached confirmation wait for submitted registrations.
//!
//! The caller gets its response as soon as the registration is submitted.
//! [`ConfirmationWatcher::watch`] then spawns a task that polls the node
//! until the transaction reaches the configured depth or the timeout fires.
//! The identity's [`PendingGuard`] moves into that task, so the pending flag
//! is cleared exactly once however the wait ends.

use crate::domain::config::ConfirmationConfig;
use crate::domain::{Identity, TransactionId};
use crate::middleware::GatewayMetrics;
use crate::ports::ChainNode;
use crate::service::pending::PendingGuard;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, info_span, warn, Instrument};

/// How a confirmation wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    Confirmed { depth: u64 },
    TimedOut,
}

pub struct ConfirmationWatcher {
    chain: Arc<dyn ChainNode>,
    config: ConfirmationConfig,
    /// txid → (identity, started)
    in_flight: DashMap<TransactionId, (Identity, Instant)>,
    metrics: Arc<GatewayMetrics>,
}

impl ConfirmationWatcher {
    pub fn new(
        chain: Arc<dyn ChainNode>,
        config: ConfirmationConfig,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        Self {
            chain,
            config,
            in_flight: DashMap::new(),
            metrics,
        }
    }

    /// Number of waits still running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_watching(&self, txid: &TransactionId) -> bool {
        self.in_flight.contains_key(txid)
    }

    /// Longest-running wait, if any.
    pub fn oldest_wait(&self) -> Option<Duration> {
        self.in_flight
            .iter()
            .map(|entry| entry.value().1.elapsed())
            .max()
    }

    /// Spawn the wait for `txid`. The guard is released when the task ends.
    pub fn watch(self: &Arc<Self>, txid: TransactionId, guard: PendingGuard) -> JoinHandle<ConfirmationOutcome> {
        let identity = guard.identity().clone();
        self.in_flight
            .insert(txid.clone(), (identity.clone(), Instant::now()));
        self.metrics.record_pending_started();

        let span = info_span!(
            "confirmation_wait",
            identity = %identity,
            txid = %txid,
            required = self.config.required,
        );
        let watcher = Arc::clone(self);

        tokio::spawn(
            async move {
                let outcome = match tokio::time::timeout(watcher.config.timeout, watcher.poll(&txid)).await {
                    Ok(depth) => {
                        info!(depth, "registration confirmed");
                        ConfirmationOutcome::Confirmed { depth }
                    }
                    Err(_) => {
                        warn!(timeout = ?watcher.config.timeout, "registration still unconfirmed, releasing pending flag");
                        ConfirmationOutcome::TimedOut
                    }
                };

                watcher.in_flight.remove(&txid);
                watcher
                    .metrics
                    .record_pending_finished(matches!(outcome, ConfirmationOutcome::Confirmed { .. }));
                drop(guard);
                outcome
            }
            .instrument(span),
        )
    }

    /// Poll until the required depth is seen. Errors are logged and retried
    /// on the next tick.
    async fn poll(&self, txid: &TransactionId) -> u64 {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            match self.chain.confirmations(txid).await {
                Ok(Some(depth)) if depth >= self.config.required => return depth,
                Ok(Some(depth)) => debug!(depth, "waiting for confirmations"),
                Ok(None) => debug!("transaction not yet known to node"),
                Err(e) => {
                    self.metrics.record_poll_error();
                    warn!(error = %e, "confirmation poll failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryChain;
    use crate::adapters::pending::InMemoryPendingStore;
    use crate::domain::{Network, RawTransaction};
    use crate::service::pending::PendingRegistrationTracker;
    use std::sync::atomic::Ordering;

    struct Fixture {
        chain: Arc<InMemoryChain>,
        tracker: Arc<PendingRegistrationTracker>,
        metrics: Arc<GatewayMetrics>,
        watcher: Arc<ConfirmationWatcher>,
    }

    fn fixture(timeout_ms: u64) -> Fixture {
        let chain = Arc::new(InMemoryChain::new(Network::Testnet));
        let metrics = Arc::new(GatewayMetrics::new());
        let config = ConfirmationConfig {
            required: 2,
            poll_interval: Duration::from_millis(5),
            timeout: Duration::from_millis(timeout_ms),
        };
        Fixture {
            watcher: Arc::new(ConfirmationWatcher::new(chain.clone(), config, metrics.clone())),
            tracker: Arc::new(PendingRegistrationTracker::new(Arc::new(InMemoryPendingStore::new()))),
            chain,
            metrics,
        }
    }

    async fn submitted(chain: &InMemoryChain) -> TransactionId {
        chain.send_raw_transaction(&RawTransaction::new("00")).await.unwrap()
    }

    #[tokio::test]
    async fn test_confirmed_clears_pending() {
        let f = fixture(5_000);
        f.chain.set_auto_mine(true);
        let alice = Identity::new("alice");
        let txid = submitted(&f.chain).await;

        let guard = f.tracker.acquire(&alice).unwrap();
        let handle = f.watcher.watch(txid.clone(), guard);
        assert!(f.tracker.check(&alice));

        let outcome = handle.await.unwrap();
        assert_eq!(outcome, ConfirmationOutcome::Confirmed { depth: 2 });
        assert!(!f.tracker.check(&alice));
        assert!(!f.watcher.is_watching(&txid));
        assert_eq!(f.metrics.confirmations_confirmed.load(Ordering::Relaxed), 1);
        assert_eq!(f.metrics.registrations_pending.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_timeout_clears_pending() {
        let f = fixture(40);
        let alice = Identity::new("alice");
        let txid = submitted(&f.chain).await;

        let guard = f.tracker.acquire(&alice).unwrap();
        let outcome = f.watcher.watch(txid, guard).await.unwrap();

        assert_eq!(outcome, ConfirmationOutcome::TimedOut);
        assert!(!f.tracker.check(&alice));
        assert_eq!(f.watcher.in_flight(), 0);
        assert_eq!(f.metrics.confirmations_timed_out.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_poll_errors_are_counted_not_fatal() {
        let f = fixture(40);
        f.chain.fail_confirmations(true);
        let alice = Identity::new("alice");
        let txid = submitted(&f.chain).await;

        let guard = f.tracker.acquire(&alice).unwrap();
        let outcome = f.watcher.watch(txid, guard).await.unwrap();

        assert_eq!(outcome, ConfirmationOutcome::TimedOut);
        assert!(f.metrics.confirmation_poll_errors.load(Ordering::Relaxed) >= 1);
        assert!(!f.tracker.check(&alice));
    }

    #[tokio::test]
    async fn test_in_flight_while_waiting() {
        let f = fixture(5_000);
        let alice = Identity::new("alice");
        let txid = submitted(&f.chain).await;

        let guard = f.tracker.acquire(&alice).unwrap();
        let handle = f.watcher.watch(txid.clone(), guard);
        assert!(f.watcher.is_watching(&txid));
        assert!(f.watcher.oldest_wait().is_some());

        f.chain.mine();
        f.chain.mine();
        assert_eq!(handle.await.unwrap(), ConfirmationOutcome::Confirmed { depth: 2 });
        assert!(f.watcher.oldest_wait().is_none());
    }
}
