//! Activity feed recording.

use crate::domain::{ActivityEvent, GatewayError, GatewayResult};
use crate::middleware::GatewayMetrics;
use crate::ports::ActivityFeed;
use std::sync::Arc;
use tracing::{debug, error};

/// Mirrors accepted transactions into the feed. Only ever called with the
/// txid of a submission that succeeded; a feed failure does not undo it.
pub struct ActivityRecorder {
    feed: Arc<dyn ActivityFeed>,
    metrics: Arc<GatewayMetrics>,
}

impl ActivityRecorder {
    pub fn new(feed: Arc<dyn ActivityFeed>, metrics: Arc<GatewayMetrics>) -> Self {
        Self { feed, metrics }
    }

    pub async fn record(&self, event: ActivityEvent) -> GatewayResult<()> {
        let result = self.feed.add_activity(&event).await;
        self.metrics.record_feed(result.is_ok());

        match result {
            Ok(()) => {
                debug!(verb = %event.verb, actor = %event.actor, txid = %event.target, "activity recorded");
                Ok(())
            }
            Err(e) => {
                error!(
                    verb = %event.verb,
                    actor = %event.actor,
                    txid = %event.target,
                    error = %e,
                    "transaction submitted but feed rejected the event"
                );
                Err(GatewayError::from(e))
            }
        }
    }
}
