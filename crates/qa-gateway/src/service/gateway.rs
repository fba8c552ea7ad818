//! The gateway core: one method per endpoint.
//!
//! Mutating operations run in a fixed order:
//!
//! ```text
//! Validating → OwnershipChecked → Submitted → Recorded → Responded
//!                                                          │ (register only)
//!                                                          ▼
//!                                              ConfirmPending → Cleared
//! ```
//!
//! Anything that fails before `Submitted` has not touched the chain. After
//! that point failures are reported as-is; nothing is rolled back.

use crate::domain::config::ContractsConfig;
use crate::domain::contracts::{content_hash, content_hash_hex};
use crate::domain::{
    ActivityEvent, ContractCall, DisplayAddress, GatewayConfig, GatewayError, GatewayResult,
    Identity, OperationStage, UserListing, Verb,
};
use crate::middleware::GatewayMetrics;
use crate::ports::{AccessTokenIssuer, ActivityFeed, ChainNode, IdentityVerifier, PendingStore};
use crate::schema::*;
use crate::service::codec::AddressCodec;
use crate::service::confirmation::ConfirmationWatcher;
use crate::service::orchestrator::TransactionOrchestrator;
use crate::service::ownership::OwnershipVerifier;
use crate::service::pending::PendingRegistrationTracker;
use crate::service::recorder::ActivityRecorder;
use crate::service::registry::ContractReader;
use futures::{stream, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Concurrent `getUserByIndex` reads when listing users.
const USER_FETCH_CONCURRENCY: usize = 8;

/// External collaborators the gateway is built from.
#[derive(Clone)]
pub struct Collaborators {
    pub chain: Arc<dyn ChainNode>,
    pub identities: Arc<dyn IdentityVerifier>,
    pub tokens: Arc<dyn AccessTokenIssuer>,
    pub feed: Arc<dyn ActivityFeed>,
    pub pending: Arc<dyn PendingStore>,
}

/// Stage tracking for one mutating request.
struct Stages {
    op: &'static str,
    current: OperationStage,
}

impl Stages {
    fn start(op: &'static str) -> Self {
        Self {
            op,
            current: OperationStage::Validating,
        }
    }

    fn reach(&mut self, stage: OperationStage) {
        self.current = stage;
        debug!(op = self.op, stage = %stage, "stage reached");
    }

    fn finish<T>(self, result: GatewayResult<T>) -> GatewayResult<T> {
        let op = self.op;
        match &result {
            Ok(_) => info!(op, stage = %OperationStage::Responded, "request completed"),
            Err(e) if self.current.is_pre_submission() && e.kind().is_client_error() => {
                info!(op, stage = %self.current, code = e.kind().code(), error = %e, "request rejected")
            }
            Err(e) if self.current.is_pre_submission() => {
                warn!(op, stage = %self.current, code = e.kind().code(), error = %e, "request failed before submission")
            }
            Err(e) => {
                error!(op, stage = %self.current, code = e.kind().code(), error = %e, "request failed after submission")
            }
        }
        result
    }
}

pub struct Gateway {
    codec: Arc<AddressCodec>,
    registry: Arc<ContractReader>,
    ownership: OwnershipVerifier,
    pending: Arc<PendingRegistrationTracker>,
    orchestrator: TransactionOrchestrator,
    watcher: Arc<ConfirmationWatcher>,
    recorder: ActivityRecorder,
    identities: Arc<dyn IdentityVerifier>,
    tokens: Arc<dyn AccessTokenIssuer>,
    metrics: Arc<GatewayMetrics>,
}

impl Gateway {
    pub fn new(collaborators: Collaborators, config: &GatewayConfig) -> Self {
        Self::with_metrics(collaborators, config, Arc::new(GatewayMetrics::new()))
    }

    pub fn with_metrics(
        collaborators: Collaborators,
        config: &GatewayConfig,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        let Collaborators {
            chain,
            identities,
            tokens,
            feed,
            pending,
        } = collaborators;

        let codec = Arc::new(AddressCodec::new(chain.clone(), config.node.network));
        let registry = Arc::new(ContractReader::new(chain.clone(), config.contracts.clone()));

        Self {
            ownership: OwnershipVerifier::new(codec.clone(), identities.clone(), registry.clone()),
            pending: Arc::new(PendingRegistrationTracker::new(pending)),
            orchestrator: TransactionOrchestrator::new(
                chain.clone(),
                config.submit.clone(),
                metrics.clone(),
            ),
            watcher: Arc::new(ConfirmationWatcher::new(
                chain,
                config.confirmation.clone(),
                metrics.clone(),
            )),
            recorder: ActivityRecorder::new(feed, metrics.clone()),
            codec,
            registry,
            identities,
            tokens,
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<GatewayMetrics> {
        &self.metrics
    }

    pub fn pending(&self) -> &Arc<PendingRegistrationTracker> {
        &self.pending
    }

    pub fn watcher(&self) -> &Arc<ConfirmationWatcher> {
        &self.watcher
    }

    fn contracts(&self) -> &ContractsConfig {
        self.registry.contracts()
    }

    async fn profile_name(&self, identity: &Identity) -> GatewayResult<String> {
        Ok(self.identities.profile_name(identity).await?)
    }

    // Read-only

    pub fn ping(&self) -> PingResponse {
        PingResponse::default()
    }

    /// Pending registrations report `exists: false, pending: true` without
    /// asking the registry.
    pub async fn check(&self, req: CheckRequest) -> GatewayResult<CheckResponse> {
        if self.pending.check(&req.user) {
            return Ok(CheckResponse {
                exists: false,
                pending: Some(true),
            });
        }
        let exists = self.registry.account_exists(req.user.as_str()).await?;
        Ok(CheckResponse {
            exists,
            pending: None,
        })
    }

    pub async fn check_address(&self, req: CheckAddressRequest) -> GatewayResult<CheckAddressResponse> {
        let wallet = DisplayAddress::new_unchecked(req.wallet_address.clone());
        let claimed = self.codec.to_canonical(&wallet).await?;
        let address = self.registry.address_by_account(req.user.as_str()).await?;
        Ok(CheckAddressResponse {
            ok: claimed == address,
            user: req.user,
            wallet_address: req.wallet_address,
            address,
        })
    }

    /// Every registered user, in registry order.
    pub async fn users(&self) -> GatewayResult<UsersResponse> {
        let count = self.registry.users_count().await?;
        debug!(count, "listing users");

        let users_list = stream::iter(0..count)
            .map(|index| async move {
                let user = self.registry.user_by_index(index).await?;
                let user_address = self.codec.to_display(&user.address).await?;
                Ok::<_, GatewayError>(UserListing {
                    user_address,
                    user_account: user.account,
                    user_name: user.name,
                })
            })
            .buffered(USER_FETCH_CONCURRENCY)
            .try_collect()
            .await?;

        Ok(UsersResponse { users_list })
    }

    pub async fn access_token(&self, req: OwnedAddressRequest) -> GatewayResult<AccessTokenResponse> {
        let verified = self.ownership.verify(&req.user, &req.token, &req.address).await?;
        let access_token = self.tokens.issue(verified.display())?;
        info!(identity = %req.user, "access token issued");
        Ok(AccessTokenResponse {
            access_token,
            address: verified.display().clone(),
            user: req.user,
        })
    }

    pub fn encode_support(&self, req: EncodeSupportRequest) -> EncodeSupportResponse {
        let rewards = self.contracts().rewards;
        let call = ContractCall::support(rewards, &req.link);
        EncodeSupportResponse {
            address: rewards,
            link: req.link,
            encoded_data: hex::encode(call.calldata()),
        }
    }

    pub async fn encode_deposit(&self, req: EncodeDepositRequest) -> GatewayResult<EncodeDepositResponse> {
        let witness = self.codec.parse(&req.witness)?;
        let hex_witness = self.codec.to_canonical(&witness).await?;
        let rewards = self.contracts().rewards;
        let call = ContractCall::deposit(rewards, &req.link, hex_witness);
        Ok(EncodeDepositResponse {
            address: rewards,
            link: req.link,
            witness,
            encoded_data: hex::encode(call.calldata()),
        })
    }

    // Mutating

    /// Submit a registration and start its detached confirmation wait.
    ///
    /// The pending flag is taken before the registry lookup so that two
    /// concurrent registrations for one identity cannot both get through;
    /// it is released when the wait ends, or immediately if the
    /// registration fails before submission.
    pub async fn register(&self, req: OwnedAddressRequest) -> GatewayResult<RegisterResponse> {
        let mut stages = Stages::start("register");
        let result = async {
            let address = self.ownership.authenticate(&req.user, &req.token, &req.address).await?;
            let guard = self
                .pending
                .acquire(&req.user)
                .ok_or(GatewayError::RegistrationPending)?;

            if self.registry.address_exists(address.canonical).await? {
                return Err(GatewayError::UserExists);
            }
            stages.reach(OperationStage::OwnershipChecked);

            let name = self.profile_name(&req.user).await?;
            let call = ContractCall::register(
                self.contracts().registry,
                address.canonical,
                req.user.as_str(),
                &name,
            );
            let record = self.orchestrator.submit(call).await?;
            stages.reach(OperationStage::Submitted);

            let event = ActivityEvent::new(
                Verb::Register,
                req.user.as_str(),
                address.display.as_str(),
                record.txid.clone(),
            )
            .with_name(name.clone());
            let recorded = self.recorder.record(event).await;
            if recorded.is_ok() {
                stages.reach(OperationStage::Recorded);
            }

            // The transaction is out either way; wait for it.
            self.watcher.watch(record.txid.clone(), guard);
            recorded?;

            Ok::<_, GatewayError>(RegisterResponse {
                user: req.user.clone(),
                address: address.display,
                hex_address: address.canonical,
                user_profile_name: name,
                txid: record.txid,
            })
        }
        .await;
        stages.finish(result)
    }

    pub async fn confirm(&self, req: ConfirmRequest) -> GatewayResult<ConfirmResponse> {
        let mut stages = Stages::start("confirm");
        let result = async {
            let verified = self.ownership.verify(&req.user, &req.token, &req.address).await?;
            stages.reach(OperationStage::OwnershipChecked);

            let name = self.profile_name(&req.user).await?;
            let call = ContractCall::confirm_from(self.contracts().achievements, verified.canonical(), &req.link);
            let record = self.orchestrator.submit(call).await?;
            stages.reach(OperationStage::Submitted);

            let event = ActivityEvent::new(Verb::Confirm, req.user.as_str(), &req.link, record.txid.clone())
                .with_name(name.clone());
            self.recorder.record(event).await?;
            stages.reach(OperationStage::Recorded);

            Ok::<_, GatewayError>(ConfirmResponse {
                user: req.user.clone(),
                address: verified.display().clone(),
                hex_address: verified.canonical(),
                link: req.link.clone(),
                user_profile_name: name,
                txid: record.txid,
            })
        }
        .await;
        stages.finish(result)
    }

    /// Publish an achievement; a non-empty `previousLink` makes it an update.
    pub async fn create(&self, req: CreateRequest) -> GatewayResult<CreateResponse> {
        let mut stages = Stages::start("create");
        let result = async {
            let verified = self.ownership.verify(&req.user, &req.token, &req.address).await?;
            stages.reach(OperationStage::OwnershipChecked);

            let name = self.profile_name(&req.user).await?;
            let previous_link = req.previous_link.clone().unwrap_or_default();
            let hash = content_hash(&req.link);
            let call = ContractCall::create_from(
                self.contracts().achievements,
                verified.canonical(),
                &req.link,
                hash,
                &req.title,
                &previous_link,
            );
            let record = self.orchestrator.submit(call).await?;
            stages.reach(OperationStage::Submitted);

            let verb = Verb::for_creation(req.previous_link.as_deref());
            let event = ActivityEvent::new(verb, req.user.as_str(), &req.link, record.txid.clone())
                .with_name(name.clone());
            self.recorder.record(event).await?;
            stages.reach(OperationStage::Recorded);

            Ok::<_, GatewayError>(CreateResponse {
                user: req.user.clone(),
                address: verified.display().clone(),
                hex_address: verified.canonical(),
                link: req.link.clone(),
                title: req.title.clone(),
                previous_link,
                txid: record.txid,
                user_profile_name: name,
                content_hash: content_hash_hex(&req.link),
            })
        }
        .await;
        stages.finish(result)
    }

    /// Release a link's rewards to a witness. Not tied to an identity.
    pub async fn withdraw(&self, req: WithdrawRequest) -> GatewayResult<WithdrawResponse> {
        let mut stages = Stages::start("withdraw");
        let result = async {
            let witness = self.codec.parse(&req.witness)?;
            let hex_witness = self.codec.to_canonical(&witness).await?;
            stages.reach(OperationStage::OwnershipChecked);

            let call = ContractCall::withdraw(self.contracts().rewards, &req.link, hex_witness);
            let record = self.orchestrator.submit(call).await?;
            stages.reach(OperationStage::Submitted);

            let event = ActivityEvent::new(Verb::Withdraw, witness.as_str(), &req.link, record.txid.clone());
            self.recorder.record(event).await?;
            stages.reach(OperationStage::Recorded);

            Ok::<_, GatewayError>(WithdrawResponse {
                txid: record.txid,
                link: req.link.clone(),
                witness,
                hex_witness,
            })
        }
        .await;
        stages.finish(result)
    }

    /// Point the achievements contract at the configured rewards contract.
    /// Only allowed once.
    pub async fn init(&self, _req: InitRequest) -> GatewayResult<InitResponse> {
        let mut stages = Stages::start("init");
        let result = async {
            let current = self.registry.rewards_address().await?;
            if !current.is_zero() {
                return Err(GatewayError::AlreadyInitialized(current));
            }
            stages.reach(OperationStage::OwnershipChecked);

            let contracts = self.contracts();
            let call = ContractCall::init_rewards(contracts.achievements, contracts.rewards);
            let record = self.orchestrator.submit(call).await?;
            stages.reach(OperationStage::Submitted);

            Ok::<_, GatewayError>(InitResponse {
                txid: record.txid,
                rewards_address: contracts.rewards,
            })
        }
        .await;
        stages.finish(result)
    }

    /// Relay a client-signed `support` transaction.
    pub async fn support(&self, req: SupportRequest) -> GatewayResult<SupportResponse> {
        let mut stages = Stages::start("support");
        let result = async {
            let verified = self.ownership.verify(&req.user, &req.token, &req.address).await?;
            stages.reach(OperationStage::OwnershipChecked);

            self.orchestrator.inspect_raw(&req.raw_tx).await?;
            let name = self.profile_name(&req.user).await?;
            let txid = self.orchestrator.relay_raw(&req.raw_tx).await?;
            stages.reach(OperationStage::Submitted);

            let event = ActivityEvent::new(Verb::Support, verified.display().as_str(), &req.link, txid.clone())
                .with_name(name.clone());
            self.recorder.record(event).await?;
            stages.reach(OperationStage::Recorded);

            Ok::<_, GatewayError>(SupportResponse {
                txid,
                link: req.link.clone(),
                address: verified.display().clone(),
                user_profile_name: name,
                user: req.user.clone(),
            })
        }
        .await;
        stages.finish(result)
    }

    /// Relay a client-signed `deposit` transaction.
    pub async fn deposit(&self, req: DepositRequest) -> GatewayResult<DepositResponse> {
        let mut stages = Stages::start("deposit");
        let result = async {
            let verified = self.ownership.verify(&req.user, &req.token, &req.address).await?;
            stages.reach(OperationStage::OwnershipChecked);

            let name = self.profile_name(&req.user).await?;
            let txid = self.orchestrator.relay_raw(&req.raw_tx).await?;
            stages.reach(OperationStage::Submitted);

            let event = ActivityEvent::new(Verb::Deposit, verified.display().as_str(), &req.link, txid.clone())
                .with_name(name.clone())
                .with_witness(req.witness.clone(), req.witness_name.clone());
            self.recorder.record(event).await?;
            stages.reach(OperationStage::Recorded);

            Ok::<_, GatewayError>(DepositResponse {
                txid,
                link: req.link.clone(),
                witness: req.witness.clone(),
                address: verified.display().clone(),
                user_profile_name: name,
                user: req.user.clone(),
            })
        }
        .await;
        stages.finish(result)
    }
}
