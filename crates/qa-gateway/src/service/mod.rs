//! Gateway core services.
//!
//! Leaf-first: the address codec and contract reader sit on the chain port;
//! ownership checks build on both; the orchestrator, recorder, pending
//! tracker and confirmation watcher are composed by [`Gateway`].

pub mod codec;
pub mod confirmation;
pub mod gateway;
pub mod orchestrator;
pub mod ownership;
pub mod pending;
pub mod recorder;
pub mod registry;

pub use codec::AddressCodec;
pub use confirmation::{ConfirmationOutcome, ConfirmationWatcher};
pub use gateway::{Collaborators, Gateway};
pub use orchestrator::TransactionOrchestrator;
pub use ownership::{Authenticated, OwnershipVerifier, Verified};
pub use pending::{PendingGuard, PendingRegistrationTracker};
pub use recorder::ActivityRecorder;
pub use registry::ContractReader;
