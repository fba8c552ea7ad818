//! Ports (hexagonal architecture boundaries).

pub mod outbound;

pub use outbound::{
    AccessTokenIssuer, ActivityFeed, AuthError, ChainError, ChainNode, FeedError,
    IdentityVerifier, PendingStore,
};
