//! Error conversions from infrastructure types.
//!
//! These conversions involve I/O types and belong in the adapters layer.

use crate::domain::GatewayError;
use crate::ports::{AuthError, FeedError};

impl From<FeedError> for GatewayError {
    fn from(e: FeedError) -> Self {
        GatewayError::Feed(e.to_string())
    }
}

impl From<AuthError> for GatewayError {
    fn from(e: AuthError) -> Self {
        GatewayError::Auth(e.to_string())
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(e: std::io::Error) -> Self {
        GatewayError::Internal(e.to_string())
    }
}
