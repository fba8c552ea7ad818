//! Gateway error types with stable wire codes.
//!
//! Every failure a caller can observe maps to one [`ErrorKind`], which fixes
//! both the `error` code in the response body and the HTTP status.

use crate::domain::address::CanonicalAddress;
use serde::Serialize;
use std::fmt;

/// Stable error codes exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidRequest,
    PayloadTooLarge,
    InvalidAddress,
    InvalidToken,
    InvalidAddressOwner,
    UserExists,
    RegistrationPending,
    AlreadyInitialized,
    ConversionError,
    ContractError,
    SubmitError,
    FeedError,
    AuthError,
    InternalError,
}

impl ErrorKind {
    /// Wire code, e.g. `INVALID_ADDRESS`.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => "INVALID_REQUEST",
            ErrorKind::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ErrorKind::InvalidAddress => "INVALID_ADDRESS",
            ErrorKind::InvalidToken => "INVALID_TOKEN",
            ErrorKind::InvalidAddressOwner => "INVALID_ADDRESS_OWNER",
            ErrorKind::UserExists => "USER_EXISTS",
            ErrorKind::RegistrationPending => "REGISTRATION_PENDING",
            ErrorKind::AlreadyInitialized => "ALREADY_INITIALIZED",
            ErrorKind::ConversionError => "CONVERSION_ERROR",
            ErrorKind::ContractError => "CONTRACT_ERROR",
            ErrorKind::SubmitError => "SUBMIT_ERROR",
            ErrorKind::FeedError => "FEED_ERROR",
            ErrorKind::AuthError => "AUTH_ERROR",
            ErrorKind::InternalError => "INTERNAL_ERROR",
        }
    }

    /// HTTP status code for this kind.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::InvalidRequest | ErrorKind::InvalidAddress => 400,
            ErrorKind::InvalidToken => 401,
            ErrorKind::PayloadTooLarge => 413,
            ErrorKind::InvalidAddressOwner => 403,
            ErrorKind::UserExists
            | ErrorKind::RegistrationPending
            | ErrorKind::AlreadyInitialized => 409,
            ErrorKind::ConversionError
            | ErrorKind::ContractError
            | ErrorKind::SubmitError
            | ErrorKind::FeedError
            | ErrorKind::AuthError => 502,
            ErrorKind::InternalError => 500,
        }
    }

    /// Caller mistakes, detected before anything reaches the chain.
    pub fn is_client_error(self) -> bool {
        self.http_status() < 500
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for ErrorKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.code())
    }
}

/// Gateway-level errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    /// Body missing, malformed, or carrying unknown fields
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Body exceeded `http.max_body_size`
    #[error("request body too large")]
    PayloadTooLarge,

    /// Display address failed the syntactic check
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("token is not valid for this user")]
    InvalidToken,

    #[error("address is not registered to this user")]
    InvalidAddressOwner,

    #[error("a user is already registered for this address")]
    UserExists,

    #[error("a registration for this user is still pending")]
    RegistrationPending,

    /// Achievements contract already points at a rewards contract
    #[error("rewards already initialized at {0}")]
    AlreadyInitialized(CanonicalAddress),

    #[error("address conversion failed: {0}")]
    Conversion(String),

    /// Read-only contract call failed or returned garbage
    #[error("contract call failed: {0}")]
    Contract(String),

    #[error("transaction submission failed: {0}")]
    Submit(String),

    /// Transaction went out but the feed rejected the event
    #[error("activity feed error: {0}")]
    Feed(String),

    #[error("identity service error: {0}")]
    Auth(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("server bind error: {0}")]
    Bind(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            GatewayError::PayloadTooLarge => ErrorKind::PayloadTooLarge,
            GatewayError::InvalidAddress(_) => ErrorKind::InvalidAddress,
            GatewayError::InvalidToken => ErrorKind::InvalidToken,
            GatewayError::InvalidAddressOwner => ErrorKind::InvalidAddressOwner,
            GatewayError::UserExists => ErrorKind::UserExists,
            GatewayError::RegistrationPending => ErrorKind::RegistrationPending,
            GatewayError::AlreadyInitialized(_) => ErrorKind::AlreadyInitialized,
            GatewayError::Conversion(_) => ErrorKind::ConversionError,
            GatewayError::Contract(_) => ErrorKind::ContractError,
            GatewayError::Submit(_) => ErrorKind::SubmitError,
            GatewayError::Feed(_) => ErrorKind::FeedError,
            GatewayError::Auth(_) => ErrorKind::AuthError,
            GatewayError::Config(_) | GatewayError::Bind(_) | GatewayError::Internal(_) => {
                ErrorKind::InternalError
            }
        }
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Error body returned to callers: `{"error": CODE, "message": text}`.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    /// Extra top-level fields merged into the body
    pub data: Option<serde_json::Map<String, serde_json::Value>>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            data: None,
        }
    }

    pub fn status(&self) -> u16 {
        self.kind.http_status()
    }
}

impl From<&GatewayError> for ApiError {
    fn from(err: &GatewayError) -> Self {
        let mut api = ApiError::new(err.kind(), err.to_string());
        if let GatewayError::AlreadyInitialized(address) = err {
            let mut data = serde_json::Map::new();
            data.insert(
                "initializedAddress".to_string(),
                serde_json::Value::String(address.to_hex()),
            );
            api.data = Some(data);
        }
        api
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        ApiError::from(&err)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl Serialize for ApiError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let extra = self.data.as_ref().map_or(0, |d| d.len());
        let mut map = serializer.serialize_map(Some(2 + extra))?;
        map.serialize_entry("error", &self.kind)?;
        map.serialize_entry("message", &self.message)?;
        if let Some(ref data) = self.data {
            for (key, value) in data {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        GatewayError::InvalidRequest(e.to_string())
    }
}
