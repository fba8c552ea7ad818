//! Middleware stack for the gateway.
//!
//! Layer order: Request → Tracing → CORS → BodyLimit → Handler

pub mod cors;
pub mod metrics;
pub mod tracing;

pub use cors::create_cors_layer;
pub use metrics::{GatewayMetrics, RequestTimer};
pub use tracing::TracingLayer;
