//! HTTP surface: routes and server lifecycle.

pub mod routes;
pub mod server;

pub use routes::{routes, AppState};
pub use server::{build_router, GatewayServer, RunningServer};
