//! CareBridge caregiver API server.
//!
//! Serves the REST surface for protected member records plus the `/ws`
//! realtime endpoint that notifies a caregiver's live sessions about member
//! changes. The binary entry point is `main.rs`; everything here is also
//! usable as a library so integration tests can assemble a server
//! in-process.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod realtime;
pub mod server;

pub use config::AppConfig;
pub use error::ApiError;
pub use observability::{apply_logging_level, init_tracing, init_tracing_with_level};
pub use server::{AppState, CareBridgeServer, ServerBuilder, build_app};
