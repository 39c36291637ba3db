//! Signing daemon
//!
//! Serves the signing engine over REST:
//! - process creation, status, listing and audit trail
//! - slot commit and reject
//! - expiry evaluation and a periodic expiry sweep
//! - tamper verification
//! - a server-sent event stream of status changes

#![deny(unsafe_code)]

pub mod api;
pub mod config;
pub mod error;
pub mod server;
pub mod sweeper;

pub use config::DaemonConfig;
pub use error::{ApiError, ApiResult, DaemonError, DaemonResult};
pub use server::Server;
