//! REST API over the signing engine

pub mod handlers;
pub mod payloads;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::AppState;
