//! HTTP control surface
//!
//! A small axum router that drives the recording session from outside
//! the relay: start, stop, status and health.

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
