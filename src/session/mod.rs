//! Recording session management
//!
//! This module provides the `RecordingSession` abstraction that owns:
//! - Stream acquisition (screen capture, then microphone)
//! - Audio mixing with the union fallback
//! - The chunked capture recorder and its artifact
//! - The process-global active-recorder registry

mod config;
pub mod registry;
mod session;
mod stats;

pub use config::SessionConfig;
pub use registry::RecorderRegistry;
pub use session::{RecordingSession, SessionState};
pub use stats::SessionStatus;
