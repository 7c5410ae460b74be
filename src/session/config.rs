use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier (e.g., "meeting-2026-08-23-standup")
    pub session_id: String,

    /// Interval between periodic fragment deliveries from the recorder
    pub timeslice: Duration,

    /// Sample rate for the mixed audio program
    pub sample_rate: u32,

    /// Number of audio channels (1 = mono, 2 = stereo)
    pub channels: u16,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("meeting-{}", uuid::Uuid::new_v4()),
            timeslice: Duration::from_secs(1),
            sample_rate: 16000,
            channels: 1,
        }
    }
}
