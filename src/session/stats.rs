use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of a recording session's state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    /// Whether recording is currently active
    pub is_recording: bool,

    /// Current state machine phase
    pub state: String,

    /// When the active recording started, if any
    pub started_at: Option<DateTime<Utc>>,

    /// Duration of the active recording in seconds
    pub duration_secs: f64,

    /// Whether the combined stream came from the mixing graph
    /// (false means the union fallback is in use)
    pub mixed_audio: bool,
}
