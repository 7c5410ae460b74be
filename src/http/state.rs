use std::sync::Arc;
use tokio::sync::Mutex;

use crate::delivery::ArtifactConsumer;
use crate::session::RecordingSession;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The context's recording session
    pub session: Arc<Mutex<RecordingSession>>,

    /// Where finished artifacts go (upload or local download)
    pub consumer: Arc<dyn ArtifactConsumer>,
}

impl AppState {
    pub fn new(session: Arc<Mutex<RecordingSession>>, consumer: Arc<dyn ArtifactConsumer>) -> Self {
        Self { session, consumer }
    }
}
