use std::sync::Arc;
use tracing::info;

use crate::error::RecordingError;

use super::backend::CaptureBackend;
use super::constraints::{DisplayConstraints, MicConstraints};
use super::track::MediaStream;

/// Requests display-capture and microphone streams from the capture
/// backend, applying the distinct constraint profile for each.
pub struct StreamAcquirer {
    backend: Arc<dyn CaptureBackend>,
    display: DisplayConstraints,
    microphone: MicConstraints,
}

impl StreamAcquirer {
    pub fn new(backend: Arc<dyn CaptureBackend>) -> Self {
        Self {
            backend,
            display: DisplayConstraints::default(),
            microphone: MicConstraints::default(),
        }
    }

    pub fn with_constraints(
        backend: Arc<dyn CaptureBackend>,
        display: DisplayConstraints,
        microphone: MicConstraints,
    ) -> Self {
        Self {
            backend,
            display,
            microphone,
        }
    }

    /// Request a display-capture stream: ideal-resolution video hints
    /// plus faithful (unprocessed) system audio.
    pub async fn acquire_screen_stream(&self) -> Result<MediaStream, RecordingError> {
        let stream = self.backend.open_display(&self.display).await?;
        info!(
            backend = self.backend.name(),
            video_tracks = stream.video_tracks().len(),
            audio_tracks = stream.audio_tracks().len(),
            "screen capture acquired"
        );
        Ok(stream)
    }

    /// Request a microphone-only stream with the voice profile.
    pub async fn acquire_mic_stream(&self) -> Result<MediaStream, RecordingError> {
        info!("requesting microphone access");
        let stream = self.backend.open_microphone(&self.microphone).await?;
        info!(
            backend = self.backend.name(),
            audio_tracks = stream.audio_tracks().len(),
            "microphone access granted"
        );
        Ok(stream)
    }
}
