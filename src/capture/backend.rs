use std::path::PathBuf;
use std::sync::Arc;

use crate::error::RecordingError;

use super::constraints::{DisplayConstraints, MicConstraints};
use super::track::MediaStream;

/// Audio stream source type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioStreamSource {
    /// Display/tab capture audio (applications, browser, etc.)
    Screen,
    /// Microphone input
    Microphone,
}

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
    /// Audio stream source (screen or microphone)
    pub source: AudioStreamSource,
}

/// Capture backend trait
///
/// A backend opens platform media sources and hands back streams whose
/// audio tracks feed live PCM frames. Implementations:
/// - File: slices a WAV file into timed frames (loopback/batch use)
/// - Synthetic: generated tones, used by tests and demos
#[async_trait::async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Open a display-capture stream (video plus optional system audio).
    async fn open_display(
        &self,
        constraints: &DisplayConstraints,
    ) -> Result<MediaStream, RecordingError>;

    /// Open a microphone-only stream.
    async fn open_microphone(
        &self,
        constraints: &MicConstraints,
    ) -> Result<MediaStream, RecordingError>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Capture source selection
#[derive(Debug, Clone)]
pub enum CaptureSource {
    /// WAV files standing in for display and microphone feeds
    File {
        display_path: PathBuf,
        microphone_path: PathBuf,
    },
    /// Generated tones (tests, demos)
    Synthetic,
}

/// Capture backend factory
pub struct CaptureBackendFactory;

impl CaptureBackendFactory {
    pub fn create(
        source: CaptureSource,
        sample_rate: u32,
        channels: u16,
    ) -> Result<Arc<dyn CaptureBackend>, RecordingError> {
        match source {
            CaptureSource::File {
                display_path,
                microphone_path,
            } => Ok(Arc::new(super::file::WavFileBackend::new(
                display_path,
                microphone_path,
            ))),
            CaptureSource::Synthetic => Ok(Arc::new(super::synthetic::SyntheticBackend::new(
                super::synthetic::SyntheticConfig {
                    sample_rate,
                    channels,
                    ..Default::default()
                },
            ))),
        }
    }
}
