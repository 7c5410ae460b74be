use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::info;

use crate::error::RecordingError;

use super::backend::{AudioFrame, AudioStreamSource, CaptureBackend};
use super::constraints::{DisplayConstraints, MicConstraints};
use super::track::{MediaStream, MediaTrack};

/// Configuration for the synthetic capture backend.
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// Duration of each emitted frame in milliseconds.
    pub frame_duration_ms: u64,
    /// Number of frames each audio track emits before the feed closes.
    pub frames_per_stream: usize,
    /// Whether the display stream carries an audio track.
    pub display_audio: bool,
    /// Fail display requests with `PermissionDenied`.
    pub deny_display: bool,
    /// Fail microphone requests with `PermissionDenied`.
    pub deny_microphone: bool,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            frame_duration_ms: 100,
            frames_per_stream: 20,
            display_audio: true,
            deny_display: false,
            deny_microphone: false,
        }
    }
}

/// Tone-generator capture backend.
///
/// Emits deterministic PCM frames on each audio track, counts every
/// acquisition, and remembers the tracks it created so callers can
/// assert on their final state. Used by tests and demos where no real
/// capture device exists.
pub struct SyntheticBackend {
    config: SyntheticConfig,
    display_opens: AtomicUsize,
    microphone_opens: AtomicUsize,
    opened_tracks: Mutex<Vec<Arc<MediaTrack>>>,
}

impl SyntheticBackend {
    pub fn new(config: SyntheticConfig) -> Self {
        Self {
            config,
            display_opens: AtomicUsize::new(0),
            microphone_opens: AtomicUsize::new(0),
            opened_tracks: Mutex::new(Vec::new()),
        }
    }

    pub fn display_opens(&self) -> usize {
        self.display_opens.load(Ordering::SeqCst)
    }

    pub fn microphone_opens(&self) -> usize {
        self.microphone_opens.load(Ordering::SeqCst)
    }

    /// Every track handed out so far, in acquisition order.
    pub fn opened_tracks(&self) -> Vec<Arc<MediaTrack>> {
        self.opened_tracks.lock().unwrap().clone()
    }

    fn spawn_tone_feed(&self, source: AudioStreamSource, amplitude: i16) -> mpsc::Receiver<AudioFrame> {
        let (tx, rx) = mpsc::channel(self.config.frames_per_stream + 1);
        let config = self.config.clone();

        tokio::spawn(async move {
            let samples_per_frame =
                (config.sample_rate as u64 * config.frame_duration_ms / 1000) as usize
                    * config.channels as usize;

            for index in 0..config.frames_per_stream {
                let frame = AudioFrame {
                    samples: vec![amplitude; samples_per_frame],
                    sample_rate: config.sample_rate,
                    channels: config.channels,
                    timestamp_ms: index as u64 * config.frame_duration_ms,
                    source,
                };
                if tx.send(frame).await.is_err() {
                    break;
                }
            }
            // Dropping the sender closes the feed.
        });

        rx
    }

    fn remember(&self, stream: &MediaStream) {
        let mut opened = self.opened_tracks.lock().unwrap();
        opened.extend(stream.tracks().iter().cloned());
    }
}

#[async_trait::async_trait]
impl CaptureBackend for SyntheticBackend {
    async fn open_display(
        &self,
        constraints: &DisplayConstraints,
    ) -> Result<MediaStream, RecordingError> {
        if self.config.deny_display {
            return Err(RecordingError::PermissionDenied);
        }
        self.display_opens.fetch_add(1, Ordering::SeqCst);

        let mut tracks = vec![Arc::new(MediaTrack::video("synthetic display"))];
        if constraints.capture_audio && self.config.display_audio {
            let feed = self.spawn_tone_feed(AudioStreamSource::Screen, 1000);
            tracks.push(Arc::new(MediaTrack::audio("synthetic tab audio", feed)));
        }

        let stream = MediaStream::new(tracks);
        self.remember(&stream);

        info!(
            width = constraints.width_ideal,
            height = constraints.height_ideal,
            audio = constraints.capture_audio,
            "synthetic display capture opened"
        );

        Ok(stream)
    }

    async fn open_microphone(
        &self,
        _constraints: &MicConstraints,
    ) -> Result<MediaStream, RecordingError> {
        if self.config.deny_microphone {
            return Err(RecordingError::PermissionDenied);
        }
        self.microphone_opens.fetch_add(1, Ordering::SeqCst);

        let feed = self.spawn_tone_feed(AudioStreamSource::Microphone, 500);
        let stream = MediaStream::new(vec![Arc::new(MediaTrack::audio("synthetic mic", feed))]);
        self.remember(&stream);

        info!("synthetic microphone opened");

        Ok(stream)
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}
