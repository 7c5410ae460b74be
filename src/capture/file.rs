use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use crate::error::RecordingError;

use super::backend::{AudioFrame, AudioStreamSource, CaptureBackend};
use super::constraints::{DisplayConstraints, MicConstraints};
use super::track::{MediaStream, MediaTrack};

/// Frame length emitted by the file backend.
const FRAME_DURATION_MS: u64 = 100;

/// WAV-file capture backend.
///
/// Stands in for live platform capture by slicing pre-recorded WAV files
/// into timed PCM frames, one file per source. Useful for loopback runs
/// and batch processing.
pub struct WavFileBackend {
    display_path: PathBuf,
    microphone_path: PathBuf,
}

impl WavFileBackend {
    pub fn new(display_path: PathBuf, microphone_path: PathBuf) -> Self {
        Self {
            display_path,
            microphone_path,
        }
    }

    fn open_wav(path: &Path) -> Result<LoadedWav, RecordingError> {
        let reader = hound::WavReader::open(path).map_err(|e| match e {
            hound::Error::IoError(io) => RecordingError::from_io(io),
            _ => RecordingError::NotSupported,
        })?;

        let spec = reader.spec();
        if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
            return Err(RecordingError::NotSupported);
        }

        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| RecordingError::NotSupported)?;

        info!(
            path = %path.display(),
            sample_rate = spec.sample_rate,
            channels = spec.channels,
            samples = samples.len(),
            "loaded capture file"
        );

        Ok(LoadedWav {
            samples,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
        })
    }

    fn spawn_feed(wav: LoadedWav, source: AudioStreamSource) -> mpsc::Receiver<AudioFrame> {
        let (tx, rx) = mpsc::channel(100);

        tokio::spawn(async move {
            let samples_per_frame = (wav.sample_rate as u64 * FRAME_DURATION_MS / 1000) as usize
                * wav.channels as usize;
            if samples_per_frame == 0 {
                return;
            }

            let mut timestamp_ms = 0;
            for chunk in wav.samples.chunks(samples_per_frame) {
                let frame = AudioFrame {
                    samples: chunk.to_vec(),
                    sample_rate: wav.sample_rate,
                    channels: wav.channels,
                    timestamp_ms,
                    source,
                };
                if tx.send(frame).await.is_err() {
                    break;
                }
                timestamp_ms += FRAME_DURATION_MS;
            }
        });

        rx
    }
}

#[derive(Debug)]
struct LoadedWav {
    samples: Vec<i16>,
    sample_rate: u32,
    channels: u16,
}

#[async_trait::async_trait]
impl CaptureBackend for WavFileBackend {
    async fn open_display(
        &self,
        constraints: &DisplayConstraints,
    ) -> Result<MediaStream, RecordingError> {
        let mut tracks = vec![Arc::new(MediaTrack::video("file display"))];

        if constraints.capture_audio {
            let wav = Self::open_wav(&self.display_path)?;
            let feed = Self::spawn_feed(wav, AudioStreamSource::Screen);
            tracks.push(Arc::new(MediaTrack::audio("file tab audio", feed)));
        }

        Ok(MediaStream::new(tracks))
    }

    async fn open_microphone(
        &self,
        _constraints: &MicConstraints,
    ) -> Result<MediaStream, RecordingError> {
        let wav = Self::open_wav(&self.microphone_path)?;
        let feed = Self::spawn_feed(wav, AudioStreamSource::Microphone);

        Ok(MediaStream::new(vec![Arc::new(MediaTrack::audio(
            "file mic", feed,
        ))]))
    }

    fn name(&self) -> &str {
        "wav-file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_maps_to_not_found() {
        let err = WavFileBackend::open_wav(Path::new("/nonexistent/capture.wav")).unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }
}
