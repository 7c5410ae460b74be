use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::capture::{AudioFrame, MediaStream};
use crate::error::RecordingError;

use super::artifact::{normalized_mime_type, RecordingArtifact};
use super::chunk::ChunkAccumulator;
use super::encoder::{EncoderRegistry, MediaEncoder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecorderState {
    Inactive,
    Recording,
    Stopped,
}

/// Events flowing from the drive task to the chunk accumulator.
///
/// A single producer feeds this channel, so fragments arrive in strict
/// append order and `Stopped` trails every fragment of the recording.
enum RecorderEvent {
    Chunk(Vec<u8>),
    Stopped,
}

/// Streaming recorder over a combined capture stream.
///
/// Encodes the stream's first audio track into periodic fragments so
/// data is buffered even if the recording is interrupted, and assembles
/// one immutable artifact when stopped.
pub struct CaptureRecorder {
    id: Uuid,
    mime_type: String,
    normalized_mime: &'static str,
    feed: Option<mpsc::Receiver<AudioFrame>>,
    encoder: Option<Box<dyn MediaEncoder>>,
    state: RecorderState,
    stop_tx: Option<watch::Sender<bool>>,
    completion: Option<oneshot::Receiver<Result<RecordingArtifact, RecordingError>>>,
}

impl std::fmt::Debug for CaptureRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureRecorder")
            .field("id", &self.id)
            .field("mime_type", &self.mime_type)
            .field("normalized_mime", &self.normalized_mime)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Create a recorder for the given stream, negotiating the first
/// supported MIME type from the ordered candidate list.
///
/// The recorder borrows the stream's first audio-track feed; the stream
/// itself stays owned by the caller.
pub fn create_recorder(
    stream: &MediaStream,
    candidates: &[&str],
    registry: &EncoderRegistry,
    sample_rate: u32,
    channels: u16,
) -> Result<CaptureRecorder, RecordingError> {
    let mime_type = registry
        .select(candidates)
        .ok_or(RecordingError::NotSupported)?;

    let encoder = registry
        .create(&mime_type, sample_rate, channels)
        .ok_or(RecordingError::NotSupported)?;

    let feed = stream.audio_tracks().first().and_then(|t| t.take_feed());
    if feed.is_none() {
        warn!("recorder created over a stream with no readable audio feed");
    }

    info!(mime_type = %mime_type, "recorder created");

    Ok(CaptureRecorder {
        id: Uuid::new_v4(),
        mime_type,
        normalized_mime: normalized_mime_type(stream.has_video()),
        feed,
        encoder: Some(encoder),
        state: RecorderState::Inactive,
        stop_tx: None,
        completion: None,
    })
}

impl CaptureRecorder {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The negotiated encoder MIME type. For logging only; artifacts are
    /// tagged with the normalized type instead.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    /// Begin continuous recording with periodic fragment delivery.
    pub fn start(&mut self, timeslice: Duration) {
        if self.state != RecorderState::Inactive {
            warn!("recorder already started, skipping");
            return;
        }

        let encoder = match self.encoder.take() {
            Some(e) => e,
            None => {
                warn!("recorder has no encoder, skipping start");
                return;
            }
        };

        let (stop_tx, stop_rx) = watch::channel(false);
        let (events_tx, events_rx) = mpsc::channel::<RecorderEvent>(64);
        let (done_tx, done_rx) = oneshot::channel();

        let feed = self.feed.take();
        tokio::spawn(drive_recording(feed, encoder, timeslice, stop_rx, events_tx));
        tokio::spawn(accumulate_chunks(
            events_rx,
            self.normalized_mime.to_string(),
            done_tx,
        ));

        self.stop_tx = Some(stop_tx);
        self.completion = Some(done_rx);
        self.state = RecorderState::Recording;

        info!(timeslice_ms = timeslice.as_millis() as u64, "recording started");
    }

    /// Stop recording and await the assembled artifact.
    ///
    /// The artifact is materialized only after the final fragment event;
    /// the accumulator guarantees assembly never happens early. A second
    /// stop is `NoActiveRecording`.
    pub async fn stop(&mut self) -> Result<RecordingArtifact, RecordingError> {
        if self.state != RecorderState::Recording {
            return Err(RecordingError::NoActiveRecording);
        }
        self.state = RecorderState::Stopped;

        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(true);
        }

        let completion = self
            .completion
            .take()
            .ok_or(RecordingError::NoActiveRecording)?;

        completion
            .await
            .map_err(|e| RecordingError::Unknown(e.into()))?
    }
}

async fn drive_recording(
    mut feed: Option<mpsc::Receiver<AudioFrame>>,
    mut encoder: Box<dyn MediaEncoder>,
    timeslice: Duration,
    mut stop_rx: watch::Receiver<bool>,
    events_tx: mpsc::Sender<RecorderEvent>,
) {
    let mut interval = tokio::time::interval(timeslice);
    // The first tick fires immediately; it just flushes an empty fragment,
    // which the accumulator drops.
    loop {
        tokio::select! {
            _ = stop_rx.changed() => break,
            maybe_frame = recv_frame(&mut feed) => {
                match maybe_frame {
                    Some(frame) => encoder.encode(&frame),
                    // Source tracks ended: the recording stops naturally.
                    None => break,
                }
            }
            _ = interval.tick() => {
                let fragment = encoder.take_fragment();
                if events_tx.send(RecorderEvent::Chunk(fragment)).await.is_err() {
                    return;
                }
            }
        }
    }

    let fragment = encoder.take_fragment();
    if events_tx.send(RecorderEvent::Chunk(fragment)).await.is_err() {
        return;
    }
    let trailer = encoder.finish();
    if events_tx.send(RecorderEvent::Chunk(trailer)).await.is_err() {
        return;
    }
    let _ = events_tx.send(RecorderEvent::Stopped).await;

    debug!("recorder drive task finished");
}

async fn recv_frame(feed: &mut Option<mpsc::Receiver<AudioFrame>>) -> Option<AudioFrame> {
    match feed {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn accumulate_chunks(
    mut events_rx: mpsc::Receiver<RecorderEvent>,
    mime_type: String,
    done_tx: oneshot::Sender<Result<RecordingArtifact, RecordingError>>,
) {
    let mut accumulator = ChunkAccumulator::new(mime_type);
    let mut done_tx = Some(done_tx);

    while let Some(event) = events_rx.recv().await {
        match event {
            RecorderEvent::Chunk(fragment) => accumulator.push(fragment),
            RecorderEvent::Stopped => {
                if let Some(result) = accumulator.finish() {
                    if let Some(tx) = done_tx.take() {
                        let _ = tx.send(result);
                    }
                }
            }
        }
    }

    // Drive task gone without a stop event; finalize what we have.
    if let Some(result) = accumulator.finish() {
        if let Some(tx) = done_tx.take() {
            let _ = tx.send(result);
        }
    }
}
