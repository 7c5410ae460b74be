// Audio mixer for combining screen-capture and microphone streams.
//
// Naively unioning tracks from two streams does not mix audio: most
// recorders store the first audio track only. Cross-source mixing needs
// an explicit signal sum, so the mixer builds a small routing graph: one
// source node per input stream that carries audio, all routed into a
// single shared destination whose output track holds the time-aligned
// sample sum (with clipping).
//
// When the graph cannot be built, `combine` returns the union fallback
// as a first-class outcome instead of failing recording start.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::capture::{AudioFrame, AudioStreamSource, MediaStream, MediaTrack};
use crate::error::RecordingError;

/// Configuration for the audio mixer.
#[derive(Debug, Clone)]
pub struct MixerConfig {
    /// Target sample rate for output
    pub sample_rate: u32,
    /// Number of channels in output
    pub channels: u16,
    /// Maximum buffering delay in milliseconds (default: 200ms)
    /// Frames older than this are dropped to prevent unbounded buffering
    pub max_buffer_delay_ms: u64,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            max_buffer_delay_ms: 200,
        }
    }
}

/// How the combined stream was produced.
pub enum MixOutcome {
    /// Graph mixing succeeded: exactly one mixed audio track.
    Mixed(MediaStream),
    /// Mixing was unavailable; the stream is a plain track union with
    /// the source audio tracks surviving independently.
    Fallback(MediaStream),
}

impl MixOutcome {
    pub fn stream(&self) -> &MediaStream {
        match self {
            MixOutcome::Mixed(s) | MixOutcome::Fallback(s) => s,
        }
    }

    pub fn into_stream(self) -> MediaStream {
        match self {
            MixOutcome::Mixed(s) | MixOutcome::Fallback(s) => s,
        }
    }

    pub fn is_mixed(&self) -> bool {
        matches!(self, MixOutcome::Mixed(_))
    }
}

/// Handle to the running mixing graph.
///
/// Owns the routing tasks. Closing it is mandatory during cleanup;
/// leaving it open leaks the source feeds. Drop closes as a backstop.
pub struct MixerContext {
    tasks: Vec<JoinHandle<()>>,
    closed: bool,
}

impl MixerContext {
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        for task in &self.tasks {
            task.abort();
        }
        info!("mixer context closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for MixerContext {
    fn drop(&mut self) {
        if !self.closed {
            warn!("mixer context dropped while open, closing");
            self.close();
        }
    }
}

/// Audio mixer that combines two capture streams.
pub struct AudioMixer {
    config: MixerConfig,
}

impl AudioMixer {
    pub fn new(config: MixerConfig) -> Self {
        info!(
            sample_rate = config.sample_rate,
            channels = config.channels,
            "audio mixer initialized"
        );
        Self { config }
    }

    /// Combine the streams, preferring the mixing graph and falling back
    /// to a plain union when the graph cannot be built. Recording start
    /// must never fail solely because mixing failed.
    pub fn combine(
        &self,
        screen: &MediaStream,
        mic: &MediaStream,
    ) -> (MixOutcome, Option<MixerContext>) {
        match self.mix_audio_streams(screen, mic) {
            Ok((stream, context)) => {
                log_stream_info(screen, mic, &stream);
                (MixOutcome::Mixed(stream), Some(context))
            }
            Err(err) => {
                crate::error::log_error("AudioMixer.combine", &err);
                let fallback = Self::create_fallback_stream(screen, mic);
                log_stream_info(screen, mic, &fallback);
                (MixOutcome::Fallback(fallback), None)
            }
        }
    }

    /// Build the mixing graph and return a stream composed of the screen
    /// stream's video tracks plus one mixed audio track.
    ///
    /// Streams with zero audio tracks are skipped, not connected.
    pub fn mix_audio_streams(
        &self,
        screen: &MediaStream,
        mic: &MediaStream,
    ) -> Result<(MediaStream, MixerContext), RecordingError> {
        let mut sources: Vec<(AudioStreamSource, mpsc::Receiver<AudioFrame>)> = Vec::new();

        for (stream, source) in [
            (screen, AudioStreamSource::Screen),
            (mic, AudioStreamSource::Microphone),
        ] {
            let audio_tracks = stream.audio_tracks();
            if audio_tracks.is_empty() {
                debug!(?source, "stream has no audio tracks, skipping");
                continue;
            }
            // Recorders consume the first audio track; so does the graph.
            let feed = audio_tracks[0]
                .take_feed()
                .ok_or(RecordingError::AudioMixingFailed)?;
            sources.push((source, feed));
            debug!(?source, "audio source connected to mixer");
        }

        let mut tasks = Vec::new();

        // Funnel every source into one channel, retagged per node.
        let (funnel_tx, funnel_rx) = mpsc::channel::<AudioFrame>(100);
        for (source, mut feed) in sources {
            let tx = funnel_tx.clone();
            tasks.push(tokio::spawn(async move {
                while let Some(mut frame) = feed.recv().await {
                    frame.source = source;
                    if tx.send(frame).await.is_err() {
                        break;
                    }
                }
            }));
        }
        drop(funnel_tx);

        // Destination node: the single mixed output track.
        let (dest_tx, dest_rx) = mpsc::channel::<AudioFrame>(100);
        let buffers = MixBuffers::new(self.config.clone());
        tasks.push(tokio::spawn(run_destination(funnel_rx, dest_tx, buffers)));

        let mut tracks = screen.video_tracks();
        tracks.push(Arc::new(MediaTrack::audio("mixed audio", dest_rx)));

        info!("audio mixing graph built");

        Ok((
            MediaStream::new(tracks),
            MixerContext {
                tasks,
                closed: false,
            },
        ))
    }

    /// Union all video tracks from screen, all audio tracks from screen,
    /// and all audio tracks from mic into one stream without mixing.
    ///
    /// Two parallel audio tracks survive independently; most recorders
    /// pick one track's audio, so this is degraded but functioning.
    pub fn create_fallback_stream(screen: &MediaStream, mic: &MediaStream) -> MediaStream {
        info!("using fallback stream combination");

        let mut tracks = screen.video_tracks();
        tracks.extend(screen.audio_tracks());
        tracks.extend(mic.audio_tracks());

        MediaStream::new(tracks)
    }
}

async fn run_destination(
    mut funnel_rx: mpsc::Receiver<AudioFrame>,
    dest_tx: mpsc::Sender<AudioFrame>,
    mut buffers: MixBuffers,
) {
    while let Some(frame) = funnel_rx.recv().await {
        buffers.buffer_frame(frame);
        while let Some(mixed) = buffers.mix_next_chunk() {
            if dest_tx.send(mixed).await.is_err() {
                return;
            }
        }
    }

    // Flush remaining buffered frames once all sources have closed.
    while let Some(mixed) = buffers.mix_next_chunk() {
        if dest_tx.send(mixed).await.is_err() {
            return;
        }
    }

    debug!("mixing destination drained");
}

/// Time-aligned per-source frame buffers and the sample-sum math.
struct MixBuffers {
    config: MixerConfig,
    buffers: HashMap<AudioStreamSource, VecDeque<AudioFrame>>,
    current_position_ms: u64,
}

impl MixBuffers {
    fn new(config: MixerConfig) -> Self {
        Self {
            config,
            buffers: HashMap::new(),
            current_position_ms: 0,
        }
    }

    /// Buffer a frame under its source, dropping frames whose format
    /// does not match the mixer output.
    fn buffer_frame(&mut self, frame: AudioFrame) {
        if frame.sample_rate != self.config.sample_rate {
            warn!(
                expected = self.config.sample_rate,
                got = frame.sample_rate,
                "frame sample rate mismatch, dropping"
            );
            return;
        }

        if frame.channels != self.config.channels {
            warn!(
                expected = self.config.channels,
                got = frame.channels,
                "frame channel count mismatch, dropping"
            );
            return;
        }

        self.buffers.entry(frame.source).or_default().push_back(frame);
        self.cleanup_old_frames();
    }

    /// Remove frames that are too old (beyond max buffer delay).
    fn cleanup_old_frames(&mut self) {
        let cutoff = self
            .current_position_ms
            .saturating_sub(self.config.max_buffer_delay_ms);

        for (source, buffer) in &mut self.buffers {
            while let Some(frame) = buffer.front() {
                if frame.timestamp_ms < cutoff {
                    warn!(
                        ?source,
                        timestamp_ms = frame.timestamp_ms,
                        position_ms = self.current_position_ms,
                        "dropping stale frame"
                    );
                    buffer.pop_front();
                } else {
                    break;
                }
            }
        }
    }

    /// Mix the next chunk from all buffered sources, or None when no
    /// data is available.
    fn mix_next_chunk(&mut self) -> Option<AudioFrame> {
        let mut frames: Vec<AudioFrame> = Vec::new();
        for buffer in self.buffers.values_mut() {
            if let Some(frame) = buffer.pop_front() {
                frames.push(frame);
            }
        }

        if frames.is_empty() {
            return None;
        }

        if frames.len() == 1 {
            let frame = frames.into_iter().next().unwrap();
            self.current_position_ms = frame.timestamp_ms;
            return Some(frame);
        }

        let mixed = self.mix_frames(&frames);
        self.current_position_ms = mixed.timestamp_ms;
        Some(mixed)
    }

    /// Mix frames together by adding their samples with clipping.
    fn mix_frames(&self, frames: &[AudioFrame]) -> AudioFrame {
        let timestamp_ms = frames.iter().map(|f| f.timestamp_ms).min().unwrap_or(0);
        let max_len = frames.iter().map(|f| f.samples.len()).max().unwrap_or(0);
        let mut mixed_samples = Vec::with_capacity(max_len);

        for i in 0..max_len {
            let mut sum: i32 = 0;
            for frame in frames {
                sum += frame.samples.get(i).copied().unwrap_or(0) as i32;
            }
            mixed_samples.push(sum.clamp(i16::MIN as i32, i16::MAX as i32) as i16);
        }

        AudioFrame {
            samples: mixed_samples,
            sample_rate: self.config.sample_rate,
            channels: self.config.channels,
            timestamp_ms,
            source: AudioStreamSource::Screen,
        }
    }
}

fn log_stream_info(screen: &MediaStream, mic: &MediaStream, combined: &MediaStream) {
    info!(
        video_tracks = combined.video_tracks().len(),
        screen_audio_tracks = screen.audio_tracks().len(),
        mic_audio_tracks = mic.audio_tracks().len(),
        combined_audio_tracks = combined.audio_tracks().len(),
        "combined streams"
    );
}
