use std::sync::Arc;
use tracing::debug;

use crate::capture::AudioFrame;

/// A streaming media encoder behind the recorder.
///
/// Models the platform codec: frames go in, opaque byte fragments come
/// out. Fragment boundaries are the recorder's timeslices; `finish`
/// drains whatever the codec still holds.
pub trait MediaEncoder: Send {
    /// The MIME type this encoder produces.
    fn mime_type(&self) -> &str;

    /// Buffer one frame of PCM input.
    fn encode(&mut self, frame: &AudioFrame);

    /// Drain the bytes encoded since the last fragment. May be empty.
    fn take_fragment(&mut self) -> Vec<u8>;

    /// Finalize the encoding and drain any trailer bytes.
    fn finish(&mut self) -> Vec<u8>;
}

type EncoderFactory = Arc<dyn Fn(u32, u16) -> Box<dyn MediaEncoder> + Send + Sync>;

struct EncoderEntry {
    mime_type: String,
    factory: EncoderFactory,
}

/// Registry of available encoders, keyed by exact MIME type string.
pub struct EncoderRegistry {
    entries: Vec<EncoderEntry>,
}

impl EncoderRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registry with the built-in baseline encoder (`audio/wav`).
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("audio/wav", |sample_rate, channels| {
            Box::new(WavPcmEncoder::new(sample_rate, channels))
        });
        registry
    }

    pub fn register<F>(&mut self, mime_type: &str, factory: F)
    where
        F: Fn(u32, u16) -> Box<dyn MediaEncoder> + Send + Sync + 'static,
    {
        self.entries.push(EncoderEntry {
            mime_type: mime_type.to_string(),
            factory: Arc::new(factory),
        });
    }

    pub fn is_supported(&self, mime_type: &str) -> bool {
        self.entries.iter().any(|e| e.mime_type == mime_type)
    }

    /// Pick the first supported candidate from an ordered preference
    /// list (efficient codecs first, minimal baseline last).
    pub fn select(&self, candidates: &[&str]) -> Option<String> {
        for candidate in candidates {
            if self.is_supported(candidate) {
                debug!(mime_type = candidate, "selected encoder");
                return Some(candidate.to_string());
            }
        }
        None
    }

    pub fn create(
        &self,
        mime_type: &str,
        sample_rate: u32,
        channels: u16,
    ) -> Option<Box<dyn MediaEncoder>> {
        self.entries
            .iter()
            .find(|e| e.mime_type == mime_type)
            .map(|e| (e.factory)(sample_rate, channels))
    }
}

impl Default for EncoderRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Ordered MIME candidates for recorder creation.
///
/// When video is disabled the audio-only types come first; the streaming
/// WAV baseline closes both lists.
pub fn default_candidates(has_video: bool) -> Vec<&'static str> {
    if has_video {
        vec![
            "video/webm;codecs=vp9,opus",
            "video/webm;codecs=vp8,opus",
            "video/webm",
            "audio/wav",
        ]
    } else {
        vec![
            "audio/webm;codecs=opus",
            "audio/webm",
            "video/webm;codecs=opus",
            "audio/wav",
        ]
    }
}

/// Streaming PCM/WAV encoder: a RIFF header fragment first (streaming
/// convention, sizes unknown up front), then raw little-endian samples.
pub struct WavPcmEncoder {
    pending: Vec<u8>,
}

impl WavPcmEncoder {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            pending: streaming_wav_header(sample_rate, channels),
        }
    }
}

impl MediaEncoder for WavPcmEncoder {
    fn mime_type(&self) -> &str {
        "audio/wav"
    }

    fn encode(&mut self, frame: &AudioFrame) {
        for sample in &frame.samples {
            self.pending.extend_from_slice(&sample.to_le_bytes());
        }
    }

    fn take_fragment(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.pending)
    }

    fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.pending)
    }
}

/// 44-byte RIFF/WAVE header with streaming-style unknown chunk sizes.
fn streaming_wav_header(sample_rate: u32, channels: u16) -> Vec<u8> {
    let bits_per_sample: u16 = 16;
    let block_align = channels * bits_per_sample / 8;
    let byte_rate = sample_rate * block_align as u32;

    let mut header = Vec::with_capacity(44);
    header.extend_from_slice(b"RIFF");
    header.extend_from_slice(&u32::MAX.to_le_bytes());
    header.extend_from_slice(b"WAVE");
    header.extend_from_slice(b"fmt ");
    header.extend_from_slice(&16u32.to_le_bytes());
    header.extend_from_slice(&1u16.to_le_bytes()); // PCM
    header.extend_from_slice(&channels.to_le_bytes());
    header.extend_from_slice(&sample_rate.to_le_bytes());
    header.extend_from_slice(&byte_rate.to_le_bytes());
    header.extend_from_slice(&block_align.to_le_bytes());
    header.extend_from_slice(&bits_per_sample.to_le_bytes());
    header.extend_from_slice(b"data");
    header.extend_from_slice(&u32::MAX.to_le_bytes());
    header
}
