//! Streaming capture recorder: MIME negotiation, chunked encoding, and
//! artifact assembly.

pub mod artifact;
pub mod chunk;
pub mod encoder;
mod recorder;

pub use artifact::{normalized_mime_type, RecordingArtifact};
pub use chunk::ChunkAccumulator;
pub use encoder::{default_candidates, EncoderRegistry, MediaEncoder, WavPcmEncoder};
pub use recorder::{create_recorder, CaptureRecorder};
