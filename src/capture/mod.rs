pub mod acquirer;
pub mod backend;
pub mod constraints;
pub mod file;
pub mod synthetic;
pub mod track;

pub use acquirer::StreamAcquirer;
pub use backend::{
    AudioFrame, AudioStreamSource, CaptureBackend, CaptureBackendFactory, CaptureSource,
};
pub use constraints::{AudioProfile, DisplayConstraints, MicConstraints};
pub use file::WavFileBackend;
pub use synthetic::{SyntheticBackend, SyntheticConfig};
pub use track::{MediaStream, MediaTrack, TrackKind, TrackState};
