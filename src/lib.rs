pub mod capture;
pub mod config;
pub mod delivery;
pub mod error;
pub mod http;
pub mod mixer;
pub mod recorder;
pub mod relay;
pub mod session;

pub use capture::{
    AudioFrame, AudioStreamSource, CaptureBackend, CaptureBackendFactory, CaptureSource,
    MediaStream, MediaTrack, StreamAcquirer,
};
pub use config::Config;
pub use delivery::{ArtifactConsumer, LocalDownload, MeetingUploader};
pub use error::{ErrorReport, RecordingError};
pub use http::{create_router, AppState};
pub use mixer::{AudioMixer, MixOutcome, MixerConfig, MixerContext};
pub use recorder::{CaptureRecorder, EncoderRegistry, RecordingArtifact};
pub use relay::{Action, CrossContextRelay, Envelope, ExtensionBridge, MessageSource};
pub use session::{RecordingSession, SessionConfig, SessionState, SessionStatus};
