use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Recording pipeline error taxonomy.
///
/// Every variant maps to a stable code and a fixed human-readable message,
/// so failure text shown to callers never leaks raw platform error strings.
#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("Permission denied. Please allow screen sharing when prompted.")]
    PermissionDenied,

    #[error("Screen recording is not supported on this platform.")]
    NotSupported,

    #[error("No screen or capture device found to record.")]
    NotFound,

    #[error("Audio mixing failed, using fallback method.")]
    AudioMixingFailed,

    #[error("No active recording to stop.")]
    NoActiveRecording,

    #[error("Recording produced no data. The capture device may have failed.")]
    EmptyRecording,

    #[error("An unknown error occurred.")]
    Unknown(#[source] anyhow::Error),
}

impl RecordingError {
    /// Stable error code for wire payloads and logs.
    pub fn code(&self) -> &'static str {
        match self {
            RecordingError::PermissionDenied => "PERMISSION_DENIED",
            RecordingError::NotSupported => "NOT_SUPPORTED",
            RecordingError::NotFound => "NOT_FOUND",
            RecordingError::AudioMixingFailed => "AUDIO_MIXING_FAILED",
            RecordingError::NoActiveRecording => "NO_ACTIVE_RECORDING",
            RecordingError::EmptyRecording => "EMPTY_RECORDING",
            RecordingError::Unknown(_) => "UNKNOWN_ERROR",
        }
    }

    /// Whether the caller can reasonably retry.
    ///
    /// Denied permissions and missing devices can recover (the user can
    /// re-prompt or plug the device back in); an unsupported capability
    /// cannot.
    pub fn recoverable(&self) -> bool {
        matches!(
            self,
            RecordingError::PermissionDenied
                | RecordingError::NotFound
                | RecordingError::AudioMixingFailed
                | RecordingError::NoActiveRecording
        )
    }

    /// Classify an I/O error from a capture backend.
    pub fn from_io(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::PermissionDenied => RecordingError::PermissionDenied,
            ErrorKind::NotFound => RecordingError::NotFound,
            ErrorKind::Unsupported => RecordingError::NotSupported,
            _ => RecordingError::Unknown(err.into()),
        }
    }

    /// Serializable form for UI consumers.
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            message: self.to_string(),
            code: self.code().to_string(),
            recoverable: self.recoverable(),
        }
    }
}

/// Structured error handed to UI layers: message, code and a
/// recoverability flag so the UI can decide whether to offer a retry.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub message: String,
    pub code: String,
    pub recoverable: bool,
}

/// Log an error with full context: normalized code plus the original error.
pub fn log_error(context: &str, err: &RecordingError) {
    match err {
        RecordingError::Unknown(original) => {
            error!(
                context,
                code = err.code(),
                recoverable = err.recoverable(),
                original = %original,
                "{}", err
            );
        }
        _ => {
            error!(
                context,
                code = err.code(),
                recoverable = err.recoverable(),
                "{}", err
            );
        }
    }
}
