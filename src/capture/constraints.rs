use serde::{Deserialize, Serialize};

/// Audio processing profile applied when opening a capture source.
///
/// System/tab audio should be reproduced faithfully, so all voice
/// processing is disabled; microphone audio is optimized for voice with
/// all of it enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioProfile {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl AudioProfile {
    /// Profile for system/tab audio: no voice processing.
    pub fn faithful() -> Self {
        Self {
            echo_cancellation: false,
            noise_suppression: false,
            auto_gain_control: false,
        }
    }

    /// Profile for microphone audio: full voice processing.
    pub fn voice() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}

/// Constraints for a display-capture request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConstraints {
    /// Ideal capture resolution hint.
    pub width_ideal: u32,
    pub height_ideal: u32,
    /// Whether to request system/tab audio alongside video.
    pub capture_audio: bool,
    pub audio: AudioProfile,
}

impl Default for DisplayConstraints {
    fn default() -> Self {
        Self {
            width_ideal: 1920,
            height_ideal: 1080,
            capture_audio: true,
            audio: AudioProfile::faithful(),
        }
    }
}

/// Constraints for a microphone-only request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MicConstraints {
    pub audio: AudioProfile,
}

impl Default for MicConstraints {
    fn default() -> Self {
        Self {
            audio: AudioProfile::voice(),
        }
    }
}
