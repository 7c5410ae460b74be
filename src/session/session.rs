use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::capture::{MediaStream, StreamAcquirer};
use crate::error::{log_error, RecordingError};
use crate::mixer::{AudioMixer, MixerConfig, MixerContext};
use crate::recorder::{
    create_recorder, default_candidates, CaptureRecorder, EncoderRegistry, RecordingArtifact,
};

use super::config::SessionConfig;
use super::registry::RecorderRegistry;
use super::stats::SessionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Starting,
    Active,
    Stopping,
}

impl SessionState {
    fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Starting => "starting",
            SessionState::Active => "active",
            SessionState::Stopping => "stopping",
        }
    }
}

/// Everything the session exclusively owns while a recording runs.
///
/// No other component may stop these streams or close the mixer context
/// directly.
struct ActiveRecording {
    recorder: CaptureRecorder,
    screen_stream: MediaStream,
    mic_stream: MediaStream,
    combined_stream: MediaStream,
    mixer_context: Option<MixerContext>,
    mixed_audio: bool,
    started_at: DateTime<Utc>,
}

/// Owns the lifetime of acquired streams, the recorder and mixer
/// resources for one recording; at most one active recording per
/// session, at most one session active per context (enforced through
/// the recorder registry).
pub struct RecordingSession {
    config: SessionConfig,
    acquirer: StreamAcquirer,
    mixer: AudioMixer,
    encoders: Arc<EncoderRegistry>,
    registry: &'static RecorderRegistry,
    state: SessionState,
    active: Option<ActiveRecording>,
}

impl RecordingSession {
    pub fn new(config: SessionConfig, acquirer: StreamAcquirer) -> Self {
        Self::with_registry(config, acquirer, super::registry::global())
    }

    /// Session bound to an explicit registry instance (tests use this to
    /// avoid sharing the process-global one).
    pub fn with_registry(
        config: SessionConfig,
        acquirer: StreamAcquirer,
        registry: &'static RecorderRegistry,
    ) -> Self {
        let mixer = AudioMixer::new(MixerConfig {
            sample_rate: config.sample_rate,
            channels: config.channels,
            ..MixerConfig::default()
        });

        Self {
            config,
            acquirer,
            mixer,
            encoders: Arc::new(EncoderRegistry::with_builtins()),
            registry,
            state: SessionState::Idle,
            active: None,
        }
    }

    pub fn with_encoders(mut self, encoders: Arc<EncoderRegistry>) -> Self {
        self.encoders = encoders;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Whether any recorder in this context is active, including ones
    /// registered before this session was created.
    pub fn has_global_recording(&self) -> bool {
        self.registry.has_active()
    }

    pub fn status(&self) -> SessionStatus {
        let (started_at, duration_secs, mixed_audio) = match &self.active {
            Some(active) => (
                Some(active.started_at),
                Utc::now()
                    .signed_duration_since(active.started_at)
                    .num_milliseconds() as f64
                    / 1000.0,
                active.mixed_audio,
            ),
            None => (None, 0.0, false),
        };

        SessionStatus {
            is_recording: self.is_recording(),
            state: self.state.as_str().to_string(),
            started_at,
            duration_secs,
            mixed_audio,
        }
    }

    /// Start recording: acquire screen then microphone, combine the
    /// streams, and start the recorder.
    ///
    /// Skipped without side effects when a recording is already in
    /// progress here or anywhere else in this context. The guard checks
    /// run synchronously before the first suspension point, so two start
    /// calls in the same tick cannot both pass.
    pub async fn start(&mut self) -> Result<(), RecordingError> {
        if self.state != SessionState::Idle || self.active.is_some() {
            warn!(session = %self.config.session_id, "recording already in progress, skipping");
            return Ok(());
        }
        if self.registry.has_active() {
            warn!(
                session = %self.config.session_id,
                "recording already active in this context, skipping"
            );
            return Ok(());
        }
        self.state = SessionState::Starting;

        info!(session = %self.config.session_id, "starting recording with combined audio streams");

        let screen_stream = match self.acquirer.acquire_screen_stream().await {
            Ok(stream) => stream,
            Err(err) => {
                log_error("RecordingSession.start.screen", &err);
                self.state = SessionState::Idle;
                return Err(err);
            }
        };

        let mic_stream = match self.acquirer.acquire_mic_stream().await {
            Ok(stream) => stream,
            Err(err) => {
                log_error("RecordingSession.start.microphone", &err);
                // No leaked open capture devices on a failed start.
                screen_stream.stop_all();
                self.state = SessionState::Idle;
                return Err(err);
            }
        };

        let (outcome, mixer_context) = self.mixer.combine(&screen_stream, &mic_stream);
        let mixed_audio = outcome.is_mixed();
        let combined_stream = outcome.into_stream();

        let candidates = default_candidates(combined_stream.has_video());
        let mut recorder = match create_recorder(
            &combined_stream,
            &candidates,
            &self.encoders,
            self.config.sample_rate,
            self.config.channels,
        ) {
            Ok(recorder) => recorder,
            Err(err) => {
                log_error("RecordingSession.start.recorder", &err);
                Self::release(
                    &screen_stream,
                    &mic_stream,
                    &combined_stream,
                    mixer_context,
                );
                self.state = SessionState::Idle;
                return Err(err);
            }
        };

        recorder.start(self.config.timeslice);
        self.registry.register(recorder.id());

        self.active = Some(ActiveRecording {
            recorder,
            screen_stream,
            mic_stream,
            combined_stream,
            mixer_context,
            mixed_audio,
            started_at: Utc::now(),
        });
        self.state = SessionState::Active;

        info!(
            session = %self.config.session_id,
            mixed_audio,
            "recording started with combined audio streams"
        );

        Ok(())
    }

    /// Stop the recording: finalize the artifact, stop every owned
    /// track, release the mixer context and clear the registry.
    ///
    /// Stop while idle is `NoActiveRecording`: it usually means the UI
    /// and session state have drifted apart, so it is reported rather
    /// than swallowed.
    pub async fn stop(&mut self) -> Result<RecordingArtifact, RecordingError> {
        if self.state != SessionState::Active {
            return Err(RecordingError::NoActiveRecording);
        }
        let mut active = match self.active.take() {
            Some(active) => active,
            None => return Err(RecordingError::NoActiveRecording),
        };
        self.state = SessionState::Stopping;

        info!(session = %self.config.session_id, "stopping recording");

        let result = active.recorder.stop().await;

        // Cleanup happens unconditionally, even when the recorder
        // reported a failure; cleanup itself never masks that error.
        Self::release(
            &active.screen_stream,
            &active.mic_stream,
            &active.combined_stream,
            active.mixer_context.take(),
        );
        self.registry.clear();
        self.state = SessionState::Idle;

        match &result {
            Ok(artifact) => {
                info!(
                    session = %self.config.session_id,
                    size = artifact.size(),
                    mime_type = artifact.mime_type(),
                    "recording stopped"
                );
            }
            Err(err) => log_error("RecordingSession.stop", err),
        }

        result
    }

    fn release(
        screen: &MediaStream,
        mic: &MediaStream,
        combined: &MediaStream,
        mixer_context: Option<MixerContext>,
    ) {
        // Stopping an already-stopped track is a no-op, so every stream
        // is stopped without checking.
        screen.stop_all();
        mic.stop_all();
        combined.stop_all();

        if let Some(mut context) = mixer_context {
            context.close();
        }
    }
}
