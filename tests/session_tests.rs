// Integration tests for the recording session lifecycle: the state
// machine, the global-recorder guard, and resource release on both the
// happy path and failed starts.

use std::sync::Arc;
use std::time::Duration;

use meetcap::capture::{StreamAcquirer, SyntheticBackend, SyntheticConfig};
use meetcap::session::registry::RecorderRegistry;
use meetcap::session::{RecordingSession, SessionConfig, SessionState};

fn leaked_registry() -> &'static RecorderRegistry {
    Box::leak(Box::new(RecorderRegistry::new()))
}

fn session_config() -> SessionConfig {
    SessionConfig {
        timeslice: Duration::from_millis(20),
        ..SessionConfig::default()
    }
}

fn build_session(
    config: SyntheticConfig,
    registry: &'static RecorderRegistry,
) -> (RecordingSession, Arc<SyntheticBackend>) {
    let backend = Arc::new(SyntheticBackend::new(config));
    let acquirer = StreamAcquirer::new(backend.clone());
    let session = RecordingSession::with_registry(session_config(), acquirer, registry);
    (session, backend)
}

fn short_synthetic() -> SyntheticConfig {
    SyntheticConfig {
        frames_per_stream: 5,
        frame_duration_ms: 10,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_stop_while_idle_is_an_error() {
    let (mut session, _backend) = build_session(short_synthetic(), leaked_registry());

    let err = session.stop().await.unwrap_err();
    assert_eq!(err.code(), "NO_ACTIVE_RECORDING");
    assert!(err.recoverable());
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test]
async fn test_full_recording_lifecycle() {
    let registry = leaked_registry();
    let (mut session, backend) = build_session(short_synthetic(), registry);

    session.start().await.unwrap();
    assert_eq!(session.state(), SessionState::Active);
    assert!(session.is_recording());
    assert!(registry.has_active());

    let status = session.status();
    assert!(status.is_recording);
    assert_eq!(status.state, "active");
    assert!(status.started_at.is_some());
    assert!(status.mixed_audio);

    tokio::time::sleep(Duration::from_millis(150)).await;

    let artifact = session.stop().await.unwrap();
    assert!(artifact.size() > 0);
    assert_eq!(artifact.mime_type(), "video/webm");

    // Everything released: state, registry, and every acquired track.
    assert_eq!(session.state(), SessionState::Idle);
    assert!(!registry.has_active());
    assert!(backend.opened_tracks().iter().all(|t| t.is_ended()));
}

#[tokio::test]
async fn test_start_while_active_is_skipped_without_side_effects() {
    let (mut session, backend) = build_session(short_synthetic(), leaked_registry());

    session.start().await.unwrap();
    assert_eq!(backend.display_opens(), 1);

    // The duplicate start is reported as success and acquires nothing.
    session.start().await.unwrap();
    assert_eq!(backend.display_opens(), 1);
    assert_eq!(backend.microphone_opens(), 1);
    assert_eq!(session.state(), SessionState::Active);

    session.stop().await.unwrap();
}

#[tokio::test]
async fn test_start_skipped_when_another_recorder_is_registered() {
    let registry = leaked_registry();
    registry.register(uuid::Uuid::new_v4());

    let (mut session, backend) = build_session(short_synthetic(), registry);

    session.start().await.unwrap();
    assert_eq!(session.state(), SessionState::Idle);
    assert!(!session.is_recording());
    assert_eq!(backend.display_opens(), 0);
    assert_eq!(backend.microphone_opens(), 0);
}

#[tokio::test]
async fn test_denied_microphone_releases_screen_capture() {
    let registry = leaked_registry();
    let (mut session, backend) = build_session(
        SyntheticConfig {
            deny_microphone: true,
            ..short_synthetic()
        },
        registry,
    );

    let err = session.start().await.unwrap_err();
    assert_eq!(err.code(), "PERMISSION_DENIED");
    assert!(err.recoverable());

    // The already-acquired screen stream must not leak.
    assert_eq!(backend.display_opens(), 1);
    assert!(backend.opened_tracks().iter().all(|t| t.is_ended()));
    assert_eq!(session.state(), SessionState::Idle);
    assert!(!registry.has_active());
}

#[tokio::test]
async fn test_denied_display_leaves_session_idle() {
    let (mut session, backend) = build_session(
        SyntheticConfig {
            deny_display: true,
            ..short_synthetic()
        },
        leaked_registry(),
    );

    let err = session.start().await.unwrap_err();
    assert_eq!(err.code(), "PERMISSION_DENIED");
    assert_eq!(backend.microphone_opens(), 0);
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test]
async fn test_session_records_again_after_stop() {
    let registry = leaked_registry();
    let (mut session, backend) = build_session(short_synthetic(), registry);

    session.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    session.stop().await.unwrap();

    session.start().await.unwrap();
    assert_eq!(backend.display_opens(), 2);
    tokio::time::sleep(Duration::from_millis(100)).await;

    let artifact = session.stop().await.unwrap();
    assert!(artifact.size() > 0);
    assert!(!registry.has_active());
}

#[tokio::test]
async fn test_mic_only_capture_still_reports_mixed_audio() {
    let (mut session, _backend) = build_session(
        SyntheticConfig {
            display_audio: false,
            ..short_synthetic()
        },
        leaked_registry(),
    );

    session.start().await.unwrap();
    // Mic-only mixing still goes through the graph.
    assert!(session.status().mixed_audio);
    session.stop().await.unwrap();
}
