// Integration tests for the cross-context relay and the extension
// bridge: transport filtering, handler dispatch, and the full
// request/response pairings against a live recording session.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::{mpsc, Mutex};

use meetcap::capture::{StreamAcquirer, SyntheticBackend, SyntheticConfig};
use meetcap::relay::{
    Action, CrossContextRelay, Envelope, ExtensionBridge, MessageSource, RelayTransports,
    WindowMessage, ACTION_PAIRINGS,
};
use meetcap::session::registry::RecorderRegistry;
use meetcap::session::{RecordingSession, SessionConfig};

struct Harness {
    relay: Arc<CrossContextRelay>,
    web_app_rx: mpsc::UnboundedReceiver<Envelope>,
    background_rx: mpsc::UnboundedReceiver<Envelope>,
    window_tx: mpsc::UnboundedSender<WindowMessage>,
    from_background_tx: mpsc::UnboundedSender<Envelope>,
}

fn harness() -> Harness {
    let (web_app_tx, web_app_rx) = mpsc::unbounded_channel();
    let (background_tx, background_rx) = mpsc::unbounded_channel();
    let (window_tx, from_web_app) = mpsc::unbounded_channel();
    let (from_background_tx, from_background) = mpsc::unbounded_channel();

    let relay = Arc::new(CrossContextRelay::new(web_app_tx, background_tx));
    let _receive_loop = relay.spawn(RelayTransports {
        from_web_app,
        from_background,
    });

    Harness {
        relay,
        web_app_rx,
        background_rx,
        window_tx,
        from_background_tx,
    }
}

fn new_session() -> Arc<Mutex<RecordingSession>> {
    let backend = Arc::new(SyntheticBackend::new(SyntheticConfig {
        frames_per_stream: 5,
        frame_duration_ms: 10,
        ..Default::default()
    }));
    let registry: &'static RecorderRegistry = Box::leak(Box::new(RecorderRegistry::new()));
    let config = SessionConfig {
        timeslice: Duration::from_millis(20),
        ..SessionConfig::default()
    };
    Arc::new(Mutex::new(RecordingSession::with_registry(
        config,
        StreamAcquirer::new(backend),
        registry,
    )))
}

fn web_app_message(action: &str) -> WindowMessage {
    WindowMessage {
        same_window: true,
        payload: json!({ "source": "meetcap-web-app", "action": action }),
    }
}

async fn recv_action(rx: &mut mpsc::UnboundedReceiver<Envelope>) -> Envelope {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for relay message")
        .expect("relay channel closed")
}

async fn assert_silent(rx: &mut mpsc::UnboundedReceiver<Envelope>) {
    let result = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
    assert!(result.is_err(), "unexpected message: {:?}", result);
}

#[tokio::test]
async fn test_initialize_announces_extension() {
    let mut h = harness();
    let bridge = ExtensionBridge::new(Arc::clone(&h.relay), new_session(), None);
    bridge.initialize().await;

    let envelope = recv_action(&mut h.web_app_rx).await;
    assert_eq!(envelope.source, MessageSource::Extension);
    assert_eq!(envelope.action.name(), "extensionInstalled");

    // No recording survived a reinitialization, so no resume notice.
    assert_silent(&mut h.web_app_rx).await;
}

#[tokio::test]
async fn test_start_stop_round_trip_through_relay() {
    let mut h = harness();
    let bridge = ExtensionBridge::new(Arc::clone(&h.relay), new_session(), None);
    bridge.initialize().await;
    assert_eq!(recv_action(&mut h.web_app_rx).await.action.name(), "extensionInstalled");

    h.window_tx.send(web_app_message("startRecording")).unwrap();
    assert_eq!(recv_action(&mut h.web_app_rx).await.action.name(), "recordingStarted");

    h.window_tx.send(web_app_message("getRecordingStatus")).unwrap();
    let envelope = recv_action(&mut h.web_app_rx).await;
    match envelope.action {
        Action::RecordingStatusResponse { success, status } => {
            assert!(success);
            let status = status.unwrap();
            assert!(status.is_recording);
            assert!(status.mixed_audio);
        }
        other => panic!("expected recordingStatusResponse, got {}", other.name()),
    }

    tokio::time::sleep(Duration::from_millis(100)).await;

    h.window_tx.send(web_app_message("stopRecording")).unwrap();
    assert_eq!(recv_action(&mut h.web_app_rx).await.action.name(), "recordingStopped");

    let envelope = recv_action(&mut h.web_app_rx).await;
    match envelope.action {
        Action::RecordingComplete { size, mime_type, .. } => {
            assert!(size > 0);
            assert_eq!(mime_type, "video/webm");
        }
        other => panic!("expected recordingComplete, got {}", other.name()),
    }
}

#[tokio::test]
async fn test_stop_without_recording_reports_error() {
    let mut h = harness();
    let bridge = ExtensionBridge::new(Arc::clone(&h.relay), new_session(), None);
    bridge.initialize().await;
    assert_eq!(recv_action(&mut h.web_app_rx).await.action.name(), "extensionInstalled");

    h.window_tx.send(web_app_message("stopRecording")).unwrap();
    let envelope = recv_action(&mut h.web_app_rx).await;
    match envelope.action {
        Action::RecordingError { code, recoverable, .. } => {
            assert_eq!(code, "NO_ACTIVE_RECORDING");
            assert!(recoverable);
        }
        other => panic!("expected recordingError, got {}", other.name()),
    }
}

#[tokio::test]
async fn test_data_requests_are_forwarded_both_ways() {
    let mut h = harness();
    let bridge = ExtensionBridge::new(Arc::clone(&h.relay), new_session(), None);
    bridge.initialize().await;
    assert_eq!(recv_action(&mut h.web_app_rx).await.action.name(), "extensionInstalled");

    // Web app asks for data; the request goes to the background context.
    h.window_tx.send(web_app_message("getRecordingData")).unwrap();
    let forwarded = recv_action(&mut h.background_rx).await;
    assert_eq!(forwarded.action.name(), "getRecordingData");
    assert_eq!(forwarded.source, MessageSource::Extension);

    // The background answers under the paired action name; the reply is
    // forwarded to the web app.
    h.from_background_tx
        .send(Envelope {
            source: MessageSource::Extension,
            action: Action::RecordingDataResponse {
                success: true,
                size: Some(4096),
                mime_type: Some("video/webm".to_string()),
                error: None,
            },
        })
        .unwrap();

    let envelope = recv_action(&mut h.web_app_rx).await;
    match envelope.action {
        Action::RecordingDataResponse { success, size, .. } => {
            assert!(success);
            assert_eq!(size, Some(4096));
        }
        other => panic!("expected recordingDataResponse, got {}", other.name()),
    }
}

#[tokio::test]
async fn test_messages_from_other_windows_are_dropped() {
    let mut h = harness();
    let bridge = ExtensionBridge::new(Arc::clone(&h.relay), new_session(), None);
    bridge.initialize().await;
    assert_eq!(recv_action(&mut h.web_app_rx).await.action.name(), "extensionInstalled");

    h.window_tx
        .send(WindowMessage {
            same_window: false,
            payload: json!({ "source": "meetcap-web-app", "action": "startRecording" }),
        })
        .unwrap();

    assert_silent(&mut h.web_app_rx).await;
}

#[tokio::test]
async fn test_messages_with_foreign_source_are_dropped() {
    let mut h = harness();
    let bridge = ExtensionBridge::new(Arc::clone(&h.relay), new_session(), None);
    bridge.initialize().await;
    assert_eq!(recv_action(&mut h.web_app_rx).await.action.name(), "extensionInstalled");

    // A window message claiming to come from the extension itself is
    // not a web app request.
    h.window_tx
        .send(WindowMessage {
            same_window: true,
            payload: json!({ "source": "meetcap-extension", "action": "startRecording" }),
        })
        .unwrap();

    assert_silent(&mut h.web_app_rx).await;
}

#[tokio::test]
async fn test_unknown_actions_are_dropped_not_errors() {
    let mut h = harness();
    let bridge = ExtensionBridge::new(Arc::clone(&h.relay), new_session(), None);
    bridge.initialize().await;
    assert_eq!(recv_action(&mut h.web_app_rx).await.action.name(), "extensionInstalled");

    h.window_tx
        .send(WindowMessage {
            same_window: true,
            payload: json!({ "source": "meetcap-web-app", "action": "selfDestruct" }),
        })
        .unwrap();

    assert_silent(&mut h.web_app_rx).await;

    // The relay keeps working after the bad message.
    h.window_tx.send(web_app_message("testConnection")).unwrap();
    assert_eq!(recv_action(&mut h.web_app_rx).await.action.name(), "extensionInstalled");
}

#[tokio::test]
async fn test_handler_registration_is_last_wins() {
    let h = harness();

    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&first);
    h.relay.register_handler("testConnection", move |_| {
        let counter = Arc::clone(&counter);
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    });

    let counter = Arc::clone(&second);
    h.relay.register_handler("testConnection", move |_| {
        let counter = Arc::clone(&counter);
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    });

    h.relay
        .dispatch(Envelope {
            source: MessageSource::WebApp,
            action: Action::TestConnection,
        })
        .await;

    assert_eq!(first.load(Ordering::SeqCst), 0);
    assert_eq!(second.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_every_paired_request_gets_its_response() {
    let mut h = harness();
    let bridge = ExtensionBridge::new(Arc::clone(&h.relay), new_session(), None);
    bridge.initialize().await;
    assert_eq!(recv_action(&mut h.web_app_rx).await.action.name(), "extensionInstalled");

    for (request, response) in ACTION_PAIRINGS {
        h.window_tx.send(web_app_message(request)).unwrap();

        // Data requests detour through the background context; echo them
        // back the way the real background script would.
        if *request == "getRecordingData" {
            assert_eq!(recv_action(&mut h.background_rx).await.action.name(), *request);
            h.from_background_tx
                .send(Envelope {
                    source: MessageSource::Extension,
                    action: Action::RecordingDataResponse {
                        success: true,
                        size: None,
                        mime_type: None,
                        error: None,
                    },
                })
                .unwrap();
        } else if *request == "clearRecordingData" {
            assert_eq!(recv_action(&mut h.background_rx).await.action.name(), *request);
            h.from_background_tx
                .send(Envelope {
                    source: MessageSource::Extension,
                    action: Action::ClearRecordingDataResponse { success: true },
                })
                .unwrap();
        }

        let mut envelope = recv_action(&mut h.web_app_rx).await;
        // stopRecording arrives here with nothing running (the start
        // pairing already drained its recording), so the reply is the
        // error form.
        if *request == "stopRecording" {
            assert_eq!(envelope.action.name(), "recordingError");
            continue;
        }
        if *request == "startRecording" {
            assert_eq!(envelope.action.name(), *response);
            // Drain the stop we owe the session before the next pairing.
            h.window_tx.send(web_app_message("stopRecording")).unwrap();
            envelope = recv_action(&mut h.web_app_rx).await;
            assert_eq!(envelope.action.name(), "recordingStopped");
            let complete = recv_action(&mut h.web_app_rx).await;
            assert_eq!(complete.action.name(), "recordingComplete");
            continue;
        }
        assert_eq!(envelope.action.name(), *response);
    }
}
