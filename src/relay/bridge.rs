use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::delivery::ArtifactConsumer;
use crate::session::RecordingSession;

use super::messages::Action;
use super::relay::CrossContextRelay;

/// Wires the relay's action registry to the recording session: the
/// in-page script of the system.
///
/// On initialization it registers every handler, announces itself to the
/// web app, and reports a recording that survived a reinitialization.
pub struct ExtensionBridge {
    relay: Arc<CrossContextRelay>,
    session: Arc<Mutex<RecordingSession>>,
    consumer: Option<Arc<dyn ArtifactConsumer>>,
}

impl ExtensionBridge {
    pub fn new(
        relay: Arc<CrossContextRelay>,
        session: Arc<Mutex<RecordingSession>>,
        consumer: Option<Arc<dyn ArtifactConsumer>>,
    ) -> Self {
        Self {
            relay,
            session,
            consumer,
        }
    }

    /// Register all message handlers and announce the bridge.
    pub async fn initialize(&self) {
        self.register_handlers();

        // Tell the web app the extension side is present.
        self.relay.send_to_web_app(Action::ExtensionInstalled {
            timestamp: Utc::now().timestamp_millis(),
        });

        // A registry entry left by a previous script instance means a
        // recording is still running in this context.
        let resumed = self.session.lock().await.has_global_recording();
        if resumed {
            info!("found active recording after reinitialization");
            self.relay.send_to_web_app(Action::RecordingResumed {
                timestamp: Utc::now().timestamp_millis(),
            });
        }

        info!("extension bridge initialized");
    }

    fn register_handlers(&self) {
        self.register_start_recording();
        self.register_stop_recording();
        self.register_get_status();
        self.register_background_forwarding();
        self.register_test_connection();
    }

    fn register_start_recording(&self) {
        let relay = Arc::clone(&self.relay);
        let session = Arc::clone(&self.session);

        self.relay.register_handler("startRecording", move |_| {
            let relay = Arc::clone(&relay);
            let session = Arc::clone(&session);
            Box::pin(async move {
                let result = session.lock().await.start().await;
                match result {
                    Ok(()) => relay.send_to_web_app(Action::RecordingStarted {
                        timestamp: Utc::now().timestamp_millis(),
                    }),
                    Err(err) => relay.send_to_web_app(Action::error(err.report())),
                }
            })
        });
    }

    fn register_stop_recording(&self) {
        let relay = Arc::clone(&self.relay);
        let session = Arc::clone(&self.session);
        let consumer = self.consumer.clone();

        self.relay.register_handler("stopRecording", move |_| {
            let relay = Arc::clone(&relay);
            let session = Arc::clone(&session);
            let consumer = consumer.clone();
            Box::pin(async move {
                let result = session.lock().await.stop().await;
                match result {
                    Ok(artifact) => {
                        relay.send_to_web_app(Action::RecordingStopped {
                            timestamp: Utc::now().timestamp_millis(),
                        });
                        relay.send_to_web_app(Action::RecordingComplete {
                            size: artifact.size(),
                            mime_type: artifact.mime_type().to_string(),
                            timestamp: artifact.created_at().timestamp_millis(),
                        });

                        if let Some(consumer) = consumer {
                            if let Err(err) = consumer.consume(&artifact).await {
                                error!(consumer = consumer.name(), %err, "artifact consumer failed");
                            }
                        }
                    }
                    Err(err) => relay.send_to_web_app(Action::error(err.report())),
                }
            })
        });
    }

    fn register_get_status(&self) {
        let relay = Arc::clone(&self.relay);
        let session = Arc::clone(&self.session);

        self.relay.register_handler("getRecordingStatus", move |_| {
            let relay = Arc::clone(&relay);
            let session = Arc::clone(&session);
            Box::pin(async move {
                let status = session.lock().await.status();
                relay.send_to_web_app(Action::RecordingStatusResponse {
                    success: true,
                    status: Some(status),
                });
            })
        });
    }

    /// Data requests go to the background context; its responses come
    /// back through the background transport and are forwarded to the
    /// web app under the paired action name.
    fn register_background_forwarding(&self) {
        let relay = Arc::clone(&self.relay);
        self.relay.register_handler("getRecordingData", move |_| {
            let relay = Arc::clone(&relay);
            Box::pin(async move {
                relay.send_to_background(Action::GetRecordingData);
            })
        });

        let relay = Arc::clone(&self.relay);
        self.relay.register_handler("clearRecordingData", move |_| {
            let relay = Arc::clone(&relay);
            Box::pin(async move {
                relay.send_to_background(Action::ClearRecordingData);
            })
        });

        let relay = Arc::clone(&self.relay);
        self.relay
            .register_handler("recordingDataResponse", move |envelope| {
                let relay = Arc::clone(&relay);
                Box::pin(async move {
                    relay.send_to_web_app(envelope.action);
                })
            });

        let relay = Arc::clone(&self.relay);
        self.relay
            .register_handler("clearRecordingDataResponse", move |envelope| {
                let relay = Arc::clone(&relay);
                Box::pin(async move {
                    relay.send_to_web_app(envelope.action);
                })
            });
    }

    fn register_test_connection(&self) {
        let relay = Arc::clone(&self.relay);
        self.relay.register_handler("testConnection", move |_| {
            let relay = Arc::clone(&relay);
            Box::pin(async move {
                relay.send_to_web_app(Action::ExtensionInstalled {
                    timestamp: Utc::now().timestamp_millis(),
                });
            })
        });
    }
}
