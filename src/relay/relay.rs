use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::messages::{Action, Envelope, MessageSource, WindowMessage};

/// An async message handler registered for one action name.
pub type MessageHandler = Arc<dyn Fn(Envelope) -> BoxFuture<'static, ()> + Send + Sync>;

/// Inbound transports feeding the relay.
///
/// The page channel carries raw window messages (arbitrary JSON plus a
/// same-window flag); the background channel carries already-structured
/// envelopes from the privileged context.
pub struct RelayTransports {
    pub from_web_app: mpsc::UnboundedReceiver<WindowMessage>,
    pub from_background: mpsc::UnboundedReceiver<Envelope>,
}

/// Passes structured messages between the embedded page, the privileged
/// background context and the recording session.
///
/// A publish/subscribe registry maps an action name to exactly one
/// handler; both transports feed the same registry. Sends are write-only
/// and never block on a reply — responses arrive asynchronously under
/// their paired action name.
pub struct CrossContextRelay {
    source: MessageSource,
    handlers: Mutex<HashMap<&'static str, MessageHandler>>,
    to_web_app: mpsc::UnboundedSender<Envelope>,
    to_background: mpsc::UnboundedSender<Envelope>,
}

impl CrossContextRelay {
    pub fn new(
        to_web_app: mpsc::UnboundedSender<Envelope>,
        to_background: mpsc::UnboundedSender<Envelope>,
    ) -> Self {
        Self {
            source: MessageSource::Extension,
            handlers: Mutex::new(HashMap::new()),
            to_web_app,
            to_background,
        }
    }

    /// Register a handler for an action. Last registration wins:
    /// registering again for the same action replaces the prior handler.
    /// That replacement is the defined behavior, relied on by reload
    /// paths that re-register their handlers.
    pub fn register_handler<F>(&self, action: &'static str, handler: F)
    where
        F: Fn(Envelope) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        self.handlers
            .lock()
            .unwrap()
            .insert(action, Arc::new(handler));
    }

    /// Send a message to the web app, tagged with this relay's source.
    pub fn send_to_web_app(&self, action: Action) {
        let envelope = Envelope {
            source: self.source,
            action,
        };
        if self.to_web_app.send(envelope).is_err() {
            warn!("web app transport closed, message dropped");
        }
    }

    /// Send a message to the background context, tagged with this
    /// relay's source.
    pub fn send_to_background(&self, action: Action) {
        let envelope = Envelope {
            source: self.source,
            action,
        };
        if self.to_background.send(envelope).is_err() {
            warn!("background transport closed, message dropped");
        }
    }

    /// Run the receive loop over both transports until they close.
    pub fn spawn(self: &Arc<Self>, mut transports: RelayTransports) -> JoinHandle<()> {
        let relay = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    message = transports.from_web_app.recv() => {
                        match message {
                            Some(message) => relay.handle_window_message(message).await,
                            None => break,
                        }
                    }
                    envelope = transports.from_background.recv() => {
                        match envelope {
                            Some(envelope) => relay.handle_background_message(envelope).await,
                            None => break,
                        }
                    }
                }
            }
            debug!("relay transports closed");
        })
    }

    async fn handle_background_message(&self, envelope: Envelope) {
        // Background messages must carry the extension's own source tag.
        if envelope.source != MessageSource::Extension {
            debug!(source = ?envelope.source, "background message with foreign source, dropping");
            return;
        }
        self.dispatch(envelope).await;
    }

    async fn handle_window_message(&self, message: WindowMessage) {
        if !message.same_window {
            debug!("window message from another window, dropping");
            return;
        }

        let envelope: Envelope = match serde_json::from_value(message.payload) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(%err, "undecodable window message, dropping");
                return;
            }
        };

        if envelope.source != MessageSource::WebApp {
            debug!(source = ?envelope.source, "window message with foreign source, dropping");
            return;
        }

        self.dispatch(envelope).await;
    }

    /// Dispatch to the registered handler. Unrecognized actions are
    /// logged and dropped, never an error.
    pub async fn dispatch(&self, envelope: Envelope) {
        let action = envelope.action.name();
        let handler = self.handlers.lock().unwrap().get(action).cloned();

        match handler {
            Some(handler) => handler(envelope).await,
            None => warn!(action, "unknown message action, dropping"),
        }
    }
}
