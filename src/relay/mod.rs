//! Cross-context message relay
//!
//! Bridges the embedded page, the privileged background context and the
//! recording session through one action-keyed handler registry fed by
//! two filtered transports.

mod bridge;
mod messages;
mod relay;

pub use bridge::ExtensionBridge;
pub use messages::{Action, Envelope, MessageSource, WindowMessage, ACTION_PAIRINGS};
pub use relay::{CrossContextRelay, MessageHandler, RelayTransports};
