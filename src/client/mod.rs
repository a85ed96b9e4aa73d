//! Messaging client abstraction.
//!
//! The gateway never talks to WhatsApp directly. It drives an implementation of
//! [`MessagingClient`], which owns the browser session, authentication data and
//! transport. [`BridgeClient`] is the production adapter; [`FakeClient`] is an
//! in-process stand-in that can emit synthetic lifecycle events.

mod bridge;
mod fake;
mod send;

pub use bridge::{BridgeClient, BridgeOptions, BrowserOptions};
pub use fake::{Call, FakeClient};
pub use send::SendResponse;

use crate::events::Event;
use crate::types::Jid;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Event callback. Handlers run on whichever task delivers the event.
pub type EventHandler = Box<dyn Fn(Event) + Send + Sync>;

/// Operations the gateway needs from the messaging client.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Add an event handler (called for every lifecycle event).
    async fn add_event_handler(&self, handler: EventHandler);

    /// Start the client. Pairing and readiness are reported through events,
    /// not through the return value.
    async fn initialize(&self) -> crate::Result<()>;

    /// Whether `id` is an account on the messaging network.
    async fn is_registered_user(&self, id: &Jid) -> crate::Result<bool>;

    /// Send a text message.
    async fn send_message(&self, to: &Jid, body: &str) -> crate::Result<SendResponse>;

    /// Unlink this device and drop the stored session.
    async fn logout(&self) -> crate::Result<()>;

    /// Release the client's resources (browser, child process).
    async fn destroy(&self) -> crate::Result<()>;
}

/// Shared list of registered event handlers.
#[derive(Clone, Default)]
pub struct EventHandlers {
    handlers: Arc<RwLock<Vec<EventHandler>>>,
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, handler: EventHandler) {
        self.handlers.write().await.push(handler);
    }

    pub async fn dispatch(&self, evt: Event) {
        tracing::debug!(event = evt.name(), "dispatching event");
        let handlers = self.handlers.read().await;
        for f in handlers.iter() {
            f(evt.clone());
        }
    }

    pub async fn len(&self) -> usize {
        self.handlers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
