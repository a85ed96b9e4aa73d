use super::{EventHandler, EventHandlers, MessagingClient, SendResponse};
use crate::error::Error;
use crate::events::Event;
use crate::types::Jid;
use crate::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// A call received by [`FakeClient`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Initialize,
    IsRegisteredUser(Jid),
    SendMessage { to: Jid, body: String },
    Logout,
    Destroy,
}

/// In-memory messaging client (for testing or local runs; never touches the network).
///
/// Lifecycle events are only produced by [`FakeClient::emit`].
#[derive(Default)]
pub struct FakeClient {
    handlers: EventHandlers,
    registered: Mutex<HashSet<Jid>>,
    calls: Mutex<Vec<Call>>,
    lookup_error: Mutex<Option<String>>,
    send_error: Mutex<Option<String>>,
    logout_error: Mutex<Option<String>>,
    next_id: AtomicU64,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `jid` as an account on the network.
    pub fn register(&self, jid: Jid) -> &Self {
        lock(&self.registered).insert(jid);
        self
    }

    /// Make every subsequent `is_registered_user` fail with `message`.
    pub fn fail_lookups(&self, message: impl Into<String>) -> &Self {
        *lock(&self.lookup_error) = Some(message.into());
        self
    }

    /// Make every subsequent `send_message` fail with `message`.
    pub fn fail_sends(&self, message: impl Into<String>) -> &Self {
        *lock(&self.send_error) = Some(message.into());
        self
    }

    /// Make every subsequent `logout` fail with `message`.
    pub fn fail_logout(&self, message: impl Into<String>) -> &Self {
        *lock(&self.logout_error) = Some(message.into());
        self
    }

    /// Deliver `evt` to every registered handler.
    pub async fn emit(&self, evt: Event) {
        self.handlers.dispatch(evt).await;
    }

    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    /// Every `send_message` call, failed ones included.
    pub fn sent(&self) -> Vec<(Jid, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::SendMessage { to, body } => Some((to, body)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        lock(&self.calls).push(call);
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl MessagingClient for FakeClient {
    async fn add_event_handler(&self, handler: EventHandler) {
        self.handlers.add(handler).await;
    }

    async fn initialize(&self) -> Result<()> {
        self.record(Call::Initialize);
        Ok(())
    }

    async fn is_registered_user(&self, id: &Jid) -> Result<bool> {
        self.record(Call::IsRegisteredUser(id.clone()));
        let failure = lock(&self.lookup_error).clone();
        if let Some(message) = failure {
            return Err(Error::client(message));
        }
        Ok(lock(&self.registered).contains(id))
    }

    async fn send_message(&self, to: &Jid, body: &str) -> Result<SendResponse> {
        self.record(Call::SendMessage {
            to: to.clone(),
            body: body.to_string(),
        });
        let failure = lock(&self.send_error).clone();
        if let Some(message) = failure {
            return Err(Error::client(message));
        }
        let seq = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(SendResponse::new(Some(format!("3EB0{:016X}", seq))))
    }

    async fn logout(&self) -> Result<()> {
        self.record(Call::Logout);
        let failure = lock(&self.logout_error).clone();
        if let Some(message) = failure {
            return Err(Error::client(message));
        }
        self.handlers
            .dispatch(Event::Disconnected {
                reason: "LOGOUT".to_string(),
            })
            .await;
        Ok(())
    }

    async fn destroy(&self) -> Result<()> {
        self.record(Call::Destroy);
        Ok(())
    }
}
