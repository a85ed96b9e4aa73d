//! Session manager: turns the messaging client's lifecycle events into state
//! the gateway can query.

pub mod display;

use crate::client::{MessagingClient, SendResponse};
use crate::events::Event;
use crate::types::Jid;
use crate::Result;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Readiness and pending pairing code. Written only from event handlers
/// (and by a successful [`SessionManager::logout`]).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub ready: bool,
    pub pairing_code: Option<String>,
}

/// Point-in-time summary of [`SessionState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Status {
    pub ready: bool,
    pub has_pairing_code: bool,
}

impl From<&SessionState> for Status {
    fn from(state: &SessionState) -> Self {
        Self {
            ready: state.ready,
            has_pairing_code: state.pairing_code.is_some(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SessionOptions {
    /// Print pairing codes as a QR in the terminal.
    pub render_qr: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self { render_qr: true }
    }
}

pub struct SessionManager {
    client: Arc<dyn MessagingClient>,
    state: Arc<watch::Sender<SessionState>>,
}

impl SessionManager {
    /// Wrap `client` and subscribe to its events. Does not start the client;
    /// call [`SessionManager::start`] for that.
    pub async fn new(client: Arc<dyn MessagingClient>, options: SessionOptions) -> Arc<Self> {
        let (state, _) = watch::channel(SessionState::default());
        let state = Arc::new(state);

        let writer = Arc::clone(&state);
        client
            .add_event_handler(Box::new(move |evt| {
                if options.render_qr {
                    if let Event::Qr { code } = &evt {
                        display::print_pairing_code(code);
                    }
                }
                apply_event(&writer, evt);
            }))
            .await;

        Arc::new(Self { client, state })
    }

    pub async fn start(&self) -> Result<()> {
        info!("initializing messaging client");
        self.client.initialize().await
    }

    pub fn status(&self) -> Status {
        Status::from(&*self.state.borrow())
    }

    pub fn pairing_code(&self) -> Option<String> {
        self.state.borrow().pairing_code.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.state.borrow().ready
    }

    /// Watch state changes (e.g. to wait for readiness).
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub async fn is_registered(&self, target: &Jid) -> Result<bool> {
        self.client.is_registered_user(target).await
    }

    pub async fn send_message(&self, target: &Jid, text: &str) -> Result<SendResponse> {
        self.client.send_message(target, text).await
    }

    pub async fn logout(&self) -> Result<()> {
        self.client.logout().await?;
        self.state.send_modify(|s| s.ready = false);
        info!("logged out");
        Ok(())
    }

    /// Release the client's resources. Call once, on process exit.
    pub async fn shutdown(&self) -> Result<()> {
        info!("shutting down messaging client");
        self.client.destroy().await
    }
}

fn apply_event(state: &watch::Sender<SessionState>, evt: Event) {
    match evt {
        Event::Qr { code } => {
            info!("pairing code issued, scan it to link this device");
            state.send_modify(|s| {
                s.ready = false;
                s.pairing_code = Some(code);
            });
        }
        Event::Authenticated => info!("client authenticated"),
        Event::Ready => {
            info!("client is ready");
            state.send_modify(|s| {
                s.ready = true;
                s.pairing_code = None;
            });
        }
        Event::AuthFailure { message } => {
            error!(reason = %message, "authentication failed");
            state.send_modify(|s| s.ready = false);
        }
        Event::Disconnected { reason } => {
            warn!(%reason, "client disconnected");
            state.send_modify(|s| s.ready = false);
        }
    }
}
