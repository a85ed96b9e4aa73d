//! # whatsapp-gateway
//!
//! Small REST gateway in front of a WhatsApp web client.
//!
//! ## Features
//!
//! - Session status and pairing QR over HTTP
//! - Sending text messages to Indonesian phone numbers
//! - Logout / session reset
//! - Terminal QR rendering for the operator
//! - A client for services that call the gateway
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use whatsapp_gateway::{gateway, BridgeClient, BridgeOptions, SessionManager, SessionOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = Arc::new(BridgeClient::new(BridgeOptions::new("whatsapp-bridge")));
//!     let session = SessionManager::new(client, SessionOptions::default()).await;
//!     session.start().await?;
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3001").await?;
//!     gateway::serve(listener, session, async {
//!         tokio::signal::ctrl_c().await.ok();
//!     })
//!     .await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod gateway;
pub mod remote;
pub mod session;
pub mod types;

pub use client::{
    BridgeClient, BridgeOptions, BrowserOptions, FakeClient, MessagingClient, SendResponse,
};
pub use config::Config;
pub use error::{Error, Result};
pub use events::Event;
pub use remote::GatewayClient;
pub use session::{SessionManager, SessionOptions, SessionState, Status};
pub use types::{Jid, MessageId};
