//! Lifecycle events emitted by the messaging client.

/// Events delivered to handlers registered with
/// [`MessagingClient::add_event_handler`](crate::client::MessagingClient::add_event_handler).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Pairing requested. `code` is the raw QR payload to scan with the phone's
    /// Linked Devices screen. A fresh code is issued every ~20s until scanned.
    Qr { code: String },

    /// Credentials accepted. The client may still be syncing; sending is only
    /// possible after [`Event::Ready`].
    Authenticated,

    /// Restoring or establishing the session failed.
    AuthFailure { message: String },

    /// Session fully loaded, messages can be sent.
    Ready,

    /// Connection lost or session revoked from the phone.
    Disconnected { reason: String },
}

impl Event {
    /// Short name used in logs and on the bridge wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Qr { .. } => "qr",
            Self::Authenticated => "authenticated",
            Self::AuthFailure { .. } => "auth_failure",
            Self::Ready => "ready",
            Self::Disconnected { .. } => "disconnected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names() {
        assert_eq!(Event::Qr { code: "x".into() }.name(), "qr");
        assert_eq!(Event::Ready.name(), "ready");
        assert_eq!(
            Event::Disconnected {
                reason: "NAVIGATION".into()
            }
            .name(),
            "disconnected"
        );
    }
}
