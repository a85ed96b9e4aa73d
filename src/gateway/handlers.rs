//! Request handlers. All state lives in the [`SessionManager`]; handlers only
//! validate input and translate results into JSON.

use super::error::ApiError;
use super::phone::{chat_id, normalize_phone};
use crate::session::SessionManager;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub whatsapp_ready: bool,
    pub has_qr: bool,
}

/// Report the session status. Never fails.
pub async fn health_handler(State(session): State<Arc<SessionManager>>) -> Json<HealthResponse> {
    let status = session.status();
    Json(HealthResponse {
        status: "online".to_string(),
        whatsapp_ready: status.ready,
        has_qr: status.has_pairing_code,
    })
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum QrResponse {
    Code { qr: String },
    Authenticated { message: &'static str },
}

/// Hand out the current pairing code so a web page can render it.
pub async fn qr_handler(
    State(session): State<Arc<SessionManager>>,
) -> Result<Json<QrResponse>, ApiError> {
    if let Some(qr) = session.pairing_code() {
        return Ok(Json(QrResponse::Code { qr }));
    }
    if session.is_ready() {
        return Ok(Json(QrResponse::Authenticated {
            message: "Already authenticated",
        }));
    }
    Err(ApiError::NoPairingCode)
}

#[derive(Debug, Default, Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub success: bool,
    pub message: &'static str,
    pub to: String,
}

/// Send a text message to a phone number.
///
/// Checks run in order: required fields (400), readiness (503), registration
/// (404). Only then is the message sent; a failure there is a 500 carrying the
/// client's error text.
pub async fn send_handler(
    State(session): State<Arc<SessionManager>>,
    payload: Result<Json<SendRequest>, JsonRejection>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    let Json(request) = payload?;
    let (phone, message) = match (non_empty(request.phone), non_empty(request.message)) {
        (Some(phone), Some(message)) => (phone, message),
        _ => {
            return Err(ApiError::Validation(
                "Phone and message are required".to_string(),
            ))
        }
    };

    if !session.is_ready() {
        return Err(ApiError::NotReady);
    }

    let to = normalize_phone(&phone);
    let target = chat_id(&to);

    if !session.is_registered(&target).await? {
        return Err(ApiError::NotRegistered);
    }

    match session.send_message(&target, &message).await {
        Ok(sent) => {
            info!(%to, id = sent.id.as_deref().unwrap_or("-"), "message sent");
            Ok(Json(SendMessageResponse {
                success: true,
                message: "Message sent successfully",
                to,
            }))
        }
        Err(e) => {
            error!(%to, error = %e, "error sending message");
            Err(e.into())
        }
    }
}

fn non_empty(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.is_empty())
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: &'static str,
}

/// Unlink the device. The next `initialize` will ask for a new pairing code.
pub async fn logout_handler(
    State(session): State<Arc<SessionManager>>,
) -> Result<Json<LogoutResponse>, ApiError> {
    session.logout().await?;
    Ok(Json(LogoutResponse {
        success: true,
        message: "Logged out successfully",
    }))
}
