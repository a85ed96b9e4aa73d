//! HTTP error responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Everything a handler can fail with. Each variant maps to one status code.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("WhatsApp client not ready. Please authenticate first.")]
    NotReady,

    #[error("QR not yet generated")]
    NoPairingCode,

    #[error("Phone number not registered on WhatsApp")]
    NotRegistered,

    /// Failure from the messaging client, text passed through.
    #[error("{0}")]
    Collaborator(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotReady | Self::NoPairingCode => StatusCode::SERVICE_UNAVAILABLE,
            Self::NotRegistered => StatusCode::NOT_FOUND,
            Self::Collaborator(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<crate::Error> for ApiError {
    fn from(err: crate::Error) -> Self {
        Self::Collaborator(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self {
            // /qr never had a success flag
            Self::NoPairingCode => json!({ "error": self.to_string() }),
            _ => json!({ "success": false, "error": self.to_string() }),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(
            ApiError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::NotReady.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            ApiError::NoPairingCode.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(ApiError::NotRegistered.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Collaborator("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn collaborator_text_is_verbatim() {
        let err: ApiError = crate::Error::client("Evaluation failed: t").into();
        assert_eq!(err.to_string(), "Evaluation failed: t");
    }
}
