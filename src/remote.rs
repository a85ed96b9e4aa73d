//! Client for a running gateway, for services that send notifications through it.

use crate::gateway::HealthResponse;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_URL: &str = "http://localhost:3001";

const STATUS_TIMEOUT: Duration = Duration::from_secs(2);
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of a send through the gateway. Mirrors the `/send` response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOutcome {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SendOutcome {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

#[derive(Clone)]
pub struct GatewayClient {
    http: Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Gateway status, or an offline status when it cannot be reached.
    pub async fn status(&self) -> HealthResponse {
        match self.fetch_status().await {
            Ok(status) => status,
            Err(e) => {
                debug!("WhatsApp gateway status check failed: {}", e);
                HealthResponse {
                    status: "offline".to_string(),
                    whatsapp_ready: false,
                    has_qr: false,
                }
            }
        }
    }

    async fn fetch_status(&self) -> anyhow::Result<HealthResponse> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .timeout(STATUS_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    pub async fn is_ready(&self) -> bool {
        self.status().await.whatsapp_ready
    }

    /// Send `message` to `phone`. Never fails; errors end up in
    /// [`SendOutcome::error`].
    pub async fn send_message(&self, phone: &str, message: &str) -> SendOutcome {
        let response = self
            .http
            .post(format!("{}/send", self.base_url))
            .json(&json!({ "phone": phone, "message": message }))
            .timeout(SEND_TIMEOUT)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) if e.is_timeout() => return SendOutcome::failure("Request timeout"),
            Err(e) => return SendOutcome::failure(e.to_string()),
        };

        let ok = response.status().is_success();
        match response.json::<SendOutcome>().await {
            Ok(outcome) if ok => outcome,
            Ok(outcome) => SendOutcome::failure(
                outcome
                    .error
                    .unwrap_or_else(|| "Unknown error".to_string()),
            ),
            Err(e) => SendOutcome::failure(e.to_string()),
        }
    }
}
