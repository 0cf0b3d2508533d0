//! HTTP delivery sink
//!
//! reqwest-backed implementation of [`DeliverySink`]: JSON POST to the
//! email provider's send endpoint, and GET-or-POST delivery to automation
//! webhooks.

use super::{DeliverySink, EmailMessage};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

/// How the event payload reaches the automation webhook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookMethod {
    /// Payload JSON-encoded into a `data` query parameter
    Get,
    /// Payload as the JSON request body
    Post,
}

/// Production delivery sink over HTTP
pub struct HttpDeliverySink {
    client: reqwest::Client,
    email_endpoint: String,
    email_api_key: String,
    webhook_method: WebhookMethod,
}

#[derive(Deserialize)]
struct SendEmailResponse {
    id: String,
}

impl HttpDeliverySink {
    pub fn new(
        email_endpoint: String,
        email_api_key: String,
        webhook_method: WebhookMethod,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("billmail/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Delivery(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            email_endpoint,
            email_api_key,
            webhook_method,
        })
    }
}

#[async_trait]
impl DeliverySink for HttpDeliverySink {
    async fn send_email(&self, message: &EmailMessage) -> Result<String> {
        tracing::debug!("Sending email to {:?} via provider", message.to);

        let response = self
            .client
            .post(&self.email_endpoint)
            .bearer_auth(&self.email_api_key)
            .json(message)
            .send()
            .await
            .map_err(|e| AppError::Delivery(format!("Email request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Delivery(format!(
                "Email provider returned {}: {}",
                status, body
            )));
        }

        let parsed: SendEmailResponse = response
            .json()
            .await
            .map_err(|e| AppError::Delivery(format!("Bad email provider response: {}", e)))?;

        tracing::info!("Email accepted by provider: {}", parsed.id);
        Ok(parsed.id)
    }

    async fn send_webhook(&self, url: &str, payload: &Value) -> Result<String> {
        tracing::debug!("Delivering webhook to {}", url);

        let request = match self.webhook_method {
            WebhookMethod::Post => self.client.post(url).json(payload),
            WebhookMethod::Get => self
                .client
                .get(url)
                .query(&[("data", payload.to_string())]),
        };

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Delivery(format!("Webhook request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(AppError::Delivery(format!(
                "Webhook returned {}: {}",
                status, body
            )));
        }

        tracing::info!("Webhook delivered: {} ({})", url, status);
        Ok(body)
    }
}
