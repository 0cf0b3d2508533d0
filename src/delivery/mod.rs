//! Delivery sink boundary
//!
//! External transmission of rendered notifications. The dispatcher only
//! sees this trait; production wires in the reqwest-backed
//! [`HttpDeliverySink`], tests substitute an in-memory mock.

pub mod http;

pub use http::{HttpDeliverySink, WebhookMethod};

use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// A rendered email ready for the provider
#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

/// External transport for emails and webhook calls
#[async_trait]
pub trait DeliverySink: Send + Sync {
    /// Send an email; returns the provider message id on success.
    async fn send_email(&self, message: &EmailMessage) -> Result<String>;

    /// Deliver a JSON event payload to a caller-supplied webhook URL;
    /// returns the response body. A non-2xx response is a failure.
    async fn send_webhook(&self, url: &str, payload: &Value) -> Result<String>;
}
