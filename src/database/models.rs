//! Database models
//!
//! Rust structs representing database entities.
//! All models use serde for serialization at the API boundary.

use crate::taxonomy::{TemplateSubtype, TemplateType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A notification template with token placeholders in subject and content
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Template {
    pub id: String,
    pub name: String,
    /// Token string, single line
    pub subject: String,
    /// Token string, multi-line
    pub content: String,
    pub template_type: TemplateType,
    pub subtype: TemplateSubtype,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create template request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTemplateRequest {
    pub name: String,
    pub subject: String,
    pub content: String,
    pub template_type: TemplateType,
    pub subtype: TemplateSubtype,
    #[serde(default)]
    pub is_default: bool,
}

/// Update template request (full record)
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTemplateRequest {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub content: String,
    pub template_type: TemplateType,
    pub subtype: TemplateSubtype,
    pub is_default: bool,
}

/// Contract-lifecycle action recorded in the webhook audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum WebhookAction {
    #[serde(rename = "criacao_contrato")]
    #[sqlx(rename = "criacao_contrato")]
    ContractCreation,
    #[serde(rename = "edicao_contrato")]
    #[sqlx(rename = "edicao_contrato")]
    ContractEdit,
    #[serde(rename = "assinatura_contrato")]
    #[sqlx(rename = "assinatura_contrato")]
    ContractSignature,
}

impl WebhookAction {
    pub fn as_str(self) -> &'static str {
        match self {
            WebhookAction::ContractCreation => "criacao_contrato",
            WebhookAction::ContractEdit => "edicao_contrato",
            WebhookAction::ContractSignature => "assinatura_contrato",
        }
    }
}

/// One appended webhook audit row.
///
/// One row per event with an action column; the rest of the event travels
/// as a single JSON blob in `payload`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WebhookLogRecord {
    pub id: i64,
    pub action: WebhookAction,
    /// JSON-serialized [`WebhookEvent`]
    pub payload: String,
    pub created_at: DateTime<Utc>,
}

/// Payload stored per webhook audit row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    pub contract_id: String,
    pub contract_type: String,
    pub client_name: String,
    pub client_email: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub webhook_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
