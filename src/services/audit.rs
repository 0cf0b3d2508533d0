//! Webhook audit service
//!
//! Append-only record of contract-lifecycle webhook deliveries. Each row
//! carries exactly one action and the full event as a JSON blob; rows are
//! never updated. Write failures surface as `AppError::AuditLog` so
//! callers can tell "sent but not logged" apart from "not sent".

use crate::config::{DEFAULT_WEBHOOK_LOG_LIMIT, MAX_WEBHOOK_LOG_LIMIT};
use crate::database::{Repository, WebhookAction, WebhookEvent, WebhookLogRecord};
use crate::error::{AppError, Result};

/// Service for the webhook audit log
#[derive(Clone)]
pub struct WebhookAuditService {
    repo: Repository,
}

impl WebhookAuditService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Append one audit row for a contract-lifecycle webhook delivery
    pub async fn log_webhook(
        &self,
        action: WebhookAction,
        event: &WebhookEvent,
    ) -> Result<WebhookLogRecord> {
        let payload = serde_json::to_string(event)
            .map_err(|e| AppError::AuditLog(format!("Failed to serialize event: {}", e)))?;

        tracing::info!(
            "Logging webhook {} for contract {}",
            action.as_str(),
            event.contract_id
        );

        self.repo
            .insert_webhook_log(action, &payload)
            .await
            .map_err(|e| AppError::AuditLog(format!("Failed to append audit row: {}", e)))
    }

    /// All audit rows, newest first, optionally filtered by action
    pub async fn get_webhook_logs(
        &self,
        action: Option<WebhookAction>,
    ) -> Result<Vec<WebhookLogRecord>> {
        self.repo.list_webhook_logs(action).await
    }

    /// Most recent audit rows. `limit` defaults to
    /// [`DEFAULT_WEBHOOK_LOG_LIMIT`] and is capped at
    /// [`MAX_WEBHOOK_LOG_LIMIT`].
    pub async fn get_recent_webhook_logs(
        &self,
        limit: Option<i64>,
    ) -> Result<Vec<WebhookLogRecord>> {
        let limit = limit
            .unwrap_or(DEFAULT_WEBHOOK_LOG_LIMIT)
            .clamp(1, MAX_WEBHOOK_LOG_LIMIT);

        self.repo.recent_webhook_logs(limit).await
    }
}
