//! Repository layer for database operations
//!
//! CRUD operations for templates and the append-only webhook audit log.
//! Default-template exclusivity runs inside a transaction: siblings are
//! cleared before the new record is written, so no reader ever sees two
//! defaults for one (type, subtype) pair.

use super::models::*;
use crate::error::{AppError, Result};
use crate::taxonomy::{TemplateSubtype, TemplateType};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new template
    pub async fn create_template(&self, req: CreateTemplateRequest) -> Result<Template> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        if req.is_default {
            sqlx::query(
                r#"
                UPDATE templates SET is_default = 0, updated_at = ?
                WHERE template_type = ? AND subtype = ? AND is_default = 1
                "#,
            )
            .bind(now)
            .bind(req.template_type)
            .bind(req.subtype)
            .execute(&mut *tx)
            .await?;
        }

        let template = sqlx::query_as::<_, Template>(
            r#"
            INSERT INTO templates
                (id, name, subject, content, template_type, subtype, is_default, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&req.name)
        .bind(&req.subject)
        .bind(&req.content)
        .bind(req.template_type)
        .bind(req.subtype)
        .bind(req.is_default)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!("Created template: {}", id);
        Ok(template)
    }

    /// Get a template by ID
    pub async fn get_template(&self, id: &str) -> Result<Template> {
        let template = sqlx::query_as::<_, Template>("SELECT * FROM templates WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::TemplateNotFound(id.to_string()))?;

        Ok(template)
    }

    /// List all templates
    pub async fn list_templates(&self) -> Result<Vec<Template>> {
        let templates =
            sqlx::query_as::<_, Template>("SELECT * FROM templates ORDER BY updated_at DESC")
                .fetch_all(&self.pool)
                .await?;

        Ok(templates)
    }

    /// Update a template (full record)
    pub async fn update_template(&self, req: UpdateTemplateRequest) -> Result<Template> {
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        if req.is_default {
            // Clear siblings first so the pair never briefly carries two
            // defaults.
            sqlx::query(
                r#"
                UPDATE templates SET is_default = 0, updated_at = ?
                WHERE template_type = ? AND subtype = ? AND is_default = 1 AND id != ?
                "#,
            )
            .bind(now)
            .bind(req.template_type)
            .bind(req.subtype)
            .bind(&req.id)
            .execute(&mut *tx)
            .await?;
        }

        let template = sqlx::query_as::<_, Template>(
            r#"
            UPDATE templates
            SET name = ?, subject = ?, content = ?, template_type = ?,
                subtype = ?, is_default = ?, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&req.name)
        .bind(&req.subject)
        .bind(&req.content)
        .bind(req.template_type)
        .bind(req.subtype)
        .bind(req.is_default)
        .bind(now)
        .bind(&req.id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::TemplateNotFound(req.id.clone()))?;

        tx.commit().await?;

        tracing::debug!("Updated template: {}", req.id);
        Ok(template)
    }

    /// Delete a template.
    ///
    /// Deleting a default leaves the (type, subtype) pair with no default;
    /// nothing is auto-promoted.
    pub async fn delete_template(&self, id: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM templates WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::TemplateNotFound(id.to_string()));
        }

        tracing::debug!("Deleted template: {}", id);
        Ok(())
    }

    /// Get the default template for a (type, subtype) pair, if one exists
    pub async fn get_default_template(
        &self,
        template_type: TemplateType,
        subtype: TemplateSubtype,
    ) -> Result<Option<Template>> {
        let template = sqlx::query_as::<_, Template>(
            r#"
            SELECT * FROM templates
            WHERE template_type = ? AND subtype = ? AND is_default = 1
            "#,
        )
        .bind(template_type)
        .bind(subtype)
        .fetch_optional(&self.pool)
        .await?;

        Ok(template)
    }

    /// Append one webhook audit row. Rows are never updated in place.
    pub async fn insert_webhook_log(
        &self,
        action: WebhookAction,
        payload: &str,
    ) -> Result<WebhookLogRecord> {
        let now = Utc::now();

        let record = sqlx::query_as::<_, WebhookLogRecord>(
            r#"
            INSERT INTO webhook_logs (action, payload, created_at)
            VALUES (?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(action)
        .bind(payload)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Appended webhook log row: {}", record.id);
        Ok(record)
    }

    /// List webhook log rows, newest first, optionally filtered by action
    pub async fn list_webhook_logs(
        &self,
        action: Option<WebhookAction>,
    ) -> Result<Vec<WebhookLogRecord>> {
        let records = match action {
            Some(action) => {
                sqlx::query_as::<_, WebhookLogRecord>(
                    "SELECT * FROM webhook_logs WHERE action = ? ORDER BY id DESC",
                )
                .bind(action)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, WebhookLogRecord>(
                    "SELECT * FROM webhook_logs ORDER BY id DESC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(records)
    }

    /// Most recent webhook log rows, capped at `limit`
    pub async fn recent_webhook_logs(&self, limit: i64) -> Result<Vec<WebhookLogRecord>> {
        let records = sqlx::query_as::<_, WebhookLogRecord>(
            "SELECT * FROM webhook_logs ORDER BY id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
