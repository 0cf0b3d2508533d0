//! Notification dispatcher
//!
//! Orchestrates one dispatch: resolve template, render subject and body,
//! check the dedup cache, hand the result to the delivery sink, and for
//! contract-lifecycle events append the outcome to the webhook audit log.
//!
//! Within one dispatch the stages run strictly in order; a failed send is
//! never recorded in the dedup cache, so caller-level retries stay safe.

use crate::database::{WebhookAction, WebhookEvent};
use crate::dedup::DedupCache;
use crate::delivery::{DeliverySink, EmailMessage};
use crate::error::{AppError, Result};
use crate::render;
use crate::services::{TemplatesService, WebhookAuditService};
use crate::taxonomy::{self, TemplateSubtype, TemplateType};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// One notification dispatch request (external entry point)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRequest {
    #[serde(rename = "type")]
    pub template_type: TemplateType,
    pub subtype: TemplateSubtype,
    pub template_id: String,
    pub to: String,
    /// Token name to value mapping for rendering
    pub data: Map<String, Value>,
    pub due_date: NaiveDate,
    pub installment_index: u32,
    pub installment_total: u32,
    pub days_until_due: i64,
}

impl DispatchRequest {
    /// Request validation; runs before any store or network call.
    fn validate(&self) -> Result<()> {
        if self.template_id.trim().is_empty() {
            return Err(AppError::Validation("templateId is required".to_string()));
        }
        if self.to.trim().is_empty() || !self.to.contains('@') {
            return Err(AppError::Validation(format!(
                "Invalid recipient address '{}'",
                self.to
            )));
        }
        if !taxonomy::is_valid_pair(self.template_type, self.subtype) {
            return Err(AppError::Validation(format!(
                "Subtype '{}' is not valid for template type '{}'",
                self.subtype, self.template_type
            )));
        }
        if self.installment_index == 0 || self.installment_index > self.installment_total {
            return Err(AppError::Validation(format!(
                "Installment {}/{} is out of range",
                self.installment_index, self.installment_total
            )));
        }
        Ok(())
    }
}

/// Outcome of a dispatch. Duplicate suppression is a benign outcome, not
/// an error.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Sent { message_id: String },
    AlreadySent { elapsed_ms: i64 },
}

/// A contract-lifecycle event bound for the automation webhook
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractEvent {
    pub action: WebhookAction,
    pub contract_id: String,
    pub contract_type: String,
    pub client_name: String,
    pub client_email: String,
    pub webhook_url: String,
}

/// Orchestrates template resolution, rendering, dedup and delivery
pub struct NotificationDispatcher {
    templates: TemplatesService,
    audit: WebhookAuditService,
    dedup: Arc<DedupCache>,
    sink: Arc<dyn DeliverySink>,
    from_address: String,
}

impl NotificationDispatcher {
    pub fn new(
        templates: TemplatesService,
        audit: WebhookAuditService,
        dedup: Arc<DedupCache>,
        sink: Arc<dyn DeliverySink>,
        from_address: String,
    ) -> Self {
        Self {
            templates,
            audit,
            dedup,
            sink,
            from_address,
        }
    }

    /// Dispatch one templated email notification.
    ///
    /// Interactive test sends use this entry directly; no audit row is
    /// written either way.
    pub async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchOutcome> {
        request.validate()?;

        // Resolving
        let template = self.templates.get_template(&request.template_id).await?;

        // Rendering
        let subject = render::render(&template.subject, &request.data);
        let html = render::render(&template.content, &request.data);

        // DedupCheck
        let fingerprint = DedupCache::fingerprint(
            &request.to,
            request.due_date,
            request.installment_index,
            request.days_until_due,
        );
        let check = self.dedup.check(&fingerprint);
        if check.is_duplicate {
            tracing::info!(
                "Suppressed duplicate notification to {} (sent {} ms ago)",
                request.to,
                check.elapsed_ms
            );
            return Ok(DispatchOutcome::AlreadySent {
                elapsed_ms: check.elapsed_ms,
            });
        }

        // Sending. On failure the fingerprint stays unrecorded so a retry
        // passes the dedup check.
        let message_id = self
            .sink
            .send_email(&EmailMessage {
                from: self.from_address.clone(),
                to: vec![request.to.clone()],
                subject,
                html,
            })
            .await?;

        self.dedup.record_sent(&fingerprint);

        tracing::info!("Notification sent to {}: {}", request.to, message_id);
        Ok(DispatchOutcome::Sent { message_id })
    }

    /// Deliver a contract-lifecycle event to its automation webhook and
    /// append the outcome to the audit log.
    ///
    /// The audit row is written for both outcomes. An audit-write failure
    /// returns `AppError::AuditLog` even when delivery succeeded, so the
    /// caller can distinguish "sent but not logged" from "not sent"; a
    /// delivery failure with a successful log returns `AppError::Delivery`.
    pub async fn notify_contract_event(&self, event: ContractEvent) -> Result<DispatchOutcome> {
        if event.webhook_url.trim().is_empty() {
            return Err(AppError::Validation("webhookUrl is required".to_string()));
        }

        let timestamp = Utc::now();
        let payload = json!({
            "action": event.action,
            "contractId": event.contract_id,
            "contractType": event.contract_type,
            "clientName": event.client_name,
            "clientEmail": event.client_email,
            "timestamp": timestamp,
        });

        let delivery = self.sink.send_webhook(&event.webhook_url, &payload).await;

        let (status, response, error) = match &delivery {
            Ok(body) => ("sent", Some(body.clone()), None),
            Err(e) => ("failed", None, Some(e.to_string())),
        };

        self.audit
            .log_webhook(
                event.action,
                &WebhookEvent {
                    contract_id: event.contract_id.clone(),
                    contract_type: event.contract_type.clone(),
                    client_name: event.client_name.clone(),
                    client_email: event.client_email.clone(),
                    status: status.to_string(),
                    timestamp,
                    webhook_url: event.webhook_url.clone(),
                    response,
                    error,
                },
            )
            .await?;

        let body = delivery?;
        Ok(DispatchOutcome::Sent { message_id: body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{initialize_database, CreateTemplateRequest, Repository};
    use async_trait::async_trait;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// In-memory sink recording every delivery attempt
    #[derive(Default)]
    struct MockSink {
        emails: Mutex<Vec<EmailMessage>>,
        webhooks: Mutex<Vec<(String, Value)>>,
        fail_next: AtomicBool,
    }

    #[async_trait]
    impl DeliverySink for MockSink {
        async fn send_email(&self, message: &EmailMessage) -> Result<String> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(AppError::Delivery("provider timeout".to_string()));
            }
            let mut emails = self.emails.lock().unwrap();
            emails.push(message.clone());
            Ok(format!("msg-{}", emails.len()))
        }

        async fn send_webhook(&self, url: &str, payload: &Value) -> Result<String> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(AppError::Delivery("502 Bad Gateway".to_string()));
            }
            self.webhooks
                .lock()
                .unwrap()
                .push((url.to_string(), payload.clone()));
            Ok("ok".to_string())
        }
    }

    struct Fixture {
        dispatcher: NotificationDispatcher,
        audit: WebhookAuditService,
        sink: Arc<MockSink>,
        template_id: String,
    }

    async fn create_fixture() -> Fixture {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();

        initialize_database(&pool).await.unwrap();

        let repo = Repository::new(pool);
        let templates = TemplatesService::new(repo.clone());
        let audit = WebhookAuditService::new(repo);

        let template = templates
            .create_template(CreateTemplateRequest {
                name: "Cobrança padrão".to_string(),
                subject: "Parcela {numero_parcela}/{total_parcelas}".to_string(),
                content: "Olá {nome_cliente}, vence em {dias} dias.".to_string(),
                template_type: TemplateType::Clients,
                subtype: TemplateSubtype::RecurringCharge,
                is_default: true,
            })
            .await
            .unwrap();

        let sink = Arc::new(MockSink::default());
        let dispatcher = NotificationDispatcher::new(
            templates,
            audit.clone(),
            Arc::new(DedupCache::new()),
            sink.clone(),
            "Financeiro <cobranca@x.com>".to_string(),
        );

        Fixture {
            dispatcher,
            audit,
            sink,
            template_id: template.id,
        }
    }

    fn request(fixture: &Fixture) -> DispatchRequest {
        DispatchRequest {
            template_type: TemplateType::Clients,
            subtype: TemplateSubtype::RecurringCharge,
            template_id: fixture.template_id.clone(),
            to: "a@x.com".to_string(),
            data: [
                ("nome_cliente".to_string(), json!("Ana")),
                ("numero_parcela".to_string(), json!(1)),
                ("total_parcelas".to_string(), json!(3)),
                ("dias".to_string(), json!(5)),
            ]
            .into_iter()
            .collect(),
            due_date: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
            installment_index: 1,
            installment_total: 3,
            days_until_due: 5,
        }
    }

    #[tokio::test]
    async fn test_first_send_succeeds_second_is_suppressed() {
        let fixture = create_fixture().await;

        let first = fixture.dispatcher.dispatch(request(&fixture)).await.unwrap();
        assert!(matches!(first, DispatchOutcome::Sent { .. }));

        let second = fixture.dispatcher.dispatch(request(&fixture)).await.unwrap();
        assert!(matches!(second, DispatchOutcome::AlreadySent { .. }));

        // The sink saw exactly one send.
        let emails = fixture.sink.emails.lock().unwrap();
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].subject, "Parcela 1/3");
        assert_eq!(emails[0].html, "Olá Ana, vence em 5 dias.");
        assert_eq!(emails[0].to, vec!["a@x.com".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_send_not_recorded_so_retry_passes() {
        let fixture = create_fixture().await;

        fixture.sink.fail_next.store(true, Ordering::SeqCst);
        let failed = fixture.dispatcher.dispatch(request(&fixture)).await;
        assert!(matches!(failed, Err(AppError::Delivery(_))));

        // Retry of the identical request must not be suppressed.
        let retried = fixture.dispatcher.dispatch(request(&fixture)).await.unwrap();
        assert!(matches!(retried, DispatchOutcome::Sent { .. }));
    }

    #[tokio::test]
    async fn test_unknown_template_is_terminal_without_side_effects() {
        let fixture = create_fixture().await;

        let mut req = request(&fixture);
        req.template_id = "missing".to_string();

        let result = fixture.dispatcher.dispatch(req).await;
        assert!(matches!(result, Err(AppError::TemplateNotFound(_))));
        assert!(fixture.sink.emails.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_request_rejected_before_any_call() {
        let fixture = create_fixture().await;

        let mut req = request(&fixture);
        req.to = "not-an-address".to_string();

        let result = fixture.dispatcher.dispatch(req).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let mut req = request(&fixture);
        req.subtype = TemplateSubtype::InvoiceRequest;

        let result = fixture.dispatcher.dispatch(req).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(fixture.sink.emails.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_different_fingerprint_not_suppressed() {
        let fixture = create_fixture().await;

        fixture.dispatcher.dispatch(request(&fixture)).await.unwrap();

        // Same recipient and due date, next installment.
        let mut req = request(&fixture);
        req.installment_index = 2;

        let outcome = fixture.dispatcher.dispatch(req).await.unwrap();
        assert!(matches!(outcome, DispatchOutcome::Sent { .. }));
        assert_eq!(fixture.sink.emails.lock().unwrap().len(), 2);
    }

    fn contract_event() -> ContractEvent {
        ContractEvent {
            action: WebhookAction::ContractEdit,
            contract_id: "c-42".to_string(),
            contract_type: "recorrente".to_string(),
            client_name: "Ana Souza".to_string(),
            client_email: "ana@x.com".to_string(),
            webhook_url: "https://hooks.example.com/contracts".to_string(),
        }
    }

    #[tokio::test]
    async fn test_contract_event_delivered_and_audited() {
        let fixture = create_fixture().await;

        fixture
            .dispatcher
            .notify_contract_event(contract_event())
            .await
            .unwrap();

        let webhooks = fixture.sink.webhooks.lock().unwrap();
        assert_eq!(webhooks.len(), 1);
        assert_eq!(webhooks[0].0, "https://hooks.example.com/contracts");
        assert_eq!(webhooks[0].1["contractId"], "c-42");

        drop(webhooks);

        let logs = fixture
            .audit
            .get_webhook_logs(Some(WebhookAction::ContractEdit))
            .await
            .unwrap();
        assert_eq!(logs.len(), 1);

        let event: WebhookEvent = serde_json::from_str(&logs[0].payload).unwrap();
        assert_eq!(event.status, "sent");
        assert!(event.error.is_none());
    }

    #[tokio::test]
    async fn test_failed_contract_delivery_still_audited() {
        let fixture = create_fixture().await;

        fixture.sink.fail_next.store(true, Ordering::SeqCst);
        let result = fixture
            .dispatcher
            .notify_contract_event(contract_event())
            .await;
        assert!(matches!(result, Err(AppError::Delivery(_))));

        let logs = fixture
            .audit
            .get_webhook_logs(Some(WebhookAction::ContractEdit))
            .await
            .unwrap();
        assert_eq!(logs.len(), 1);

        let event: WebhookEvent = serde_json::from_str(&logs[0].payload).unwrap();
        assert_eq!(event.status, "failed");
        assert!(event.error.is_some());
        assert!(event.response.is_none());
    }
}
