//! Application state and initialization
//!
//! Constructs the pool, repository, services, delivery sink and dedup
//! cache once at startup; everything else borrows from here.

use crate::config;
use crate::database::{create_pool, Repository};
use crate::dedup::DedupCache;
use crate::delivery::{HttpDeliverySink, WebhookMethod};
use crate::error::Result;
use crate::services::{
    DedupSweeper, NotificationDispatcher, TemplatesService, WebhookAuditService,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Runtime configuration, read from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub email_endpoint: String,
    pub email_api_key: String,
    pub email_from: String,
    pub webhook_method: WebhookMethod,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let database_path = std::env::var("BILLMAIL_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("billmail.sqlite"));

        let webhook_method = match std::env::var("BILLMAIL_WEBHOOK_METHOD").as_deref() {
            Ok("get") | Ok("GET") => WebhookMethod::Get,
            _ => WebhookMethod::Post,
        };

        Self {
            database_path,
            email_endpoint: std::env::var("BILLMAIL_EMAIL_ENDPOINT")
                .unwrap_or_else(|_| config::DEFAULT_EMAIL_ENDPOINT.to_string()),
            email_api_key: std::env::var("BILLMAIL_EMAIL_API_KEY").unwrap_or_default(),
            email_from: std::env::var("BILLMAIL_EMAIL_FROM")
                .unwrap_or_else(|_| config::DEFAULT_EMAIL_FROM.to_string()),
            webhook_method,
        }
    }
}

/// Central application state holding all services
pub struct App {
    pub templates: TemplatesService,
    pub audit: WebhookAuditService,
    pub dispatcher: NotificationDispatcher,
    pub dedup: Arc<DedupCache>,
    pub sweeper: DedupSweeper,
}

impl App {
    /// Application setup - called once on startup
    pub async fn build(config: &AppConfig) -> Result<App> {
        tracing::info!("Initializing application");

        let pool = create_pool(&config.database_path).await?;
        let repo = Repository::new(pool);

        let templates = TemplatesService::new(repo.clone());
        let audit = WebhookAuditService::new(repo);

        let sink = Arc::new(HttpDeliverySink::new(
            config.email_endpoint.clone(),
            config.email_api_key.clone(),
            config.webhook_method,
        )?);

        let dedup = Arc::new(DedupCache::new());
        let sweeper = DedupSweeper::new(Arc::clone(&dedup)).await?;

        let dispatcher = NotificationDispatcher::new(
            templates.clone(),
            audit.clone(),
            Arc::clone(&dedup),
            sink,
            config.email_from.clone(),
        );

        tracing::info!("Application initialized successfully");

        Ok(App {
            templates,
            audit,
            dispatcher,
            dedup,
            sweeper,
        })
    }
}
