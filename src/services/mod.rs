//! Services module
//!
//! Business logic services that coordinate between callers, repository,
//! cache and delivery sink.

pub mod audit;
pub mod dispatcher;
pub mod sweeper;
pub mod templates;

pub use audit::WebhookAuditService;
pub use dispatcher::NotificationDispatcher;
pub use sweeper::DedupSweeper;
pub use templates::TemplatesService;
