//! Application configuration constants
//!
//! Central location for all configuration constants, resource limits,
//! and validation boundaries used throughout the notification core.

// ===== Duplicate Suppression =====

/// How long a successfully sent notification suppresses an identical
/// retrigger, in milliseconds (1 hour).
pub const DEDUP_WINDOW_MS: i64 = 3_600_000;

/// Cron expression for the hourly dedup cache sweep.
/// Second-resolution format used by tokio-cron-scheduler.
pub const DEDUP_SWEEP_CRON: &str = "0 0 * * * *";

// ===== Webhook Audit Log Limits =====

/// Default page size when reading recent webhook log entries
pub const DEFAULT_WEBHOOK_LOG_LIMIT: i64 = 50;

/// Hard cap on the recent-log page size.
/// Prevents an oversized limit from pulling the whole table.
pub const MAX_WEBHOOK_LOG_LIMIT: i64 = 200;

// ===== Email Delivery Defaults =====

/// Sender used when no explicit from address is configured
pub const DEFAULT_EMAIL_FROM: &str = "Financeiro <no-reply@localhost>";

/// Email provider send endpoint used when none is configured
pub const DEFAULT_EMAIL_ENDPOINT: &str = "https://api.resend.com/emails";
