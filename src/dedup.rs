//! Notification deduplication cache
//!
//! In-memory, time-windowed idempotency guard. A fingerprint identifies
//! "the same notification event" across retries; once a send succeeds,
//! identical events are suppressed for [`config::DEDUP_WINDOW_MS`].
//!
//! The cache is process-local and deliberately non-durable: a restart
//! forgets everything. Construct one instance at startup and share it by
//! `Arc`; tests build their own instances.
//!
//! Known race: `check` and `record_sent` are separate operations, not an
//! atomic test-and-set. Two identical events racing the check in parallel
//! can both see "not duplicate". Dispatches run sequentially per request
//! handler in this system, so the window for that race is accepted rather
//! than closed.

use crate::config::DEDUP_WINDOW_MS;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// Result of a duplicate check
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct DedupCheck {
    pub is_duplicate: bool,
    /// Milliseconds since the fingerprint was last recorded; 0 when the
    /// fingerprint has never been seen.
    pub elapsed_ms: i64,
}

/// Time-windowed cache of successfully dispatched notification fingerprints
#[derive(Debug, Default)]
pub struct DedupCache {
    entries: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl DedupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic composite key for one notification event.
    ///
    /// Template and amount are deliberately excluded: two events aimed at
    /// the same recipient, due date, installment and reminder offset are
    /// the same notification attempt.
    pub fn fingerprint(
        recipient: &str,
        due_date: NaiveDate,
        installment_index: u32,
        days_until_due: i64,
    ) -> String {
        format!(
            "{}|{}|{}|{}",
            recipient.trim().to_ascii_lowercase(),
            due_date,
            installment_index,
            days_until_due
        )
    }

    /// Read-only duplicate check against the current clock.
    ///
    /// Never mutates the cache: recording happens only after a successful
    /// send, so a failed send does not block its own retry.
    pub fn check(&self, fingerprint: &str) -> DedupCheck {
        self.check_at(fingerprint, Utc::now())
    }

    pub fn check_at(&self, fingerprint: &str, now: DateTime<Utc>) -> DedupCheck {
        let entries = self.lock();
        match entries.get(fingerprint) {
            Some(sent_at) => {
                let elapsed_ms = (now - *sent_at).num_milliseconds();
                DedupCheck {
                    is_duplicate: elapsed_ms < DEDUP_WINDOW_MS,
                    elapsed_ms,
                }
            }
            None => DedupCheck {
                is_duplicate: false,
                elapsed_ms: 0,
            },
        }
    }

    /// Record a successful dispatch for this fingerprint
    pub fn record_sent(&self, fingerprint: &str) {
        self.record_sent_at(fingerprint, Utc::now());
    }

    pub fn record_sent_at(&self, fingerprint: &str, now: DateTime<Utc>) {
        let mut entries = self.lock();
        entries.insert(fingerprint.to_string(), now);
        tracing::debug!("Recorded sent notification: {}", fingerprint);
    }

    /// Purge entries older than the window; returns how many were removed.
    ///
    /// Best-effort memory bound only. Correctness does not depend on the
    /// sweep because `check` already compares ages.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }

    pub fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, sent_at| (now - *sent_at).num_milliseconds() < DEDUP_WINDOW_MS);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        // A poisoned lock only means a panic elsewhere; the map itself is
        // still usable.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_fingerprint() -> String {
        DedupCache::fingerprint(
            "a@x.com",
            NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
            1,
            5,
        )
    }

    #[test]
    fn test_fingerprint_is_deterministic_and_case_folded() {
        let due = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let a = DedupCache::fingerprint("A@X.com", due, 1, 5);
        let b = DedupCache::fingerprint("a@x.com ", due, 1, 5);
        assert_eq!(a, b);
        assert_eq!(a, "a@x.com|2024-05-10|1|5");
    }

    #[test]
    fn test_recorded_fingerprint_is_duplicate_within_window() {
        let cache = DedupCache::new();
        let fp = sample_fingerprint();

        cache.record_sent(&fp);
        let check = cache.check(&fp);

        assert!(check.is_duplicate);
        assert!(check.elapsed_ms < DEDUP_WINDOW_MS);
    }

    #[test]
    fn test_entry_expires_after_window() {
        let cache = DedupCache::new();
        let fp = sample_fingerprint();
        let sent_at = Utc::now();

        cache.record_sent_at(&fp, sent_at);

        let later = sent_at + Duration::milliseconds(DEDUP_WINDOW_MS + 1);
        let check = cache.check_at(&fp, later);

        assert!(!check.is_duplicate);
        assert!(check.elapsed_ms > DEDUP_WINDOW_MS);
    }

    #[test]
    fn test_check_never_mutates() {
        let cache = DedupCache::new();
        let fp = sample_fingerprint();

        for _ in 0..100 {
            assert!(!cache.check(&fp).is_duplicate);
        }
        assert!(cache.is_empty());
    }

    #[test]
    fn test_unseen_fingerprint_not_duplicate() {
        let cache = DedupCache::new();
        let check = cache.check("nobody|2024-01-01|1|0");
        assert!(!check.is_duplicate);
        assert_eq!(check.elapsed_ms, 0);
    }

    #[test]
    fn test_sweep_removes_only_stale_entries() {
        let cache = DedupCache::new();
        let now = Utc::now();

        cache.record_sent_at("fresh", now);
        cache.record_sent_at("stale", now - Duration::milliseconds(DEDUP_WINDOW_MS + 1));

        let removed = cache.sweep_at(now);

        assert_eq!(removed, 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.check_at("fresh", now).is_duplicate);
    }
}
