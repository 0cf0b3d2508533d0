//! Dedup cache sweeper
//!
//! Background job that purges expired entries from the deduplication
//! cache once per hour. One job only; calling `start` again while the
//! job is scheduled is a no-op, so the timer never doubles.

use crate::config::DEDUP_SWEEP_CRON;
use crate::dedup::DedupCache;
use crate::error::{AppError, Result};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

/// Scheduler service for the hourly dedup sweep
pub struct DedupSweeper {
    scheduler: Arc<RwLock<JobScheduler>>,
    cache: Arc<DedupCache>,
    current_job_id: Arc<RwLock<Option<Uuid>>>,
}

impl DedupSweeper {
    pub async fn new(cache: Arc<DedupCache>) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler: Arc::new(RwLock::new(scheduler)),
            cache,
            current_job_id: Arc::new(RwLock::new(None)),
        })
    }

    /// Schedule the sweep job and start the scheduler
    pub async fn start(&self) -> Result<()> {
        let mut current_job = self.current_job_id.write().await;

        if current_job.is_none() {
            let cache = Arc::clone(&self.cache);

            let job = Job::new_async(DEDUP_SWEEP_CRON, move |_uuid, _l| {
                let cache = Arc::clone(&cache);
                Box::pin(async move {
                    let removed = cache.sweep();
                    if removed > 0 {
                        tracing::info!("Dedup sweep removed {} expired entries", removed);
                    } else {
                        tracing::debug!("Dedup sweep found no expired entries");
                    }
                })
            })
            .map_err(|e| AppError::Scheduler(format!("Failed to create sweep job: {}", e)))?;

            let job_id = job.guid();

            let scheduler = self.scheduler.write().await;
            scheduler
                .add(job)
                .await
                .map_err(|e| AppError::Scheduler(format!("Failed to schedule job: {}", e)))?;

            *current_job = Some(job_id);
        }

        let scheduler = self.scheduler.read().await;
        scheduler
            .start()
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Dedup sweeper started ({})", DEDUP_SWEEP_CRON);
        Ok(())
    }

    /// Shutdown scheduler gracefully
    pub async fn shutdown(&self) -> Result<()> {
        let mut scheduler = self.scheduler.write().await;
        scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Dedup sweeper shutdown");
        Ok(())
    }
}
