use chrono::Utc;
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::nav::nav_errors::{NavError, Result};
use crate::nav::nav_model::{RefreshFailure, RefreshSummary};
use crate::nav::nav_traits::{ActiveSchemeSource, NavServiceTrait};

#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Schemes per batch.
    pub batch_size: usize,
    /// In-flight provider calls within a batch.
    pub concurrency: usize,
    /// Pause between request launches.
    pub req_delay: Duration,
    /// Pause between batches.
    pub batch_delay: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        RefreshConfig {
            batch_size: 10,
            concurrency: 10,
            req_delay: Duration::from_millis(300),
            batch_delay: Duration::from_millis(2000),
        }
    }
}

/// Sweeps the active scheme set and refreshes the NAV store in bounded,
/// provider-friendly batches. A single sentinel keeps runs exclusive; one
/// scheme's failure never fails the run.
pub struct NavRefreshEngine {
    nav_service: Arc<dyn NavServiceTrait>,
    scheme_source: Arc<dyn ActiveSchemeSource>,
    config: RefreshConfig,
    running: AtomicBool,
}

struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl NavRefreshEngine {
    pub fn new(
        nav_service: Arc<dyn NavServiceTrait>,
        scheme_source: Arc<dyn ActiveSchemeSource>,
        config: RefreshConfig,
    ) -> Self {
        Self {
            nav_service,
            scheme_source,
            config,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub async fn run(&self, cancel: &CancellationToken) -> Result<RefreshSummary> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(NavError::RefreshInProgress);
        }
        let _guard = RunGuard(&self.running);

        let started_at = Utc::now().naive_utc();
        let clock = Instant::now();

        let codes = self.scheme_source.active_scheme_codes()?;
        info!("NAV refresh sweeping {} active schemes", codes.len());

        let mut successes: Vec<i32> = Vec::new();
        let mut failures: Vec<RefreshFailure> = Vec::new();

        'batches: for (batch_index, batch) in
            codes.chunks(self.config.batch_size.max(1)).enumerate()
        {
            if batch_index > 0 {
                tokio::select! {
                    _ = tokio::time::sleep(self.config.batch_delay) => {}
                    _ = cancel.cancelled() => {
                        info!("NAV refresh cancelled between batches");
                        break 'batches;
                    }
                }
            }

            let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
            let mut handles = Vec::with_capacity(batch.len());

            for (i, &scheme_code) in batch.iter().enumerate() {
                if i > 0 {
                    tokio::select! {
                        _ = tokio::time::sleep(self.config.req_delay) => {}
                        _ = cancel.cancelled() => break,
                    }
                }
                if cancel.is_cancelled() {
                    break;
                }
                let Ok(permit) = semaphore.clone().acquire_owned().await else {
                    break;
                };
                let service = self.nav_service.clone();
                handles.push((
                    scheme_code,
                    tokio::spawn(async move {
                        let _permit = permit;
                        service.fetch_and_store_latest(scheme_code).await
                    }),
                ));
            }

            // The in-flight batch always drains, even after cancellation.
            for (scheme_code, handle) in handles {
                match handle.await {
                    Ok(Ok(_)) => successes.push(scheme_code),
                    Ok(Err(err)) => {
                        warn!("NAV refresh failed for scheme {}: {}", scheme_code, err);
                        failures.push(RefreshFailure {
                            scheme_code,
                            error: err.to_string(),
                        });
                    }
                    Err(err) => {
                        warn!("NAV refresh worker for scheme {} aborted: {}", scheme_code, err);
                        failures.push(RefreshFailure {
                            scheme_code,
                            error: err.to_string(),
                        });
                    }
                }
            }

            if cancel.is_cancelled() {
                break 'batches;
            }
        }

        let summary = RefreshSummary {
            total: codes.len(),
            successes,
            failures,
            duration_ms: clock.elapsed().as_millis() as u64,
            started_at,
        };
        info!(
            "NAV refresh finished: {}/{} schemes updated, {} failures, {} ms",
            summary.successes.len(),
            summary.total,
            summary.failures.len(),
            summary.duration_ms
        );
        Ok(summary)
    }
}
