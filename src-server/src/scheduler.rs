//! Background scheduler for the periodic NAV refresh.
//!
//! Fires on the configured cron expression in the configured timezone and
//! hands the run to the refresh engine. The engine's sentinel keeps a
//! scheduled run from overlapping a manual one.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use chrono_tz::Tz;
use cron::Schedule;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::main_lib::AppState;

pub fn start_nav_refresh_scheduler(
    state: Arc<AppState>,
    schedule: Schedule,
    timezone: Tz,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("NAV refresh scheduler started (timezone {})", timezone);

        loop {
            let Some(next) = schedule.upcoming(timezone).next() else {
                warn!("Cron schedule yields no future runs; scheduler exiting");
                break;
            };
            let now = Utc::now().with_timezone(&timezone);
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            debug!("Next scheduled NAV refresh at {}", next);

            tokio::select! {
                _ = sleep(wait) => {
                    match state.refresh_engine.run(&shutdown).await {
                        Ok(summary) => info!(
                            "Scheduled NAV refresh: {}/{} schemes updated, {} failures, {} ms",
                            summary.successes.len(),
                            summary.total,
                            summary.failures.len(),
                            summary.duration_ms
                        ),
                        Err(err) => warn!("Scheduled NAV refresh skipped: {}", err),
                    }
                }
                _ = shutdown.cancelled() => {
                    info!("NAV refresh scheduler stopping");
                    break;
                }
            }
        }
    })
}
