mod api;
mod auth;
mod config;
mod error;
mod main_lib;
mod response;
mod scheduler;

use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use cron::Schedule;
use tokio_util::sync::CancellationToken;

use api::app_router;
use config::Config;
use main_lib::{build_state, init_tracing, AppState};
use scheduler::start_nav_refresh_scheduler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing();

    let state = build_state(&config)?;

    // `fundfolio-server issue-token <user-id> [role]` mints a bearer token
    // for local use and exits without starting the server.
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("issue-token") {
        let user_id = args.get(2).map(String::as_str).unwrap_or("local-user");
        let role = args.get(3).map(String::as_str).unwrap_or(auth::ROLE_USER);
        println!("{}", state.auth.issue_token(user_id, role)?);
        return Ok(());
    }

    let schedule = Schedule::from_str(&config.cron.schedule)
        .map_err(|e| anyhow::anyhow!("Invalid CRON_SCHEDULE '{}': {}", config.cron.schedule, e))?;
    let timezone: chrono_tz::Tz = config
        .cron
        .timezone
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid CRON_TIMEZONE '{}': {}", config.cron.timezone, e))?;

    let shutdown = CancellationToken::new();
    let scheduler_handle = start_nav_refresh_scheduler(
        state.clone(),
        schedule,
        timezone,
        shutdown.clone(),
    );

    let router = app_router(state.clone(), &config, shutdown.clone());
    tracing::info!("Listening on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    // In-flight work gets a bounded window to drain; past it, exit dirty.
    shutdown.cancel();
    let deadline = config.nav.batch_delay * 2;
    if !drain_refresh(&state, deadline).await {
        tracing::error!(
            "NAV refresh did not stop within {:?} of the shutdown signal",
            deadline
        );
        std::process::exit(1);
    }
    scheduler_handle.abort();
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn drain_refresh(state: &Arc<AppState>, deadline: Duration) -> bool {
    let started = Instant::now();
    while state.refresh_engine.is_running() {
        if started.elapsed() > deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    true
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", err);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => tracing::error!("Failed to install SIGTERM handler: {}", err),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
    shutdown.cancel();
}
