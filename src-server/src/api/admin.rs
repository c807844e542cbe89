use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Extension, Json, Router};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::main_lib::AppState;
use crate::response::{ok, ApiResponse};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshAccepted {
    run_id: String,
    status: &'static str,
}

/// Kicks off a NAV refresh in the background and answers 202. The engine's
/// own sentinel keeps two runs from overlapping.
async fn run_nav_update(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Extension(shutdown): Extension<CancellationToken>,
) -> ApiResult<(StatusCode, Json<ApiResponse<RefreshAccepted>>)> {
    if !user.is_admin() {
        return Err(ApiError::Forbidden(
            "Admin role required to trigger a NAV refresh".to_string(),
        ));
    }
    if state.refresh_engine.is_running() {
        return Err(ApiError::Conflict(
            "A NAV refresh run is already in progress".to_string(),
        ));
    }

    let run_id = Uuid::new_v4().to_string();
    let engine = state.refresh_engine.clone();
    let log_id = run_id.clone();
    tokio::spawn(async move {
        match engine.run(&shutdown).await {
            Ok(summary) => tracing::info!(
                "Manual NAV refresh {} finished: {}/{} updated, {} failures",
                log_id,
                summary.successes.len(),
                summary.total,
                summary.failures.len()
            ),
            Err(err) => tracing::warn!("Manual NAV refresh {} not run: {}", log_id, err),
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        ok(RefreshAccepted {
            run_id,
            status: "accepted",
        }),
    ))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/admin/cron/run-nav-update", post(run_nav_update))
}
