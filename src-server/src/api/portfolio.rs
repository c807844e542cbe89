use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fundfolio_core::portfolios::{BuyOutcome, SellOutcome};
use fundfolio_core::valuation::{HistoryPoint, HistoryRange, PortfolioValuation, PositionValuation};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::main_lib::AppState;
use crate::response::{ok, ApiResponse};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderRequest {
    scheme_code: i32,
    units: Decimal,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RemovedResponse {
    scheme_code: i32,
    removed: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryQuery {
    days: Option<u32>,
    start_date: Option<chrono::NaiveDate>,
    end_date: Option<chrono::NaiveDate>,
}

async fn add(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(order): Json<OrderRequest>,
) -> ApiResult<Json<ApiResponse<BuyOutcome>>> {
    let outcome = state
        .portfolio_service
        .buy(&user.user_id, order.scheme_code, order.units)
        .await?;
    Ok(ok(outcome))
}

async fn sell(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(order): Json<OrderRequest>,
) -> ApiResult<Json<ApiResponse<SellOutcome>>> {
    let outcome = state
        .portfolio_service
        .sell(&user.user_id, order.scheme_code, order.units)
        .await?;
    Ok(ok(outcome))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(scheme_code): Path<i32>,
) -> ApiResult<Json<ApiResponse<RemovedResponse>>> {
    state.portfolio_service.remove(&user.user_id, scheme_code).await?;
    Ok(ok(RemovedResponse {
        scheme_code,
        removed: true,
    }))
}

async fn value(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<PortfolioValuation>>> {
    let valuation = state.valuation_service.portfolio_value(&user.user_id).await?;
    Ok(ok(valuation))
}

async fn list(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<Vec<PositionValuation>>>> {
    let valuation = state.valuation_service.portfolio_value(&user.user_id).await?;
    Ok(ok(valuation.positions))
}

async fn history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<ApiResponse<Vec<HistoryPoint>>>> {
    let range = match (query.start_date, query.end_date) {
        (Some(start), Some(end)) => HistoryRange::Between(start, end),
        (None, None) => HistoryRange::Days(query.days.unwrap_or(0)),
        _ => {
            return Err(ApiError::BadRequest(
                "startDate and endDate must be supplied together".to_string(),
            ))
        }
    };
    let points = state
        .valuation_service
        .portfolio_history(&user.user_id, range)?;
    Ok(ok(points))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/portfolio/add", post(add))
        .route("/portfolio/sell", post(sell))
        .route("/portfolio/remove/:scheme_code", delete(remove))
        .route("/portfolio/value", get(value))
        .route("/portfolio/list", get(list))
        .route("/portfolio/history", get(history))
}
