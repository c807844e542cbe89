use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;

use fundfolio_core::transactions::{TransactionFilter, TransactionPage, TransactionType};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::main_lib::AppState;
use crate::response::{ok, ApiResponse};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionsQuery {
    scheme_code: Option<i32>,
    page: Option<i64>,
    limit: Option<i64>,
    #[serde(rename = "type")]
    tx_type: Option<String>,
}

async fn list(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<TransactionsQuery>,
) -> ApiResult<Json<ApiResponse<TransactionPage>>> {
    let tx_type = query
        .tx_type
        .as_deref()
        .map(TransactionType::from_str)
        .transpose()
        .map_err(ApiError::BadRequest)?;

    let filter = TransactionFilter {
        scheme_code: query.scheme_code,
        tx_type,
        page: query.page.unwrap_or(1),
        limit: query.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE),
    };

    let page = state.transaction_repository.search(&user.user_id, &filter)?;
    Ok(ok(page))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/transactions", get(list))
}
