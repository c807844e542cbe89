use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use fundfolio_core::schemes::Scheme;

use crate::error::ApiResult;
use crate::main_lib::AppState;
use crate::response::{ok, ApiResponse};

#[derive(Deserialize)]
struct SearchQuery {
    q: String,
}

async fn get_scheme(
    State(state): State<Arc<AppState>>,
    Path(scheme_code): Path<i32>,
) -> ApiResult<Json<ApiResponse<Scheme>>> {
    let scheme = state.scheme_service.get_scheme(scheme_code)?;
    Ok(ok(scheme))
}

async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Scheme>>>> {
    let schemes = state.scheme_service.search_schemes(&query.q)?;
    Ok(ok(schemes))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/schemes/search", get(search))
        .route("/schemes/:scheme_code", get(get_scheme))
}
