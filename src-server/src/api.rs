use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware,
    routing::get,
    Extension, Router,
};
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

pub mod admin;
pub mod portfolio;
pub mod schemes;
pub mod transactions;

use crate::auth::require_jwt;
use crate::config::Config;
use crate::main_lib::AppState;

pub async fn healthz() -> &'static str {
    "ok"
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_allow.iter().any(|origin| origin == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_allow
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

pub fn app_router(
    state: Arc<AppState>,
    config: &Config,
    shutdown: CancellationToken,
) -> Router {
    let protected = Router::new()
        .merge(portfolio::router())
        .merge(transactions::router())
        .merge(schemes::router())
        .merge(admin::router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_jwt));

    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api", protected)
        .layer(Extension(shutdown))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(cors_layer(config))
        .with_state(state)
}
