use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use fundfolio_core::{
    db,
    nav::{MfApiProvider, NavRefreshEngine, NavRepository, NavService, RefreshConfig},
    portfolios::{PortfolioRepository, PortfolioService, PortfolioServiceTrait},
    schemes::{SchemeRepository, SchemeService, SchemeServiceTrait},
    transactions::{TransactionRepository, TransactionRepositoryTrait},
    valuation::{ValuationService, ValuationServiceTrait},
};

use crate::auth::AuthManager;
use crate::config::Config;

pub struct AppState {
    pub portfolio_service: Arc<dyn PortfolioServiceTrait>,
    pub valuation_service: Arc<dyn ValuationServiceTrait>,
    pub transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    pub scheme_service: Arc<dyn SchemeServiceTrait>,
    pub refresh_engine: Arc<NavRefreshEngine>,
    pub auth: Arc<AuthManager>,
}

pub fn init_tracing() {
    let fmt_layer = fmt::layer().json().with_current_span(false);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

pub fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;

    let scheme_repository = Arc::new(SchemeRepository::new(pool.clone()));
    let scheme_service = Arc::new(SchemeService::new(scheme_repository.clone()));

    let provider = Arc::new(MfApiProvider::new(
        &config.provider.base_url,
        config.provider.timeout,
        config.nav.retry_max,
    )?);

    let nav_repository = Arc::new(NavRepository::new(pool.clone()));
    let nav_service = Arc::new(NavService::new(
        nav_repository,
        provider,
        scheme_repository.clone(),
        config.nav.history_cap,
    ));

    let portfolio_repository = Arc::new(PortfolioRepository::new(pool.clone()));
    let transaction_repository = Arc::new(TransactionRepository::new(pool));

    let portfolio_service = Arc::new(PortfolioService::new(
        portfolio_repository.clone(),
        transaction_repository.clone(),
        nav_service.clone(),
    ));

    let valuation_service = Arc::new(ValuationService::new(
        portfolio_service.clone(),
        transaction_repository.clone(),
        nav_service.clone(),
        scheme_service.clone(),
    ));

    let refresh_engine = Arc::new(NavRefreshEngine::new(
        nav_service.clone(),
        portfolio_repository,
        RefreshConfig {
            batch_size: config.nav.batch_size,
            concurrency: config.nav.concurrency,
            req_delay: config.nav.req_delay,
            batch_delay: config.nav.batch_delay,
        },
    ));

    let auth = Arc::new(AuthManager::new(
        config.auth.token_secret.as_bytes(),
        config.auth.token_ttl,
    ));

    Ok(Arc::new(AppState {
        portfolio_service,
        valuation_service,
        transaction_repository,
        scheme_service,
        refresh_engine,
        auth,
    }))
}
