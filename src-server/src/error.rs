use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use fundfolio_core::errors::Error as CoreError;
use fundfolio_core::nav::NavError;
use fundfolio_core::portfolios::PortfolioError;
use fundfolio_core::schemes::SchemeError;
use fundfolio_core::transactions::TransactionError;
use fundfolio_core::valuation::ValuationError;

#[allow(dead_code)]
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("Not Found")]
    NotFound,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Non-2xx responses all share this shape.
#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<String>>,
}

fn nav_status(err: &NavError) -> StatusCode {
    match err {
        NavError::Unavailable(_) => StatusCode::UNPROCESSABLE_ENTITY,
        NavError::NotFound(_) => StatusCode::NOT_FOUND,
        NavError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        NavError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        NavError::Transport(_) | NavError::Parse(_) => StatusCode::BAD_GATEWAY,
        NavError::RefreshInProgress => StatusCode::CONFLICT,
        NavError::Database(_) | NavError::DatabaseConnection(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn portfolio_status(err: &PortfolioError) -> StatusCode {
    match err {
        PortfolioError::NoPosition(_) => StatusCode::NOT_FOUND,
        PortfolioError::InsufficientUnits { .. } | PortfolioError::HasTransactions(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        PortfolioError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        PortfolioError::Nav(nav) => nav_status(nav),
        PortfolioError::Transaction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        PortfolioError::Database(_) | PortfolioError::DatabaseConnection(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn core_status(err: &CoreError) -> StatusCode {
    match err {
        CoreError::Portfolio(e) => portfolio_status(e),
        CoreError::Nav(e) => nav_status(e),
        CoreError::Scheme(SchemeError::NotFound(_)) => StatusCode::NOT_FOUND,
        CoreError::Scheme(SchemeError::InvalidSchemeCode(_)) => StatusCode::BAD_REQUEST,
        CoreError::Scheme(_) => StatusCode::INTERNAL_SERVER_ERROR,
        CoreError::Transaction(TransactionError::InvalidPagination(_)) => StatusCode::BAD_REQUEST,
        CoreError::Transaction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        CoreError::Valuation(ValuationError::InvalidRange(_)) => StatusCode::BAD_REQUEST,
        CoreError::Valuation(ValuationError::Portfolio(e)) => portfolio_status(e),
        CoreError::Valuation(ValuationError::Nav(e)) => nav_status(e),
        CoreError::Valuation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        CoreError::Validation(_) => StatusCode::BAD_REQUEST,
        CoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Core(e) => (core_status(e), e.to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason.clone()),
            ApiError::Unauthorized(reason) => (StatusCode::UNAUTHORIZED, reason.clone()),
            ApiError::Forbidden(reason) => (StatusCode::FORBIDDEN, reason.clone()),
            ApiError::Conflict(reason) => (StatusCode::CONFLICT, reason.clone()),
            ApiError::Internal(reason) => (StatusCode::INTERNAL_SERVER_ERROR, reason.clone()),
            ApiError::Anyhow(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        if status.is_server_error() {
            tracing::error!("Request failed with {}: {}", status, message);
        }

        // Internal detail stays out of 5xx bodies.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            message
        };

        let body = Json(ErrorBody {
            success: false,
            message,
            errors: None,
        });
        (status, body).into_response()
    }
}

impl From<PortfolioError> for ApiError {
    fn from(err: PortfolioError) -> Self {
        ApiError::Core(CoreError::from(err))
    }
}

impl From<NavError> for ApiError {
    fn from(err: NavError) -> Self {
        ApiError::Core(CoreError::from(err))
    }
}

impl From<SchemeError> for ApiError {
    fn from(err: SchemeError) -> Self {
        ApiError::Core(CoreError::from(err))
    }
}

impl From<TransactionError> for ApiError {
    fn from(err: TransactionError) -> Self {
        ApiError::Core(CoreError::from(err))
    }
}

impl From<ValuationError> for ApiError {
    fn from(err: ValuationError) -> Self {
        ApiError::Core(CoreError::from(err))
    }
}
