use thiserror::Error;

use crate::errors::DatabaseError;
use crate::nav::NavError;
use crate::portfolios::PortfolioError;
use crate::transactions::TransactionError;

pub type Result<T> = std::result::Result<T, ValuationError>;

#[derive(Error, Debug)]
pub enum ValuationError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Database error: {0}")]
    DatabaseConnection(#[from] DatabaseError),

    #[error("Portfolio error: {0}")]
    Portfolio(#[from] PortfolioError),

    #[error("Transaction log error: {0}")]
    Transaction(#[from] TransactionError),

    #[error("NAV error: {0}")]
    Nav(#[from] NavError),

    #[error("Invalid date range: {0}")]
    InvalidRange(String),
}
