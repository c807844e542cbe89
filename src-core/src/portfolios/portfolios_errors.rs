use rust_decimal::Decimal;
use thiserror::Error;

use crate::errors::DatabaseError;
use crate::nav::NavError;
use crate::transactions::TransactionError;

pub type Result<T> = std::result::Result<T, PortfolioError>;

#[derive(Error, Debug)]
pub enum PortfolioError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Database error: {0}")]
    DatabaseConnection(#[from] DatabaseError),

    #[error("No position held in scheme {0}")]
    NoPosition(i32),

    #[error("Insufficient units: requested {requested}, held {held}")]
    InsufficientUnits { requested: Decimal, held: Decimal },

    #[error("Portfolio for scheme {0} still has transactions")]
    HasTransactions(i32),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("NAV lookup failed: {0}")]
    Nav(#[from] NavError),

    #[error("Transaction log error: {0}")]
    Transaction(#[from] TransactionError),
}
