use thiserror::Error;

use crate::errors::DatabaseError;

pub type Result<T> = std::result::Result<T, TransactionError>;

#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Database error: {0}")]
    DatabaseConnection(#[from] DatabaseError),

    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),
}
