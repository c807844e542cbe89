use thiserror::Error;

use crate::errors::DatabaseError;

pub type Result<T> = std::result::Result<T, SchemeError>;

#[derive(Error, Debug)]
pub enum SchemeError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Database error: {0}")]
    DatabaseConnection(#[from] DatabaseError),

    #[error("Scheme {0} not found in catalog")]
    NotFound(i32),

    #[error("Invalid scheme code: {0}")]
    InvalidSchemeCode(i32),
}
