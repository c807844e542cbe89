use thiserror::Error;

use crate::errors::DatabaseError;

pub type Result<T> = std::result::Result<T, NavError>;

#[derive(Error, Debug)]
pub enum NavError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Database error: {0}")]
    DatabaseConnection(#[from] DatabaseError),

    #[error("Provider transport error: {0}")]
    Transport(String),

    #[error("Provider request timed out")]
    Timeout,

    #[error("Provider payload parse error: {0}")]
    Parse(String),

    #[error("Provider rate limit exceeded")]
    RateLimited,

    #[error("Scheme {0} not found at provider")]
    NotFound(i32),

    #[error("No NAV available for scheme {0}")]
    Unavailable(i32),

    #[error("A NAV refresh run is already in progress")]
    RefreshInProgress,
}

impl From<reqwest::Error> for NavError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NavError::Timeout
        } else if err.is_decode() {
            NavError::Parse(err.to_string())
        } else {
            NavError::Transport(err.to_string())
        }
    }
}
