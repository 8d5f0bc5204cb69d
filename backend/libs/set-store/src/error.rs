//! Store error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Invalid score for {key}: {score}")]
    InvalidScore { key: String, score: f64 },
}

pub type StoreResult<T> = Result<T, StoreError>;
