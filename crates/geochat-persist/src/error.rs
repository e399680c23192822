use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Invalid persistence configuration: {0}")]
    Config(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupted checkpoint {id}: {reason}")]
    Corrupted { id: String, reason: String },
}

pub type Result<T> = std::result::Result<T, PersistError>;
