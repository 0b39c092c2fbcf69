use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration for {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

impl CacheError {
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        CacheError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

pub type CacheResult<T> = Result<T, CacheError>;
