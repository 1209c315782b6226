use thiserror::Error;

#[derive(Error, Debug)]
pub enum SamarthError {
    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("API error for resource {resource_id}: {message}")]
    Api { resource_id: String, message: String },

    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidConfig { key: String, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, SamarthError>;
