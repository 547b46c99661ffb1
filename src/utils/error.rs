use thiserror::Error;

#[derive(Error, Debug)]
pub enum UnifyError {
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    #[error("SQL Server error: {0}")]
    SqlServerError(#[from] tiberius::error::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("MongoDB error: {0}")]
    MongoError(#[from] mongodb::error::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Missing configuration: {field} is not set")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{store} responded with status {status}: {message}")]
    StoreError {
        store: String,
        status: u16,
        message: String,
    },

    #[error("Request signing failed: {message}")]
    SigningError { message: String },
}

pub type Result<T> = std::result::Result<T, UnifyError>;
