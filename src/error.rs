use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Authorization failed: {0}")]
    Auth(String),

    #[error("Google Sheets request failed: {0}")]
    Transport(String),

    #[error("Stored document is invalid: {0}")]
    Data(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
