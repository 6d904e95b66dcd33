//! AWX client error types

use invsync_directory::DirectoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AwxError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AWX API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AwxError>;

impl From<AwxError> for DirectoryError {
    fn from(err: AwxError) -> Self {
        match err {
            AwxError::Http(e) if e.is_decode() => DirectoryError::Decode(e.to_string()),
            AwxError::Http(e) => DirectoryError::Transport(e.to_string()),
            AwxError::Api { status, message } => DirectoryError::Api { status, message },
            AwxError::Decode(msg) => DirectoryError::Decode(msg),
            AwxError::InvalidConfig(msg) => DirectoryError::InvalidConfig(msg),
            AwxError::Cancelled => DirectoryError::Cancelled,
            AwxError::Json(e) => DirectoryError::Json(e),
        }
    }
}
