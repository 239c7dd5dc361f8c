//! Error types for Vitals

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Scoring service error ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Export error: {0}")]
    Export(String),
}

impl Error {
    /// Whether this error came from a remote call (transport, timeout or non-success status)
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Remote { .. })
    }

    /// Human-readable message suitable for a dismissible warning banner
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::Remote { message, .. } => message.clone(),
            Self::Http(e) if e.is_timeout() => "The scoring service did not respond in time".into(),
            Self::Http(_) => "Could not reach the scoring service".into(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
