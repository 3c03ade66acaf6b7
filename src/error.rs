// src/error.rs

//! Unified error handling for the fetcher.

use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for fetcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing failed
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// The format filter is not a valid regular expression
    #[error("Invalid format filter: {0}")]
    Regex(#[from] regex::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Login did not produce a session
    #[error("Login failed: {0}")]
    Session(#[source] Box<AppError>),

    /// Request could not be sent or its body could not be read
    #[error("Request failed during {stage}: {source}")]
    Transport {
        stage: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status
    #[error("Unexpected HTTP status {status} during {stage}")]
    HttpStatus { stage: &'static str, status: u16 },

    /// Download reference could not be resolved for an item
    #[error("Download error for {id}: {message}")]
    Download { id: String, message: String },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Wrap any error raised while logging in.
    pub fn session(source: AppError) -> Self {
        Self::Session(Box::new(source))
    }

    /// Create a transport error for the given request stage.
    pub fn transport(stage: &'static str, source: reqwest::Error) -> Self {
        Self::Transport { stage, source }
    }

    /// Create a status error for the given request stage.
    pub fn status(stage: &'static str, status: StatusCode) -> Self {
        Self::HttpStatus {
            stage,
            status: status.as_u16(),
        }
    }

    /// Create a download error for an item.
    pub fn download(id: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Download {
            id: id.into(),
            message: message.to_string(),
        }
    }

    /// Whether a retry of the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { source, .. } => source.is_connect() || source.is_timeout(),
            Self::HttpStatus { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || *status >= 500
            }
            _ => false,
        }
    }
}
