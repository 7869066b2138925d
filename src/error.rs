// src/error.rs

use thiserror::Error;

/// Fatal problems detected before any row is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing exact column: {column}")]
    MissingTargetColumn { column: String },

    #[error("search API key is missing or empty")]
    MissingCredential,

    #[error("search API rejected the preflight check (status {status})")]
    PreflightRejected { status: u16 },

    #[error("search API unreachable during preflight: {0}")]
    PreflightUnreachable(String),

    #[error("invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },
}

/// Per-query failures. These never abort a run; the controller counts them as misses.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("non-success status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            ProviderError::Status(status.as_u16())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}
