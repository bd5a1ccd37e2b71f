use thiserror::Error;

use crate::error::PagedashError;

/// Errors raised by credential storage and account flows.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not logged in")]
    NotLoggedIn,
    #[error("Refresh rejected: {0}")]
    RefreshRejected(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::de::Error> for AuthError {
    fn from(error: toml::de::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::ser::Error> for AuthError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<AuthError> for PagedashError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::RefreshRejected(reason) => PagedashError::SessionExpired(reason),
            AuthError::NotLoggedIn => {
                PagedashError::SessionExpired("no stored credential".to_string())
            }
            other => PagedashError::InvalidState(other.to_string()),
        }
    }
}
