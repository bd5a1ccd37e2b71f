//! Error types for pagedash.

pub mod problem;

pub use problem::{extract_error_message, ProblemDetails, DEFAULT_ERROR_MESSAGE};

use thiserror::Error;

/// Primary error type for all pagedash operations.
#[derive(Error, Debug)]
pub enum PagedashError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api {
        status: u16,
        message: String,
        details: Option<ProblemDetails>,
    },

    /// A 401 handed back to the caller (public route, retried request, or no token to refresh).
    #[error("Unauthorized: {message}")]
    Unauthorized {
        message: String,
        details: Option<ProblemDetails>,
    },

    /// The session could not be recovered and has been torn down.
    #[error("Session expired: {0}")]
    SessionExpired(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failure reported by a custom [`Transport`](crate::http::Transport).
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Broad error category, mirroring how the pipeline treats each failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 401 on a normal protected call; recoverable by a refresh.
    TransientAuth,
    /// Refresh rejected or unreachable; the session is gone.
    TerminalAuth,
    /// 4xx other than 401.
    Client,
    /// 5xx.
    Server,
    Network,
    Timeout,
    Configuration,
    Serialization,
    Unknown,
}

impl PagedashError {
    /// Build the error for a non-success HTTP status and its raw body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let details = ProblemDetails::parse(body);
        let message = match details.as_ref() {
            Some(problem) => problem.message().unwrap_or_else(|| body.to_string()),
            None => body.to_string(),
        };
        match status {
            401 => Self::Unauthorized { message, details },
            _ => Self::Api {
                status,
                message,
                details,
            },
        }
    }

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Unauthorized { .. } => Some(401),
            Self::Network(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unauthorized { .. } => ErrorCategory::TransientAuth,
            Self::SessionExpired(_) => ErrorCategory::TerminalAuth,
            Self::Api { status, .. } => match status {
                500..=599 => ErrorCategory::Server,
                400..=499 => ErrorCategory::Client,
                _ => ErrorCategory::Unknown,
            },
            Self::Network(_) | Self::Transport(_) => ErrorCategory::Network,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            _ => ErrorCategory::Unknown,
        }
    }

    /// Whether the caller has to sign in again before retrying.
    pub fn requires_login(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::TransientAuth | ErrorCategory::TerminalAuth
        )
    }

    /// Human-readable message suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api {
                details: Some(problem),
                ..
            }
            | Self::Unauthorized {
                details: Some(problem),
                ..
            } => problem
                .message()
                .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string()),
            Self::Api { status, .. } if *status >= 500 => {
                "Server error. Please try again later.".to_string()
            }
            Self::Api { message, .. } if !message.trim().is_empty() => message.clone(),
            Self::Unauthorized { .. } | Self::SessionExpired(_) => {
                "Your session has expired. Please sign in again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, PagedashError>;
