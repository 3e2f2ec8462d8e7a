//! Failure model for exchanges with the commentary backend.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Backend,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Backend => "backend",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    #[error("backend unreachable: {0}")]
    Transport(String),
    #[error(
        "backend error (status {status}): {}",
        .detail.as_deref().unwrap_or("no detail provided")
    )]
    Status { status: u16, detail: Option<String> },
    #[error("malformed backend response: {0}")]
    Malformed(String),
    #[error("invalid backend address: {0}")]
    InvalidUrl(String),
}

impl CollaboratorError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CollaboratorError::Transport(_) => ErrorCategory::Network,
            CollaboratorError::Status { .. }
            | CollaboratorError::Malformed(_)
            | CollaboratorError::InvalidUrl(_) => ErrorCategory::Backend,
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            CollaboratorError::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CollaboratorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            CollaboratorError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            CollaboratorError::Status {
                status: status.as_u16(),
                detail: None,
            }
        } else {
            CollaboratorError::Transport(err.to_string())
        }
    }
}

impl From<url::ParseError> for CollaboratorError {
    fn from(err: url::ParseError) -> Self {
        CollaboratorError::InvalidUrl(err.to_string())
    }
}
