use shared::error::ErrorCode;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("query text required")]
    MissingText,
}

/// A prediction call that did not produce a usable result.
#[derive(Debug, Error)]
pub enum RequestFailed {
    #[error("prediction service unreachable: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("prediction service returned {status} ({code:?}): {message}")]
    Status {
        status: u16,
        code: ErrorCode,
        message: String,
    },
    #[error("malformed prediction response: {0}")]
    MalformedBody(String),
    #[error("invalid service url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("request cancelled before completion")]
    Cancelled,
}

/// Cloneable shape of a `RequestFailed`, for events and presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport { timeout: bool },
    Status { status: u16, code: ErrorCode },
    MalformedBody,
    InvalidUrl,
    Cancelled,
}

impl RequestFailed {
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport(err) => FailureKind::Transport {
                timeout: err.is_timeout(),
            },
            Self::Status { status, code, .. } => FailureKind::Status {
                status: *status,
                code: *code,
            },
            Self::MalformedBody(_) => FailureKind::MalformedBody,
            Self::InvalidUrl { .. } => FailureKind::InvalidUrl,
            Self::Cancelled => FailureKind::Cancelled,
        }
    }
}

impl From<reqwest::Error> for RequestFailed {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::MalformedBody(err.to_string())
        } else {
            Self::Transport(err)
        }
    }
}
