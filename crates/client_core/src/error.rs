use std::time::Duration;

use reqwest::StatusCode;
use shared::error::MISSING_API_KEY_MARKER;
use thiserror::Error;

pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The backend answered with a non-OK status.
    #[error("{message}")]
    Api { status: StatusCode, message: String },
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("request cancelled")]
    Cancelled,
    #[error("invalid response from server: {0}")]
    Decode(String),
    #[error("invalid server url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ClientError {
    pub fn api(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn is_missing_api_key(&self) -> bool {
        matches!(
            self,
            ClientError::Api { status, message }
                if *status == StatusCode::BAD_REQUEST && message.starts_with(MISSING_API_KEY_MARKER)
        )
    }

    /// Failures where no usable answer reached us at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_) | ClientError::Timeout(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Cancelled)
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(err) => err.status(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_requires_bad_request_status() {
        let missing = ClientError::api(StatusCode::BAD_REQUEST, "Missing OpenAI API key.");
        assert!(missing.is_missing_api_key());

        let wrong_status = ClientError::api(StatusCode::UNAUTHORIZED, "Missing OpenAI API key.");
        assert!(!wrong_status.is_missing_api_key());

        let other = ClientError::api(StatusCode::BAD_REQUEST, "Missing question");
        assert!(!other.is_missing_api_key());
    }

    #[test]
    fn timeout_counts_as_transport_and_reports_seconds() {
        let err = ClientError::Timeout(Duration::from_secs(30));
        assert!(err.is_transport());
        assert_eq!(err.to_string(), "request timed out after 30s");
        assert!(!ClientError::Cancelled.is_transport());
    }
}
