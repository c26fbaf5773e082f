use serde::{Deserialize, Serialize};

/// Prefix the backend puts on the 400 it returns when no OpenAI key is
/// available, neither from the request nor from its own environment.
pub const MISSING_API_KEY_MARKER: &str = "Missing OpenAI API key";

/// Error body every endpoint returns on a non-OK status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }

    pub fn is_missing_api_key(&self) -> bool {
        self.error.starts_with(MISSING_API_KEY_MARKER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_missing_key_marker_only_as_prefix() {
        assert!(ErrorBody::new("Missing OpenAI API key. Provide one in the form.").is_missing_api_key());
        assert!(!ErrorBody::new("Upstream said: Missing OpenAI API key").is_missing_api_key());
    }

    #[test]
    fn tolerates_bodies_without_error_field() {
        let body: ErrorBody = serde_json::from_str("{}").expect("decode");
        assert!(body.error.is_empty());
    }
}
