use thiserror::Error;

/// Failure reported by a [`crate::Transport`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// The provider rejected the credential (HTTP 401).
    #[error("API request failed: 401 Unauthorized")]
    Unauthorized,

    #[error("API request failed: {code} {reason}")]
    Status { code: u16, reason: String },

    #[error("{0}")]
    Network(String),

    #[error("{0}")]
    Malformed(String),
}

/// Per-exchange failure surfaced to the user as an error message.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Please set your API key to continue.")]
    MissingCredential,

    #[error("Invalid API key. Please reset your API key and try again.")]
    AuthInvalid,

    #[error("Error: {0}")]
    Transport(String),

    #[error("Error: {0}")]
    MalformedResponse(String),

    #[error("Error displaying message: {0}")]
    Render(String),
}

impl From<TransportError> for ChatError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Unauthorized => ChatError::AuthInvalid,
            TransportError::Malformed(msg) => ChatError::MalformedResponse(msg),
            other => ChatError::Transport(other.to_string()),
        }
    }
}

/// Failure reading or writing persisted state.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not access store file '{0}': {1}")]
    Io(String, #[source] std::io::Error),

    #[error("could not decode stored value: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not determine data directory")]
    NoDataDir,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_maps_to_auth_invalid() {
        let err: ChatError = TransportError::Unauthorized.into();
        assert!(matches!(err, ChatError::AuthInvalid));
    }

    #[test]
    fn test_status_message() {
        let err: ChatError = TransportError::Status {
            code: 503,
            reason: "Service Unavailable".into(),
        }
        .into();
        assert_eq!(err.to_string(), "Error: API request failed: 503 Service Unavailable");
    }

    #[test]
    fn test_malformed_message() {
        let err: ChatError = TransportError::Malformed("Invalid response format from API".into()).into();
        assert!(matches!(err, ChatError::MalformedResponse(_)));
        assert_eq!(err.to_string(), "Error: Invalid response format from API");
    }
}
