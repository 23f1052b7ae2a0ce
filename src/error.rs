use thiserror::Error;

/// Errors raised while building requests or talking to the inference service.
///
/// These never leave the orchestrators; [`crate::IdentifySession`] and
/// [`crate::SkinSession`] turn them into stage failures and notices.
#[derive(Error, Debug)]
pub enum DiagnosisError {
    /// The selected image could not be resolved to bytes.
    #[error("Invalid image reference: {0}")]
    InvalidImageReference(String),

    /// Network-level request failure with context.
    #[error("{context}: {source}")]
    Transport {
        context: String,
        source: reqwest::Error,
    },

    /// The service answered with a non-success status or an `error` field.
    #[error("Inference service rejected the request{}: {message}", status_suffix(.status))]
    RemoteRejection {
        status: Option<u16>,
        message: String,
    },

    /// A success response was missing fields or carried nonsense values.
    #[error("Invalid response from inference service: {0}")]
    InvalidResponse(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for DiagnosisError {
    fn from(err: anyhow::Error) -> Self {
        DiagnosisError::Other(err.to_string())
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

/// Coarse failure taxonomy used for notices and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response, or the network was unreachable.
    TransportFailure,
    /// A response arrived but was not a usable success.
    RemoteRejection,
    /// Local precondition failure before any network call.
    InvalidImageReference,
}

impl DiagnosisError {
    /// Classify this error for recovery and presentation.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DiagnosisError::InvalidImageReference(_) => ErrorKind::InvalidImageReference,
            DiagnosisError::Transport { .. } => ErrorKind::TransportFailure,
            DiagnosisError::RemoteRejection { .. }
            | DiagnosisError::InvalidResponse(_)
            | DiagnosisError::Json(_) => ErrorKind::RemoteRejection,
            // Configuration problems surface before a response exists.
            DiagnosisError::InvalidConfig(_) | DiagnosisError::Other(_) => {
                ErrorKind::TransportFailure
            }
        }
    }

    /// The server-provided message, if this is a rejection that carried one.
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            DiagnosisError::RemoteRejection { message, .. } if !message.is_empty() => {
                Some(message.as_str())
            }
            _ => None,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, DiagnosisError>;
