use thiserror::Error;

/// Everything that can go wrong between a trigger and a rendered result.
///
/// The `Display` text of each variant is exactly what the user is alerted
/// with, so `Server` renders only the message the backend gave us.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("{0}")]
    MalformedResponse(String),

    #[error("backend did not finalize")]
    NotFinalized,
}

impl DispatchError {
    /// Short machine-friendly name, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::Validation(_) => "validation",
            DispatchError::Transport(_) => "transport",
            DispatchError::Server { .. } => "server",
            DispatchError::MalformedResponse(_) => "malformed_response",
            DispatchError::NotFinalized => "not_finalized",
        }
    }

    /// Validation errors are handled before any display change.
    pub fn is_validation(&self) -> bool {
        matches!(self, DispatchError::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_error_displays_only_message() {
        let err = DispatchError::Server {
            status: 422,
            message: "bad prompt".to_string(),
        };
        assert_eq!(err.to_string(), "bad prompt");
        assert_eq!(err.kind(), "server");
    }

    #[test]
    fn validation_is_flagged() {
        let err = DispatchError::Validation("empty".to_string());
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "empty");
    }

    #[test]
    fn malformed_is_not_validation() {
        let err = DispatchError::MalformedResponse("expected value".to_string());
        assert!(!err.is_validation());
        assert_eq!(err.kind(), "malformed_response");
    }
}
