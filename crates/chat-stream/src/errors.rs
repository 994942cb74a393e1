/// Terminal failure cause delivered through `on_error` and
/// `SessionOutcome::Failed`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The endpoint answered with a non-success status before streaming began.
    #[error("completion endpoint returned status {status}")]
    Status { status: u16 },
    /// Reading the response body failed mid-stream.
    #[error("transport error: {0}")]
    Transport(String),
    /// A frame could not be decoded and the session is configured to fail on it.
    #[error("malformed frame: {raw}")]
    Malformed { raw: String },
    /// The endpoint sent an error record in-band.
    #[error("upstream error: {0}")]
    Upstream(String),
    /// The session task ended without producing an outcome (e.g. a callback panicked).
    #[error("session task terminated: {0}")]
    Internal(String),
}

impl SessionError {
    pub(crate) fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Returns the HTTP status for `Status` failures.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status } => Some(*status),
            _ => None,
        }
    }
}

/// Errors returned by the chat request/client API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    /// Invalid client configuration.
    #[error("config error: {0}")]
    Config(String),
    /// Invalid request built by the caller.
    #[error("validation error: {0}")]
    Validation(String),
    /// Sending the request failed before a response was received.
    #[error("transport error: {0}")]
    Transport(String),
    /// A started session ended in failure.
    #[error(transparent)]
    Session(SessionError),
    /// The session was cancelled before it produced a reply.
    #[error("cancelled")]
    Cancelled,
}

impl From<SessionError> for ChatError {
    fn from(value: SessionError) -> Self {
        ChatError::Session(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_only_reported_for_status_failures() {
        assert_eq!(SessionError::Status { status: 502 }.status_code(), Some(502));
        assert_eq!(SessionError::transport("reset").status_code(), None);
    }

    #[test]
    fn session_error_converts_into_chat_error() {
        let err: ChatError = SessionError::Upstream("quota exceeded".into()).into();
        assert_eq!(err.to_string(), "upstream error: quota exceeded");
    }
}
