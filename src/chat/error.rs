//! Error types for the chat subsystem.

use thiserror::Error;

/// Failure of a single chat exchange with the upstream endpoint.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Transport failure or non-2xx status.
    #[error("upstream unavailable: {message}")]
    UpstreamUnavailable {
        /// HTTP status when one was received.
        status: Option<u16>,
        /// Diagnostic detail (never shown to end users).
        message: String,
    },
    /// A 2xx body without the expected candidate text.
    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),
}

impl ChatError {
    /// Static text shown to end users for any chat failure.
    pub const USER_FALLBACK: &'static str =
        "I'm having trouble connecting right now. Please try again in a moment.";

    /// HTTP status attached to the failure, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::UpstreamUnavailable { status, .. } => *status,
            Self::MalformedResponse(_) => None,
        }
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(value: reqwest::Error) -> Self {
        Self::UpstreamUnavailable {
            status: value.status().map(|s| s.as_u16()),
            message: value.to_string(),
        }
    }
}

/// Convenience result alias for chat operations.
pub type ChatResult<T> = Result<T, ChatError>;

/// Misuse of a chat session.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum SessionError {
    /// No live session with that id.
    #[error("unknown chat session: {0}")]
    UnknownSession(String),
    /// A reply is still outstanding for this session.
    #[error("a request is already pending for this session")]
    RequestPending,
    /// Blank input.
    #[error("message text is empty")]
    EmptyMessage,
    /// The context changed before the reply arrived; the reply was dropped.
    #[error("conversation context changed before the reply arrived")]
    Superseded,
}
