use thiserror::Error;

/// Failures reported by a [`RequestGateway`](crate::http::RequestGateway).
///
/// These are surfaced to callers unchanged inside [`QueryError::Transport`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("network error: {message}")]
    Network { message: String, url: Option<String> },

    #[error("HTTP {status} (code {code}): {message}")]
    Http { status: u16, code: i64, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unknown query command: {0}")]
    UnknownCommand(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl QueryError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// True for errors raised before any request was attempted.
    #[must_use]
    pub fn is_argument_error(&self) -> bool {
        matches!(self, Self::InvalidArgument(_) | Self::UnknownCommand(_))
    }
}
