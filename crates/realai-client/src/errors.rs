/// Errors that stop a decode session.
///
/// Malformed event records and undecodable image payloads never surface here;
/// they are absorbed by the decoder and only logged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// The byte source failed while the stream was being read.
    #[error("stream transport error: {message}")]
    Transport { message: String },
    /// The caller aborted the session through an `AbortHandle`.
    #[error("stream cancelled")]
    Cancelled,
}

impl StreamError {
    /// Creates a transport-level error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

/// Top-level error type for the client API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Invalid client configuration.
    #[error("config error: {0}")]
    Config(String),
    /// Invalid caller input (empty model, no messages, ...).
    #[error("validation error: {0}")]
    Validation(String),
    /// Upstream answered with a non-success status before any streaming began.
    #[error("provider error ({status}): {message}")]
    Provider { status: u16, message: String },
    /// Request could not be sent or the response body could not be read.
    #[error("transport error: {0}")]
    Transport(String),
    /// Response body did not have the expected shape.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// Failure raised while decoding an established stream.
    #[error(transparent)]
    Stream(#[from] StreamError),
}

impl ClientError {
    /// Creates a provider-level error from an HTTP status and message.
    pub fn provider(status: u16, message: impl Into<String>) -> Self {
        Self::Provider {
            status,
            message: message.into(),
        }
    }

    /// Returns the HTTP status carried by provider errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Provider { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true when the error came from caller cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Stream(StreamError::Cancelled))
    }
}
