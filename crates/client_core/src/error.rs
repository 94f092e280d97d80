use shared::error::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),
    #[error("{}", .0.message)]
    Rejected(ApiError),
    #[error("malformed service response: {0}")]
    Decode(String),
    #[error("invalid url '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("failed to read local file: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Message reported by the service itself, when the failure came from the
    /// response envelope rather than the transport.
    pub fn service_message(&self) -> Option<&str> {
        match self {
            ClientError::Rejected(err) => Some(err.message.as_str()),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}

impl From<ApiError> for ClientError {
    fn from(value: ApiError) -> Self {
        ClientError::Rejected(value)
    }
}
