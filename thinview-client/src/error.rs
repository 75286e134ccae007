use thinview_content::ContentError;
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request to '{endpoint}' timed out after {timeout_ms} ms")]
    Timeout { endpoint: String, timeout_ms: u64 },

    #[error("Request to '{endpoint}' was cancelled")]
    Cancelled { endpoint: String },

    #[error("Malformed response envelope '{name}': {reason}")]
    MalformedEnvelope { name: String, reason: String },

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::DeserializationError(err.to_string())
    }
}
