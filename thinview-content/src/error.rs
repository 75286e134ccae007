use thiserror::Error;

pub type ContentResult<T> = Result<T, ContentError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContentError {
    #[error("Component delta is missing required field 'id'")]
    MissingId,

    #[error("Component delta must be a JSON object, got {found}")]
    NotAnObject { found: String },

    #[error("Component deltas must arrive as a JSON array")]
    NotAnArray,

    #[error("Invalid value for '{property}' on component '{id}': {reason}")]
    InvalidProperty {
        id: String,
        property: String,
        reason: String,
    },

    #[error("Invalid toolBarArea {value}: expected one of 0, 1, 2, 3")]
    InvalidToolBarArea { value: i64 },

    #[error("Invalid sort mode '{mode}'. Expected one of: Ascending, Descending, None")]
    InvalidSortMode { mode: String },

    #[error("Row has {found} values but {expected} column names were given")]
    RowWidthMismatch { expected: usize, found: usize },

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

impl From<serde_json::Error> for ContentError {
    fn from(err: serde_json::Error) -> Self {
        ContentError::DeserializationError(err.to_string())
    }
}
