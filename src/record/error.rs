use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("String is too long: column {column} holds at most {max} bytes, got {actual}")]
    StringTooLong {
        column: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("Column {column} contains a NUL byte at position {position}")]
    EmbeddedNul {
        column: &'static str,
        position: usize,
    },

    #[error("Invalid row size: expected {expected}, got {actual}")]
    InvalidRowSize { expected: usize, actual: usize },

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

pub type RecordResult<T> = Result<T, RecordError>;
