//! Errors in the library.
use thiserror::Error;

/// Errors raised when accessing a [`Record`](crate::record::Record).
#[derive(Debug, Error)]
pub enum RecordError {
    /// The requested key does not exist in the record.
    #[error("Key {0} was not found in the record")]
    KeyNotFound(String),

    /// The value under the key has a different type than requested.
    #[error("Value for key {0} is not of the requested type")]
    WrongType(String),
}
