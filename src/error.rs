//! Error types for the docmap library.
//!
//! All failures are represented by the [`DocmapError`] enum. Errors are
//! surfaced at the call site that detected them; nothing in the crate
//! retries or recovers locally.
//!
//! # Examples
//!
//! ```
//! use docmap::error::{DocmapError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(DocmapError::invalid_argument("empty field name"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::fmt::Display;

use thiserror::Error;

/// The main error type for docmap operations.
#[derive(Error, Debug)]
pub enum DocmapError {
    /// A required input was null, empty or otherwise malformed.
    #[error("Invalid argument: {0}")]
    ArgumentInvalid(String),

    /// A leaf value has no document representation.
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// A property type cannot be mapped to a field, or the object graph
    /// cannot be flattened.
    #[error("Unmappable type: {0}")]
    UnmappableType(String),

    /// A predicate or sort key uses an expression shape the translator
    /// does not accept.
    #[error("Unsupported expression: {0}")]
    UnsupportedExpression(String),

    /// The document was written without a stored source payload.
    #[error("Missing source payload: {0}")]
    MissingSourcePayload(String),

    /// The stored source payload exists but cannot be decoded.
    #[error("Corrupt source payload: {0}")]
    CorruptSourcePayload(String),

    /// The search engine failed while reading or writing.
    #[error("Engine execution failure: {0}")]
    Engine(anyhow::Error),

    /// Serialization error raised from inside a serde implementation.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for operations that may fail with DocmapError.
pub type Result<T> = std::result::Result<T, DocmapError>;

impl DocmapError {
    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        DocmapError::ArgumentInvalid(msg.into())
    }

    /// Create a new unsupported type error.
    pub fn unsupported_type<S: Into<String>>(msg: S) -> Self {
        DocmapError::UnsupportedType(msg.into())
    }

    /// Create a new unmappable type error.
    pub fn unmappable_type<S: Into<String>>(msg: S) -> Self {
        DocmapError::UnmappableType(msg.into())
    }

    /// Create a new unsupported expression error.
    pub fn unsupported_expression<S: Into<String>>(msg: S) -> Self {
        DocmapError::UnsupportedExpression(msg.into())
    }

    /// Create a new missing payload error.
    pub fn missing_source<S: Into<String>>(msg: S) -> Self {
        DocmapError::MissingSourcePayload(msg.into())
    }

    /// Create a new corrupt payload error.
    pub fn corrupt_source<S: Into<String>>(msg: S) -> Self {
        DocmapError::CorruptSourcePayload(msg.into())
    }

    /// Create a new engine error from a message.
    pub fn engine<S: Display>(msg: S) -> Self {
        DocmapError::Engine(anyhow::anyhow!("{}", msg))
    }

    /// Wrap an error raised by an engine implementation.
    pub fn engine_source<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        DocmapError::Engine(anyhow::Error::new(err))
    }

    /// Whether this error came from the engine rather than from translation
    /// or mapping.
    pub fn is_engine(&self) -> bool {
        matches!(self, DocmapError::Engine(_))
    }
}

impl serde::ser::Error for DocmapError {
    fn custom<T: Display>(msg: T) -> Self {
        DocmapError::Serialization(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = DocmapError::invalid_argument("empty name");
        assert_eq!(error.to_string(), "Invalid argument: empty name");

        let error = DocmapError::unsupported_expression("a || b");
        assert_eq!(error.to_string(), "Unsupported expression: a || b");

        let error = DocmapError::missing_source("doc 7");
        assert_eq!(error.to_string(), "Missing source payload: doc 7");
    }

    #[test]
    fn test_engine_error_wraps_source() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "segment gone");
        let error = DocmapError::engine_source(io_error);

        assert!(error.is_engine());
        assert_eq!(error.to_string(), "Engine execution failure: segment gone");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<u32>("nope").unwrap_err();
        match DocmapError::from(json_error) {
            DocmapError::Json(_) => {}
            _ => panic!("Expected JSON error variant"),
        }
    }
}
