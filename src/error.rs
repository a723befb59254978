//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
///
/// A missing key is never an error; lookups return `Option`. Errors only come
/// from collaborators (size estimation, duration parsing) and the shell.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A size estimator could not size a value
    #[error("Size estimation failed: {0}")]
    SizeEstimate(String),

    /// Structural size estimation could not serialize a value
    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A duration expression could not be parsed
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    /// A shell command was malformed
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CacheError::InvalidDuration("soon".to_string());
        assert_eq!(err.to_string(), "Invalid duration: soon");

        let err = CacheError::SizeEstimate("too deep".to_string());
        assert_eq!(err.to_string(), "Size estimation failed: too deep");
    }

    #[test]
    fn test_serde_error_converts() {
        let serde_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: CacheError = serde_err.into();
        assert!(matches!(err, CacheError::Serialize(_)));
    }
}
