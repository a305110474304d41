//! Error types for the event model
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use thiserror::Error;

/// Result type alias for model operations
pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Errors raised while constructing an event record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A field that has no default was never set on the builder
    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_missing_field() {
        let err = ModelError::MissingRequiredField("event_type");
        let msg = err.to_string();
        assert!(msg.contains("Missing required field"));
        assert!(msg.contains("event_type"));
    }
}
