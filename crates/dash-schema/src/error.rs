//! Error types for the document model
//!
//! Covers:
//! - Shape classification (is this a v1 DTO or a v2 resource?)
//! - Malformed JSON payloads
//! - Enum values outside the schema

/// Errors raised while reading persisted dashboard documents
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Payload is not valid JSON
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload matched neither the v1 nor the v2 document shape
    #[error("unrecognized document shape: {0}")]
    UnrecognizedShape(String),

    /// A required field is absent or has the wrong type
    #[error("invalid field '{field}': {message}")]
    InvalidField {
        /// Dotted path of the offending field
        field: String,
        /// What was wrong with it
        message: String,
    },

    /// An enumerated value is not part of the schema
    #[error("invalid value '{value}' for {enum_name}")]
    InvalidEnumValue {
        /// Schema enum name
        enum_name: &'static str,
        /// Value found in the document
        value: String,
    },
}

impl SchemaError {
    /// Create unrecognized shape error
    pub fn unrecognized(message: impl Into<String>) -> Self {
        Self::UnrecognizedShape(message.into())
    }

    /// Create invalid field error
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result alias for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
