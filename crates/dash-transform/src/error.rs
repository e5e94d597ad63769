//! Error types for the transform engine
//!
//! Covers:
//! - Per-element failures (one variable, panel or annotation layer)
//! - Document-level failures that abort the whole transform
//! - Structural validation of produced v2 specs

use dash_schema::SchemaError;
use std::fmt;

/// One structural violation in a v2 spec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON pointer of the offending value
    pub path: String,
    /// What is wrong
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        write!(f, "{path}: {}", self.message)
    }
}

/// Structural validation failure, carrying every violation found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Violations in document order
    pub violations: Vec<Violation>,
}

impl ValidationError {
    /// Single-violation error
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violations: vec![Violation {
                path: path.into(),
                message: message.into(),
            }],
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} violation(s)", self.violations.len())?;
        for violation in &self.violations {
            write!(f, "; {violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Errors raised by the transform engine
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// Variable kind outside the closed set of eight
    #[error("unsupported variable kind: {0}")]
    UnsupportedVariableKind(String),

    /// One element (panel, variable, annotation, layout item) is malformed
    #[error("invalid {element} '{name}': {message}")]
    InvalidElement {
        /// Element category
        element: &'static str,
        /// Element name or index
        name: String,
        /// What was wrong
        message: String,
    },

    /// Dashboard-level time settings are missing or not an object
    #[error("missing or invalid time settings")]
    MissingTimeSettings,

    /// Dashboard-level structure is unusable
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Produced spec failed structural validation
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Document model error
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Spec could not be serialized
    #[error("serialize error: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl TransformError {
    /// Create invalid element error
    pub fn invalid_element(
        element: &'static str,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidElement {
            element,
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create invalid document error
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument(message.into())
    }

    /// Whether the error is confined to a single element
    #[must_use]
    pub fn is_element_local(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedVariableKind(_) | Self::InvalidElement { .. }
        )
    }
}

/// Result alias for transform operations
pub type TransformResult<T> = Result<T, TransformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_display() {
        let err = ValidationError {
            violations: vec![
                Violation { path: "/cursorSync".into(), message: "bad enum".into() },
                Violation { path: String::new(), message: "missing title".into() },
            ],
        };
        assert_eq!(
            err.to_string(),
            "2 violation(s); /cursorSync: bad enum; /: missing title"
        );
    }

    #[test]
    fn element_locality() {
        assert!(TransformError::UnsupportedVariableKind("x".into()).is_element_local());
        assert!(!TransformError::MissingTimeSettings.is_element_local());
    }
}
