//! Scene graph errors

/// Errors raised by scene mutations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    /// No variable with this name in the set
    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    /// Variable names must be unique within a set
    #[error("duplicate variable name: {0}")]
    DuplicateVariable(String),

    /// Variable exists but does not accept the requested change
    #[error("variable '{name}' is read-only")]
    ReadOnlyVariable {
        /// Variable name
        name: String,
    },
}

impl SceneError {
    /// Create unknown variable error
    pub fn unknown_variable(name: impl Into<String>) -> Self {
        Self::UnknownVariable(name.into())
    }

    /// Create duplicate variable error
    pub fn duplicate_variable(name: impl Into<String>) -> Self {
        Self::DuplicateVariable(name.into())
    }
}

/// Result alias for scene operations
pub type SceneResult<T> = Result<T, SceneError>;
