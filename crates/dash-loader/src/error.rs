//! Error types for dashboard loading
//!
//! Provides error handling for:
//! - Document store failures (not found, transport, cancellation)
//! - Version mismatch control flow between the two managers
//! - Transform failures surfaced through the published load error
//! - The programmatic spec-apply boundary

use dash_schema::SchemaVersion;
use dash_transform::TransformError;
use serde::{Deserialize, Serialize};

/// Control-flow signal: the document is stored in the other schema generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("dashboard is stored as {stored_version}")]
pub struct VersionMismatch {
    /// Generation the backend actually stores
    pub stored_version: SchemaVersion,
}

impl VersionMismatch {
    #[inline]
    #[must_use]
    pub fn new(stored_version: SchemaVersion) -> Self {
        Self { stored_version }
    }
}

/// Errors that may carry a [`VersionMismatch`]
pub trait MismatchSignal {
    /// The mismatch signal, if this error is one
    fn version_mismatch(&self) -> Option<VersionMismatch>;
}

/// Failures reported by a [`crate::DocumentStore`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Document absent
    #[error("dashboard not found: {0}")]
    NotFound(String),

    /// Network or backend failure
    #[error("request failed ({status}): {message}")]
    Http {
        status: u16,
        message: String,
        message_id: Option<String>,
    },

    /// Superseded by a newer request
    #[error("request cancelled")]
    Cancelled,

    /// Backend stores the document in another generation
    #[error("dashboard is stored as {0}")]
    StoredVersion(SchemaVersion),
}

impl StoreError {
    /// Create HTTP error
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
            message_id: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl MismatchSignal for StoreError {
    fn version_mismatch(&self) -> Option<VersionMismatch> {
        match self {
            Self::StoredVersion(version) => Some(VersionMismatch::new(*version)),
            _ => None,
        }
    }
}

/// Errors raised by the page state managers
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Document absent
    #[error("dashboard not found: {0}")]
    NotFound(String),

    /// Retry against the other manager
    #[error(transparent)]
    VersionMismatch(#[from] VersionMismatch),

    /// Backend failure
    #[error("request failed ({status}): {message}")]
    Transport {
        status: u16,
        message: String,
        message_id: Option<String>,
    },

    /// Document content could not be turned into a scene
    #[error("transform failed: {0}")]
    Transform(#[from] TransformError),

    /// Load options do not describe a loadable dashboard
    #[error("invalid load options: {0}")]
    InvalidOptions(String),

    /// Provisioning preview could not be reshaped
    #[error("provisioning preview error: {0}")]
    Provisioning(String),
}

impl LoadError {
    /// Create invalid options error
    pub fn invalid_options(message: impl Into<String>) -> Self {
        Self::InvalidOptions(message.into())
    }

    /// Create provisioning error
    pub fn provisioning(message: impl Into<String>) -> Self {
        Self::Provisioning(message.into())
    }

    /// HTTP-like status used in the published load error
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Transport { status, .. } => *status,
            Self::InvalidOptions(_) | Self::Provisioning(_) => 400,
            Self::VersionMismatch(_) | Self::Transform(_) => 500,
        }
    }
}

impl MismatchSignal for LoadError {
    fn version_mismatch(&self) -> Option<VersionMismatch> {
        match self {
            Self::VersionMismatch(mismatch) => Some(*mismatch),
            _ => None,
        }
    }
}

impl From<StoreError> for LoadError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(uid) => Self::NotFound(uid),
            StoreError::Http {
                status,
                message,
                message_id,
            } => Self::Transport {
                status,
                message,
                message_id,
            },
            StoreError::StoredVersion(version) => Self::VersionMismatch(VersionMismatch::new(version)),
            // Callers resolve cancellation to "no document" before converting
            StoreError::Cancelled => Self::Transport {
                status: 0,
                message: "request cancelled".to_string(),
                message_id: None,
            },
        }
    }
}

/// Published, user-visible load error
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadErrorInfo {
    pub status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

impl From<&LoadError> for LoadErrorInfo {
    fn from(err: &LoadError) -> Self {
        let message_id = match err {
            LoadError::Transport { message_id, .. } => message_id.clone(),
            _ => None,
        };
        Self {
            status: err.status(),
            message: err.to_string(),
            message_id,
        }
    }
}

/// Rejections from the programmatic spec-apply boundary
#[derive(Debug, thiserror::Error)]
pub enum SpecApplyError {
    /// Payload changes something other than `spec`
    #[error("cannot change {0} of an open dashboard")]
    IdentityChanged(&'static str),

    /// Payload is not a resource
    #[error("invalid resource: {0}")]
    InvalidResource(String),

    /// Spec does not transform
    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// Result type for load operations
pub type LoadResult<T> = Result<T, LoadError>;
