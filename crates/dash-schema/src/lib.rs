//! Dashboard Schema - persisted document model
//!
//! Two incompatible generations of the dashboard document live side by side:
//! - v1: `DashboardDTO`, a loose legacy body plus typed server metadata
//! - v2: `DashboardWithAccessInfo`, a Kubernetes-style resource whose
//!   `spec` follows the typed model in [`v2`]
//!
//! Shape classification is exclusive: a JSON value is either a v1 DTO, a v2
//! resource, or neither.
//!
//! # Example
//!
//! ```rust,ignore
//! use dash_schema::prelude::*;
//!
//! let doc = RawDocument::from_json(text)?;
//! match doc.schema_version() {
//!     SchemaVersion::V1 => println!("legacy {}", doc.identity()),
//!     SchemaVersion::V2 => println!("resource {}", doc.identity()),
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod canonical;
pub mod document;
pub mod error;
pub mod legacy;
pub mod resource;
pub mod v1;
pub mod v2;
pub mod version;

pub use canonical::canonicalize;
pub use document::{is_v1_shape, is_v2_shape, is_v2_spec, RawDocument};
pub use error::{SchemaError, SchemaResult};
pub use legacy::FromLegacy;
pub use resource::{AccessInfo, DashboardResource, ObjectMeta};
pub use v1::{DashboardDto, DashboardMeta, LooseObject};
pub use version::{Fingerprint, SchemaVersion};

/// Prelude for common imports
pub mod prelude {
    pub use crate::canonical::canonicalize;
    pub use crate::document::RawDocument;
    pub use crate::error::{SchemaError, SchemaResult};
    pub use crate::legacy::FromLegacy;
    pub use crate::resource::{DashboardResource, ObjectMeta};
    pub use crate::v1::{DashboardDto, DashboardMeta, LooseObject};
    pub use crate::v2::Spec;
    pub use crate::version::{Fingerprint, SchemaVersion};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
