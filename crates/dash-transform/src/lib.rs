//! Dashboard Transform - persisted documents to scenes and back
//!
//! Forward direction ([`document_to_scene`]):
//! - v1: loose legacy JSON (grid or rows, `templating`, `annotations`)
//! - v2: typed spec with per-element isolation
//! - per-element failures are logged and skipped, dashboard-level failures
//!   abort the transform
//!
//! Reverse direction ([`scene_to_document`]) always writes a v2 spec,
//! canonical and validated.
//!
//! # Example
//!
//! ```rust,ignore
//! use dash_transform::prelude::*;
//!
//! let doc = RawDocument::from_json(text)?;
//! let scene = document_to_scene(&doc, &TransformOptions::default())?;
//! let spec = scene_to_document(&scene, false)?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod annotations;
mod assemble;
pub mod error;
pub mod layout;
pub mod meta;
pub mod options;
pub mod panels;
pub mod reverse;
pub mod v1;
pub mod v2;
pub mod validate;
pub mod variables;

pub use assemble::attach_meta;
pub use error::{TransformError, TransformResult, ValidationError, Violation};
pub use layout::LayoutSerializer;
pub use options::TransformOptions;
pub use reverse::{scene_to_document, scene_to_resource, spec_from_state};
pub use validate::validate_spec;
pub use variables::{variable_from_v1, variable_from_v2, variable_to_v2};

use dash_scene::DashboardScene;
use dash_schema::{is_v2_spec, RawDocument};

/// Build a scene from a persisted document
///
/// Snapshot mode is on when requested or when the document says it is a
/// snapshot. A v1 document whose `dashboard` holds a v2 spec (home
/// dashboards) goes through the v2 path.
///
/// # Errors
///
/// Dashboard-level failures only; see [`TransformError::is_element_local`].
pub fn document_to_scene(
    doc: &RawDocument,
    opts: &TransformOptions,
) -> TransformResult<DashboardScene> {
    let (mut state, meta) = match doc {
        RawDocument::V1(dto) => {
            let opts = opts.with_snapshot(opts.snapshot || dto.meta.is_snapshot);
            let state = if is_v2_spec(&dto.dashboard) {
                v2::state_from_spec(&dto.dashboard, &opts)?
            } else {
                v1::state_from_dashboard(&dto.dashboard, &opts)?
            };
            (state, meta::meta_from_v1(&dto.meta))
        }
        RawDocument::V2(resource) => (
            v2::state_from_spec(&resource.spec, opts)?,
            meta::meta_from_resource(resource),
        ),
    };

    state.uid = doc.identity().to_string();
    state.version = doc.version();
    state.fingerprint = Some(doc.fingerprint());
    attach_meta(&mut state, meta);

    tracing::debug!(
        uid = %state.uid,
        version = %doc.schema_version(),
        variables = state.variables.len(),
        panels = state.body.panels().len(),
        "document transformed"
    );
    Ok(DashboardScene::new(state))
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::error::{TransformError, TransformResult, ValidationError};
    pub use crate::options::TransformOptions;
    pub use crate::reverse::scene_to_document;
    pub use crate::validate::validate_spec;
    pub use crate::document_to_scene;
    pub use dash_schema::RawDocument;
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
