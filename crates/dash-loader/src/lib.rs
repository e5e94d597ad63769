//! Dashboard Loader - load, cache and reload dashboards
//!
//! - [`DocumentStore`]: async backend contract (v1 and v2 APIs, home,
//!   public, snapshot, provisioning preview, folders)
//! - two-tier caching: a short-lived single-slot [`DocumentCache`] and an
//!   identity keyed [`SceneCache`]
//! - per-generation [`PageStateManager`]s publishing [`ManagerState`] on a
//!   watch channel, driven by the [`LoadPhase`] machine
//! - [`UnifiedDashboardPageStateManager`], which switches generation when
//!   the backend reports a [`VersionMismatch`]
//! - [`ReloadOnParamsChangeBehavior`], edit-as-code and preserved URL state
//!
//! # Example
//!
//! ```rust,ignore
//! use dash_loader::prelude::*;
//!
//! let manager = UnifiedDashboardPageStateManager::new(services, LoaderConfig::default());
//! manager.load_dashboard(LoadOptions::uid("abc")).await?;
//! let scene = manager.state().dashboard;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cache;
pub mod config;
pub mod edit;
pub mod error;
pub mod manager;
pub mod options;
pub mod phase;
pub mod provisioning;
pub mod reload;
pub mod state;
pub mod store;
pub mod unified;
pub mod url_state;

pub use cache::{DocumentCache, SceneCache};
pub use config::{ConfigError, LoaderConfig};
pub use edit::{apply_json_edit, apply_resource, JsonEditOutcome};
pub use error::{
    LoadError, LoadErrorInfo, LoadResult, MismatchSignal, SpecApplyError, StoreError,
    VersionMismatch,
};
pub use manager::{
    DashboardPageManager, DashboardPageStateManagerV1, DashboardPageStateManagerV2,
    LoaderServices, PageStateManager, SchemaMarker, V1Schema, V2Schema, STASHED_DASHBOARD_KEY,
};
pub use options::{LoadOptions, ProvisioningTarget, ReloadParams, Route, HOME_CACHE_KEY};
pub use phase::{allowed_transitions, validate_transition, IllegalTransition, LoadPhase};
pub use provisioning::{reshape_preview, spec_checksum};
pub use reload::{ReloadOnParamsChangeBehavior, ShownSceneWatcher};
pub use state::ManagerState;
pub use store::{
    new_dashboard_template, DocumentStore, FetchOutcome, FetchRequest, FolderInfo, KeyValueStore,
    LocationService, MemoryKeyValueStore, ProvisioningPreview, RepositoryInfo,
};
pub use unified::{DashboardReloader, UnifiedDashboardPageStateManager};
pub use url_state::{PreservedUrlState, QueryParams};

/// Prelude for common imports
pub mod prelude {
    pub use crate::config::LoaderConfig;
    pub use crate::error::{LoadError, LoadResult, StoreError};
    pub use crate::manager::{DashboardPageManager, LoaderServices};
    pub use crate::options::{LoadOptions, ReloadParams, Route};
    pub use crate::state::ManagerState;
    pub use crate::store::{DocumentStore, FetchOutcome, KeyValueStore, LocationService};
    pub use crate::unified::UnifiedDashboardPageStateManager;
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
