//! Version-reconciling facade over the two page state managers
//!
//! Callers use one API without knowing which schema generation a dashboard
//! is stored in. Every operation runs against the active manager; a
//! [`VersionMismatch`](crate::VersionMismatch) switches the active manager
//! and re-runs the operation once. Published state mirrors whichever
//! manager is active when the operation completes.

use crate::config::LoaderConfig;
use crate::error::{LoadResult, MismatchSignal};
use crate::manager::{
    DashboardPageManager, DashboardPageStateManagerV1, DashboardPageStateManagerV2, LoaderServices,
};
use crate::options::{LoadOptions, ReloadParams};
use crate::state::ManagerState;
use async_trait::async_trait;
use dash_scene::DashboardScene;
use dash_schema::{RawDocument, SchemaVersion};
use futures::future::BoxFuture;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;

/// Something that can re-fetch the shown dashboard
#[async_trait]
pub trait DashboardReloader: Send + Sync {
    async fn reload_dashboard(&self, params: ReloadParams) -> LoadResult<()>;
}

/// Unified page state manager
#[derive(Debug)]
pub struct UnifiedDashboardPageStateManager {
    v1: Arc<DashboardPageStateManagerV1>,
    v2: Arc<DashboardPageStateManagerV2>,
    active: RwLock<SchemaVersion>,
    config: LoaderConfig,
    state: watch::Sender<ManagerState>,
}

impl UnifiedDashboardPageStateManager {
    /// Create both managers over shared services; v1 starts active
    #[must_use]
    pub fn new(services: LoaderServices, config: LoaderConfig) -> Self {
        let (state, _) = watch::channel(ManagerState::default());
        Self {
            v1: Arc::new(DashboardPageStateManagerV1::new(services.clone(), config.clone())),
            v2: Arc::new(DashboardPageStateManagerV2::new(services, config.clone())),
            active: RwLock::new(SchemaVersion::V1),
            config,
            state,
        }
    }

    #[inline]
    #[must_use]
    pub fn active_version(&self) -> SchemaVersion {
        *self.active.read()
    }

    pub fn set_active_manager(&self, version: SchemaVersion) {
        let mut active = self.active.write();
        if *active != version {
            tracing::debug!(from = %*active, to = %version, "switching active manager");
            *active = version;
        }
    }

    /// Manager for a generation
    #[must_use]
    pub fn manager(&self, version: SchemaVersion) -> Arc<dyn DashboardPageManager> {
        match version {
            SchemaVersion::V1 => Arc::clone(&self.v1) as Arc<dyn DashboardPageManager>,
            SchemaVersion::V2 => Arc::clone(&self.v2) as Arc<dyn DashboardPageManager>,
        }
    }

    #[must_use]
    pub fn active(&self) -> Arc<dyn DashboardPageManager> {
        self.manager(self.active_version())
    }

    fn managers(&self) -> [Arc<dyn DashboardPageManager>; 2] {
        [self.manager(SchemaVersion::V1), self.manager(SchemaVersion::V2)]
    }

    fn sync_state(&self) {
        let next = self.active().state();
        self.state.send_if_modified(|state| {
            let changed = !state.is_equivalent(&next);
            *state = next;
            changed
        });
    }

    /// Run `op` on the active manager, switching managers once on a mismatch
    ///
    /// # Errors
    ///
    /// Whatever `op` returns after the retry, or the first error when it
    /// is not a mismatch.
    pub async fn with_version_handling<T, F>(&self, op: F) -> LoadResult<T>
    where
        F: Fn(Arc<dyn DashboardPageManager>) -> BoxFuture<'static, LoadResult<T>> + Send + Sync,
        T: Send,
    {
        let result = match op(self.active()).await {
            Err(err) => match err.version_mismatch() {
                Some(mismatch) => {
                    tracing::info!(stored = %mismatch.stored_version, "retrying with matching manager");
                    self.set_active_manager(mismatch.stored_version);
                    op(self.active()).await
                }
                None => Err(err),
            },
            ok => ok,
        };
        self.sync_state();
        result
    }

    /// Load a dashboard
    ///
    /// # Errors
    ///
    /// A mismatch that persisted after the retry.
    pub async fn load_dashboard(&self, options: LoadOptions) -> LoadResult<()> {
        if options.is_new() {
            self.set_active_manager(if self.config.prefer_v2_for_new_dashboards {
                SchemaVersion::V2
            } else {
                SchemaVersion::V1
            });
        }
        self.with_version_handling(move |manager| {
            let options = options.clone();
            Box::pin(async move { manager.load_dashboard(&options).await })
        })
        .await
    }

    /// Reload the shown dashboard
    ///
    /// # Errors
    ///
    /// A mismatch that persisted after the retry.
    pub async fn reload_dashboard(&self, params: ReloadParams) -> LoadResult<()> {
        self.with_version_handling(move |manager| {
            let params = params.clone();
            Box::pin(async move { manager.reload_dashboard(&params).await })
        })
        .await
    }

    /// Load a snapshot
    ///
    /// # Errors
    ///
    /// A mismatch that persisted after the retry.
    pub async fn load_snapshot(&self, key: &str) -> LoadResult<()> {
        let key = key.to_string();
        self.with_version_handling(move |manager| {
            let key = key.clone();
            Box::pin(async move { manager.load_snapshot(&key).await })
        })
        .await
    }

    /// Fetch a document; a v2 document makes the v2 manager active
    ///
    /// # Errors
    ///
    /// Store and reshape failures.
    pub async fn fetch_dashboard(&self, options: LoadOptions) -> LoadResult<Option<RawDocument>> {
        let document = self
            .with_version_handling(move |manager| {
                let options = options.clone();
                Box::pin(async move { manager.fetch_dashboard(&options).await })
            })
            .await?;
        if let Some(RawDocument::V2(_)) = &document {
            self.set_active_manager(SchemaVersion::V2);
        }
        Ok(document)
    }

    /// Build a scene with the manager matching the document
    ///
    /// # Errors
    ///
    /// Transform failures.
    pub async fn transform_response_to_scene(
        &self,
        document: RawDocument,
        options: &LoadOptions,
    ) -> LoadResult<Arc<DashboardScene>> {
        let version = document.schema_version();
        self.set_active_manager(version);
        self.manager(version)
            .transform_response_to_scene(document, options)
            .await
    }

    #[must_use]
    pub fn get_dashboard_from_cache(&self, key: &str) -> Option<RawDocument> {
        self.active().get_dashboard_from_cache(key)
    }

    pub fn set_dashboard_cache(&self, key: &str, document: RawDocument) {
        self.manager(document.schema_version())
            .set_dashboard_cache(key, document);
    }

    pub fn clear_dashboard_cache(&self) {
        for manager in self.managers() {
            manager.clear_dashboard_cache();
        }
    }

    pub async fn get_scene_from_cache(&self, identity: &str) -> Option<Arc<DashboardScene>> {
        self.active().get_scene_from_cache(identity).await
    }

    pub async fn set_scene_cache(&self, identity: &str, scene: Arc<DashboardScene>) {
        self.active().set_scene_cache(identity, scene).await;
    }

    pub async fn remove_scene_from_cache(&self, identity: &str) {
        for manager in self.managers() {
            manager.remove_scene_from_cache(identity).await;
        }
    }

    pub fn clear_scene_cache(&self) {
        for manager in self.managers() {
            manager.clear_scene_cache();
        }
    }

    pub fn clear_state(&self) {
        for manager in self.managers() {
            manager.clear_state();
        }
        self.state.send_replace(ManagerState::default());
    }

    #[must_use]
    pub fn state(&self) -> ManagerState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ManagerState> {
        self.state.subscribe()
    }
}

#[async_trait]
impl DashboardReloader for UnifiedDashboardPageStateManager {
    async fn reload_dashboard(&self, params: ReloadParams) -> LoadResult<()> {
        UnifiedDashboardPageStateManager::reload_dashboard(self, params).await
    }
}
