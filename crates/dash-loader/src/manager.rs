//! Per-version page state managers
//!
//! One manager per schema generation, each with its own document cache,
//! scene cache and published state. The generation is a type parameter:
//! [`DashboardPageStateManagerV1`] fetches through the v1 API and
//! [`DashboardPageStateManagerV2`] through the v2 API. A document that the
//! backend stores in the other generation surfaces as a
//! [`VersionMismatch`] for the unified manager to act on.
//!
//! Load flow: publish `Loading` (dropping the shown dashboard), fetch,
//! transform, publish `Loaded` or `Error`. A load that was overtaken by a
//! newer load or reload on the same manager does not publish.

use crate::cache::{DocumentCache, SceneCache};
use crate::config::LoaderConfig;
use crate::error::{LoadError, LoadErrorInfo, LoadResult, MismatchSignal, StoreError, VersionMismatch};
use crate::options::{LoadOptions, ReloadParams, Route};
use crate::phase::validate_transition;
use crate::provisioning::reshape_preview;
use crate::state::ManagerState;
use crate::store::{DocumentStore, FetchOutcome, FetchRequest, KeyValueStore, LocationService};
use async_trait::async_trait;
use dash_scene::DashboardScene;
use dash_schema::{
    is_v1_shape, is_v2_shape, AccessInfo, DashboardDto, DashboardMeta, DashboardResource,
    ObjectMeta, RawDocument, SchemaError, SchemaVersion,
};
use dash_transform::{document_to_scene, TransformOptions};
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Local storage key holding a dashboard stashed for the new route
pub const STASHED_DASHBOARD_KEY: &str = "DASHBOARD_FROM_LS_KEY";

/// Schema generation served by a manager
pub trait SchemaMarker: Send + Sync + 'static {
    const VERSION: SchemaVersion;

    /// Reject documents of the other generation
    ///
    /// # Errors
    ///
    /// The mismatch naming the document's generation.
    fn check(document: &RawDocument) -> Result<(), VersionMismatch> {
        let found = document.schema_version();
        if found == Self::VERSION {
            Ok(())
        } else {
            Err(VersionMismatch::new(found))
        }
    }
}

/// Legacy generation marker
#[derive(Debug, Clone, Copy)]
pub struct V1Schema;

/// Resource generation marker
#[derive(Debug, Clone, Copy)]
pub struct V2Schema;

impl SchemaMarker for V1Schema {
    const VERSION: SchemaVersion = SchemaVersion::V1;
}

impl SchemaMarker for V2Schema {
    const VERSION: SchemaVersion = SchemaVersion::V2;
}

/// External services shared by the managers
#[derive(Clone)]
pub struct LoaderServices {
    pub store: Arc<dyn DocumentStore>,
    pub location: Arc<dyn LocationService>,
    pub kv: Arc<dyn KeyValueStore>,
}

impl LoaderServices {
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        location: Arc<dyn LocationService>,
        kv: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self { store, location, kv }
    }
}

impl fmt::Debug for LoaderServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderServices").finish_non_exhaustive()
    }
}

/// Operations shared by both generations
#[async_trait]
pub trait DashboardPageManager: Send + Sync {
    /// Generation this manager serves
    fn version(&self) -> SchemaVersion;

    /// Load and publish a dashboard
    ///
    /// Failures are published as `load_error`; only a version mismatch is
    /// also returned.
    async fn load_dashboard(&self, options: &LoadOptions) -> LoadResult<()>;

    /// Re-fetch the shown dashboard, replacing it only when it changed
    async fn reload_dashboard(&self, params: &ReloadParams) -> LoadResult<()>;

    async fn load_snapshot(&self, key: &str) -> LoadResult<()>;

    /// Fetch a document, through the document cache where the route allows
    ///
    /// `Ok(None)` for redirects and cancelled requests.
    async fn fetch_dashboard(&self, options: &LoadOptions) -> LoadResult<Option<RawDocument>>;

    /// Cached scene when the fingerprint matches, otherwise a fresh one
    async fn transform_response_to_scene(
        &self,
        document: RawDocument,
        options: &LoadOptions,
    ) -> LoadResult<Arc<DashboardScene>>;

    fn get_dashboard_from_cache(&self, key: &str) -> Option<RawDocument>;
    fn set_dashboard_cache(&self, key: &str, document: RawDocument);
    fn clear_dashboard_cache(&self);

    async fn get_scene_from_cache(&self, identity: &str) -> Option<Arc<DashboardScene>>;
    async fn set_scene_cache(&self, identity: &str, scene: Arc<DashboardScene>);
    async fn remove_scene_from_cache(&self, identity: &str);
    fn clear_scene_cache(&self);

    /// Back to `Idle` with nothing shown
    fn clear_state(&self);
    fn state(&self) -> ManagerState;
    fn subscribe(&self) -> watch::Receiver<ManagerState>;
}

/// Page state manager for one schema generation
pub struct PageStateManager<V: SchemaMarker> {
    services: LoaderServices,
    config: LoaderConfig,
    documents: DocumentCache,
    scenes: SceneCache,
    state: watch::Sender<ManagerState>,
    load_seq: AtomicU64,
    _schema: PhantomData<V>,
}

/// Manager for legacy documents
pub type DashboardPageStateManagerV1 = PageStateManager<V1Schema>;
/// Manager for resource documents
pub type DashboardPageStateManagerV2 = PageStateManager<V2Schema>;

impl<V: SchemaMarker> fmt::Debug for PageStateManager<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageStateManager")
            .field("version", &V::VERSION)
            .field("config", &self.config)
            .field("phase", &self.state.borrow().phase)
            .finish_non_exhaustive()
    }
}

impl<V: SchemaMarker> PageStateManager<V> {
    #[must_use]
    pub fn new(services: LoaderServices, config: LoaderConfig) -> Self {
        let (state, _) = watch::channel(ManagerState::default());
        Self {
            documents: DocumentCache::new(config.document_cache_ttl()),
            scenes: SceneCache::new(config.scene_cache_capacity),
            services,
            config,
            state,
            load_seq: AtomicU64::new(0),
            _schema: PhantomData,
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    fn transform_options(&self) -> TransformOptions {
        self.config.transform_options()
    }

    fn publish(&self, next: ManagerState) {
        let from = self.state.borrow().phase;
        if let Err(err) = validate_transition(from, next.phase) {
            tracing::warn!(version = %V::VERSION, error = %err, "unexpected phase change");
        }
        self.state.send_replace(next);
    }

    fn begin(&self) -> u64 {
        self.load_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, seq: u64) -> bool {
        self.load_seq.load(Ordering::SeqCst) == seq
    }

    /// Publish the outcome of a load; only mismatches are returned
    fn finish(&self, seq: u64, result: LoadResult<Option<Arc<DashboardScene>>>) -> LoadResult<()> {
        if !self.is_current(seq) {
            tracing::debug!(version = %V::VERSION, "superseded load discarded");
            return Ok(());
        }
        match result {
            Ok(scene) => {
                if let Some(scene) = &scene {
                    tracing::info!(uid = %scene.uid(), version = %V::VERSION, "dashboard loaded");
                }
                self.publish(ManagerState::loaded(scene));
                Ok(())
            }
            Err(err) => {
                self.publish(ManagerState::failed(LoadErrorInfo::from(&err)));
                if err.version_mismatch().is_some() {
                    tracing::info!(version = %V::VERSION, error = %err, "dashboard stored in other schema");
                    Err(err)
                } else {
                    tracing::error!(version = %V::VERSION, error = %err, "dashboard load failed");
                    Ok(())
                }
            }
        }
    }

    /// Publish the outcome of a background reload. The shown scene stays on
    /// screen when the refetch fails, and nothing is published when the
    /// refetch changed nothing.
    fn settle_reload(
        &self,
        seq: u64,
        current: &Arc<DashboardScene>,
        result: LoadResult<Arc<DashboardScene>>,
    ) -> LoadResult<()> {
        if !self.is_current(seq) {
            tracing::debug!(version = %V::VERSION, "superseded reload discarded");
            return Ok(());
        }
        let next = match &result {
            Ok(scene) => ManagerState::loaded(Some(Arc::clone(scene))),
            Err(err) => {
                ManagerState::failed(LoadErrorInfo::from(err)).with_dashboard(Some(Arc::clone(current)))
            }
        };
        if !self.state.borrow().is_equivalent(&next) {
            self.publish(next);
        }
        match result {
            Ok(_) => Ok(()),
            Err(err) if err.version_mismatch().is_some() => {
                tracing::info!(version = %V::VERSION, error = %err, "dashboard stored in other schema");
                Err(err)
            }
            Err(err) => {
                tracing::error!(version = %V::VERSION, error = %err, "dashboard reload failed");
                Ok(())
            }
        }
    }

    /// Follow a redirect, yielding the document otherwise
    fn follow(&self, outcome: FetchOutcome) -> Option<RawDocument> {
        match outcome {
            FetchOutcome::Document(document) => Some(document),
            FetchOutcome::Redirect { uri } => {
                tracing::info!(uri = %uri, "redirecting");
                self.services.location.replace(&uri);
                None
            }
        }
    }

    /// Point the location at the canonical URL, keeping the query string
    fn correct_url(&self, document: &RawDocument) {
        let Some(url) = document.url().filter(|u| !u.is_empty()) else {
            return;
        };
        let current = self.services.location.current_path();
        let (path, query) = match current.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (current.as_str(), None),
        };
        if path != url {
            let target = query.map_or_else(|| url.to_string(), |q| format!("{url}?{q}"));
            tracing::debug!(from = %path, to = %target, "correcting dashboard url");
            self.services.location.replace(&target);
        }
    }

    async fn fetch_home_document(&self) -> LoadResult<Option<RawDocument>> {
        let document = resolve(self.services.store.fetch_home().await)?.and_then(|o| self.follow(o));
        Ok(document.map(|mut document| {
            if let RawDocument::V1(dto) = &mut document {
                dto.meta.is_home = true;
            }
            document
        }))
    }

    async fn new_document(&self, options: &LoadOptions) -> LoadResult<Option<RawDocument>> {
        if let Some(text) = self.services.kv.take(STASHED_DASHBOARD_KEY) {
            match stashed_document(&text, V::VERSION) {
                Ok(document) => return Ok(Some(document)),
                Err(err) => tracing::warn!(error = %err, "ignoring stashed dashboard"),
            }
        }
        resolve(
            self.services
                .store
                .fetch_new_template(V::VERSION, options.folder_uid.as_deref())
                .await,
        )
    }

    async fn attach_folder(&self, scene: &DashboardScene) {
        let folder_uid = scene.read(|s| {
            s.meta
                .folder_title
                .is_none()
                .then(|| s.meta.folder_uid.clone())
                .flatten()
        });
        let Some(folder_uid) = folder_uid else {
            return;
        };
        match self.services.store.fetch_folder(&folder_uid).await {
            Ok(folder) => scene.update(|s| {
                s.meta.folder_title = Some(folder.title);
                s.meta.folder_url = folder.url;
            }),
            Err(err) => tracing::warn!(folder = %folder_uid, error = %err, "folder lookup failed"),
        }
    }

    async fn load_scene(&self, options: &LoadOptions) -> LoadResult<Option<Arc<DashboardScene>>> {
        let document = if matches!(options.route, Route::Home) {
            self.fetch_home_document().await?
        } else {
            self.fetch_dashboard(options).await?
        };
        let Some(document) = document else {
            return Ok(None);
        };
        let scene = self.transform_response_to_scene(document, options).await?;
        match options.route {
            Route::Embedded => scene.update(|s| s.meta.is_embedded = true),
            Route::Normal => self.attach_folder(&scene).await,
            _ => {}
        }
        Ok(Some(scene))
    }

    async fn reload_scene(
        &self,
        current: &Arc<DashboardScene>,
        uid: &str,
        params: &ReloadParams,
    ) -> LoadResult<Arc<DashboardScene>> {
        let request = FetchRequest {
            uid: uid.to_string(),
            slug: None,
            params: params.to_query(),
        };
        let outcome = resolve(self.services.store.fetch_dashboard(V::VERSION, &request).await)?;
        let Some(document) = outcome.and_then(|o| self.follow(o)) else {
            return Ok(Arc::clone(current));
        };
        V::check(&document)?;
        self.documents.set(uid, document.clone());

        let fingerprint = document.fingerprint();
        let cached = self.scenes.get(uid).await;
        let unchanged = current.fingerprint().as_ref() == Some(&fingerprint)
            && cached.map_or(true, |c| c.fingerprint().as_ref() == Some(&fingerprint));
        if unchanged {
            tracing::debug!(uid = %uid, "reload returned the shown version");
            return Ok(Arc::clone(current));
        }

        let scene = Arc::new(document_to_scene(&document, &self.transform_options())?);
        self.scenes.insert(uid, Arc::clone(&scene)).await;
        tracing::info!(uid = %uid, version = scene.version(), "dashboard reloaded");
        Ok(scene)
    }
}

#[async_trait]
impl<V: SchemaMarker> DashboardPageManager for PageStateManager<V> {
    fn version(&self) -> SchemaVersion {
        V::VERSION
    }

    async fn load_dashboard(&self, options: &LoadOptions) -> LoadResult<()> {
        let seq = self.begin();
        self.publish(ManagerState::loading());
        let result = self.load_scene(options).await;
        self.finish(seq, result)
    }

    async fn reload_dashboard(&self, params: &ReloadParams) -> LoadResult<()> {
        let current = self.state.borrow().dashboard.clone();
        let Some(current) = current else {
            return Ok(());
        };
        let uid = current.uid();
        if uid.is_empty() {
            return Ok(());
        }

        let seq = self.begin();
        let result = self.reload_scene(&current, &uid, params).await;
        self.settle_reload(seq, &current, result)
    }

    async fn load_snapshot(&self, key: &str) -> LoadResult<()> {
        let seq = self.begin();
        self.publish(ManagerState::loading());
        let result = match resolve(self.services.store.fetch_snapshot(key).await) {
            Ok(Some(document)) => {
                let options = self.transform_options().with_snapshot(true);
                document_to_scene(&document, &options)
                    .map(|scene| Some(Arc::new(scene)))
                    .map_err(LoadError::from)
            }
            Ok(None) => Ok(None),
            Err(err) => Err(err),
        };
        self.finish(seq, result)
    }

    async fn fetch_dashboard(&self, options: &LoadOptions) -> LoadResult<Option<RawDocument>> {
        let key = options.cache_key();
        if let Some(document) = key.as_deref().and_then(|k| self.documents.get(k)) {
            tracing::debug!(key = ?key, "document cache hit");
            return Ok(Some(document));
        }

        let store = &self.services.store;
        let document = match &options.route {
            Route::Home => resolve(store.fetch_home().await)?.and_then(|o| self.follow(o)),
            Route::Normal | Route::Embedded => {
                if options.uid.is_empty() {
                    return Err(LoadError::invalid_options("dashboard uid is required"));
                }
                let request = FetchRequest {
                    uid: options.uid.clone(),
                    slug: None,
                    params: options.params.clone(),
                };
                resolve(store.fetch_dashboard(V::VERSION, &request).await)?.and_then(|o| self.follow(o))
            }
            Route::New => return self.new_document(options).await,
            Route::Provisioning(target) => resolve(
                store
                    .fetch_provisioning_preview(&target.repo, &target.path, target.git_ref.as_deref())
                    .await,
            )?
            .map(|preview| reshape_preview(&preview, V::VERSION))
            .transpose()?,
            Route::Public { access_token } => resolve(store.fetch_public(access_token).await)?,
        };
        let Some(mut document) = document else {
            return Ok(None);
        };

        if matches!(options.route, Route::Normal | Route::Embedded) {
            V::check(&document)?;
        }
        if let (Route::Embedded, RawDocument::V1(dto)) = (&options.route, &mut document) {
            dto.meta.is_embedded = true;
        }
        if let Some(key) = key {
            self.documents.set(key, document.clone());
        }
        if matches!(options.route, Route::Normal) {
            self.correct_url(&document);
        }
        Ok(Some(document))
    }

    async fn transform_response_to_scene(
        &self,
        document: RawDocument,
        options: &LoadOptions,
    ) -> LoadResult<Arc<DashboardScene>> {
        let identity = document.identity().to_string();
        let cacheable =
            !identity.is_empty() && !matches!(options.route, Route::New | Route::Home);

        if cacheable {
            if let Some(scene) = self.scenes.get(&identity).await {
                if scene.fingerprint() == Some(document.fingerprint()) {
                    tracing::debug!(uid = %identity, "scene cache hit");
                    return Ok(scene);
                }
            }
        }

        let scene = Arc::new(document_to_scene(&document, &self.transform_options())?);
        if cacheable {
            self.scenes.insert(identity, Arc::clone(&scene)).await;
        }
        Ok(scene)
    }

    fn get_dashboard_from_cache(&self, key: &str) -> Option<RawDocument> {
        self.documents.get(key)
    }

    fn set_dashboard_cache(&self, key: &str, document: RawDocument) {
        self.documents.set(key, document);
    }

    fn clear_dashboard_cache(&self) {
        self.documents.clear();
    }

    async fn get_scene_from_cache(&self, identity: &str) -> Option<Arc<DashboardScene>> {
        self.scenes.get(identity).await
    }

    async fn set_scene_cache(&self, identity: &str, scene: Arc<DashboardScene>) {
        self.scenes.insert(identity, scene).await;
    }

    async fn remove_scene_from_cache(&self, identity: &str) {
        self.scenes.remove(identity).await;
    }

    fn clear_scene_cache(&self) {
        self.scenes.clear();
    }

    fn clear_state(&self) {
        self.begin();
        self.state.send_replace(ManagerState::default());
    }

    fn state(&self) -> ManagerState {
        self.state.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<ManagerState> {
        self.state.subscribe()
    }
}

/// Cancellation resolves to "nothing"; everything else becomes a load error
fn resolve<T>(result: Result<T, StoreError>) -> LoadResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(StoreError::Cancelled) => {
            tracing::debug!("fetch cancelled");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

/// Turn a stashed JSON document into a new, unsaved document
fn stashed_document(text: &str, version: SchemaVersion) -> Result<RawDocument, SchemaError> {
    let value: Value = serde_json::from_str(text)?;
    if is_v1_shape(&value) || is_v2_shape(&value) {
        let mut document = RawDocument::from_value(value)?;
        if let RawDocument::V1(dto) = &mut document {
            dto.meta.is_new = true;
        }
        return Ok(document);
    }
    if !value.is_object() {
        return Err(SchemaError::unrecognized("stashed dashboard is not an object"));
    }
    Ok(match version {
        SchemaVersion::V1 => RawDocument::V1(DashboardDto::new(
            value,
            DashboardMeta {
                can_save: true,
                can_edit: true,
                is_new: true,
                ..DashboardMeta::default()
            },
        )),
        SchemaVersion::V2 => RawDocument::V2(
            DashboardResource::new(ObjectMeta::default(), value).with_access(AccessInfo {
                can_save: true,
                can_edit: true,
                ..AccessInfo::default()
            }),
        ),
    })
}
