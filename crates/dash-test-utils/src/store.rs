//! In-memory loader services that record every call

use async_trait::async_trait;
use dash_loader::{
    new_dashboard_template, DocumentStore, FetchOutcome, FetchRequest, FolderInfo, LocationService,
    ProvisioningPreview, StoreError,
};
use dash_schema::{RawDocument, SchemaVersion};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::time::Duration;

/// One call made against [`RecordingDocumentStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Dashboard {
        version: SchemaVersion,
        uid: String,
        params: Vec<(String, String)>,
    },
    Home,
    Public(String),
    Snapshot(String),
    Preview {
        repo: String,
        path: String,
    },
    Folder(String),
    NewTemplate(SchemaVersion),
}

/// Document store backed by maps, with per-uid failures, redirects and
/// delays
#[derive(Debug, Default)]
pub struct RecordingDocumentStore {
    dashboards: DashMap<String, RawDocument>,
    failures: DashMap<String, StoreError>,
    redirects: DashMap<String, String>,
    delays: DashMap<String, Duration>,
    home: Mutex<Option<Result<FetchOutcome, StoreError>>>,
    public: DashMap<String, RawDocument>,
    snapshots: DashMap<String, RawDocument>,
    previews: DashMap<String, ProvisioningPreview>,
    folders: DashMap<String, FolderInfo>,
    calls: Mutex<Vec<StoreCall>>,
}

impl RecordingDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or replace) a dashboard under its identity
    pub fn insert(&self, document: RawDocument) {
        self.dashboards.insert(document.identity().to_string(), document);
    }

    /// Make fetches of `uid` fail until [`Self::clear_failure`]
    pub fn fail(&self, uid: &str, error: StoreError) {
        self.failures.insert(uid.to_string(), error);
    }

    pub fn clear_failure(&self, uid: &str) {
        self.failures.remove(uid);
    }

    pub fn redirect(&self, uid: &str, uri: &str) {
        self.redirects.insert(uid.to_string(), uri.to_string());
    }

    /// Delay fetches of `uid`; pair with a paused tokio clock
    pub fn delay(&self, uid: &str, delay: Duration) {
        self.delays.insert(uid.to_string(), delay);
    }

    pub fn set_home(&self, outcome: Result<FetchOutcome, StoreError>) {
        *self.home.lock() = Some(outcome);
    }

    pub fn insert_public(&self, access_token: &str, document: RawDocument) {
        self.public.insert(access_token.to_string(), document);
    }

    pub fn insert_snapshot(&self, key: &str, document: RawDocument) {
        self.snapshots.insert(key.to_string(), document);
    }

    pub fn insert_preview(&self, repo: &str, path: &str, preview: ProvisioningPreview) {
        self.previews.insert(format!("{repo}/{path}"), preview);
    }

    pub fn insert_folder(&self, folder: FolderInfo) {
        self.folders.insert(folder.uid.clone(), folder);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    /// Number of dashboard fetches for `uid`, any version
    pub fn dashboard_fetches(&self, uid: &str) -> usize {
        self.count(|c| matches!(c, StoreCall::Dashboard { uid: u, .. } if u == uid))
    }

    pub fn count(&self, pred: impl Fn(&StoreCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl DocumentStore for RecordingDocumentStore {
    async fn fetch_dashboard(
        &self,
        version: SchemaVersion,
        request: &FetchRequest,
    ) -> Result<FetchOutcome, StoreError> {
        self.record(StoreCall::Dashboard {
            version,
            uid: request.uid.clone(),
            params: request.params.clone().into_iter().collect(),
        });
        let delay = self.delays.get(&request.uid).map(|d| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.failures.get(&request.uid) {
            return Err(err.clone());
        }
        if let Some(uri) = self.redirects.get(&request.uid) {
            return Ok(FetchOutcome::Redirect { uri: uri.clone() });
        }
        self.dashboards
            .get(&request.uid)
            .map(|d| FetchOutcome::Document(d.clone()))
            .ok_or_else(|| StoreError::NotFound(request.uid.clone()))
    }

    async fn fetch_home(&self) -> Result<FetchOutcome, StoreError> {
        self.record(StoreCall::Home);
        self.home
            .lock()
            .clone()
            .unwrap_or_else(|| Err(StoreError::NotFound("home".to_string())))
    }

    async fn fetch_public(&self, access_token: &str) -> Result<RawDocument, StoreError> {
        self.record(StoreCall::Public(access_token.to_string()));
        self.public
            .get(access_token)
            .map(|d| d.clone())
            .ok_or_else(|| StoreError::NotFound(access_token.to_string()))
    }

    async fn fetch_snapshot(&self, key: &str) -> Result<RawDocument, StoreError> {
        self.record(StoreCall::Snapshot(key.to_string()));
        self.snapshots
            .get(key)
            .map(|d| d.clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn fetch_provisioning_preview(
        &self,
        repo: &str,
        path: &str,
        _git_ref: Option<&str>,
    ) -> Result<ProvisioningPreview, StoreError> {
        self.record(StoreCall::Preview {
            repo: repo.to_string(),
            path: path.to_string(),
        });
        self.previews
            .get(&format!("{repo}/{path}"))
            .map(|p| p.clone())
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    async fn fetch_folder(&self, uid: &str) -> Result<FolderInfo, StoreError> {
        self.record(StoreCall::Folder(uid.to_string()));
        self.folders
            .get(uid)
            .map(|f| f.clone())
            .ok_or_else(|| StoreError::NotFound(uid.to_string()))
    }

    async fn fetch_new_template(
        &self,
        version: SchemaVersion,
        folder_uid: Option<&str>,
    ) -> Result<RawDocument, StoreError> {
        self.record(StoreCall::NewTemplate(version));
        new_dashboard_template(version, folder_uid)
    }
}

/// Location service holding a path and the list of replacements
#[derive(Debug, Default)]
pub struct RecordingLocationService {
    path: Mutex<String>,
    replaced: Mutex<Vec<String>>,
}

impl RecordingLocationService {
    pub fn at(path: &str) -> Self {
        Self {
            path: Mutex::new(path.to_string()),
            replaced: Mutex::default(),
        }
    }

    pub fn replacements(&self) -> Vec<String> {
        self.replaced.lock().clone()
    }
}

impl LocationService for RecordingLocationService {
    fn current_path(&self) -> String {
        self.path.lock().clone()
    }

    fn replace(&self, path: &str) {
        *self.path.lock() = path.to_string();
        self.replaced.lock().push(path.to_string());
    }
}
