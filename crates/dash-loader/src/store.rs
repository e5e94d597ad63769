//! External services the loader talks to
//!
//! - [`DocumentStore`]: the backend holding persisted dashboards
//! - [`LocationService`]: current route and navigation side effects
//! - [`KeyValueStore`]: browser-style local storage
//!
//! All three are traits so that tests and the CLI can run the managers
//! against in-memory implementations.

use crate::error::StoreError;
use async_trait::async_trait;
use dash_schema::v2::Spec;
use dash_schema::{
    DashboardDto, DashboardMeta, DashboardResource, ObjectMeta, RawDocument, SchemaVersion,
};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Title given to fresh dashboards
pub const NEW_DASHBOARD_TITLE: &str = "New dashboard";

/// Request for a dashboard by identity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchRequest {
    pub uid: String,
    pub slug: Option<String>,
    pub params: BTreeMap<String, String>,
}

impl FetchRequest {
    #[must_use]
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            ..Self::default()
        }
    }
}

/// Result of a dashboard fetch
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Document(RawDocument),
    /// The backend asked the client to navigate elsewhere
    Redirect { uri: String },
}

/// Repository owning a previewed file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub title: String,
}

/// Provisioning file preview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisioningPreview {
    pub path: String,
    #[serde(default, rename = "ref")]
    pub git_ref: Option<String>,
    /// Checksum of the file in the repository
    #[serde(default)]
    pub hash: Option<String>,
    pub repository: RepositoryInfo,
    /// The resource as it would be written, `{apiVersion, kind, metadata, spec}`
    #[serde(rename = "dryRun")]
    pub dry_run: Value,
}

/// Folder metadata used for navigation breadcrumbs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderInfo {
    pub uid: String,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Backend holding persisted dashboards
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a dashboard through the API of the given generation
    async fn fetch_dashboard(
        &self,
        version: SchemaVersion,
        request: &FetchRequest,
    ) -> Result<FetchOutcome, StoreError>;

    async fn fetch_home(&self) -> Result<FetchOutcome, StoreError>;

    async fn fetch_public(&self, access_token: &str) -> Result<RawDocument, StoreError>;

    async fn fetch_snapshot(&self, key: &str) -> Result<RawDocument, StoreError>;

    async fn fetch_provisioning_preview(
        &self,
        repo: &str,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<ProvisioningPreview, StoreError>;

    async fn fetch_folder(&self, uid: &str) -> Result<FolderInfo, StoreError>;

    /// Template for a brand new dashboard
    async fn fetch_new_template(
        &self,
        version: SchemaVersion,
        folder_uid: Option<&str>,
    ) -> Result<RawDocument, StoreError> {
        new_dashboard_template(version, folder_uid)
    }
}

/// Locally built template for a new dashboard
///
/// # Errors
///
/// Only if the default spec fails to serialize.
pub fn new_dashboard_template(
    version: SchemaVersion,
    folder_uid: Option<&str>,
) -> Result<RawDocument, StoreError> {
    match version {
        SchemaVersion::V1 => Ok(RawDocument::V1(DashboardDto::new(
            json!({
                "title": NEW_DASHBOARD_TITLE,
                "editable": true,
                "panels": [],
                "time": {"from": "now-6h", "to": "now"},
            }),
            DashboardMeta {
                can_save: true,
                can_edit: true,
                can_share: true,
                can_star: false,
                is_new: true,
                folder_uid: folder_uid.map(str::to_string),
                ..DashboardMeta::default()
            },
        ))),
        SchemaVersion::V2 => {
            let spec = Spec {
                title: NEW_DASHBOARD_TITLE.to_string(),
                ..Spec::default()
            };
            let spec = serde_json::to_value(spec).map_err(|e| StoreError::http(500, e.to_string()))?;
            let mut metadata = ObjectMeta::default();
            if let Some(folder) = folder_uid {
                metadata = metadata.with_annotation(dash_schema::resource::ANNO_FOLDER, folder);
            }
            let mut resource = DashboardResource::new(metadata, spec);
            resource.access.can_save = true;
            resource.access.can_edit = true;
            resource.access.can_share = true;
            Ok(RawDocument::V2(resource))
        }
    }
}

/// Current route and navigation
pub trait LocationService: Send + Sync {
    /// Path plus query of the current location
    fn current_path(&self) -> String;

    /// Replace the current location without a history entry
    fn replace(&self, path: &str);
}

/// String key/value storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn delete(&self, key: &str);

    /// Read and remove
    fn take(&self, key: &str) -> Option<String> {
        let value = self.get(key);
        self.delete(key);
        value
    }
}

/// In-memory [`KeyValueStore`]
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: DashMap<String, String>,
}

impl MemoryKeyValueStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    fn set(&self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn delete(&self, key: &str) {
        self.entries.remove(key);
    }

    fn take(&self, key: &str) -> Option<String> {
        self.entries.remove(key).map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_have_no_identity() {
        let v1 = new_dashboard_template(SchemaVersion::V1, Some("f1")).unwrap();
        assert_eq!(v1.identity(), "");
        assert_eq!(v1.folder_uid(), Some("f1"));

        let v2 = new_dashboard_template(SchemaVersion::V2, None).unwrap();
        assert_eq!(v2.schema_version(), SchemaVersion::V2);
        assert_eq!(v2.identity(), "");
        let RawDocument::V2(resource) = v2 else {
            panic!("expected a v2 template");
        };
        assert_eq!(resource.spec["title"], json!(NEW_DASHBOARD_TITLE));
    }

    #[test]
    fn memory_kv_take() {
        let kv = MemoryKeyValueStore::new();
        kv.set("k", "v".into());
        assert_eq!(kv.get("k").as_deref(), Some("v"));
        assert_eq!(kv.take("k").as_deref(), Some("v"));
        assert_eq!(kv.get("k"), None);
    }
}
