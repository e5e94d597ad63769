//! Structured (v2) dashboard resource envelope

use crate::version::SchemaVersion;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Annotation naming the folder a resource lives in
pub const ANNO_FOLDER: &str = "grafana.app/folder";
/// Annotation naming the kind of manager that owns a resource
pub const ANNO_MANAGED_BY: &str = "grafana.app/managedBy";
/// Annotation naming the concrete manager instance
pub const ANNO_MANAGER_ID: &str = "grafana.app/managerId";
/// Annotation holding the source file path of a managed resource
pub const ANNO_SOURCE_PATH: &str = "grafana.app/sourcePath";
/// Annotation holding the checksum of the managed source file
pub const ANNO_SOURCE_CHECKSUM: &str = "grafana.app/sourceChecksum";
/// Annotation holding the last update time
pub const ANNO_UPDATED_TIMESTAMP: &str = "grafana.app/updatedTimestamp";
/// Annotation holding the creator
pub const ANNO_CREATED_BY: &str = "grafana.app/createdBy";

/// Kubernetes-style object metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Resource name; the dashboard identity
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl ObjectMeta {
    /// Metadata with only a name
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder: set generation
    #[inline]
    #[must_use]
    pub fn with_generation(mut self, generation: i64) -> Self {
        self.generation = Some(generation);
        self
    }

    /// Builder: add annotation
    #[must_use]
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Folder uid from annotations
    #[must_use]
    pub fn folder(&self) -> Option<&str> {
        self.annotations.get(ANNO_FOLDER).map(String::as_str)
    }
}

/// Access information returned alongside a v2 resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct AccessInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub can_save: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_share: bool,
    pub can_star: bool,
    pub can_admin: bool,
    pub is_public: bool,
    pub reload_on_params_change: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations_permissions: Option<Value>,
}

/// v2 document: `DashboardWithAccessInfo`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResource {
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    pub metadata: ObjectMeta,
    /// Dashboard spec, kept as JSON so each element can be read in isolation
    pub spec: Value,
    #[serde(default)]
    pub access: AccessInfo,
}

impl DashboardResource {
    /// Default api version written by this crate
    pub const API_VERSION: &'static str = "v2alpha1";
    /// Kind used for access-annotated responses
    pub const KIND: &'static str = "DashboardWithAccessInfo";

    /// Create resource from metadata and spec
    #[must_use]
    pub fn new(metadata: ObjectMeta, spec: Value) -> Self {
        Self {
            api_version: Self::API_VERSION.to_string(),
            kind: Self::KIND.to_string(),
            metadata,
            spec,
            access: AccessInfo::default(),
        }
    }

    /// Builder: set access info
    #[must_use]
    pub fn with_access(mut self, access: AccessInfo) -> Self {
        self.access = access;
        self
    }

    /// Schema generation implied by `apiVersion`
    #[inline]
    #[must_use]
    pub fn schema_version(&self) -> SchemaVersion {
        SchemaVersion::from_api_version(&self.api_version)
    }

    /// Resource generation, 0 when absent
    #[inline]
    #[must_use]
    pub fn generation(&self) -> i64 {
        self.metadata.generation.unwrap_or(0)
    }
}
