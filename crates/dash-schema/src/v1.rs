//! Legacy (v1) dashboard transfer object
//!
//! The `dashboard` body of a v1 document is kept as loose JSON: the legacy
//! schema went through dozens of migrations and older documents carry fields
//! in several spellings. Readers go through the [`LooseObject`] accessors
//! instead of a strict struct so one odd field never rejects a whole document.

use crate::resource::ObjectMeta;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// v1 document: dashboard body plus server-side metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardDto {
    /// Legacy dashboard body
    pub dashboard: Value,
    /// Permissions, folder, provenance
    #[serde(default)]
    pub meta: DashboardMeta,
}

impl DashboardDto {
    /// Create DTO from body and meta
    #[inline]
    #[must_use]
    pub fn new(dashboard: Value, meta: DashboardMeta) -> Self {
        Self { dashboard, meta }
    }

    /// Dashboard uid (empty for new and home dashboards)
    #[must_use]
    pub fn uid(&self) -> &str {
        self.dashboard.str_field("uid").unwrap_or_default()
    }

    /// Dashboard version counter
    #[must_use]
    pub fn version(&self) -> i64 {
        self.dashboard.i64_field("version").unwrap_or(0)
    }
}

/// Server-side metadata attached to a v1 document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct DashboardMeta {
    pub can_save: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_share: bool,
    pub can_star: bool,
    pub can_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    pub is_snapshot: bool,
    pub is_new: bool,
    pub is_embedded: bool,
    pub is_starred: bool,
    pub is_home: bool,
    pub provisioned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioned_external_id: Option<String>,
    pub public_dashboard_enabled: bool,
    pub reload_on_params_change: bool,
    /// Resource metadata when the DTO was reshaped from a k8s-style resource
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k8s: Option<ObjectMeta>,
    /// Keys this model does not know about, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Lenient accessors over legacy JSON objects
pub trait LooseObject {
    /// String field, `None` when absent or not a string
    fn str_field(&self, key: &str) -> Option<&str>;
    /// Integer field; accepts floats and numeric strings
    fn i64_field(&self, key: &str) -> Option<i64>;
    /// Boolean field, `None` when absent or not a bool
    fn bool_field(&self, key: &str) -> Option<bool>;
    /// Object field
    fn object_field(&self, key: &str) -> Option<&Map<String, Value>>;
    /// Array field
    fn array_field(&self, key: &str) -> Option<&Vec<Value>>;
}

impl LooseObject for Value {
    fn str_field(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn i64_field(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn bool_field(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    fn object_field(&self, key: &str) -> Option<&Map<String, Value>> {
        self.get(key).and_then(Value::as_object)
    }

    fn array_field(&self, key: &str) -> Option<&Vec<Value>> {
        self.get(key).and_then(Value::as_array)
    }
}

/// Non-empty string field, owned
#[must_use]
pub fn non_empty(value: &Value, key: &str) -> Option<String> {
    value
        .str_field(key)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
