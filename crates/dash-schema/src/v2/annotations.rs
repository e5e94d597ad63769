//! Annotation queries

use super::elements::{DataQueryKind, DataSourceRef};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationQuerySpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasource: Option<DataSourceRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<DataQueryKind>,
    #[serde(default)]
    pub enable: bool,
    #[serde(default)]
    pub hide: bool,
    #[serde(default)]
    pub icon_color: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub built_in: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<AnnotationPanelFilter>,
    /// Datasource-specific properties the schema does not model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legacy_options: Option<Map<String, Value>>,
}

/// Panels an annotation layer applies to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationPanelFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<bool>,
    #[serde(default)]
    pub ids: Vec<u32>,
}

impl AnnotationPanelFilter {
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
