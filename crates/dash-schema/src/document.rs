//! Version-tagged persisted document and shape classification

use crate::error::{SchemaError, SchemaResult};
use crate::resource::DashboardResource;
use crate::v1::{DashboardDto, LooseObject};
use crate::version::{Fingerprint, SchemaVersion};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A persisted dashboard in one of the two schema generations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDocument {
    V1(DashboardDto),
    V2(DashboardResource),
}

/// `{dashboard: {..}}` without an `apiVersion`
#[must_use]
pub fn is_v1_shape(value: &Value) -> bool {
    value.object_field("dashboard").is_some() && value.get("apiVersion").is_none()
}

/// `{apiVersion, metadata: {..}, spec: {..}}` without a `dashboard`
#[must_use]
pub fn is_v2_shape(value: &Value) -> bool {
    value.str_field("apiVersion").is_some()
        && value.object_field("metadata").is_some()
        && value.object_field("spec").is_some()
        && value.get("dashboard").is_none()
}

/// Bare v2 spec: carries `elements` and `layout`
#[must_use]
pub fn is_v2_spec(value: &Value) -> bool {
    value.object_field("elements").is_some() && value.object_field("layout").is_some()
}

impl RawDocument {
    /// Classify and parse a JSON payload
    ///
    /// # Errors
    ///
    /// `UnrecognizedShape` when the payload matches neither shape, `Json`
    /// when it matches a shape but its typed parts do not parse.
    pub fn from_value(value: Value) -> SchemaResult<Self> {
        if is_v2_shape(&value) {
            return Ok(Self::V2(serde_json::from_value(value)?));
        }
        if is_v1_shape(&value) {
            return Ok(Self::V1(serde_json::from_value(value)?));
        }
        let keys = value
            .as_object()
            .map(|o| o.keys().cloned().collect::<Vec<_>>().join(", "))
            .unwrap_or_else(|| "non-object".to_string());
        tracing::debug!(keys = %keys, "document matches neither v1 nor v2 shape");
        Err(SchemaError::unrecognized(format!("top-level keys: [{keys}]")))
    }

    /// Parse JSON text
    ///
    /// # Errors
    ///
    /// See [`RawDocument::from_value`].
    pub fn from_json(text: &str) -> SchemaResult<Self> {
        Self::from_value(serde_json::from_str(text)?)
    }

    /// Schema generation of this document
    #[must_use]
    pub fn schema_version(&self) -> SchemaVersion {
        match self {
            Self::V1(_) => SchemaVersion::V1,
            Self::V2(_) => SchemaVersion::V2,
        }
    }

    /// Stable identity: uid for v1, resource name for v2
    #[must_use]
    pub fn identity(&self) -> &str {
        match self {
            Self::V1(dto) => dto.uid(),
            Self::V2(res) => &res.metadata.name,
        }
    }

    /// Version number shown on the scene
    #[must_use]
    pub fn version(&self) -> i64 {
        self.fingerprint().version()
    }

    /// Value compared against a cached scene
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        match self {
            Self::V1(dto) => Fingerprint::Legacy {
                version: dto.version(),
                created: dto.meta.created.clone(),
            },
            Self::V2(res) => Fingerprint::Resource {
                generation: res.generation(),
            },
        }
    }

    /// Canonical URL the server reported for this document
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::V1(dto) => dto.meta.url.as_deref(),
            Self::V2(res) => res.access.url.as_deref(),
        }
    }

    /// Folder uid of the document
    #[must_use]
    pub fn folder_uid(&self) -> Option<&str> {
        match self {
            Self::V1(dto) => dto.meta.folder_uid.as_deref(),
            Self::V2(res) => res.metadata.folder(),
        }
    }

    /// Whether the dashboard asks to be re-fetched when params change
    #[must_use]
    pub fn reload_on_params_change(&self) -> bool {
        match self {
            Self::V1(dto) => dto.meta.reload_on_params_change,
            Self::V2(res) => res.access.reload_on_params_change,
        }
    }

    /// Serialize back to JSON
    ///
    /// # Errors
    ///
    /// Propagates serializer failures.
    pub fn to_value(&self) -> SchemaResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl From<DashboardDto> for RawDocument {
    fn from(dto: DashboardDto) -> Self {
        Self::V1(dto)
    }
}

impl From<DashboardResource> for RawDocument {
    fn from(res: DashboardResource) -> Self {
        Self::V2(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ObjectMeta;
    use crate::v1::DashboardMeta;
    use serde_json::json;

    #[test]
    fn classify_v1() {
        let doc = RawDocument::from_value(json!({
            "dashboard": {"uid": "d1", "version": 3},
            "meta": {"created": "t0", "url": "/d/d1/slug"}
        }))
        .unwrap();

        assert_eq!(doc.schema_version(), SchemaVersion::V1);
        assert_eq!(doc.identity(), "d1");
        assert_eq!(
            doc.fingerprint(),
            Fingerprint::Legacy { version: 3, created: Some("t0".into()) }
        );
        assert_eq!(doc.url(), Some("/d/d1/slug"));
    }

    #[test]
    fn classify_v2() {
        let doc = RawDocument::from_value(json!({
            "apiVersion": "dashboard.grafana.app/v2alpha1",
            "kind": "DashboardWithAccessInfo",
            "metadata": {"name": "d2", "generation": 5, "annotations": {"grafana.app/folder": "f1"}},
            "spec": {"title": "x"},
            "access": {"url": "/d/d2"}
        }))
        .unwrap();

        assert_eq!(doc.schema_version(), SchemaVersion::V2);
        assert_eq!(doc.identity(), "d2");
        assert_eq!(doc.version(), 5);
        assert_eq!(doc.folder_uid(), Some("f1"));
    }

    #[test]
    fn ambiguous_and_unknown_shapes_rejected() {
        let both = json!({
            "apiVersion": "v2alpha1",
            "metadata": {},
            "spec": {},
            "dashboard": {}
        });
        assert!(!is_v1_shape(&both));
        assert!(!is_v2_shape(&both));
        assert!(matches!(
            RawDocument::from_value(both),
            Err(SchemaError::UnrecognizedShape(_))
        ));
        assert!(RawDocument::from_value(json!([1, 2])).is_err());
    }

    #[test]
    fn serializes_back_to_original_shape() {
        let v1 = RawDocument::from(DashboardDto::new(json!({"uid": "a"}), DashboardMeta::default()));
        assert!(is_v1_shape(&v1.to_value().unwrap()));

        let v2 = RawDocument::from(DashboardResource::new(ObjectMeta::named("b"), json!({})));
        assert!(is_v2_shape(&v2.to_value().unwrap()));
    }

    #[test]
    fn bare_spec_detection() {
        assert!(is_v2_spec(&json!({"elements": {}, "layout": {"kind": "GridLayout"}})));
        assert!(!is_v2_spec(&json!({"panels": []})));
    }
}
