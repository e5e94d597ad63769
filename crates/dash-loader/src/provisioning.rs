//! Provisioning preview reshape
//!
//! A repository file preview carries the resource as it would be written
//! (`dryRun`). It is turned into a regular document of the requested
//! generation, with the management annotations set so the scene knows the
//! dashboard is owned by a repository.

use crate::error::{LoadError, LoadResult};
use crate::store::ProvisioningPreview;
use dash_schema::resource::{
    ANNO_MANAGED_BY, ANNO_MANAGER_ID, ANNO_SOURCE_CHECKSUM, ANNO_SOURCE_PATH, ANNO_UPDATED_TIMESTAMP,
};
use dash_schema::{
    canonicalize, AccessInfo, DashboardDto, DashboardMeta, DashboardResource, LooseObject,
    ObjectMeta, RawDocument, SchemaVersion,
};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

/// `managedBy` value for repository-owned dashboards
pub const MANAGER_KIND_REPO: &str = "repo";

/// Hex sha256 of the canonical JSON form
#[must_use]
pub fn spec_checksum(spec: &Value) -> String {
    hex::encode(Sha256::digest(canonicalize(spec).to_string().as_bytes()))
}

/// Reshape a preview into a document of the given generation
///
/// # Errors
///
/// `Provisioning` when the dry run has no object `spec` or its metadata
/// does not parse.
pub fn reshape_preview(preview: &ProvisioningPreview, version: SchemaVersion) -> LoadResult<RawDocument> {
    let dry_run = &preview.dry_run;
    let spec = dry_run
        .object_field("spec")
        .map(|s| Value::Object(s.clone()))
        .ok_or_else(|| LoadError::provisioning(format!("{}: dry run has no spec", preview.path)))?;
    let metadata = dry_run.get("metadata").cloned().unwrap_or_else(|| json!({}));
    let mut metadata: ObjectMeta = serde_json::from_value(metadata)
        .map_err(|e| LoadError::provisioning(format!("{}: {e}", preview.path)))?;

    let checksum = preview.hash.clone().unwrap_or_else(|| spec_checksum(&spec));
    for (key, value) in [
        (ANNO_MANAGED_BY, MANAGER_KIND_REPO.to_string()),
        (ANNO_MANAGER_ID, preview.repository.name.clone()),
        (ANNO_SOURCE_PATH, preview.path.clone()),
        (ANNO_SOURCE_CHECKSUM, checksum),
    ] {
        metadata.annotations.insert(key.to_string(), value);
    }
    metadata
        .annotations
        .entry(ANNO_UPDATED_TIMESTAMP.to_string())
        .or_insert_with(|| chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true));

    tracing::debug!(
        repo = %preview.repository.name,
        path = %preview.path,
        version = %version,
        "reshaping provisioning preview"
    );

    Ok(match version {
        SchemaVersion::V1 => {
            let mut dashboard = spec;
            if let Some(body) = dashboard.as_object_mut() {
                body.entry("uid").or_insert_with(|| json!(metadata.name));
            }
            let meta = DashboardMeta {
                can_save: true,
                can_edit: true,
                can_share: true,
                provisioned: true,
                provisioned_external_id: Some(preview.path.clone()),
                folder_uid: metadata.folder().map(str::to_string),
                created: metadata.creation_timestamp.clone(),
                k8s: Some(metadata),
                ..DashboardMeta::default()
            };
            RawDocument::V1(DashboardDto::new(dashboard, meta))
        }
        SchemaVersion::V2 => {
            let mut resource = DashboardResource::new(metadata, spec).with_access(AccessInfo {
                can_save: true,
                can_edit: true,
                can_share: true,
                ..AccessInfo::default()
            });
            if let Some(api_version) = dry_run.str_field("apiVersion") {
                resource.api_version = api_version.to_string();
            }
            RawDocument::V2(resource)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RepositoryInfo;

    fn preview(hash: Option<&str>) -> ProvisioningPreview {
        ProvisioningPreview {
            path: "dash.json".into(),
            git_ref: Some("main".into()),
            hash: hash.map(str::to_string),
            repository: RepositoryInfo {
                name: "repo-1".into(),
                ..RepositoryInfo::default()
            },
            dry_run: json!({
                "apiVersion": "dashboard.grafana.app/v1beta1",
                "kind": "Dashboard",
                "metadata": {"name": "prov-1", "generation": 1, "creationTimestamp": "2025-04-09T07:27:46Z"},
                "spec": {"title": "Provisioned", "time": {"from": "now-1h", "to": "now"}}
            }),
        }
    }

    #[test]
    fn v1_reshape_injects_annotations() {
        let doc = reshape_preview(&preview(Some("abc")), SchemaVersion::V1).unwrap();
        let RawDocument::V1(dto) = doc else {
            panic!("expected v1");
        };
        assert_eq!(dto.uid(), "prov-1");
        assert!(dto.meta.provisioned);
        let annotations = &dto.meta.k8s.as_ref().unwrap().annotations;
        assert_eq!(annotations[ANNO_MANAGED_BY], "repo");
        assert_eq!(annotations[ANNO_MANAGER_ID], "repo-1");
        assert_eq!(annotations[ANNO_SOURCE_PATH], "dash.json");
        assert_eq!(annotations[ANNO_SOURCE_CHECKSUM], "abc");
        assert!(annotations.contains_key(ANNO_UPDATED_TIMESTAMP));
    }

    #[test]
    fn v2_reshape_computes_checksum() {
        let p = preview(None);
        let doc = reshape_preview(&p, SchemaVersion::V2).unwrap();
        let RawDocument::V2(resource) = doc else {
            panic!("expected v2");
        };
        assert_eq!(resource.metadata.name, "prov-1");
        assert_eq!(
            resource.metadata.annotations[ANNO_SOURCE_CHECKSUM],
            spec_checksum(&p.dry_run["spec"])
        );
        assert_eq!(spec_checksum(&json!({"a": 1})).len(), 64);
    }

    #[test]
    fn missing_spec_is_an_error() {
        let mut p = preview(None);
        p.dry_run = json!({"metadata": {}});
        assert!(matches!(
            reshape_preview(&p, SchemaVersion::V1),
            Err(LoadError::Provisioning(_))
        ));
    }
}
