//! Server metadata -> scene metadata

use dash_scene::SceneMeta;
use dash_schema::{DashboardMeta, DashboardResource};

#[must_use]
pub fn meta_from_v1(meta: &DashboardMeta) -> SceneMeta {
    SceneMeta {
        can_save: meta.can_save,
        can_edit: meta.can_edit,
        can_delete: meta.can_delete,
        can_share: meta.can_share,
        can_star: meta.can_star,
        can_admin: meta.can_admin,
        slug: meta.slug.clone(),
        url: meta.url.clone(),
        folder_uid: meta.folder_uid.clone(),
        folder_title: meta.folder_title.clone(),
        folder_url: meta.folder_url.clone(),
        created: meta.created.clone(),
        is_snapshot: meta.is_snapshot,
        is_new: meta.is_new,
        is_embedded: meta.is_embedded,
        is_home: meta.is_home,
        is_public: meta.public_dashboard_enabled,
        provisioned: meta.provisioned,
        reload_on_params_change: meta.reload_on_params_change,
        api_version: None,
        kind: None,
        k8s: meta.k8s.clone(),
    }
}

/// Resource metadata and access info; the folder comes from the
/// `grafana.app/folder` annotation
#[must_use]
pub fn meta_from_resource(resource: &DashboardResource) -> SceneMeta {
    let access = &resource.access;
    SceneMeta {
        can_save: access.can_save,
        can_edit: access.can_edit,
        can_delete: access.can_delete,
        can_share: access.can_share,
        can_star: access.can_star,
        can_admin: access.can_admin,
        slug: access.slug.clone(),
        url: access.url.clone(),
        folder_uid: resource.metadata.folder().map(str::to_string),
        created: resource.metadata.creation_timestamp.clone(),
        is_public: access.is_public,
        reload_on_params_change: access.reload_on_params_change,
        api_version: Some(resource.api_version.clone()),
        kind: Some(resource.kind.clone()),
        k8s: Some(resource.metadata.clone()),
        ..SceneMeta::default()
    }
}
