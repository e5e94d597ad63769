//! Edit-as-code and programmatic spec-apply boundaries
//!
//! Both rebuild the scene state from a v2 spec and swap it into the live
//! scene, so the scene instance (and anything holding it) survives. The
//! uid, version, fingerprint and server metadata of the open dashboard are
//! kept; only the content changes.

use crate::error::SpecApplyError;
use dash_scene::DashboardScene;
use dash_schema::{canonicalize, is_v2_shape, ObjectMeta};
use dash_transform::{attach_meta, v2, validate_spec, TransformOptions, TransformResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of an edit-as-code submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonEditOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JsonEditOutcome {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(error: impl ToString) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
        }
    }
}

/// Apply JSON text holding a v2 spec or a full v2 resource
///
/// Never fails: problems come back in the outcome so the caller keeps its
/// edit buffer.
pub fn apply_json_edit(scene: &DashboardScene, text: &str) -> JsonEditOutcome {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(err) => return JsonEditOutcome::failed(format!("invalid json: {err}")),
    };
    let spec = if is_v2_shape(&value) {
        value.get("spec").cloned().unwrap_or_default()
    } else {
        value
    };
    match replace_spec(scene, &spec) {
        Ok(()) => JsonEditOutcome::ok(),
        Err(err) => {
            tracing::debug!(uid = %scene.uid(), error = %err, "json edit rejected");
            JsonEditOutcome::failed(err)
        }
    }
}

/// Apply a full resource whose identity must match the open dashboard
///
/// # Errors
///
/// `IdentityChanged` when `apiVersion`, `kind` or `metadata` differ from the
/// open dashboard, `InvalidResource` when there is no `spec`, `Transform`
/// when the spec does not validate.
pub fn apply_resource(scene: &DashboardScene, resource: &Value) -> Result<(), SpecApplyError> {
    let payload = resource
        .as_object()
        .ok_or_else(|| SpecApplyError::InvalidResource("resource must be an object".to_string()))?;

    let (api_version, kind, metadata) = scene.read(|s| {
        (
            s.meta.api_version.clone(),
            s.meta.kind.clone(),
            s.meta.k8s.clone().unwrap_or_else(|| ObjectMeta::named(s.uid.clone())),
        )
    });

    if let Some(value) = payload.get("apiVersion") {
        if value.as_str() != api_version.as_deref() {
            return Err(SpecApplyError::IdentityChanged("apiVersion"));
        }
    }
    if let Some(value) = payload.get("kind") {
        if value.as_str() != kind.as_deref() {
            return Err(SpecApplyError::IdentityChanged("kind"));
        }
    }
    if let Some(value) = payload.get("metadata") {
        let current = serde_json::to_value(&metadata)
            .map_err(|e| SpecApplyError::InvalidResource(e.to_string()))?;
        if canonicalize(value) != canonicalize(&current) {
            return Err(SpecApplyError::IdentityChanged("metadata"));
        }
    }

    let spec = payload
        .get("spec")
        .ok_or_else(|| SpecApplyError::InvalidResource("resource has no spec".to_string()))?;
    replace_spec(scene, spec)?;
    Ok(())
}

fn replace_spec(scene: &DashboardScene, spec: &Value) -> TransformResult<()> {
    validate_spec(spec)?;
    let snapshot = scene.read(|s| s.meta.is_snapshot);
    let mut next = v2::state_from_spec(spec, &TransformOptions::new().with_snapshot(snapshot))?;
    scene.read(|current| {
        next.uid.clone_from(&current.uid);
        next.version = current.version;
        next.fingerprint.clone_from(&current.fingerprint);
        next.scopes.clone_from(&current.scopes);
        next.is_editing = current.is_editing;
        attach_meta(&mut next, current.meta.clone());
    });
    next.is_dirty = true;
    scene.replace_state(next);
    tracing::debug!(uid = %scene.uid(), "scene rebuilt from spec");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_scene::{DashboardState, SceneMeta, SceneTimeRange};
    use serde_json::json;

    fn spec(title: &str) -> Value {
        json!({
            "annotations": [],
            "cursorSync": "Crosshair",
            "elements": {},
            "layout": {"kind": "GridLayout", "spec": {"items": []}},
            "links": [],
            "preload": false,
            "tags": ["edited"],
            "timeSettings": {
                "from": "now-12h", "to": "now", "autoRefresh": "",
                "autoRefreshIntervals": [], "hideTimepicker": false, "fiscalYearStartMonth": 0
            },
            "title": title,
            "variables": []
        })
    }

    fn open_scene() -> DashboardScene {
        DashboardScene::new(DashboardState {
            uid: "d1".into(),
            version: 4,
            title: "before".into(),
            time_range: Some(SceneTimeRange::default()),
            meta: SceneMeta {
                api_version: Some("v2alpha1".into()),
                kind: Some("DashboardWithAccessInfo".into()),
                k8s: Some(ObjectMeta::named("d1").with_generation(4)),
                reload_on_params_change: true,
                ..SceneMeta::default()
            },
            ..DashboardState::default()
        })
    }

    #[test]
    fn json_edit_keeps_identity() {
        let scene = open_scene();
        let key = scene.key().to_string();
        let outcome = apply_json_edit(&scene, &spec("after").to_string());
        assert_eq!(outcome, JsonEditOutcome::ok());

        let state = scene.state();
        assert_eq!(scene.key(), key);
        assert_eq!(state.uid, "d1");
        assert_eq!(state.version, 4);
        assert_eq!(state.title, "after");
        assert_eq!(state.tags, vec!["edited".to_string()]);
        assert!(state.is_dirty);
        assert!(state.reloads_on_params_change());
    }

    #[test]
    fn json_edit_failures_are_reported() {
        let scene = open_scene();
        let outcome = apply_json_edit(&scene, "{ not json");
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("invalid json"));

        let mut bad = spec("x");
        bad.as_object_mut().unwrap().remove("timeSettings");
        let outcome = apply_json_edit(&scene, &bad.to_string());
        assert!(!outcome.success);
        assert_eq!(scene.read(|s| s.title.clone()), "before");
    }

    #[test]
    fn resource_identity_is_guarded() {
        let scene = open_scene();
        let metadata = json!({"name": "d1", "generation": 4});

        let changed_kind = json!({"kind": "Other", "spec": spec("x")});
        assert!(matches!(
            apply_resource(&scene, &changed_kind),
            Err(SpecApplyError::IdentityChanged("kind"))
        ));

        let changed_meta = json!({"metadata": {"name": "other"}, "spec": spec("x")});
        assert!(matches!(
            apply_resource(&scene, &changed_meta),
            Err(SpecApplyError::IdentityChanged("metadata"))
        ));

        let changed_api = json!({"apiVersion": "v9", "spec": spec("x")});
        assert!(matches!(
            apply_resource(&scene, &changed_api),
            Err(SpecApplyError::IdentityChanged("apiVersion"))
        ));

        let ok = json!({
            "apiVersion": "v2alpha1",
            "kind": "DashboardWithAccessInfo",
            "metadata": metadata,
            "spec": spec("applied")
        });
        apply_resource(&scene, &ok).unwrap();
        assert_eq!(scene.read(|s| s.title.clone()), "applied");
    }
}
