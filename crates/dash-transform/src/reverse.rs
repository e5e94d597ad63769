//! Scene -> v2 document
//!
//! The reverse path always writes the latest schema. Output is canonical
//! (deep-sorted, null-free) and has passed [`validate_spec`] before it is
//! returned; a failed check yields no document at all.

use crate::annotations::annotation_to_v2;
use crate::error::{TransformError, TransformResult};
use crate::layout::LayoutSerializer;
use crate::validate::validate_spec;
use crate::variables::variable_to_v2;
use dash_scene::{Behavior, DashboardScene, DashboardState};
use dash_schema::v2::{CursorSync, Spec, TimeSettingsSpec};
use dash_schema::{canonicalize, DashboardResource, ObjectMeta};
use serde_json::Value;
use std::collections::BTreeMap;

/// Build the typed spec for a scene state
///
/// # Errors
///
/// `MissingTimeSettings` when the scene has no time range.
pub fn spec_from_state(state: &DashboardState, is_snapshot: bool) -> TransformResult<Spec> {
    let range = state
        .time_range
        .as_ref()
        .ok_or(TransformError::MissingTimeSettings)?;

    let mut elements = BTreeMap::new();
    let layout = state.body.serialize_layout(&mut elements)?;

    let cursor_sync = state
        .behaviors
        .iter()
        .find_map(|b| match b {
            Behavior::CursorSync(sync) => Some(*sync),
            _ => None,
        })
        .unwrap_or(CursorSync::Off);
    let live_now = state.behaviors.iter().find_map(|b| match b {
        Behavior::LiveNow { enabled } => Some(*enabled),
        _ => None,
    });

    Ok(Spec {
        annotations: state.data_layers.annotations().map(annotation_to_v2).collect(),
        cursor_sync,
        description: state.description.clone(),
        editable: state.editable,
        elements,
        layout,
        links: state.links.clone(),
        live_now,
        preload: state.preload,
        revision: state.revision,
        tags: state.tags.clone(),
        time_settings: TimeSettingsSpec {
            timezone: range.timezone.clone(),
            from: range.from.clone(),
            to: range.to.clone(),
            auto_refresh: state.refresh.refresh.clone(),
            auto_refresh_intervals: state.refresh.intervals.clone(),
            quick_ranges: state.controls.quick_ranges.clone(),
            hide_timepicker: state.controls.hide_timepicker,
            week_start: range.week_start.clone(),
            fiscal_year_start_month: range.fiscal_year_start_month,
            now_delay: range.now_delay.clone(),
        },
        title: state.title.clone(),
        variables: state
            .variables
            .iter()
            .map(|v| variable_to_v2(v, is_snapshot))
            .collect(),
    })
}

/// Serialize a scene to a canonical, validated v2 spec
///
/// # Errors
///
/// `MissingTimeSettings`, `Serialize`, or `Validation` with every violation
/// found.
pub fn scene_to_document(scene: &DashboardScene, is_snapshot: bool) -> TransformResult<Value> {
    let spec = scene.read(|state| spec_from_state(state, is_snapshot))?;
    let value = serde_json::to_value(&spec).map_err(TransformError::Serialize)?;
    let value = canonicalize(&value);
    validate_spec(&value)?;
    tracing::debug!(uid = %scene.uid(), "scene serialized");
    Ok(value)
}

/// Serialize a scene to a full v2 resource
///
/// Metadata comes from the resource the scene was loaded from, or a fresh
/// object named after the uid.
///
/// # Errors
///
/// Same as [`scene_to_document`].
pub fn scene_to_resource(scene: &DashboardScene, is_snapshot: bool) -> TransformResult<Value> {
    let spec = scene_to_document(scene, is_snapshot)?;
    let (metadata, api_version, kind) = scene.read(|state| {
        (
            state
                .meta
                .k8s
                .clone()
                .unwrap_or_else(|| ObjectMeta::named(state.uid.clone())),
            state.meta.api_version.clone(),
            state.meta.kind.clone(),
        )
    });
    let mut resource = DashboardResource::new(metadata, spec);
    if let Some(api_version) = api_version {
        resource.api_version = api_version;
    }
    if let Some(kind) = kind {
        resource.kind = kind;
    }
    let value = serde_json::to_value(&resource).map_err(TransformError::Serialize)?;
    Ok(canonicalize(&value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_scene::SceneTimeRange;
    use serde_json::json;

    #[test]
    fn missing_time_range_fails_fast() {
        let scene = DashboardScene::new(DashboardState::default());
        assert!(matches!(
            scene_to_document(&scene, false),
            Err(TransformError::MissingTimeSettings)
        ));
    }

    #[test]
    fn empty_scene_serializes_canonically() {
        let scene = DashboardScene::new(DashboardState {
            uid: "u".into(),
            title: "Empty".into(),
            time_range: Some(SceneTimeRange::default()),
            ..DashboardState::default()
        });
        let doc = scene_to_document(&scene, false).unwrap();
        assert_eq!(doc["cursorSync"], json!("Off"));
        assert_eq!(doc["layout"], json!({"kind": "GridLayout", "spec": {"items": []}}));
        assert!(doc.get("liveNow").is_none());
        let keys: Vec<&String> = doc.as_object().unwrap().keys().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);

        let resource = scene_to_resource(&scene, false).unwrap();
        assert_eq!(resource["metadata"]["name"], json!("u"));
        assert_eq!(resource["spec"], doc);
    }
}
