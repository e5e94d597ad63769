//! v2 spec -> scene state
//!
//! The spec is read through a lenient envelope so that one malformed
//! variable, element or annotation does not reject the whole document.
//! Only the time settings object and the layout are load-bearing.

use crate::annotations::annotation_from_v2;
use crate::assemble::{behaviors, collect_layers, collect_variables};
use crate::error::{TransformError, TransformResult};
use crate::layout::layout_from_v2;
use crate::options::TransformOptions;
use crate::panels::panel_from_v2;
use crate::variables::variable_from_v2;
use dash_scene::{DashboardState, LayoutManager, RefreshPicker, SceneTimeRange, TimeControls, VizPanel};
use dash_schema::v2::{CursorSync, DashboardLink, Element, LayoutKind, TimeSettingsSpec};
use dash_schema::FromLegacy;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SpecEnvelope {
    title: String,
    description: Option<String>,
    tags: Vec<String>,
    editable: Option<bool>,
    preload: bool,
    live_now: Option<bool>,
    revision: Option<i64>,
    cursor_sync: Option<Value>,
    time_settings: Option<Value>,
    links: Vec<Value>,
    variables: Vec<Value>,
    elements: Map<String, Value>,
    annotations: Vec<Value>,
    layout: Option<Value>,
}

/// Build scene state from a v2 spec value
///
/// # Errors
///
/// `MissingTimeSettings` when `timeSettings` is absent or malformed,
/// `InvalidDocument` when the spec or its layout does not parse.
pub fn state_from_spec(spec: &Value, opts: &TransformOptions) -> TransformResult<DashboardState> {
    let envelope: SpecEnvelope = serde_json::from_value(spec.clone())
        .map_err(|e| TransformError::invalid_document(format!("spec: {e}")))?;

    let time: TimeSettingsSpec = envelope
        .time_settings
        .filter(Value::is_object)
        .and_then(|t| serde_json::from_value(t).ok())
        .ok_or(TransformError::MissingTimeSettings)?;

    let panels = parse_elements(&envelope.elements);
    let body = match envelope.layout {
        Some(layout) => {
            let layout: LayoutKind = serde_json::from_value(layout)
                .map_err(|e| TransformError::invalid_document(format!("layout: {e}")))?;
            warn_unreferenced(&layout, &panels);
            layout_from_v2(&layout, &panels)
        }
        None => LayoutManager::default(),
    };

    let variables = collect_variables(
        envelope.variables.iter().map(variable_from_v2),
        opts.snapshot,
    );
    let data_layers = collect_layers(
        envelope.annotations.iter().map(annotation_from_v2),
        opts.alert_states_layer,
    );
    let cursor_sync: CursorSync = FromLegacy::from_legacy(envelope.cursor_sync.as_ref());

    Ok(DashboardState {
        title: envelope.title,
        description: envelope.description,
        tags: envelope.tags,
        editable: envelope.editable,
        preload: envelope.preload,
        revision: envelope.revision,
        links: envelope
            .links
            .into_iter()
            .filter_map(|l| match serde_json::from_value::<DashboardLink>(l) {
                Ok(link) => Some(link),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping dashboard link");
                    None
                }
            })
            .collect(),
        time_range: Some(SceneTimeRange {
            from: time.from,
            to: time.to,
            timezone: time.timezone,
            week_start: time.week_start,
            fiscal_year_start_month: time.fiscal_year_start_month,
            now_delay: time.now_delay,
        }),
        refresh: RefreshPicker {
            refresh: time.auto_refresh,
            intervals: time.auto_refresh_intervals,
        },
        controls: TimeControls {
            hide_timepicker: time.hide_timepicker,
            quick_ranges: time.quick_ranges,
        },
        variables,
        data_layers,
        body,
        behaviors: behaviors(cursor_sync, envelope.live_now),
        ..DashboardState::default()
    })
}

/// Parse each element on its own; failures are skipped with a warning
fn parse_elements(elements: &Map<String, Value>) -> BTreeMap<String, VizPanel> {
    elements
        .iter()
        .filter_map(|(name, raw)| match serde_json::from_value::<Element>(raw.clone()) {
            Ok(element) => {
                let mut panel = panel_from_v2(&element);
                panel.key.clone_from(name);
                Some((name.clone(), panel))
            }
            Err(err) => {
                tracing::warn!(element = %name, error = %err, "skipping element");
                None
            }
        })
        .collect()
}

fn warn_unreferenced(layout: &LayoutKind, panels: &BTreeMap<String, VizPanel>) {
    let referenced: BTreeSet<&str> = layout.element_names().into_iter().collect();
    for name in panels.keys().filter(|n| !referenced.contains(n.as_str())) {
        tracing::warn!(element = %name, "element not referenced by layout, dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_scene::{Behavior, SceneVariable};
    use serde_json::json;

    fn time_settings() -> Value {
        json!({
            "from": "now-1h",
            "to": "now",
            "autoRefresh": "",
            "autoRefreshIntervals": ["5s"],
            "hideTimepicker": false,
            "fiscalYearStartMonth": 0
        })
    }

    #[test]
    fn missing_time_settings_is_fatal() {
        let spec = json!({"title": "x", "elements": {}, "layout": {"kind": "GridLayout", "spec": {"items": []}}});
        assert!(matches!(
            state_from_spec(&spec, &TransformOptions::default()),
            Err(TransformError::MissingTimeSettings)
        ));

        let spec = json!({"title": "x", "timeSettings": {"from": "now-1h"}});
        assert!(matches!(
            state_from_spec(&spec, &TransformOptions::default()),
            Err(TransformError::MissingTimeSettings)
        ));
    }

    #[test]
    fn bad_layout_is_fatal() {
        let spec = json!({"timeSettings": time_settings(), "layout": {"kind": "Masonry", "spec": {}}});
        assert!(matches!(
            state_from_spec(&spec, &TransformOptions::default()),
            Err(TransformError::InvalidDocument(_))
        ));
    }

    #[test]
    fn elements_and_variables_isolated() {
        let spec = json!({
            "title": "iso",
            "cursorSync": "Tooltip",
            "timeSettings": time_settings(),
            "elements": {
                "good": {"kind": "LibraryPanel", "spec": {"id": 1, "title": "L", "libraryPanel": {"name": "n", "uid": "u"}}},
                "bad": {"kind": "Panel", "spec": {"title": "no id"}},
                "orphan": {"kind": "LibraryPanel", "spec": {"id": 2, "libraryPanel": {"name": "o", "uid": "o"}}}
            },
            "layout": {"kind": "AutoGridLayout", "spec": {
                "columnWidthMode": "standard",
                "rowHeightMode": "standard",
                "items": [
                    {"kind": "AutoGridLayoutItem", "spec": {"element": {"kind": "ElementReference", "name": "good"}}},
                    {"kind": "AutoGridLayoutItem", "spec": {"element": {"kind": "ElementReference", "name": "bad"}}}
                ]
            }},
            "variables": [
                {"kind": "TextVariable", "spec": {"name": "a", "query": "1"}},
                {"kind": "SwitchVariable", "spec": {"name": "b"}},
                {"kind": "ConstantVariable", "spec": {"query": "no name"}}
            ]
        });

        let state = state_from_spec(&spec, &TransformOptions::default()).unwrap();
        let panels = state.body.panels();
        assert_eq!(panels.len(), 1);
        assert_eq!(panels[0].key, "good");
        assert_eq!(state.variables.len(), 1);
        assert!(matches!(state.variables.get("a"), Some(SceneVariable::TextBox(_))));
        assert!(state.behaviors.contains(&Behavior::CursorSync(CursorSync::Tooltip)));
        assert_eq!(state.time_range.as_ref().map(|t| t.from.as_str()), Some("now-1h"));
    }
}
