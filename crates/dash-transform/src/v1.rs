//! Legacy dashboard body -> scene state

use crate::annotations::annotation_from_v1;
use crate::assemble::{behaviors, collect_layers, collect_variables};
use crate::error::{TransformError, TransformResult};
use crate::layout::layout_from_v1;
use crate::options::TransformOptions;
use crate::variables::variable_from_v1;
use dash_scene::{DashboardState, RefreshPicker, SceneTimeRange, TimeControls};
use dash_schema::v1::{non_empty, LooseObject};
use dash_schema::v2::{CursorSync, DashboardLink, TimeRangeOption, TimeSettingsSpec};
use dash_schema::FromLegacy;
use serde_json::Value;

/// Build scene state from a legacy `dashboard` object
///
/// A missing `time` object falls back to the schema defaults; a `time`
/// member that is present but not an object is fatal.
///
/// # Errors
///
/// `InvalidDocument` when the body is not an object, `MissingTimeSettings`
/// for a malformed `time` member.
pub fn state_from_dashboard(
    dashboard: &Value,
    opts: &TransformOptions,
) -> TransformResult<DashboardState> {
    if !dashboard.is_object() {
        return Err(TransformError::invalid_document("dashboard is not an object"));
    }
    let defaults = TimeSettingsSpec::default();
    let (from, to) = match dashboard.get("time") {
        None | Some(Value::Null) => (defaults.from.clone(), defaults.to.clone()),
        Some(time @ Value::Object(_)) => (
            time.str_field("from").unwrap_or(defaults.from.as_str()).to_string(),
            time.str_field("to").unwrap_or(defaults.to.as_str()).to_string(),
        ),
        Some(_) => return Err(TransformError::MissingTimeSettings),
    };
    let picker = dashboard.get("timepicker").cloned().unwrap_or(Value::Null);

    let time_range = SceneTimeRange {
        from,
        to,
        timezone: non_empty(dashboard, "timezone"),
        week_start: non_empty(dashboard, "weekStart"),
        fiscal_year_start_month: dashboard.i64_field("fiscalYearStartMonth").unwrap_or(0),
        now_delay: non_empty(&picker, "nowDelay"),
    };
    let refresh = RefreshPicker {
        refresh: dashboard.str_field("refresh").unwrap_or_default().to_string(),
        intervals: picker
            .array_field("refresh_intervals")
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_else(TimeSettingsSpec::default_intervals),
    };
    let controls = TimeControls {
        hide_timepicker: picker.bool_field("hidden").unwrap_or(false),
        quick_ranges: picker
            .get("quick_ranges")
            .and_then(|q| serde_json::from_value::<Vec<TimeRangeOption>>(q.clone()).ok()),
    };

    let variables = collect_variables(
        list(dashboard, "templating").iter().map(variable_from_v1),
        opts.snapshot,
    );
    let data_layers = collect_layers(
        list(dashboard, "annotations").iter().map(annotation_from_v1),
        opts.alert_states_layer,
    );
    let body = layout_from_v1(dashboard.array_field("panels").map(Vec::as_slice).unwrap_or_default());

    let cursor_sync: CursorSync = FromLegacy::from_legacy(dashboard.get("graphTooltip"));

    Ok(DashboardState {
        uid: dashboard.str_field("uid").unwrap_or_default().to_string(),
        version: dashboard.i64_field("version").unwrap_or(0),
        title: dashboard.str_field("title").unwrap_or_default().to_string(),
        description: non_empty(dashboard, "description"),
        tags: dashboard
            .array_field("tags")
            .map(|t| t.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default(),
        editable: Some(dashboard.bool_field("editable").unwrap_or(true)),
        preload: dashboard.bool_field("preload").unwrap_or(false),
        revision: dashboard.i64_field("revision"),
        links: links(dashboard),
        time_range: Some(time_range),
        refresh,
        controls,
        variables,
        data_layers,
        body,
        behaviors: behaviors(cursor_sync, dashboard.bool_field("liveNow")),
        ..DashboardState::default()
    })
}

/// `<key>.list` of a legacy dashboard
fn list<'a>(dashboard: &'a Value, key: &str) -> &'a [Value] {
    dashboard
        .get(key)
        .and_then(|v| v.array_field("list"))
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn links(dashboard: &Value) -> Vec<DashboardLink> {
    dashboard
        .array_field("links")
        .map(|items| {
            items
                .iter()
                .filter_map(|l| match serde_json::from_value::<DashboardLink>(l.clone()) {
                    Ok(link) => Some(link),
                    Err(err) => {
                        tracing::warn!(error = %err, "skipping dashboard link");
                        None
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_scene::{Behavior, LayoutManager, SceneVariable};
    use serde_json::json;

    #[test]
    fn dashboard_level_fields() {
        let state = state_from_dashboard(
            &json!({
                "uid": "abc",
                "title": "Ops",
                "tags": ["prod"],
                "graphTooltip": 1,
                "liveNow": true,
                "time": {"from": "now-1h", "to": "now"},
                "timezone": "utc",
                "refresh": "5m",
                "timepicker": {"hidden": true, "refresh_intervals": ["1m", "5m"], "nowDelay": "1m"},
                "links": [{"title": "Docs", "type": "link", "url": "https://example.com"}],
                "templating": {"list": [
                    {"type": "constant", "name": "c", "query": "1"},
                    {"type": "mystery", "name": "m"}
                ]},
                "annotations": {"list": [{"name": "deploys", "enable": false}]},
                "panels": [{"id": 1, "type": "text", "gridPos": {"x": 0, "y": 0, "w": 24, "h": 4}}]
            }),
            &TransformOptions::default(),
        )
        .unwrap();

        assert_eq!(state.uid, "abc");
        assert_eq!(state.editable, Some(true));
        assert_eq!(state.refresh.refresh, "5m");
        assert_eq!(state.refresh.intervals, vec!["1m", "5m"]);
        assert!(state.controls.hide_timepicker);
        let range = state.time_range.as_ref().unwrap();
        assert_eq!(range.from, "now-1h");
        assert_eq!(range.timezone.as_deref(), Some("utc"));
        assert_eq!(range.now_delay.as_deref(), Some("1m"));
        assert_eq!(state.links.len(), 1);
        assert_eq!(state.variables.len(), 1);
        assert_eq!(state.data_layers.annotations().count(), 1);
        assert!(matches!(state.body, LayoutManager::Grid(ref g) if g.items.len() == 1));
        assert!(state.behaviors.contains(&Behavior::CursorSync(CursorSync::Crosshair)));
        assert!(state.behaviors.contains(&Behavior::LiveNow { enabled: true }));
    }

    #[test]
    fn time_defaults_and_fatal_shape() {
        let state = state_from_dashboard(&json!({"title": "t"}), &TransformOptions::default()).unwrap();
        assert_eq!(state.time_range, Some(SceneTimeRange::default()));
        assert_eq!(state.refresh.intervals.len(), 10);

        assert!(matches!(
            state_from_dashboard(&json!({"time": "yesterday"}), &TransformOptions::default()),
            Err(TransformError::MissingTimeSettings)
        ));
        assert!(matches!(
            state_from_dashboard(&json!([]), &TransformOptions::default()),
            Err(TransformError::InvalidDocument(_))
        ));
    }

    #[test]
    fn snapshot_freezes_variables() {
        let state = state_from_dashboard(
            &json!({"templating": {"list": [
                {"type": "custom", "name": "env", "query": "a,b", "current": {"text": "a", "value": "a"}},
                {"type": "adhoc", "name": "filters"}
            ]}}),
            &TransformOptions::new().with_snapshot(true).with_alert_states_layer(true),
        )
        .unwrap();

        assert!(matches!(state.variables.get("env"), Some(SceneVariable::Snapshot(_))));
        assert!(state.variables.get("filters").is_some_and(SceneVariable::is_read_only));
        assert!(state.data_layers.has_alert_states());
    }
}
