//! Shared assembly steps of both forward builders

use crate::error::TransformResult;
use crate::variables::freeze_for_snapshot;
use dash_scene::{
    AlertStatesLayer, AnnotationLayer, Behavior, DashboardState, DataLayer, DataLayerSet,
    SceneMeta, SceneVariable, SceneVariableSet,
};
use dash_schema::v2::CursorSync;

/// Collect variables, isolating per-variable failures
pub(crate) fn collect_variables(
    results: impl IntoIterator<Item = TransformResult<SceneVariable>>,
    snapshot: bool,
) -> SceneVariableSet {
    let mut set = SceneVariableSet::new();
    for result in results {
        let variable = match result {
            Ok(v) if snapshot => freeze_for_snapshot(v),
            Ok(v) => v,
            Err(err) => {
                tracing::warn!(error = %err, "skipping variable");
                continue;
            }
        };
        if let Err(err) = set.add(variable) {
            tracing::warn!(error = %err, "skipping variable");
        }
    }
    set
}

/// Collect annotation layers, isolating per-layer failures
pub(crate) fn collect_layers(
    results: impl IntoIterator<Item = TransformResult<AnnotationLayer>>,
    alert_states: bool,
) -> DataLayerSet {
    let mut layers: Vec<DataLayer> = results
        .into_iter()
        .filter_map(|r| match r {
            Ok(layer) => Some(DataLayer::Annotations(layer)),
            Err(err) => {
                tracing::warn!(error = %err, "skipping annotation layer");
                None
            }
        })
        .collect();
    if alert_states {
        layers.push(DataLayer::AlertStates(AlertStatesLayer::default()));
    }
    DataLayerSet::new(layers)
}

pub(crate) fn behaviors(cursor_sync: CursorSync, live_now: Option<bool>) -> Vec<Behavior> {
    let mut out = vec![Behavior::CursorSync(cursor_sync)];
    if let Some(enabled) = live_now {
        out.push(Behavior::LiveNow { enabled });
    }
    out.push(Behavior::RegisterMacros);
    out
}

/// Attach server metadata to a freshly built state
///
/// Adds the reload behavior when the metadata asks for it.
pub fn attach_meta(state: &mut DashboardState, meta: SceneMeta) {
    let reload = meta.reload_on_params_change;
    state.meta = meta;
    state
        .behaviors
        .retain(|b| !matches!(b, Behavior::ReloadOnParamsChange));
    if reload {
        state.behaviors.push(Behavior::ReloadOnParamsChange);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransformError;
    use dash_scene::{TextBoxVariable, VariableCommon};
    use dash_schema::v2::VariableOption;

    fn text(name: &str) -> SceneVariable {
        SceneVariable::TextBox(TextBoxVariable {
            common: VariableCommon::named(name),
            query: "x".into(),
            current: VariableOption::new("x", "x"),
        })
    }

    #[test]
    fn failures_and_duplicates_are_dropped() {
        let set = collect_variables(
            vec![
                Ok(text("a")),
                Err(TransformError::UnsupportedVariableKind("system".into())),
                Ok(text("a")),
                Ok(text("b")),
            ],
            false,
        );
        let names: Vec<&str> = set.iter().map(SceneVariable::name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn reload_behavior_follows_meta() {
        let mut state = DashboardState {
            behaviors: behaviors(CursorSync::Off, None),
            ..DashboardState::default()
        };
        attach_meta(&mut state, SceneMeta { reload_on_params_change: true, ..SceneMeta::default() });
        assert!(state.reloads_on_params_change());
        attach_meta(&mut state, SceneMeta::default());
        assert!(!state.reloads_on_params_change());
    }
}
