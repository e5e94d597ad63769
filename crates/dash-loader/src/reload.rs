//! Reload-on-params-change behavior
//!
//! Watches a scene's events and asks a [`DashboardReloader`] to re-fetch
//! the dashboard when time, variable values or scopes change and the
//! dashboard is configured for server-side reloads.

use crate::config::LoaderConfig;
use crate::options::ReloadParams;
use crate::state::ManagerState;
use crate::unified::DashboardReloader;
use dash_scene::{DashboardScene, DashboardState, Deactivation, SceneEvent};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Reload trigger attached to an active scene
#[derive(Clone)]
pub struct ReloadOnParamsChangeBehavior {
    reloader: Arc<dyn DashboardReloader>,
    enabled: bool,
}

impl std::fmt::Debug for ReloadOnParamsChangeBehavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadOnParamsChangeBehavior")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl ReloadOnParamsChangeBehavior {
    #[must_use]
    pub fn new(reloader: Arc<dyn DashboardReloader>, config: &LoaderConfig) -> Self {
        Self {
            reloader,
            enabled: config.reload_on_params_change,
        }
    }

    /// Events that can require a server re-fetch
    #[must_use]
    pub fn is_trigger(event: &SceneEvent) -> bool {
        matches!(
            event,
            SceneEvent::TimeRangeChanged { .. }
                | SceneEvent::VariableValueChanged { .. }
                | SceneEvent::ScopesChanged
        )
    }

    /// Reload only for dashboards that ask for it, outside edit mode and
    /// once every variable has resolved
    #[must_use]
    pub fn should_reload(state: &DashboardState) -> bool {
        state.reloads_on_params_change() && !state.is_editing && !state.variables.any_loading()
    }

    /// Parameters describing the scene's current time, variables and scopes
    #[must_use]
    pub fn params(state: &DashboardState) -> ReloadParams {
        ReloadParams {
            version: Some(state.version),
            time_range: state
                .time_range
                .as_ref()
                .map(|t| (t.from.clone(), t.to.clone())),
            variables: state.variables.url_values().into_iter().collect(),
            scopes: state.scopes.clone(),
        }
    }

    /// Start watching; the returned guard stops the watcher
    ///
    /// Editing and variable resolution are tracked from the event stream
    /// itself, so a trigger is judged against the flags in force when it
    /// was emitted. Time, variable and scope values are read when the
    /// reload is issued. Must be called inside a tokio runtime.
    pub fn attach(&self, scene: &Arc<DashboardScene>) -> Deactivation {
        if !self.enabled {
            return scene.activate(|| {});
        }

        let mut events = scene.events();
        let mut gate = scene.read(SuppressionGate::from_state);
        let weak = Arc::downgrade(scene);
        let reloader = Arc::clone(&self.reloader);
        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        gate.observe(&event);
                        if !Self::is_trigger(&event) {
                            continue;
                        }
                        if !gate.is_open() {
                            tracing::debug!(event = ?event, "reload suppressed");
                            continue;
                        }
                        let Some(scene) = weak.upgrade() else {
                            break;
                        };
                        let params = scene.read(|s| s.reloads_on_params_change().then(|| Self::params(s)));
                        drop(scene);
                        let Some(params) = params else {
                            continue;
                        };
                        if let Err(err) = reloader.reload_dashboard(params).await {
                            tracing::warn!(error = %err, "reload on params change failed");
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "scene events lagged");
                        if let Some(scene) = weak.upgrade() {
                            gate = scene.read(SuppressionGate::from_state);
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        scene.activate(move || task.abort())
    }

    /// Keep the behavior attached to whichever scene `states` shows
    ///
    /// A reload that returns a new version replaces the shown scene; the
    /// watcher detaches from the old one and attaches to its replacement.
    /// Dropping the returned handle detaches from both.
    pub fn follow(&self, mut states: watch::Receiver<ManagerState>) -> ShownSceneWatcher {
        let behavior = self.clone();
        let task = tokio::spawn(async move {
            let mut attached: Option<(Arc<DashboardScene>, Deactivation)> = None;
            loop {
                let shown = states.borrow_and_update().dashboard.clone();
                let unchanged = match (&attached, &shown) {
                    (Some((current, _)), Some(next)) => Arc::ptr_eq(current, next),
                    (None, None) => true,
                    _ => false,
                };
                if !unchanged {
                    if let Some(scene) = &shown {
                        tracing::debug!(uid = %scene.uid(), "reload behavior moved to shown scene");
                    }
                    attached = shown.map(|scene| {
                        let guard = behavior.attach(&scene);
                        (scene, guard)
                    });
                }
                if states.changed().await.is_err() {
                    break;
                }
            }
        });
        ShownSceneWatcher { task }
    }
}

/// Editing and variable-loading flags as seen through scene events
#[derive(Debug, Default)]
struct SuppressionGate {
    editing: bool,
    loading: BTreeSet<String>,
}

impl SuppressionGate {
    fn from_state(state: &DashboardState) -> Self {
        Self {
            editing: state.is_editing,
            loading: state.variables.loading_names().map(str::to_string).collect(),
        }
    }

    fn observe(&mut self, event: &SceneEvent) {
        match event {
            SceneEvent::EditingChanged { editing } => self.editing = *editing,
            SceneEvent::VariableLoadingChanged { name, loading: true } => {
                self.loading.insert(name.clone());
            }
            SceneEvent::VariableLoadingChanged { name, loading: false } => {
                self.loading.remove(name);
            }
            _ => {}
        }
    }

    fn is_open(&self) -> bool {
        !self.editing && self.loading.is_empty()
    }
}

/// Handle returned by [`ReloadOnParamsChangeBehavior::follow`]
#[derive(Debug)]
pub struct ShownSceneWatcher {
    task: JoinHandle<()>,
}

impl ShownSceneWatcher {
    /// Stop following and detach from the shown scene
    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for ShownSceneWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadResult;
    use async_trait::async_trait;
    use dash_scene::{Behavior, SceneTimeRange, SceneVariable, TextBoxVariable, VariableCommon};
    use dash_schema::v2::VariableOption;
    use parking_lot::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<ReloadParams>>,
    }

    #[async_trait]
    impl DashboardReloader for Recorder {
        async fn reload_dashboard(&self, params: ReloadParams) -> LoadResult<()> {
            self.calls.lock().push(params);
            Ok(())
        }
    }

    fn scene(reload: bool) -> Arc<DashboardScene> {
        let mut state = DashboardState {
            uid: "d1".into(),
            version: 2,
            time_range: Some(SceneTimeRange::default()),
            ..DashboardState::default()
        };
        if reload {
            state.behaviors.push(Behavior::ReloadOnParamsChange);
        }
        state
            .variables
            .add(SceneVariable::TextBox(TextBoxVariable {
                common: VariableCommon::named("q"),
                query: String::new(),
                current: VariableOption::default(),
            }))
            .unwrap();
        DashboardScene::shared(state)
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test]
    async fn time_change_triggers_reload() {
        let recorder = Arc::new(Recorder::default());
        let behavior = ReloadOnParamsChangeBehavior::new(recorder.clone(), &LoaderConfig::default());
        let scene = scene(true);
        let guard = behavior.attach(&scene);
        assert!(scene.is_active());

        scene.set_time_range("now-1h", "now");
        settle().await;

        let calls = recorder.calls.lock().clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].time_range, Some(("now-1h".to_string(), "now".to_string())));
        assert_eq!(calls[0].version, Some(2));
        guard.deactivate();
        assert!(!scene.is_active());
    }

    #[tokio::test]
    async fn suppressed_while_editing_or_loading() {
        let recorder = Arc::new(Recorder::default());
        let behavior = ReloadOnParamsChangeBehavior::new(recorder.clone(), &LoaderConfig::default());
        let scene = scene(true);
        let _guard = behavior.attach(&scene);

        scene.set_editing(true);
        scene.set_time_range("now-2h", "now");
        settle().await;
        scene.set_editing(false);

        scene.set_variable_loading("q", true).unwrap();
        scene.set_scopes(vec!["s".into()]);
        settle().await;
        assert!(recorder.calls.lock().is_empty());

        scene.set_variable_loading("q", false).unwrap();
        scene.set_variable_value("q", VariableOption::new("v", "v")).unwrap();
        settle().await;
        let calls = recorder.calls.lock().clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].variables["q"], vec!["v".to_string()]);
    }

    #[tokio::test]
    async fn triggers_are_judged_when_emitted() {
        let recorder = Arc::new(Recorder::default());
        let behavior = ReloadOnParamsChangeBehavior::new(recorder.clone(), &LoaderConfig::default());
        let scene = scene(true);
        let _guard = behavior.attach(&scene);

        scene.set_time_range("now-1h", "now");
        scene.set_editing(true);
        settle().await;
        assert_eq!(recorder.calls.lock().len(), 1);

        scene.set_time_range("now-2h", "now");
        scene.set_editing(false);
        settle().await;
        assert_eq!(recorder.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn variables_loading_at_attach_suppress_until_settled() {
        let recorder = Arc::new(Recorder::default());
        let behavior = ReloadOnParamsChangeBehavior::new(recorder.clone(), &LoaderConfig::default());
        let scene = scene(true);
        scene.set_variable_loading("q", true).unwrap();
        let _guard = behavior.attach(&scene);

        scene.set_time_range("now-1h", "now");
        settle().await;
        assert!(recorder.calls.lock().is_empty());

        scene.set_variable_loading("q", false).unwrap();
        scene.set_time_range("now-2h", "now");
        settle().await;
        assert_eq!(recorder.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn flag_and_config_gate_reloads() {
        let recorder = Arc::new(Recorder::default());
        let behavior = ReloadOnParamsChangeBehavior::new(recorder.clone(), &LoaderConfig::default());
        let plain = scene(false);
        let _guard = behavior.attach(&plain);
        plain.set_time_range("now-1h", "now");

        let disabled = ReloadOnParamsChangeBehavior::new(
            recorder.clone(),
            &LoaderConfig::default().with_reload_on_params_change(false),
        );
        let flagged = scene(true);
        let _guard2 = disabled.attach(&flagged);
        flagged.set_time_range("now-1h", "now");

        settle().await;
        assert!(recorder.calls.lock().is_empty());
    }
}
