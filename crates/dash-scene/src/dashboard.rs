//! Dashboard root node
//!
//! The root exclusively owns its children as plain data inside one
//! [`SceneNode`]. Identity is the `Arc` that holds the scene: caches and the
//! loader compare scenes with [`Arc::ptr_eq`], and [`DashboardScene::replace_state`]
//! swaps content without changing identity.

use crate::behavior::{Behavior, SceneEvent};
use crate::data::DataLayerSet;
use crate::error::{SceneError, SceneResult};
use crate::layout::LayoutManager;
use crate::node::{Deactivation, SceneNode};
use crate::time::{RefreshPicker, SceneTimeRange, TimeControls};
use crate::variables::SceneVariableSet;
use dash_schema::v2::{DashboardLink, VariableOption};
use dash_schema::{Fingerprint, ObjectMeta};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

const EVENT_CAPACITY: usize = 64;

static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

/// Server-side metadata carried by a loaded dashboard
#[derive(Debug, Clone, Default, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct SceneMeta {
    pub can_save: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_share: bool,
    pub can_star: bool,
    pub can_admin: bool,
    pub slug: Option<String>,
    pub url: Option<String>,
    pub folder_uid: Option<String>,
    pub folder_title: Option<String>,
    pub folder_url: Option<String>,
    pub created: Option<String>,
    pub is_snapshot: bool,
    pub is_new: bool,
    pub is_embedded: bool,
    pub is_home: bool,
    pub is_public: bool,
    pub provisioned: bool,
    pub reload_on_params_change: bool,
    /// `apiVersion` of the resource the scene was loaded from (v2 only)
    pub api_version: Option<String>,
    /// `kind` of the resource the scene was loaded from (v2 only)
    pub kind: Option<String>,
    pub k8s: Option<ObjectMeta>,
}

/// Complete state of a dashboard scene
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub uid: String,
    pub version: i64,
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub editable: Option<bool>,
    pub preload: bool,
    pub revision: Option<i64>,
    pub links: Vec<DashboardLink>,
    pub meta: SceneMeta,
    pub is_editing: bool,
    pub is_dirty: bool,
    pub fingerprint: Option<Fingerprint>,
    pub time_range: Option<SceneTimeRange>,
    pub refresh: RefreshPicker,
    pub controls: TimeControls,
    pub variables: SceneVariableSet,
    pub data_layers: DataLayerSet,
    pub body: LayoutManager,
    pub behaviors: Vec<Behavior>,
    pub scopes: Vec<String>,
}

impl DashboardState {
    /// Whether the reload-on-params-change behavior is attached
    #[must_use]
    pub fn reloads_on_params_change(&self) -> bool {
        self.behaviors
            .iter()
            .any(|b| matches!(b, Behavior::ReloadOnParamsChange))
    }
}

/// Live dashboard scene
#[derive(Debug)]
pub struct DashboardScene {
    key: String,
    node: SceneNode<DashboardState>,
    events: broadcast::Sender<SceneEvent>,
}

impl DashboardScene {
    /// Build a scene; each scene gets a fresh instance key
    #[must_use]
    pub fn new(state: DashboardState) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            key: format!("dashboard-{}", NEXT_KEY.fetch_add(1, Ordering::Relaxed)),
            node: SceneNode::new(state),
            events,
        }
    }

    /// Build a shared scene
    #[must_use]
    pub fn shared(state: DashboardState) -> Arc<Self> {
        Arc::new(Self::new(state))
    }

    /// Instance key, stable across `replace_state`
    #[inline]
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn state(&self) -> DashboardState {
        self.node.state()
    }

    pub fn read<R>(&self, f: impl FnOnce(&DashboardState) -> R) -> R {
        self.node.read(f)
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut DashboardState) -> R) -> R {
        self.node.update(f)
    }

    #[must_use]
    pub fn uid(&self) -> String {
        self.read(|s| s.uid.clone())
    }

    #[must_use]
    pub fn version(&self) -> i64 {
        self.read(|s| s.version)
    }

    #[must_use]
    pub fn fingerprint(&self) -> Option<Fingerprint> {
        self.read(|s| s.fingerprint.clone())
    }

    /// State revision channel
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.node.subscribe()
    }

    /// Event stream
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<SceneEvent> {
        self.events.subscribe()
    }

    /// Activate the scene
    pub fn activate<F>(&self, on_deactivate: F) -> Deactivation
    where
        F: FnOnce() + Send + 'static,
    {
        tracing::debug!(key = %self.key, "scene activated");
        self.node.activate(on_deactivate)
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.node.is_active()
    }

    /// Change the time range
    pub fn set_time_range(&self, from: impl Into<String>, to: impl Into<String>) {
        let (from, to) = (from.into(), to.into());
        self.node.update(|s| {
            let range = s.time_range.get_or_insert_with(SceneTimeRange::default);
            range.from.clone_from(&from);
            range.to.clone_from(&to);
        });
        self.emit(SceneEvent::TimeRangeChanged { from, to });
    }

    /// Change a variable's current value
    ///
    /// # Errors
    ///
    /// `UnknownVariable` or `ReadOnlyVariable`.
    pub fn set_variable_value(&self, name: &str, value: VariableOption) -> SceneResult<()> {
        self.node.update(|s| {
            s.variables
                .get_mut(name)
                .ok_or_else(|| SceneError::unknown_variable(name))?
                .set_current(value)
        })?;
        self.emit(SceneEvent::VariableValueChanged {
            name: name.to_string(),
        });
        Ok(())
    }

    /// Flag a variable as resolving
    ///
    /// # Errors
    ///
    /// `UnknownVariable` when the name is not in the set.
    pub fn set_variable_loading(&self, name: &str, loading: bool) -> SceneResult<()> {
        self.node.update(|s| s.variables.set_loading(name, loading))?;
        self.emit(SceneEvent::VariableLoadingChanged {
            name: name.to_string(),
            loading,
        });
        Ok(())
    }

    /// Replace scope filters
    pub fn set_scopes(&self, scopes: Vec<String>) {
        self.node.update(|s| s.scopes = scopes);
        self.emit(SceneEvent::ScopesChanged);
    }

    /// Enter or leave edit mode
    pub fn set_editing(&self, editing: bool) {
        self.node.update(|s| s.is_editing = editing);
        self.emit(SceneEvent::EditingChanged { editing });
    }

    pub fn mark_dirty(&self) {
        self.node.update(|s| s.is_dirty = true);
    }

    /// Swap the whole state, keeping this scene's identity
    pub fn replace_state(&self, state: DashboardState) {
        self.node.set_state(state);
    }

    fn emit(&self, event: SceneEvent) {
        // No receivers is not an error
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::variables::{SceneVariable, TextBoxVariable, VariableCommon};

    fn scene_with_var() -> DashboardScene {
        let mut state = DashboardState {
            uid: "d1".into(),
            ..DashboardState::default()
        };
        state
            .variables
            .add(SceneVariable::TextBox(TextBoxVariable {
                common: VariableCommon::named("q"),
                query: "a".into(),
                current: VariableOption::new("a", "a"),
            }))
            .unwrap();
        DashboardScene::new(state)
    }

    #[test]
    fn keys_are_unique() {
        let a = DashboardScene::new(DashboardState::default());
        let b = DashboardScene::new(DashboardState::default());
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn replace_state_keeps_key() {
        let scene = scene_with_var();
        let key = scene.key().to_string();
        scene.replace_state(DashboardState {
            uid: "d2".into(),
            ..DashboardState::default()
        });
        assert_eq!(scene.key(), key);
        assert_eq!(scene.uid(), "d2");
    }

    #[tokio::test]
    async fn mutators_emit_events() {
        let scene = scene_with_var();
        let mut events = scene.events();

        scene.set_time_range("now-1h", "now");
        scene.set_variable_value("q", VariableOption::new("b", "b")).unwrap();
        scene.set_variable_loading("q", true).unwrap();

        assert_eq!(
            events.recv().await.unwrap(),
            SceneEvent::TimeRangeChanged { from: "now-1h".into(), to: "now".into() }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            SceneEvent::VariableValueChanged { name: "q".into() }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            SceneEvent::VariableLoadingChanged { name: "q".into(), loading: true }
        );
        assert!(scene.read(|s| s.variables.any_loading()));
    }

    #[test]
    fn unknown_variable_rejected() {
        let scene = scene_with_var();
        assert_eq!(
            scene.set_variable_value("nope", VariableOption::default()),
            Err(SceneError::unknown_variable("nope"))
        );
    }
}
