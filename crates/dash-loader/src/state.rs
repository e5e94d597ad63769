//! Published manager state

use crate::error::LoadErrorInfo;
use crate::phase::LoadPhase;
use dash_scene::DashboardScene;
use std::sync::Arc;

/// What subscribers of a page state manager observe
#[derive(Debug, Clone, Default)]
pub struct ManagerState {
    pub dashboard: Option<Arc<DashboardScene>>,
    pub is_loading: bool,
    pub load_error: Option<LoadErrorInfo>,
    pub phase: LoadPhase,
}

impl ManagerState {
    /// Loading with no dashboard shown
    #[must_use]
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            phase: LoadPhase::Loading,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn loaded(dashboard: Option<Arc<DashboardScene>>) -> Self {
        Self {
            dashboard,
            phase: LoadPhase::Loaded,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failed(error: LoadErrorInfo) -> Self {
        Self {
            load_error: Some(error),
            phase: LoadPhase::Error,
            ..Self::default()
        }
    }

    /// Keep `dashboard` on screen alongside this state
    #[must_use]
    pub fn with_dashboard(mut self, dashboard: Option<Arc<DashboardScene>>) -> Self {
        self.dashboard = dashboard;
        self
    }

    /// Identity of the shown scene
    #[must_use]
    pub fn dashboard_uid(&self) -> Option<String> {
        self.dashboard.as_ref().map(|d| d.uid())
    }

    /// Same scene instance shown in both states
    #[must_use]
    pub fn same_dashboard(&self, other: &Self) -> bool {
        match (&self.dashboard, &other.dashboard) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Nothing a subscriber could observe differs
    #[must_use]
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.phase == other.phase
            && self.is_loading == other.is_loading
            && self.load_error == other.load_error
            && self.same_dashboard(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_scene::DashboardState;

    fn scene() -> Arc<DashboardScene> {
        Arc::new(DashboardScene::new(DashboardState::default()))
    }

    #[test]
    fn failed_state_can_keep_the_scene() {
        let shown = scene();
        let state = ManagerState::failed(LoadErrorInfo::default()).with_dashboard(Some(Arc::clone(&shown)));
        assert_eq!(state.phase, LoadPhase::Error);
        assert!(Arc::ptr_eq(&shown, state.dashboard.as_ref().unwrap()));
        assert!(!state.is_loading);
    }

    #[test]
    fn equivalence_is_by_scene_identity() {
        let shown = scene();
        let a = ManagerState::loaded(Some(Arc::clone(&shown)));
        assert!(a.is_equivalent(&ManagerState::loaded(Some(shown))));
        assert!(!a.is_equivalent(&ManagerState::loaded(Some(scene()))));
        assert!(!a.is_equivalent(&ManagerState::loaded(None)));
    }
}
