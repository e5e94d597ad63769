//! Time and variable URL parameters carried between dashboards

use crate::store::KeyValueStore;
use dash_scene::DashboardScene;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Storage key of the saved parameters
pub const PRESERVED_URL_STATE_KEY: &str = "dashboard.preserved-url-state";

const VARIABLE_PREFIX: &str = "var-";
const KEPT_KEYS: [&str; 3] = ["from", "to", "timezone"];

/// Multi-valued query parameters
pub type QueryParams = BTreeMap<String, Vec<String>>;

fn is_preserved(key: &str) -> bool {
    key.starts_with(VARIABLE_PREFIX) || KEPT_KEYS.contains(&key)
}

/// Whitelisted URL state persisted in a [`KeyValueStore`]
#[derive(Clone)]
pub struct PreservedUrlState {
    kv: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for PreservedUrlState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreservedUrlState").finish_non_exhaustive()
    }
}

impl PreservedUrlState {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Save the whitelisted subset of `params`; an empty subset clears
    pub fn save(&self, params: &QueryParams) {
        let kept: QueryParams = params
            .iter()
            .filter(|(key, _)| is_preserved(key))
            .map(|(key, values)| (key.clone(), values.clone()))
            .collect();
        if kept.is_empty() {
            self.kv.delete(PRESERVED_URL_STATE_KEY);
            return;
        }
        match serde_json::to_string(&kept) {
            Ok(text) => self.kv.set(PRESERVED_URL_STATE_KEY, text),
            Err(err) => tracing::warn!(error = %err, "could not save url state"),
        }
    }

    /// Saved parameters that apply to `scene`
    ///
    /// `var-*` entries for variables the scene does not declare are dropped.
    #[must_use]
    pub fn restore(&self, scene: &DashboardScene) -> QueryParams {
        let Some(text) = self.kv.get(PRESERVED_URL_STATE_KEY) else {
            return QueryParams::new();
        };
        let saved: QueryParams = match serde_json::from_str(&text) {
            Ok(saved) => saved,
            Err(err) => {
                tracing::warn!(error = %err, "discarding unreadable url state");
                self.kv.delete(PRESERVED_URL_STATE_KEY);
                return QueryParams::new();
            }
        };
        scene.read(|state| {
            saved
                .into_iter()
                .filter(|(key, _)| match key.strip_prefix(VARIABLE_PREFIX) {
                    Some(name) => state.variables.get(name).is_some(),
                    None => true,
                })
                .collect()
        })
    }

    pub fn clear(&self) {
        self.kv.delete(PRESERVED_URL_STATE_KEY);
    }
}
