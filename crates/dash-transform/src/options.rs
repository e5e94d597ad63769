//! Transform options

use serde::{Deserialize, Serialize};

/// Options applied when building a scene from a document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformOptions {
    /// Build read-only variable holders instead of live variables
    pub snapshot: bool,
    /// Add the alert-states data layer
    pub alert_states_layer: bool,
}

impl TransformOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: snapshot mode
    #[inline]
    #[must_use]
    pub fn with_snapshot(mut self, snapshot: bool) -> Self {
        self.snapshot = snapshot;
        self
    }

    /// Builder: alert-states layer
    #[inline]
    #[must_use]
    pub fn with_alert_states_layer(mut self, enabled: bool) -> Self {
        self.alert_states_layer = enabled;
        self
    }
}
