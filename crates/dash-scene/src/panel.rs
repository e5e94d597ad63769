//! Visualization panel node

use crate::data::PanelData;
use crate::time::PanelTimeRange;
use dash_schema::v2::{DataLink, FieldConfigSource, LibraryPanelRef};
use serde_json::{Map, Value};

/// Panel owned by one layout position
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VizPanel {
    /// Element name this panel serializes under
    pub key: String,
    pub id: i64,
    pub title: String,
    pub description: String,
    pub links: Vec<DataLink>,
    pub transparent: Option<bool>,
    pub plugin_id: String,
    pub plugin_version: String,
    pub options: Map<String, Value>,
    pub field_config: FieldConfigSource,
    pub data: Option<PanelData>,
    pub time_window: Option<PanelTimeRange>,
    /// Set when the panel is a library panel reference
    pub library_panel: Option<LibraryPanelRef>,
}

impl VizPanel {
    /// Element name for a panel id
    #[must_use]
    pub fn key_for_id(id: i64) -> String {
        format!("panel-{id}")
    }

    #[must_use]
    pub fn new(id: i64, plugin_id: impl Into<String>) -> Self {
        Self {
            key: Self::key_for_id(id),
            id,
            plugin_id: plugin_id.into(),
            ..Self::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn is_library_panel(&self) -> bool {
        self.library_panel.is_some()
    }
}
