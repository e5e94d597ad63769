//! Typed v2 dashboard spec
//!
//! Mirrors the `v2alpha1` schema closely enough that a valid spec survives
//! deserialize → serialize unchanged after canonicalization:
//! - optional schema fields are `Option` and skipped when absent
//! - free-form numbers are kept as [`serde_json::Number`]
//! - kinds are adjacently tagged (`{"kind": .., "spec": ..}`)

mod annotations;
mod elements;
mod layout;
mod time;
mod variables;

pub use annotations::{AnnotationPanelFilter, AnnotationQuerySpec};
pub use elements::{
    DataLink, DataQueryKind, DataSourceRef, DataTransformerConfig, DynamicConfigValue, Element,
    FieldColor, FieldColorModeId, FieldConfig, FieldConfigSource, FieldOverride,
    LibraryPanelKindSpec, LibraryPanelRef, MatcherConfig, PanelQuerySpec, PanelSpec,
    QueryGroupSpec, QueryOptionsSpec, VizConfigSpec,
};
pub use layout::{
    AutoGridLayoutItemSpec, AutoGridLayoutSpec, ElementReference, GridLayoutItemSpec,
    GridLayoutSpec, LayoutKind, RepeatOptions, RowsLayoutRowSpec, RowsLayoutSpec,
    TabsLayoutSpec, TabsLayoutTabSpec, VariableRepeat, AUTO_GRID_HEIGHT_MODES,
    AUTO_GRID_WIDTH_MODES,
};
pub use time::{CursorSync, DashboardLink, DashboardLinkType, TimeRangeOption, TimeSettingsSpec};
pub use variables::{
    AdHocFilterWithLabels, AdhocVariableSpec, ConstantVariableSpec, CustomVariableSpec,
    DatasourceVariableSpec, GroupByVariableSpec, IntervalVariableSpec, QueryVariableSpec,
    StringOrArray, TextVariableSpec, VariableHide, VariableKind, VariableOption,
    VariableRefresh, VariableSort, LEGACY_STRING_VALUE_KEY,
};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Generic `{kind, spec}` pair for kinds whose tag is a constant or an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kinded<S> {
    pub kind: String,
    pub spec: S,
}

impl<S> Kinded<S> {
    #[inline]
    #[must_use]
    pub fn new(kind: impl Into<String>, spec: S) -> Self {
        Self {
            kind: kind.into(),
            spec,
        }
    }
}

/// Kind tags used by [`Kinded`] wrappers
pub mod kinds {
    pub const ANNOTATION_QUERY: &str = "AnnotationQuery";
    pub const QUERY_GROUP: &str = "QueryGroup";
    pub const PANEL_QUERY: &str = "PanelQuery";
    pub const GRID_LAYOUT_ITEM: &str = "GridLayoutItem";
    pub const ROWS_LAYOUT_ROW: &str = "RowsLayoutRow";
    pub const AUTO_GRID_LAYOUT_ITEM: &str = "AutoGridLayoutItem";
    pub const TABS_LAYOUT_TAB: &str = "TabsLayoutTab";
    pub const ELEMENT_REFERENCE: &str = "ElementReference";
}

/// Dashboard v2 spec
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spec {
    pub annotations: Vec<Kinded<AnnotationQuerySpec>>,
    pub cursor_sync: CursorSync,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editable: Option<bool>,
    pub elements: BTreeMap<String, Element>,
    pub layout: LayoutKind,
    pub links: Vec<DashboardLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_now: Option<bool>,
    pub preload: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<i64>,
    pub tags: Vec<String>,
    pub time_settings: TimeSettingsSpec,
    pub title: String,
    pub variables: Vec<VariableKind>,
}

impl Default for Spec {
    fn default() -> Self {
        Self {
            annotations: Vec::new(),
            cursor_sync: CursorSync::Off,
            description: None,
            editable: Some(true),
            elements: BTreeMap::new(),
            layout: LayoutKind::GridLayout(GridLayoutSpec::default()),
            links: Vec::new(),
            live_now: None,
            preload: false,
            revision: None,
            tags: Vec::new(),
            time_settings: TimeSettingsSpec::default(),
            title: String::new(),
            variables: Vec::new(),
        }
    }
}
