//! Layout kinds

use super::{kinds, Kinded};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Accepted `columnWidthMode` values of an auto grid
pub const AUTO_GRID_WIDTH_MODES: [&str; 4] = ["narrow", "standard", "wide", "custom"];
/// Accepted `rowHeightMode` values of an auto grid
pub const AUTO_GRID_HEIGHT_MODES: [&str; 4] = ["short", "standard", "tall", "custom"];

/// Top-level or nested layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "spec")]
pub enum LayoutKind {
    GridLayout(GridLayoutSpec),
    RowsLayout(RowsLayoutSpec),
    AutoGridLayout(AutoGridLayoutSpec),
    TabsLayout(TabsLayoutSpec),
}

impl LayoutKind {
    /// Every kind tag accepted in `layout.kind`
    pub const KINDS: [&'static str; 4] = ["GridLayout", "RowsLayout", "AutoGridLayout", "TabsLayout"];

    /// Names of every element referenced anywhere in this layout, in order
    #[must_use]
    pub fn element_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::GridLayout(grid) => {
                out.extend(grid.items.iter().map(|i| i.spec.element.name.as_str()));
            }
            Self::AutoGridLayout(auto) => {
                out.extend(auto.items.iter().map(|i| i.spec.element.name.as_str()));
            }
            Self::RowsLayout(rows) => {
                for row in &rows.rows {
                    row.spec.layout.collect_names(out);
                }
            }
            Self::TabsLayout(tabs) => {
                for tab in &tabs.tabs {
                    tab.spec.layout.collect_names(out);
                }
            }
        }
    }
}

/// Named reference into `spec.elements`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementReference {
    pub kind: String,
    pub name: String,
}

impl ElementReference {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            kind: kinds::ELEMENT_REFERENCE.to_string(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridLayoutSpec {
    #[serde(default)]
    pub items: Vec<Kinded<GridLayoutItemSpec>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridLayoutItemSpec {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
    pub element: ElementReference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat: Option<RepeatOptions>,
}

/// Panel repeat configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatOptions {
    pub mode: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_per_row: Option<i64>,
}

/// Row, tab and auto grid item repeat: `{mode: "variable", value}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableRepeat {
    pub mode: String,
    pub value: String,
}

impl VariableRepeat {
    /// The only mode the schema defines
    pub const MODE: &'static str = "variable";

    #[must_use]
    pub fn variable(value: impl Into<String>) -> Self {
        Self {
            mode: Self::MODE.to_string(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowsLayoutSpec {
    #[serde(default)]
    pub rows: Vec<Kinded<RowsLayoutRowSpec>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowsLayoutRowSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapse: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_header: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_screen: Option<bool>,
    /// Conditional rendering group, carried opaquely
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditional_rendering: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat: Option<VariableRepeat>,
    pub layout: Box<LayoutKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoGridLayoutSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_column_count: Option<Number>,
    pub column_width_mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_width: Option<Number>,
    pub row_height_mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_height: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_screen: Option<bool>,
    #[serde(default)]
    pub items: Vec<Kinded<AutoGridLayoutItemSpec>>,
}

impl Default for AutoGridLayoutSpec {
    fn default() -> Self {
        Self {
            max_column_count: Some(Number::from(3)),
            column_width_mode: "standard".to_string(),
            column_width: None,
            row_height_mode: "standard".to_string(),
            row_height: None,
            fill_screen: Some(false),
            items: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoGridLayoutItemSpec {
    pub element: ElementReference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat: Option<VariableRepeat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditional_rendering: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabsLayoutSpec {
    #[serde(default)]
    pub tabs: Vec<Kinded<TabsLayoutTabSpec>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabsLayoutTabSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub layout: Box<LayoutKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditional_rendering: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat: Option<VariableRepeat>,
}
