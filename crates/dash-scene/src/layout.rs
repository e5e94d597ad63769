//! Layout managers
//!
//! Each manager owns its panels by value; a panel belongs to exactly one
//! layout position. Rows and tabs nest a complete layout manager.

use crate::panel::VizPanel;
use dash_schema::v2::{RepeatOptions, VariableRepeat};
use serde_json::{Number, Value};

/// Absolute grid position
#[derive(Debug, Clone, PartialEq)]
pub struct GridItem {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
    pub repeat: Option<RepeatOptions>,
    pub panel: VizPanel,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultGridLayoutManager {
    pub items: Vec<GridItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowItem {
    pub title: Option<String>,
    pub collapse: Option<bool>,
    pub hide_header: Option<bool>,
    pub fill_screen: Option<bool>,
    pub conditional_rendering: Option<Value>,
    pub repeat: Option<VariableRepeat>,
    pub layout: Box<LayoutManager>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowsLayoutManager {
    pub rows: Vec<RowItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AutoGridItem {
    pub repeat: Option<VariableRepeat>,
    pub conditional_rendering: Option<Value>,
    pub panel: VizPanel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AutoGridLayoutManager {
    pub max_column_count: Option<Number>,
    pub column_width_mode: String,
    pub column_width: Option<Number>,
    pub row_height_mode: String,
    pub row_height: Option<Number>,
    pub fill_screen: Option<bool>,
    pub items: Vec<AutoGridItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TabItem {
    pub title: Option<String>,
    pub conditional_rendering: Option<Value>,
    pub repeat: Option<VariableRepeat>,
    pub layout: Box<LayoutManager>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabsLayoutManager {
    pub tabs: Vec<TabItem>,
}

/// Body of a dashboard
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutManager {
    Grid(DefaultGridLayoutManager),
    Rows(RowsLayoutManager),
    AutoGrid(AutoGridLayoutManager),
    Tabs(TabsLayoutManager),
}

impl Default for LayoutManager {
    fn default() -> Self {
        Self::Grid(DefaultGridLayoutManager::default())
    }
}

impl LayoutManager {
    /// All panels, depth first, in layout order
    #[must_use]
    pub fn panels(&self) -> Vec<&VizPanel> {
        let mut out = Vec::new();
        self.walk(&mut out);
        out
    }

    fn walk<'a>(&'a self, out: &mut Vec<&'a VizPanel>) {
        match self {
            Self::Grid(grid) => out.extend(grid.items.iter().map(|i| &i.panel)),
            Self::AutoGrid(auto) => out.extend(auto.items.iter().map(|i| &i.panel)),
            Self::Rows(rows) => rows.rows.iter().for_each(|r| r.layout.walk(out)),
            Self::Tabs(tabs) => tabs.tabs.iter().for_each(|t| t.layout.walk(out)),
        }
    }

    /// Layout kind name
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Grid(_) => "GridLayout",
            Self::Rows(_) => "RowsLayout",
            Self::AutoGrid(_) => "AutoGridLayout",
            Self::Tabs(_) => "TabsLayout",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(id: i64) -> GridItem {
        GridItem {
            x: 0,
            y: 0,
            width: 6,
            height: 3,
            repeat: None,
            panel: VizPanel::new(id, "timeseries"),
        }
    }

    #[test]
    fn panels_walk_nested_layouts() {
        let layout = LayoutManager::Tabs(TabsLayoutManager {
            tabs: vec![TabItem {
                title: Some("t".into()),
                conditional_rendering: None,
                repeat: None,
                layout: Box::new(LayoutManager::Rows(RowsLayoutManager {
                    rows: vec![RowItem {
                        title: None,
                        collapse: None,
                        hide_header: Some(true),
                        fill_screen: None,
                        conditional_rendering: None,
                        repeat: None,
                        layout: Box::new(LayoutManager::Grid(DefaultGridLayoutManager {
                            items: vec![item(1), item(2)],
                        })),
                    }],
                })),
            }],
        });

        let keys: Vec<&str> = layout.panels().iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["panel-1", "panel-2"]);
        assert_eq!(layout.kind(), "TabsLayout");
    }
}
