//! Layout mapping
//!
//! - [`layout_from_v1`] derives a grid, or rows when the legacy document has
//!   row panels
//! - [`layout_from_v2`] resolves element references of every layout kind
//! - [`LayoutSerializer`] is implemented once per layout manager variant and
//!   writes both the layout and the elements it references

use crate::error::TransformResult;
use crate::panels::{element_name, panel_from_v1, panel_to_element};
use dash_scene::{
    AutoGridItem, AutoGridLayoutManager, DefaultGridLayoutManager, GridItem, LayoutManager,
    RowItem, RowsLayoutManager, TabItem, TabsLayoutManager, VizPanel,
};
use dash_schema::v1::{non_empty, LooseObject};
use dash_schema::v2::{
    kinds, AutoGridLayoutItemSpec, AutoGridLayoutSpec, Element, ElementReference,
    GridLayoutItemSpec, GridLayoutSpec, Kinded, LayoutKind, RepeatOptions, RowsLayoutRowSpec,
    RowsLayoutSpec, TabsLayoutSpec, TabsLayoutTabSpec, VariableRepeat,
};
use serde_json::Value;
use std::collections::BTreeMap;

/// Default legacy panel width
pub const DEFAULT_WIDTH: i64 = 6;
/// Default legacy panel height
pub const DEFAULT_HEIGHT: i64 = 3;

/// Writes a layout manager back to its v2 layout kind
pub trait LayoutSerializer {
    /// Serialize the layout, inserting every referenced element into `elements`
    ///
    /// # Errors
    ///
    /// Implementations fail only when a nested layout fails.
    fn serialize_layout(&self, elements: &mut BTreeMap<String, Element>)
        -> TransformResult<LayoutKind>;
}

fn reference(panel: &VizPanel, elements: &mut BTreeMap<String, Element>) -> ElementReference {
    let name = element_name(panel);
    elements.insert(name.clone(), panel_to_element(panel));
    ElementReference::new(name)
}

impl LayoutSerializer for DefaultGridLayoutManager {
    fn serialize_layout(
        &self,
        elements: &mut BTreeMap<String, Element>,
    ) -> TransformResult<LayoutKind> {
        let items = self
            .items
            .iter()
            .map(|item| {
                Kinded::new(
                    kinds::GRID_LAYOUT_ITEM,
                    GridLayoutItemSpec {
                        x: item.x,
                        y: item.y,
                        width: item.width,
                        height: item.height,
                        element: reference(&item.panel, elements),
                        repeat: item.repeat.clone(),
                    },
                )
            })
            .collect();
        Ok(LayoutKind::GridLayout(GridLayoutSpec { items }))
    }
}

impl LayoutSerializer for RowsLayoutManager {
    fn serialize_layout(
        &self,
        elements: &mut BTreeMap<String, Element>,
    ) -> TransformResult<LayoutKind> {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                Ok(Kinded::new(
                    kinds::ROWS_LAYOUT_ROW,
                    RowsLayoutRowSpec {
                        title: row.title.clone(),
                        collapse: row.collapse,
                        hide_header: row.hide_header,
                        fill_screen: row.fill_screen,
                        conditional_rendering: row.conditional_rendering.clone(),
                        repeat: row.repeat.clone(),
                        layout: Box::new(row.layout.serialize_layout(elements)?),
                    },
                ))
            })
            .collect::<TransformResult<Vec<_>>>()?;
        Ok(LayoutKind::RowsLayout(RowsLayoutSpec { rows }))
    }
}

impl LayoutSerializer for AutoGridLayoutManager {
    fn serialize_layout(
        &self,
        elements: &mut BTreeMap<String, Element>,
    ) -> TransformResult<LayoutKind> {
        let items = self
            .items
            .iter()
            .map(|item| {
                Kinded::new(
                    kinds::AUTO_GRID_LAYOUT_ITEM,
                    AutoGridLayoutItemSpec {
                        element: reference(&item.panel, elements),
                        repeat: item.repeat.clone(),
                        conditional_rendering: item.conditional_rendering.clone(),
                    },
                )
            })
            .collect();
        Ok(LayoutKind::AutoGridLayout(AutoGridLayoutSpec {
            max_column_count: self.max_column_count.clone(),
            column_width_mode: self.column_width_mode.clone(),
            column_width: self.column_width.clone(),
            row_height_mode: self.row_height_mode.clone(),
            row_height: self.row_height.clone(),
            fill_screen: self.fill_screen,
            items,
        }))
    }
}

impl LayoutSerializer for TabsLayoutManager {
    fn serialize_layout(
        &self,
        elements: &mut BTreeMap<String, Element>,
    ) -> TransformResult<LayoutKind> {
        let tabs = self
            .tabs
            .iter()
            .map(|tab| {
                Ok(Kinded::new(
                    kinds::TABS_LAYOUT_TAB,
                    TabsLayoutTabSpec {
                        title: tab.title.clone(),
                        layout: Box::new(tab.layout.serialize_layout(elements)?),
                        conditional_rendering: tab.conditional_rendering.clone(),
                        repeat: tab.repeat.clone(),
                    },
                ))
            })
            .collect::<TransformResult<Vec<_>>>()?;
        Ok(LayoutKind::TabsLayout(TabsLayoutSpec { tabs }))
    }
}

impl LayoutSerializer for LayoutManager {
    fn serialize_layout(
        &self,
        elements: &mut BTreeMap<String, Element>,
    ) -> TransformResult<LayoutKind> {
        match self {
            Self::Grid(m) => m.serialize_layout(elements),
            Self::Rows(m) => m.serialize_layout(elements),
            Self::AutoGrid(m) => m.serialize_layout(elements),
            Self::Tabs(m) => m.serialize_layout(elements),
        }
    }
}

// ---------------------------------------------------------------------------
// v2 -> scene
// ---------------------------------------------------------------------------

/// Resolve a v2 layout against the parsed panels
///
/// References to missing elements are skipped with a warning.
#[must_use]
pub fn layout_from_v2(layout: &LayoutKind, panels: &BTreeMap<String, VizPanel>) -> LayoutManager {
    let resolve = |reference: &ElementReference| {
        let panel = panels.get(&reference.name).cloned();
        if panel.is_none() {
            tracing::warn!(element = %reference.name, "layout references unknown element, skipped");
        }
        panel
    };

    match layout {
        LayoutKind::GridLayout(grid) => LayoutManager::Grid(DefaultGridLayoutManager {
            items: grid
                .items
                .iter()
                .filter_map(|item| {
                    let spec = &item.spec;
                    resolve(&spec.element).map(|panel| GridItem {
                        x: spec.x,
                        y: spec.y,
                        width: spec.width,
                        height: spec.height,
                        repeat: spec.repeat.clone(),
                        panel,
                    })
                })
                .collect(),
        }),
        LayoutKind::RowsLayout(rows) => LayoutManager::Rows(RowsLayoutManager {
            rows: rows
                .rows
                .iter()
                .map(|row| RowItem {
                    title: row.spec.title.clone(),
                    collapse: row.spec.collapse,
                    hide_header: row.spec.hide_header,
                    fill_screen: row.spec.fill_screen,
                    conditional_rendering: row.spec.conditional_rendering.clone(),
                    repeat: row.spec.repeat.clone(),
                    layout: Box::new(layout_from_v2(&row.spec.layout, panels)),
                })
                .collect(),
        }),
        LayoutKind::AutoGridLayout(auto) => LayoutManager::AutoGrid(AutoGridLayoutManager {
            max_column_count: auto.max_column_count.clone(),
            column_width_mode: auto.column_width_mode.clone(),
            column_width: auto.column_width.clone(),
            row_height_mode: auto.row_height_mode.clone(),
            row_height: auto.row_height.clone(),
            fill_screen: auto.fill_screen,
            items: auto
                .items
                .iter()
                .filter_map(|item| {
                    resolve(&item.spec.element).map(|panel| AutoGridItem {
                        repeat: item.spec.repeat.clone(),
                        conditional_rendering: item.spec.conditional_rendering.clone(),
                        panel,
                    })
                })
                .collect(),
        }),
        LayoutKind::TabsLayout(tabs) => LayoutManager::Tabs(TabsLayoutManager {
            tabs: tabs
                .tabs
                .iter()
                .map(|tab| TabItem {
                    title: tab.spec.title.clone(),
                    conditional_rendering: tab.spec.conditional_rendering.clone(),
                    repeat: tab.spec.repeat.clone(),
                    layout: Box::new(layout_from_v2(&tab.spec.layout, panels)),
                })
                .collect(),
        }),
    }
}

// ---------------------------------------------------------------------------
// v1 -> scene
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
struct GridPos {
    x: i64,
    y: i64,
    w: i64,
    h: i64,
}

impl GridPos {
    fn of(record: &Value) -> Self {
        let pos = record.get("gridPos");
        let field = |key: &str, default: i64| {
            pos.and_then(|p| p.i64_field(key)).unwrap_or(default)
        };
        Self {
            x: field("x", 0),
            y: field("y", 0),
            w: field("w", DEFAULT_WIDTH),
            h: field("h", DEFAULT_HEIGHT),
        }
    }
}

fn is_row(record: &Value) -> bool {
    record.str_field("type") == Some("row")
}

/// Build a grid item; malformed panels are skipped with a warning
fn grid_item(record: &Value, y_offset: i64) -> Option<GridItem> {
    let pos = GridPos::of(record);
    match panel_from_v1(record) {
        Ok(panel) => Some(GridItem {
            x: pos.x,
            y: pos.y - y_offset,
            width: pos.w,
            height: pos.h,
            repeat: panel_repeat(record),
            panel,
        }),
        Err(err) => {
            tracing::warn!(error = %err, "skipping panel");
            None
        }
    }
}

fn panel_repeat(record: &Value) -> Option<RepeatOptions> {
    let value = non_empty(record, "repeat")?;
    let direction = record.str_field("repeatDirection").unwrap_or("h");
    Some(RepeatOptions {
        mode: VariableRepeat::MODE.to_string(),
        value,
        direction: Some(if direction == "v" { "v" } else { "h" }.to_string()),
        max_per_row: record.i64_field("maxPerRow"),
    })
}

/// Build a layout from a legacy `panels[]` list
///
/// Without row panels this is a single grid. With rows, every row panel
/// opens a row; panels before the first row land in a row with a hidden
/// header. Collapsed rows carry their children in their own `panels`.
#[must_use]
pub fn layout_from_v1(panels: &[Value]) -> LayoutManager {
    if !panels.iter().any(is_row) {
        return LayoutManager::Grid(DefaultGridLayoutManager {
            items: panels.iter().filter_map(|p| grid_item(p, 0)).collect(),
        });
    }

    let mut rows = Vec::new();
    let mut leading = Vec::new();
    let mut current: Option<(RowItem, i64, Vec<GridItem>)> = None;

    for record in panels {
        if is_row(record) {
            if let Some((row, _, items)) = current.take() {
                rows.push(close_row(row, items));
            }
            let row_y = GridPos::of(record).y;
            let collapsed = record.bool_field("collapsed").unwrap_or(false);
            let children = if collapsed {
                record
                    .array_field("panels")
                    .map(|ps| ps.iter().filter_map(|p| grid_item(p, row_y + 1)).collect())
                    .unwrap_or_default()
            } else {
                Vec::new()
            };
            let row = RowItem {
                title: Some(record.str_field("title").unwrap_or_default().to_string()),
                collapse: Some(collapsed),
                hide_header: None,
                fill_screen: None,
                conditional_rendering: None,
                repeat: non_empty(record, "repeat").map(VariableRepeat::variable),
                layout: Box::default(),
            };
            current = Some((row, row_y, children));
        } else {
            match current.as_mut() {
                Some((_, row_y, items)) => items.extend(grid_item(record, *row_y + 1)),
                None => leading.extend(grid_item(record, 0)),
            }
        }
    }
    if let Some((row, _, items)) = current.take() {
        rows.push(close_row(row, items));
    }
    if !leading.is_empty() {
        rows.insert(
            0,
            RowItem {
                title: Some(String::new()),
                collapse: Some(false),
                hide_header: Some(true),
                fill_screen: None,
                conditional_rendering: None,
                repeat: None,
                layout: Box::new(LayoutManager::Grid(DefaultGridLayoutManager { items: leading })),
            },
        );
    }
    LayoutManager::Rows(RowsLayoutManager { rows })
}

fn close_row(mut row: RowItem, items: Vec<GridItem>) -> RowItem {
    row.layout = Box::new(LayoutManager::Grid(DefaultGridLayoutManager { items }));
    row
}
