//! Dashboard Scene - in-memory object graph
//!
//! A loaded dashboard is a tree of plain-data nodes owned by one root:
//! - time range, refresh picker and time picker controls
//! - an ordered, uniquely named variable set
//! - ordered data layers (annotations, alert states)
//! - a layout manager that owns every panel
//! - behaviors (cursor sync, live now, reload on params change, macros)
//!
//! The root is reactive: writes bump a revision counter on a `watch`
//! channel and semantic changes are broadcast as [`SceneEvent`]s.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod behavior;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod layout;
pub mod node;
pub mod panel;
pub mod time;
pub mod variables;

pub use behavior::{Behavior, SceneEvent};
pub use dashboard::{DashboardScene, DashboardState, SceneMeta};
pub use data::{
    AlertStatesLayer, AnnotationLayer, DataLayer, DataLayerSet, PanelData, SceneDataTransformer,
    SceneQuery, SceneQueryRunner,
};
pub use error::{SceneError, SceneResult};
pub use layout::{
    AutoGridItem, AutoGridLayoutManager, DefaultGridLayoutManager, GridItem, LayoutManager,
    RowItem, RowsLayoutManager, TabItem, TabsLayoutManager,
};
pub use node::{Deactivation, SceneNode};
pub use panel::VizPanel;
pub use time::{PanelTimeRange, RefreshPicker, SceneTimeRange, TimeControls};
pub use variables::{
    AdHocFiltersVariable, ConstantVariable, CustomVariable, DataSourceVariable, GroupByVariable,
    IntervalVariable, QueryVariable, SceneVariable, SceneVariableSet, SnapshotVariable,
    TextBoxVariable, VariableCommon,
};

/// Prelude for common imports
pub mod prelude {
    pub use crate::dashboard::{DashboardScene, DashboardState};
    pub use crate::error::{SceneError, SceneResult};
    pub use crate::layout::LayoutManager;
    pub use crate::panel::VizPanel;
    pub use crate::variables::{SceneVariable, SceneVariableSet};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
