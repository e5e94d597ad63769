//! Cross-cutting behaviors and scene events

use dash_schema::v2::CursorSync;
use serde::{Deserialize, Serialize};

/// Behavior attached to the dashboard root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Behavior {
    /// Shared crosshair / tooltip mode
    CursorSync(CursorSync),
    /// Redraw at pixel-width cadence
    LiveNow {
        /// Whether live-now is on
        enabled: bool,
    },
    /// Re-fetch the document when time, variables or scopes change
    ReloadOnParamsChange,
    /// Registers dashboard-level macros (`$__dashboard`, `$__user`, ...)
    RegisterMacros,
}

/// Events emitted by the dashboard root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneEvent {
    /// Time range from/to changed
    TimeRangeChanged {
        /// New from
        from: String,
        /// New to
        to: String,
    },
    /// A variable's current value changed
    VariableValueChanged {
        /// Variable name
        name: String,
    },
    /// A variable started or finished resolving
    VariableLoadingChanged {
        /// Variable name
        name: String,
        /// True while resolving
        loading: bool,
    },
    /// Scope filters changed
    ScopesChanged,
    /// Edit mode toggled
    EditingChanged {
        /// True in edit mode
        editing: bool,
    },
}
