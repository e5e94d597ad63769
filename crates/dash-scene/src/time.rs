//! Time range, refresh picker, panel time window

use dash_schema::v2::TimeRangeOption;
use serde::{Deserialize, Serialize};

/// Dashboard-wide time range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneTimeRange {
    pub from: String,
    pub to: String,
    pub timezone: Option<String>,
    pub week_start: Option<String>,
    pub fiscal_year_start_month: i64,
    pub now_delay: Option<String>,
}

impl SceneTimeRange {
    #[must_use]
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            timezone: None,
            week_start: None,
            fiscal_year_start_month: 0,
            now_delay: None,
        }
    }

    /// Builder: set timezone
    #[must_use]
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }
}

impl Default for SceneTimeRange {
    fn default() -> Self {
        Self::new("now-6h", "now")
    }
}

/// Auto refresh state and picker options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshPicker {
    /// Current auto refresh interval, empty when off
    pub refresh: String,
    pub intervals: Vec<String>,
}

/// Time picker chrome
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeControls {
    pub hide_timepicker: bool,
    pub quick_ranges: Option<Vec<TimeRangeOption>>,
}

/// Panel-scoped relative time / shift override
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelTimeRange {
    pub time_from: Option<String>,
    pub time_shift: Option<String>,
    pub hide_time_override: Option<bool>,
}

impl PanelTimeRange {
    /// Window for the given override values, `None` when nothing is set
    #[must_use]
    pub fn from_parts(
        time_from: Option<String>,
        time_shift: Option<String>,
        hide_time_override: Option<bool>,
    ) -> Option<Self> {
        if time_from.is_none() && time_shift.is_none() && hide_time_override.is_none() {
            return None;
        }
        Some(Self {
            time_from,
            time_shift,
            hide_time_override,
        })
    }
}
