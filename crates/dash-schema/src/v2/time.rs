//! Time settings, dashboard links, cursor sync

use serde::{Deserialize, Serialize};

/// Shared crosshair / tooltip behaviour across panels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CursorSync {
    /// No shared crosshair or tooltip
    #[default]
    Off,
    /// Shared crosshair
    Crosshair,
    /// Shared crosshair and tooltip
    Tooltip,
}

impl CursorSync {
    /// Accepted serialized values
    pub const VALUES: [&'static str; 3] = ["Off", "Crosshair", "Tooltip"];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Crosshair => "Crosshair",
            Self::Tooltip => "Tooltip",
        }
    }
}

/// Dashboard time configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSettingsSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    pub from: String,
    pub to: String,
    pub auto_refresh: String,
    pub auto_refresh_intervals: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quick_ranges: Option<Vec<TimeRangeOption>>,
    pub hide_timepicker: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week_start: Option<String>,
    pub fiscal_year_start_month: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub now_delay: Option<String>,
}

impl TimeSettingsSpec {
    /// Refresh picker intervals offered when a dashboard does not specify any
    pub const DEFAULT_INTERVALS: [&'static str; 10] =
        ["5s", "10s", "30s", "1m", "5m", "15m", "30m", "1h", "2h", "1d"];

    /// Fields a serialized time settings object must carry
    pub const REQUIRED_FIELDS: [&'static str; 6] = [
        "from",
        "to",
        "autoRefresh",
        "autoRefreshIntervals",
        "hideTimepicker",
        "fiscalYearStartMonth",
    ];

    #[must_use]
    pub fn default_intervals() -> Vec<String> {
        Self::DEFAULT_INTERVALS.iter().map(|s| (*s).to_string()).collect()
    }
}

impl Default for TimeSettingsSpec {
    fn default() -> Self {
        Self {
            timezone: Some("browser".to_string()),
            from: "now-6h".to_string(),
            to: "now".to_string(),
            auto_refresh: String::new(),
            auto_refresh_intervals: Self::default_intervals(),
            quick_ranges: None,
            hide_timepicker: false,
            week_start: None,
            fiscal_year_start_month: 0,
            now_delay: None,
        }
    }
}

/// Quick range offered by the time picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRangeOption {
    pub display: String,
    pub from: String,
    pub to: String,
}

/// `link` or `dashboards`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DashboardLinkType {
    #[default]
    Link,
    Dashboards,
}

/// Link to another dashboard or an external resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct DashboardLink {
    pub title: String,
    #[serde(rename = "type")]
    pub link_type: DashboardLinkType,
    pub icon: String,
    pub tooltip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub tags: Vec<String>,
    pub as_dropdown: bool,
    pub target_blank: bool,
    pub include_vars: bool,
    pub keep_time: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn link_type_field_name() {
        let link: DashboardLink =
            serde_json::from_value(json!({"title": "x", "type": "dashboards", "tags": ["t"]}))
                .unwrap();
        assert_eq!(link.link_type, DashboardLinkType::Dashboards);
        let back = serde_json::to_value(&link).unwrap();
        assert_eq!(back["type"], json!("dashboards"));
        assert!(back.get("url").is_none());
    }

    #[test]
    fn time_settings_defaults() {
        let ts = TimeSettingsSpec::default();
        assert_eq!(ts.auto_refresh_intervals.len(), 10);
        assert_eq!(ts.timezone.as_deref(), Some("browser"));
    }
}
