//! Decoding of legacy enum encodings
//!
//! v1 documents store variable hide/refresh/sort and the cursor sync mode as
//! integers, but hand-edited and partially migrated documents also carry the
//! string names. Both are accepted; anything else falls back to the schema
//! default.

use crate::v2::{CursorSync, VariableHide, VariableRefresh, VariableSort};
use serde_json::Value;

/// Enum readable from a legacy integer or string field
pub trait FromLegacy: Sized + Default {
    /// Variant for a legacy integer code
    fn from_code(code: i64) -> Option<Self>;

    /// Variant for a string name (v2 spelling)
    fn from_name(name: &str) -> Option<Self>;

    /// Decode an optional legacy value, falling back to the default
    fn from_legacy(value: Option<&Value>) -> Self {
        let decoded = match value {
            Some(Value::Number(n)) => n.as_i64().and_then(Self::from_code),
            Some(Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .ok()
                .and_then(Self::from_code)
                .or_else(|| Self::from_name(s.trim())),
            Some(Value::Bool(b)) => Self::from_code(i64::from(*b)),
            _ => None,
        };
        decoded.unwrap_or_default()
    }
}

impl FromLegacy for VariableHide {
    fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::DontHide),
            1 => Some(Self::HideLabel),
            2 => Some(Self::HideVariable),
            _ => None,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "dontHide" => Some(Self::DontHide),
            "hideLabel" => Some(Self::HideLabel),
            "hideVariable" => Some(Self::HideVariable),
            _ => None,
        }
    }
}

impl FromLegacy for VariableRefresh {
    fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Never),
            1 => Some(Self::OnDashboardLoad),
            2 => Some(Self::OnTimeRangeChanged),
            _ => None,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "never" => Some(Self::Never),
            "onDashboardLoad" => Some(Self::OnDashboardLoad),
            "onTimeRangeChanged" => Some(Self::OnTimeRangeChanged),
            _ => None,
        }
    }
}

impl FromLegacy for VariableSort {
    fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Disabled),
            1 => Some(Self::AlphabeticalAsc),
            2 => Some(Self::AlphabeticalDesc),
            3 => Some(Self::NumericalAsc),
            4 => Some(Self::NumericalDesc),
            5 => Some(Self::AlphabeticalCaseInsensitiveAsc),
            6 => Some(Self::AlphabeticalCaseInsensitiveDesc),
            7 => Some(Self::NaturalAsc),
            8 => Some(Self::NaturalDesc),
            _ => None,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        serde_json::from_value(Value::String(name.to_string())).ok()
    }
}

impl FromLegacy for CursorSync {
    fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Off),
            1 => Some(Self::Crosshair),
            2 => Some(Self::Tooltip),
            _ => None,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "Off" => Some(Self::Off),
            "Crosshair" => Some(Self::Crosshair),
            "Tooltip" => Some(Self::Tooltip),
            _ => None,
        }
    }
}
