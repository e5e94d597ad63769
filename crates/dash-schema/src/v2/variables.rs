//! Template variable kinds

use super::elements::{DataQueryKind, DataSourceRef};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key under which a legacy string query is wrapped into a query spec object
pub const LEGACY_STRING_VALUE_KEY: &str = "__legacyStringValue";

/// Persisted variable, one variant per kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "spec")]
pub enum VariableKind {
    QueryVariable(QueryVariableSpec),
    TextVariable(TextVariableSpec),
    ConstantVariable(ConstantVariableSpec),
    DatasourceVariable(DatasourceVariableSpec),
    IntervalVariable(IntervalVariableSpec),
    CustomVariable(CustomVariableSpec),
    GroupByVariable(GroupByVariableSpec),
    AdhocVariable(AdhocVariableSpec),
}

impl VariableKind {
    /// Every kind tag accepted in `variables[].kind`
    pub const KINDS: [&'static str; 8] = [
        "QueryVariable",
        "TextVariable",
        "ConstantVariable",
        "DatasourceVariable",
        "IntervalVariable",
        "CustomVariable",
        "GroupByVariable",
        "AdhocVariable",
    ];

    /// Variable name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::QueryVariable(s) => &s.name,
            Self::TextVariable(s) => &s.name,
            Self::ConstantVariable(s) => &s.name,
            Self::DatasourceVariable(s) => &s.name,
            Self::IntervalVariable(s) => &s.name,
            Self::CustomVariable(s) => &s.name,
            Self::GroupByVariable(s) => &s.name,
            Self::AdhocVariable(s) => &s.name,
        }
    }

    /// Kind tag
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::QueryVariable(_) => "QueryVariable",
            Self::TextVariable(_) => "TextVariable",
            Self::ConstantVariable(_) => "ConstantVariable",
            Self::DatasourceVariable(_) => "DatasourceVariable",
            Self::IntervalVariable(_) => "IntervalVariable",
            Self::CustomVariable(_) => "CustomVariable",
            Self::GroupByVariable(_) => "GroupByVariable",
            Self::AdhocVariable(_) => "AdhocVariable",
        }
    }
}

/// Single string or list of strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrArray {
    One(String),
    Many(Vec<String>),
}

impl Default for StringOrArray {
    fn default() -> Self {
        Self::One(String::new())
    }
}

impl StringOrArray {
    /// First value, or the string itself
    #[must_use]
    pub fn first(&self) -> &str {
        match self {
            Self::One(s) => s,
            Self::Many(v) => v.first().map_or("", String::as_str),
        }
    }

    /// Read from loose JSON: strings, arrays of scalars, and scalars
    #[must_use]
    pub fn from_loose(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::One(s.clone()),
            Value::Array(items) => Self::Many(items.iter().map(scalar_to_string).collect()),
            Value::Null => Self::default(),
            other => Self::One(scalar_to_string(other)),
        }
    }
}

impl From<&str> for StringOrArray {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Option of a variable, also used for the current selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableOption {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
    #[serde(default)]
    pub text: StringOrArray,
    #[serde(default)]
    pub value: StringOrArray,
}

impl VariableOption {
    #[must_use]
    pub fn new(text: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            selected: None,
            text: StringOrArray::One(text.into()),
            value: StringOrArray::One(value.into()),
        }
    }

    /// Read from a legacy `current` or option object
    #[must_use]
    pub fn from_loose(value: &Value) -> Self {
        Self {
            selected: value.get("selected").and_then(Value::as_bool),
            text: value.get("text").map(StringOrArray::from_loose).unwrap_or_default(),
            value: value.get("value").map(StringOrArray::from_loose).unwrap_or_default(),
        }
    }
}

/// Visibility of the variable picker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VariableHide {
    #[default]
    DontHide,
    HideLabel,
    HideVariable,
}

/// When a variable re-queries its options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VariableRefresh {
    #[default]
    Never,
    OnDashboardLoad,
    OnTimeRangeChanged,
}

/// Option sort order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VariableSort {
    #[default]
    Disabled,
    AlphabeticalAsc,
    AlphabeticalDesc,
    NumericalAsc,
    NumericalDesc,
    AlphabeticalCaseInsensitiveAsc,
    AlphabeticalCaseInsensitiveDesc,
    NaturalAsc,
    NaturalDesc,
}

const fn yes() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct QueryVariableSpec {
    pub name: String,
    #[serde(default)]
    pub current: VariableOption,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub hide: VariableHide,
    #[serde(default)]
    pub refresh: VariableRefresh,
    #[serde(default)]
    pub skip_url_sync: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasource: Option<DataSourceRef>,
    #[serde(default)]
    pub query: DataQueryKind,
    #[serde(default)]
    pub regex: String,
    #[serde(default)]
    pub sort: VariableSort,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(default)]
    pub options: Vec<VariableOption>,
    #[serde(default)]
    pub multi: bool,
    #[serde(default)]
    pub include_all: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default = "yes")]
    pub allow_custom_value: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_options: Option<Vec<VariableOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_options_order: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextVariableSpec {
    pub name: String,
    #[serde(default)]
    pub current: VariableOption,
    #[serde(default)]
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub hide: VariableHide,
    #[serde(default)]
    pub skip_url_sync: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstantVariableSpec {
    pub name: String,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub current: VariableOption,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub hide: VariableHide,
    #[serde(default)]
    pub skip_url_sync: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct DatasourceVariableSpec {
    pub name: String,
    #[serde(default)]
    pub plugin_id: String,
    #[serde(default)]
    pub refresh: VariableRefresh,
    #[serde(default)]
    pub regex: String,
    #[serde(default)]
    pub current: VariableOption,
    #[serde(default)]
    pub options: Vec<VariableOption>,
    #[serde(default)]
    pub multi: bool,
    #[serde(default)]
    pub include_all: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub hide: VariableHide,
    #[serde(default)]
    pub skip_url_sync: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "yes")]
    pub allow_custom_value: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalVariableSpec {
    pub name: String,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub current: VariableOption,
    #[serde(default)]
    pub options: Vec<VariableOption>,
    #[serde(default)]
    pub auto: bool,
    #[serde(default, rename = "auto_min")]
    pub auto_min: String,
    #[serde(default, rename = "auto_count")]
    pub auto_count: i64,
    #[serde(default)]
    pub refresh: VariableRefresh,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub hide: VariableHide,
    #[serde(default)]
    pub skip_url_sync: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct CustomVariableSpec {
    pub name: String,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub current: VariableOption,
    #[serde(default)]
    pub options: Vec<VariableOption>,
    #[serde(default)]
    pub multi: bool,
    #[serde(default)]
    pub include_all: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub hide: VariableHide,
    #[serde(default)]
    pub skip_url_sync: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "yes")]
    pub allow_custom_value: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupByVariableSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasource: Option<DataSourceRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<VariableOption>,
    #[serde(default)]
    pub current: VariableOption,
    #[serde(default)]
    pub options: Vec<VariableOption>,
    #[serde(default)]
    pub multi: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub hide: VariableHide,
    #[serde(default)]
    pub skip_url_sync: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdhocVariableSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasource: Option<DataSourceRef>,
    #[serde(default)]
    pub base_filters: Vec<AdHocFilterWithLabels>,
    #[serde(default)]
    pub filters: Vec<AdHocFilterWithLabels>,
    /// `MetricFindValue` records, kept as written
    #[serde(default)]
    pub default_keys: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub hide: VariableHide,
    #[serde(default)]
    pub skip_url_sync: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "yes")]
    pub allow_custom_value: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdHocFilterWithLabels {
    pub key: String,
    pub operator: String,
    #[serde(default)]
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_edit: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn adjacent_tagging() {
        let var: VariableKind = serde_json::from_value(json!({
            "kind": "TextVariable",
            "spec": {"name": "q", "query": "abc", "current": {"text": "abc", "value": "abc"}}
        }))
        .unwrap();

        assert_eq!(var.name(), "q");
        assert_eq!(var.kind(), "TextVariable");
        let VariableKind::TextVariable(spec) = &var else {
            panic!("expected text variable");
        };
        assert_eq!(spec.hide, VariableHide::DontHide);
    }

    #[test]
    fn interval_keeps_snake_case_keys() {
        let var = VariableKind::IntervalVariable(IntervalVariableSpec {
            name: "i".into(),
            query: "1m,5m".into(),
            current: VariableOption::new("1m", "1m"),
            options: vec![],
            auto: true,
            auto_min: "10s".into(),
            auto_count: 30,
            refresh: VariableRefresh::OnTimeRangeChanged,
            label: None,
            hide: VariableHide::DontHide,
            skip_url_sync: false,
            description: None,
        });
        let value = serde_json::to_value(&var).unwrap();
        assert_eq!(value["spec"]["auto_min"], json!("10s"));
        assert_eq!(value["spec"]["auto_count"], json!(30));
        assert_eq!(value["spec"]["refresh"], json!("onTimeRangeChanged"));
    }

    #[test]
    fn string_or_array_from_loose() {
        assert_eq!(StringOrArray::from_loose(&json!("a")), StringOrArray::One("a".into()));
        assert_eq!(
            StringOrArray::from_loose(&json!(["a", 1])),
            StringOrArray::Many(vec!["a".into(), "1".into()])
        );
        assert_eq!(StringOrArray::from_loose(&json!(5)).first(), "5");
    }

    #[test]
    fn sort_names() {
        let v = serde_json::to_value(VariableSort::AlphabeticalCaseInsensitiveDesc).unwrap();
        assert_eq!(v, json!("alphabeticalCaseInsensitiveDesc"));
    }
}
