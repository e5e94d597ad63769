//! Template variables
//!
//! The eight live kinds form a closed enum; every consumer matches on it
//! exhaustively. Snapshot dashboards freeze variables into
//! [`SnapshotVariable`] holders that keep the persisted record verbatim.

use crate::error::{SceneError, SceneResult};
use dash_schema::v2::{
    AdHocFilterWithLabels, DataQueryKind, DataSourceRef, StringOrArray, VariableHide,
    VariableKind, VariableOption, VariableRefresh, VariableSort,
};
use serde_json::Value;
use std::collections::BTreeSet;

/// Fields shared by every variable kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableCommon {
    pub name: String,
    pub label: Option<String>,
    pub description: Option<String>,
    pub hide: VariableHide,
    pub skip_url_sync: bool,
}

impl VariableCommon {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct QueryVariable {
    pub common: VariableCommon,
    pub current: VariableOption,
    pub options: Vec<VariableOption>,
    pub datasource: Option<DataSourceRef>,
    pub query: DataQueryKind,
    pub definition: Option<String>,
    pub regex: String,
    pub sort: VariableSort,
    pub refresh: VariableRefresh,
    pub is_multi: bool,
    pub include_all: bool,
    pub all_value: Option<String>,
    pub placeholder: Option<String>,
    pub allow_custom_value: bool,
    pub static_options: Option<Vec<VariableOption>>,
    pub static_options_order: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomVariable {
    pub common: VariableCommon,
    pub query: String,
    pub current: VariableOption,
    pub options: Vec<VariableOption>,
    pub is_multi: bool,
    pub include_all: bool,
    pub all_value: Option<String>,
    pub allow_custom_value: bool,
}

#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct DataSourceVariable {
    pub common: VariableCommon,
    pub plugin_id: String,
    pub refresh: VariableRefresh,
    pub regex: String,
    pub current: VariableOption,
    pub options: Vec<VariableOption>,
    pub is_multi: bool,
    pub include_all: bool,
    pub all_value: Option<String>,
    pub allow_custom_value: bool,
    /// The persisted selection was the `default` placeholder
    pub default_option_enabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntervalVariable {
    pub common: VariableCommon,
    /// Comma separated interval list
    pub intervals: String,
    pub current: VariableOption,
    pub options: Vec<VariableOption>,
    pub auto_enabled: bool,
    pub auto_min_interval: String,
    pub auto_step_count: i64,
    pub refresh: VariableRefresh,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstantVariable {
    pub common: VariableCommon,
    pub value: String,
    pub current: VariableOption,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextBoxVariable {
    pub common: VariableCommon,
    pub query: String,
    pub current: VariableOption,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupByVariable {
    pub common: VariableCommon,
    pub datasource: Option<DataSourceRef>,
    pub default_value: Option<VariableOption>,
    pub current: VariableOption,
    pub options: Vec<VariableOption>,
    pub is_multi: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdHocFiltersVariable {
    pub common: VariableCommon,
    pub datasource: Option<DataSourceRef>,
    pub base_filters: Vec<AdHocFilterWithLabels>,
    pub filters: Vec<AdHocFilterWithLabels>,
    pub default_keys: Vec<Value>,
    pub allow_custom_value: bool,
    pub read_only: bool,
}

/// Frozen value holder used for snapshots
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotVariable {
    pub common: VariableCommon,
    pub current: VariableOption,
    /// Persisted record this holder was built from
    pub original: VariableKind,
}

/// Variable node
#[derive(Debug, Clone, PartialEq)]
pub enum SceneVariable {
    Query(QueryVariable),
    Custom(CustomVariable),
    DataSource(DataSourceVariable),
    Interval(IntervalVariable),
    Constant(ConstantVariable),
    TextBox(TextBoxVariable),
    GroupBy(GroupByVariable),
    AdHocFilters(AdHocFiltersVariable),
    Snapshot(SnapshotVariable),
}

impl SceneVariable {
    #[must_use]
    pub fn common(&self) -> &VariableCommon {
        match self {
            Self::Query(v) => &v.common,
            Self::Custom(v) => &v.common,
            Self::DataSource(v) => &v.common,
            Self::Interval(v) => &v.common,
            Self::Constant(v) => &v.common,
            Self::TextBox(v) => &v.common,
            Self::GroupBy(v) => &v.common,
            Self::AdHocFilters(v) => &v.common,
            Self::Snapshot(v) => &v.common,
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.common().name
    }

    /// Current selection; adhoc filters have none
    #[must_use]
    pub fn current(&self) -> Option<&VariableOption> {
        match self {
            Self::Query(v) => Some(&v.current),
            Self::Custom(v) => Some(&v.current),
            Self::DataSource(v) => Some(&v.current),
            Self::Interval(v) => Some(&v.current),
            Self::Constant(v) => Some(&v.current),
            Self::TextBox(v) => Some(&v.current),
            Self::GroupBy(v) => Some(&v.current),
            Self::Snapshot(v) => Some(&v.current),
            Self::AdHocFilters(_) => None,
        }
    }

    /// Values used in URL sync (`var-<name>`)
    #[must_use]
    pub fn url_values(&self) -> Vec<String> {
        match self {
            Self::AdHocFilters(v) => v
                .filters
                .iter()
                .map(|f| format!("{}|{}|{}", f.key, f.operator, f.value))
                .collect(),
            other => match other.current().map(|c| &c.value) {
                Some(StringOrArray::One(s)) => vec![s.clone()],
                Some(StringOrArray::Many(v)) => v.clone(),
                None => Vec::new(),
            },
        }
    }

    #[must_use]
    pub fn is_read_only(&self) -> bool {
        match self {
            Self::Snapshot(_) => true,
            Self::AdHocFilters(v) => v.read_only,
            _ => false,
        }
    }

    /// Set the current selection
    ///
    /// # Errors
    ///
    /// `ReadOnlyVariable` for snapshot holders and read-only adhoc filters.
    pub fn set_current(&mut self, value: VariableOption) -> SceneResult<()> {
        match self {
            Self::Query(v) => v.current = value,
            Self::Custom(v) => v.current = value,
            Self::DataSource(v) => {
                v.default_option_enabled = false;
                v.current = value;
            }
            Self::Interval(v) => v.current = value,
            Self::Constant(v) => v.current = value,
            Self::TextBox(v) => v.current = value,
            Self::GroupBy(v) => v.current = value,
            Self::Snapshot(SnapshotVariable { common, .. })
            | Self::AdHocFilters(AdHocFiltersVariable { common, .. }) => {
                return Err(SceneError::ReadOnlyVariable {
                    name: common.name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Ordered set of variables with unique names
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneVariableSet {
    variables: Vec<SceneVariable>,
    loading: BTreeSet<String>,
}

impl SceneVariableSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a variable
    ///
    /// # Errors
    ///
    /// `DuplicateVariable` when the name is already taken.
    pub fn add(&mut self, variable: SceneVariable) -> SceneResult<()> {
        if self.get(variable.name()).is_some() {
            return Err(SceneError::duplicate_variable(variable.name()));
        }
        self.variables.push(variable);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SceneVariable> {
        self.variables.iter().find(|v| v.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut SceneVariable> {
        self.variables.iter_mut().find(|v| v.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneVariable> {
        self.variables.iter()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Mark a variable as resolving or settled
    ///
    /// # Errors
    ///
    /// `UnknownVariable` when the name is not in the set.
    pub fn set_loading(&mut self, name: &str, loading: bool) -> SceneResult<()> {
        if self.get(name).is_none() {
            return Err(SceneError::unknown_variable(name));
        }
        if loading {
            self.loading.insert(name.to_string());
        } else {
            self.loading.remove(name);
        }
        Ok(())
    }

    #[must_use]
    pub fn is_loading(&self, name: &str) -> bool {
        self.loading.contains(name)
    }

    #[must_use]
    pub fn any_loading(&self) -> bool {
        !self.loading.is_empty()
    }

    /// Names of the variables currently resolving
    pub fn loading_names(&self) -> impl Iterator<Item = &str> {
        self.loading.iter().map(String::as_str)
    }

    /// `(name, values)` pairs for every variable synced to the URL
    #[must_use]
    pub fn url_values(&self) -> Vec<(String, Vec<String>)> {
        self.variables
            .iter()
            .filter(|v| !v.common().skip_url_sync)
            .map(|v| (v.name().to_string(), v.url_values()))
            .collect()
    }
}

impl<'a> IntoIterator for &'a SceneVariableSet {
    type Item = &'a SceneVariable;
    type IntoIter = std::slice::Iter<'a, SceneVariable>;

    fn into_iter(self) -> Self::IntoIter {
        self.variables.iter()
    }
}
