//! Variable kind dispatch
//!
//! One mapping function per kind, in both directions. Unknown kinds raise
//! [`TransformError::UnsupportedVariableKind`]; callers isolate the failure to
//! that one variable.

use crate::error::{TransformError, TransformResult};
use dash_scene::{
    AdHocFiltersVariable, ConstantVariable, CustomVariable, DataSourceVariable, GroupByVariable,
    IntervalVariable, QueryVariable, SceneVariable, SnapshotVariable, TextBoxVariable,
    VariableCommon,
};
use dash_schema::v1::{non_empty, LooseObject};
use dash_schema::v2::{
    AdHocFilterWithLabels, AdhocVariableSpec, ConstantVariableSpec, CustomVariableSpec,
    DataQueryKind, DataSourceRef, DatasourceVariableSpec, GroupByVariableSpec,
    IntervalVariableSpec, QueryVariableSpec, StringOrArray, TextVariableSpec, VariableKind,
    VariableOption, VariableRefresh, LEGACY_STRING_VALUE_KEY,
};
use dash_schema::FromLegacy;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// Placeholder datasource selection stored by older dashboards
pub const DEFAULT_DATASOURCE_PLACEHOLDER: &str = "default";
/// Current auto interval sentinel
pub const AUTO_INTERVAL: &str = "$__auto";

static LEGACY_AUTO_INTERVAL: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^\$__auto_interval_\w+$").ok());

const ELEMENT: &str = "variable";

// ---------------------------------------------------------------------------
// v1 -> scene
// ---------------------------------------------------------------------------

/// Build a scene variable from a legacy `templating.list[]` record
///
/// # Errors
///
/// `UnsupportedVariableKind` for an unknown `type`, `InvalidElement` when the
/// record has no name.
pub fn variable_from_v1(record: &Value) -> TransformResult<SceneVariable> {
    let name = non_empty(record, "name").ok_or_else(|| {
        TransformError::invalid_element(ELEMENT, "<unnamed>", "missing variable name")
    })?;
    let common = VariableCommon {
        name,
        label: record.str_field("label").map(str::to_string),
        description: record.str_field("description").map(str::to_string),
        hide: FromLegacy::from_legacy(record.get("hide")),
        skip_url_sync: record.bool_field("skipUrlSync").unwrap_or(false),
    };
    let current = record
        .get("current")
        .map(VariableOption::from_loose)
        .unwrap_or_default();
    let options = loose_options(record.get("options"));
    let query_text = loose_query_text(record.get("query"));

    let var_type = record.str_field("type").unwrap_or_default();
    let variable = match var_type {
        "query" => {
            let datasource = record.get("datasource").and_then(DataSourceRef::from_loose);
            SceneVariable::Query(QueryVariable {
                query: legacy_query(record.get("query"), datasource.as_ref()),
                datasource,
                definition: record.str_field("definition").map(str::to_string),
                regex: record.str_field("regex").unwrap_or_default().to_string(),
                sort: FromLegacy::from_legacy(record.get("sort")),
                refresh: FromLegacy::from_legacy(record.get("refresh")),
                is_multi: record.bool_field("multi").unwrap_or(false),
                include_all: record.bool_field("includeAll").unwrap_or(false),
                all_value: non_empty(record, "allValue"),
                placeholder: record.str_field("placeholder").map(str::to_string),
                allow_custom_value: record.bool_field("allowCustomValue").unwrap_or(true),
                static_options: record
                    .array_field("staticOptions")
                    .map(|items| items.iter().map(VariableOption::from_loose).collect()),
                static_options_order: record.str_field("staticOptionsOrder").map(str::to_string),
                common,
                current,
                options,
            })
        }
        "custom" => SceneVariable::Custom(CustomVariable {
            common,
            query: query_text,
            current,
            options,
            is_multi: record.bool_field("multi").unwrap_or(false),
            include_all: record.bool_field("includeAll").unwrap_or(false),
            all_value: non_empty(record, "allValue"),
            allow_custom_value: record.bool_field("allowCustomValue").unwrap_or(true),
        }),
        "datasource" => datasource_variable(DataSourceVariable {
            common,
            plugin_id: query_text,
            refresh: FromLegacy::from_legacy(record.get("refresh")),
            regex: record.str_field("regex").unwrap_or_default().to_string(),
            current,
            options,
            is_multi: record.bool_field("multi").unwrap_or(false),
            include_all: record.bool_field("includeAll").unwrap_or(false),
            all_value: non_empty(record, "allValue"),
            allow_custom_value: record.bool_field("allowCustomValue").unwrap_or(true),
            default_option_enabled: false,
        }),
        "interval" => interval_variable(IntervalVariable {
            common,
            intervals: query_text,
            current,
            options,
            auto_enabled: record.bool_field("auto").unwrap_or(false),
            auto_min_interval: record.str_field("auto_min").unwrap_or("10s").to_string(),
            auto_step_count: record.i64_field("auto_count").unwrap_or(30),
            refresh: VariableRefresh::OnTimeRangeChanged,
        }),
        "constant" => SceneVariable::Constant(ConstantVariable {
            current: current_or_query(record, &query_text),
            value: query_text,
            common,
        }),
        "textbox" => SceneVariable::TextBox(TextBoxVariable {
            current: current_or_query(record, &query_text),
            query: query_text,
            common,
        }),
        "groupby" => SceneVariable::GroupBy(GroupByVariable {
            common,
            datasource: record.get("datasource").and_then(DataSourceRef::from_loose),
            default_value: record.get("defaultValue").map(VariableOption::from_loose),
            current,
            options,
            is_multi: record.bool_field("multi").unwrap_or(true),
        }),
        "adhoc" => SceneVariable::AdHocFilters(AdHocFiltersVariable {
            common,
            datasource: record.get("datasource").and_then(DataSourceRef::from_loose),
            base_filters: loose_filters(record.get("baseFilters")),
            filters: loose_filters(record.get("filters")),
            default_keys: record.array_field("defaultKeys").cloned().unwrap_or_default(),
            allow_custom_value: record.bool_field("allowCustomValue").unwrap_or(true),
            read_only: false,
        }),
        other => return Err(TransformError::UnsupportedVariableKind(other.to_string())),
    };
    Ok(variable)
}

fn loose_options(value: Option<&Value>) -> Vec<VariableOption> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().map(VariableOption::from_loose).collect())
        .unwrap_or_default()
}

fn loose_filters(value: Option<&Value>) -> Vec<AdHocFilterWithLabels> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|f| serde_json::from_value(f.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Legacy `query` as text; object queries fall back to their `query` member
fn loose_query_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(obj)) => obj
            .get("query")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

/// Wrap a legacy query; plain strings go under [`LEGACY_STRING_VALUE_KEY`]
fn legacy_query(value: Option<&Value>, datasource: Option<&DataSourceRef>) -> DataQueryKind {
    let kind = datasource
        .and_then(|ds| ds.ds_type.clone())
        .unwrap_or_default();
    let spec = match value {
        Some(Value::Object(obj)) => obj.clone(),
        Some(Value::String(s)) => {
            let mut spec = Map::new();
            spec.insert(LEGACY_STRING_VALUE_KEY.to_string(), Value::String(s.clone()));
            spec
        }
        _ => Map::new(),
    };
    DataQueryKind { kind, spec }
}

fn current_or_query(record: &Value, query: &str) -> VariableOption {
    match record.get("current") {
        Some(current) if current.get("value").is_some() => VariableOption::from_loose(current),
        _ => VariableOption::new(query, query),
    }
}

// ---------------------------------------------------------------------------
// v2 -> scene
// ---------------------------------------------------------------------------

/// Build a scene variable from a v2 `variables[]` entry
///
/// # Errors
///
/// `UnsupportedVariableKind` for a kind outside [`VariableKind::KINDS`],
/// `InvalidElement` when the spec does not parse.
pub fn variable_from_v2(entry: &Value) -> TransformResult<SceneVariable> {
    let kind = entry.str_field("kind").unwrap_or_default();
    if !VariableKind::KINDS.contains(&kind) {
        return Err(TransformError::UnsupportedVariableKind(kind.to_string()));
    }
    let typed: VariableKind = serde_json::from_value(entry.clone()).map_err(|e| {
        let name = entry
            .get("spec")
            .and_then(|s| s.str_field("name"))
            .unwrap_or("<unnamed>");
        TransformError::invalid_element(ELEMENT, name, e.to_string())
    })?;
    Ok(from_kind(typed))
}

/// Map a typed v2 variable onto its scene node
#[must_use]
pub fn from_kind(kind: VariableKind) -> SceneVariable {
    match kind {
        VariableKind::QueryVariable(s) => SceneVariable::Query(QueryVariable {
            common: common(s.name, s.label, s.description, s.hide, s.skip_url_sync),
            current: s.current,
            options: s.options,
            datasource: s.datasource,
            query: s.query,
            definition: s.definition,
            regex: s.regex,
            sort: s.sort,
            refresh: s.refresh,
            is_multi: s.multi,
            include_all: s.include_all,
            all_value: s.all_value,
            placeholder: s.placeholder,
            allow_custom_value: s.allow_custom_value,
            static_options: s.static_options,
            static_options_order: s.static_options_order,
        }),
        VariableKind::TextVariable(s) => SceneVariable::TextBox(TextBoxVariable {
            common: common(s.name, s.label, s.description, s.hide, s.skip_url_sync),
            query: s.query,
            current: s.current,
        }),
        VariableKind::ConstantVariable(s) => SceneVariable::Constant(ConstantVariable {
            common: common(s.name, s.label, s.description, s.hide, s.skip_url_sync),
            value: s.query,
            current: s.current,
        }),
        VariableKind::DatasourceVariable(s) => datasource_variable(DataSourceVariable {
            common: common(s.name, s.label, s.description, s.hide, s.skip_url_sync),
            plugin_id: s.plugin_id,
            refresh: s.refresh,
            regex: s.regex,
            current: s.current,
            options: s.options,
            is_multi: s.multi,
            include_all: s.include_all,
            all_value: s.all_value,
            allow_custom_value: s.allow_custom_value,
            default_option_enabled: false,
        }),
        VariableKind::IntervalVariable(s) => interval_variable(IntervalVariable {
            common: common(s.name, s.label, s.description, s.hide, s.skip_url_sync),
            intervals: s.query,
            current: s.current,
            options: s.options,
            auto_enabled: s.auto,
            auto_min_interval: s.auto_min,
            auto_step_count: s.auto_count,
            refresh: s.refresh,
        }),
        VariableKind::CustomVariable(s) => SceneVariable::Custom(CustomVariable {
            common: common(s.name, s.label, s.description, s.hide, s.skip_url_sync),
            query: s.query,
            current: s.current,
            options: s.options,
            is_multi: s.multi,
            include_all: s.include_all,
            all_value: s.all_value,
            allow_custom_value: s.allow_custom_value,
        }),
        VariableKind::GroupByVariable(s) => SceneVariable::GroupBy(GroupByVariable {
            common: common(s.name, s.label, s.description, s.hide, s.skip_url_sync),
            datasource: s.datasource,
            default_value: s.default_value,
            current: s.current,
            options: s.options,
            is_multi: s.multi,
        }),
        VariableKind::AdhocVariable(s) => SceneVariable::AdHocFilters(AdHocFiltersVariable {
            common: common(s.name, s.label, s.description, s.hide, s.skip_url_sync),
            datasource: s.datasource,
            base_filters: s.base_filters,
            filters: s.filters,
            default_keys: s.default_keys,
            allow_custom_value: s.allow_custom_value,
            read_only: false,
        }),
    }
}

fn common(
    name: String,
    label: Option<String>,
    description: Option<String>,
    hide: dash_schema::v2::VariableHide,
    skip_url_sync: bool,
) -> VariableCommon {
    VariableCommon {
        name,
        label,
        description,
        hide,
        skip_url_sync,
    }
}

/// A `default` selection becomes a flag; the placeholder is not kept as a value
fn datasource_variable(mut var: DataSourceVariable) -> SceneVariable {
    if var.current.value.first() == DEFAULT_DATASOURCE_PLACEHOLDER {
        var.default_option_enabled = true;
        var.current.value = StringOrArray::default();
    }
    SceneVariable::DataSource(var)
}

/// Legacy `$__auto_interval_<name>` selections become [`AUTO_INTERVAL`]
fn interval_variable(mut var: IntervalVariable) -> SceneVariable {
    let is_legacy = |s: &StringOrArray| {
        LEGACY_AUTO_INTERVAL
            .as_ref()
            .is_some_and(|re| re.is_match(s.first()))
    };
    if is_legacy(&var.current.value) {
        var.current.value = StringOrArray::from(AUTO_INTERVAL);
    }
    if is_legacy(&var.current.text) {
        var.current.text = StringOrArray::from(AUTO_INTERVAL);
    }
    SceneVariable::Interval(var)
}

/// Freeze a live variable for snapshot display
///
/// Adhoc filters stay live-typed but are flagged read-only.
#[must_use]
pub fn freeze_for_snapshot(variable: SceneVariable) -> SceneVariable {
    match variable {
        SceneVariable::AdHocFilters(mut adhoc) => {
            adhoc.read_only = true;
            SceneVariable::AdHocFilters(adhoc)
        }
        SceneVariable::Snapshot(frozen) => SceneVariable::Snapshot(frozen),
        live => {
            let current = live.current().cloned().unwrap_or_default();
            let common = live.common().clone();
            SceneVariable::Snapshot(SnapshotVariable {
                common,
                current,
                original: variable_to_v2(&live, true),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// scene -> v2
// ---------------------------------------------------------------------------

/// Serialize a scene variable
///
/// Query variable options are persisted only when the variable never
/// refreshes or `keep_options` is set (snapshots). Snapshot holders emit the
/// record they were frozen from.
#[must_use]
pub fn variable_to_v2(variable: &SceneVariable, keep_options: bool) -> VariableKind {
    match variable {
        SceneVariable::Query(v) => VariableKind::QueryVariable(QueryVariableSpec {
            name: v.common.name.clone(),
            current: v.current.clone(),
            label: v.common.label.clone(),
            hide: v.common.hide,
            refresh: v.refresh,
            skip_url_sync: v.common.skip_url_sync,
            description: v.common.description.clone(),
            datasource: v.datasource.clone(),
            query: v.query.clone(),
            regex: v.regex.clone(),
            sort: v.sort,
            definition: v.definition.clone(),
            options: if keep_options || v.refresh == VariableRefresh::Never {
                v.options.clone()
            } else {
                Vec::new()
            },
            multi: v.is_multi,
            include_all: v.include_all,
            all_value: v.all_value.clone(),
            placeholder: v.placeholder.clone(),
            allow_custom_value: v.allow_custom_value,
            static_options: v.static_options.clone(),
            static_options_order: v.static_options_order.clone(),
        }),
        SceneVariable::Custom(v) => VariableKind::CustomVariable(CustomVariableSpec {
            name: v.common.name.clone(),
            query: v.query.clone(),
            current: v.current.clone(),
            options: v.options.clone(),
            multi: v.is_multi,
            include_all: v.include_all,
            all_value: v.all_value.clone(),
            label: v.common.label.clone(),
            hide: v.common.hide,
            skip_url_sync: v.common.skip_url_sync,
            description: v.common.description.clone(),
            allow_custom_value: v.allow_custom_value,
        }),
        SceneVariable::DataSource(v) => {
            let mut current = v.current.clone();
            if v.default_option_enabled {
                current.value = StringOrArray::from(DEFAULT_DATASOURCE_PLACEHOLDER);
            }
            VariableKind::DatasourceVariable(DatasourceVariableSpec {
                name: v.common.name.clone(),
                plugin_id: v.plugin_id.clone(),
                refresh: v.refresh,
                regex: v.regex.clone(),
                current,
                options: v.options.clone(),
                multi: v.is_multi,
                include_all: v.include_all,
                all_value: v.all_value.clone(),
                label: v.common.label.clone(),
                hide: v.common.hide,
                skip_url_sync: v.common.skip_url_sync,
                description: v.common.description.clone(),
                allow_custom_value: v.allow_custom_value,
            })
        }
        SceneVariable::Interval(v) => VariableKind::IntervalVariable(IntervalVariableSpec {
            name: v.common.name.clone(),
            query: v.intervals.clone(),
            current: v.current.clone(),
            options: v.options.clone(),
            auto: v.auto_enabled,
            auto_min: v.auto_min_interval.clone(),
            auto_count: v.auto_step_count,
            refresh: v.refresh,
            label: v.common.label.clone(),
            hide: v.common.hide,
            skip_url_sync: v.common.skip_url_sync,
            description: v.common.description.clone(),
        }),
        SceneVariable::Constant(v) => VariableKind::ConstantVariable(ConstantVariableSpec {
            name: v.common.name.clone(),
            query: v.value.clone(),
            current: v.current.clone(),
            label: v.common.label.clone(),
            hide: v.common.hide,
            skip_url_sync: v.common.skip_url_sync,
            description: v.common.description.clone(),
        }),
        SceneVariable::TextBox(v) => VariableKind::TextVariable(TextVariableSpec {
            name: v.common.name.clone(),
            current: v.current.clone(),
            query: v.query.clone(),
            label: v.common.label.clone(),
            hide: v.common.hide,
            skip_url_sync: v.common.skip_url_sync,
            description: v.common.description.clone(),
        }),
        SceneVariable::GroupBy(v) => VariableKind::GroupByVariable(GroupByVariableSpec {
            name: v.common.name.clone(),
            datasource: v.datasource.clone(),
            default_value: v.default_value.clone(),
            current: v.current.clone(),
            options: v.options.clone(),
            multi: v.is_multi,
            label: v.common.label.clone(),
            hide: v.common.hide,
            skip_url_sync: v.common.skip_url_sync,
            description: v.common.description.clone(),
        }),
        SceneVariable::AdHocFilters(v) => VariableKind::AdhocVariable(AdhocVariableSpec {
            name: v.common.name.clone(),
            datasource: v.datasource.clone(),
            base_filters: v.base_filters.clone(),
            filters: v.filters.clone(),
            default_keys: v.default_keys.clone(),
            label: v.common.label.clone(),
            hide: v.common.hide,
            skip_url_sync: v.common.skip_url_sync,
            description: v.common.description.clone(),
            allow_custom_value: v.allow_custom_value,
        }),
        SceneVariable::Snapshot(v) => v.original.clone(),
    }
}
