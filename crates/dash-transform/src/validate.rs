//! Structural validation of v2 specs
//!
//! Two passes, all violations collected:
//! - a compiled JSON schema for top-level types, the cursor sync enum,
//!   required time settings and the layout kind
//! - hand-written checks per layout kind (geometry, element references,
//!   nested layouts, auto grid modes)

use crate::error::{ValidationError, Violation};
use dash_schema::v2::{
    CursorSync, LayoutKind, TimeSettingsSpec, AUTO_GRID_HEIGHT_MODES, AUTO_GRID_WIDTH_MODES,
};
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};

static SPEC_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "required": [
            "annotations", "cursorSync", "elements", "layout", "links",
            "preload", "tags", "timeSettings", "title", "variables"
        ],
        "properties": {
            "annotations": {"type": "array", "items": {"type": "object", "required": ["kind", "spec"]}},
            "cursorSync": {"enum": CursorSync::VALUES},
            "description": {"type": "string"},
            "editable": {"type": "boolean"},
            "elements": {"type": "object", "additionalProperties": {
                "type": "object",
                "required": ["kind", "spec"],
                "properties": {"kind": {"enum": ["Panel", "LibraryPanel"]}}
            }},
            "layout": {
                "type": "object",
                "required": ["kind", "spec"],
                "properties": {"kind": {"enum": LayoutKind::KINDS}, "spec": {"type": "object"}}
            },
            "links": {"type": "array", "items": {"type": "object"}},
            "liveNow": {"type": "boolean"},
            "preload": {"type": "boolean"},
            "revision": {"type": "integer"},
            "tags": {"type": "array", "items": {"type": "string"}},
            "timeSettings": {
                "type": "object",
                "required": TimeSettingsSpec::REQUIRED_FIELDS,
                "properties": {
                    "from": {"type": "string"},
                    "to": {"type": "string"},
                    "autoRefresh": {"type": "string"},
                    "autoRefreshIntervals": {"type": "array", "items": {"type": "string"}},
                    "hideTimepicker": {"type": "boolean"},
                    "fiscalYearStartMonth": {"type": "integer", "minimum": 0, "maximum": 11},
                    "timezone": {"type": "string"},
                    "weekStart": {"type": "string"},
                    "nowDelay": {"type": "string"},
                    "quickRanges": {"type": "array"}
                }
            },
            "title": {"type": "string"},
            "variables": {"type": "array", "items": {"type": "object", "required": ["kind", "spec"]}}
        }
    })
});

static COMPILED: Lazy<Result<JSONSchema, String>> =
    Lazy::new(|| JSONSchema::compile(&SPEC_SCHEMA).map_err(|e| e.to_string()));

/// Validate a v2 spec value
///
/// # Errors
///
/// A [`ValidationError`] listing every violation found.
pub fn validate_spec(spec: &Value) -> Result<(), ValidationError> {
    let schema = COMPILED
        .as_ref()
        .map_err(|e| ValidationError::single("", format!("validator unavailable: {e}")))?;

    let mut violations: Vec<Violation> = match schema.validate(spec) {
        Ok(()) => Vec::new(),
        Err(errors) => errors
            .map(|e| Violation {
                path: e.instance_path.to_string(),
                message: e.to_string(),
            })
            .collect(),
    };

    if let (Some(layout), Some(elements)) = (
        spec.get("layout"),
        spec.get("elements").and_then(Value::as_object),
    ) {
        check_layout(layout, "/layout", elements, &mut violations);
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { violations })
    }
}

fn push(out: &mut Vec<Violation>, path: impl Into<String>, message: impl Into<String>) {
    out.push(Violation {
        path: path.into(),
        message: message.into(),
    });
}

fn check_layout(layout: &Value, path: &str, elements: &Map<String, Value>, out: &mut Vec<Violation>) {
    let kind = layout.get("kind").and_then(Value::as_str).unwrap_or_default();
    let Some(spec) = layout.get("spec").and_then(Value::as_object) else {
        push(out, format!("{path}/spec"), "layout spec must be an object");
        return;
    };
    let list = |key: &str| spec.get(key).and_then(Value::as_array).map(Vec::as_slice);

    match kind {
        "GridLayout" => {
            let Some(items) = list("items") else {
                push(out, format!("{path}/spec/items"), "grid layout needs an items array");
                return;
            };
            for (i, item) in items.iter().enumerate() {
                let item_path = format!("{path}/spec/items/{i}");
                check_item_kind(item, "GridLayoutItem", &item_path, out);
                let item_spec = item.get("spec");
                for field in ["x", "y", "width", "height"] {
                    match item_spec.and_then(|s| s.get(field)).and_then(Value::as_i64) {
                        Some(v) if v >= 0 => {}
                        Some(_) => push(out, format!("{item_path}/spec/{field}"), "must not be negative"),
                        None => push(out, format!("{item_path}/spec/{field}"), "must be an integer"),
                    }
                }
                check_reference(item_spec, &item_path, elements, out);
            }
        }
        "AutoGridLayout" => {
            check_mode(spec, "columnWidthMode", &AUTO_GRID_WIDTH_MODES, path, out);
            check_mode(spec, "rowHeightMode", &AUTO_GRID_HEIGHT_MODES, path, out);
            let Some(items) = list("items") else {
                push(out, format!("{path}/spec/items"), "auto grid layout needs an items array");
                return;
            };
            for (i, item) in items.iter().enumerate() {
                let item_path = format!("{path}/spec/items/{i}");
                check_item_kind(item, "AutoGridLayoutItem", &item_path, out);
                check_reference(item.get("spec"), &item_path, elements, out);
            }
        }
        "RowsLayout" => check_nested(list("rows"), "rows", "RowsLayoutRow", path, elements, out),
        "TabsLayout" => check_nested(list("tabs"), "tabs", "TabsLayoutTab", path, elements, out),
        other => push(out, format!("{path}/kind"), format!("unknown layout kind '{other}'")),
    }
}

fn check_item_kind(item: &Value, expected: &str, path: &str, out: &mut Vec<Violation>) {
    if item.get("kind").and_then(Value::as_str) != Some(expected) {
        push(out, format!("{path}/kind"), format!("expected {expected}"));
    }
}

fn check_reference(
    item_spec: Option<&Value>,
    path: &str,
    elements: &Map<String, Value>,
    out: &mut Vec<Violation>,
) {
    let name = item_spec
        .and_then(|s| s.get("element"))
        .and_then(|e| e.get("name"))
        .and_then(Value::as_str);
    match name {
        Some(name) if elements.contains_key(name) => {}
        Some(name) => push(
            out,
            format!("{path}/spec/element/name"),
            format!("element '{name}' does not exist"),
        ),
        None => push(out, format!("{path}/spec/element"), "missing element reference"),
    }
}

fn check_mode(
    spec: &Map<String, Value>,
    key: &str,
    allowed: &[&str],
    path: &str,
    out: &mut Vec<Violation>,
) {
    match spec.get(key).and_then(Value::as_str) {
        Some(mode) if allowed.contains(&mode) => {}
        _ => push(
            out,
            format!("{path}/spec/{key}"),
            format!("must be one of {}", allowed.join(", ")),
        ),
    }
}

fn check_nested(
    entries: Option<&[Value]>,
    key: &str,
    expected_kind: &str,
    path: &str,
    elements: &Map<String, Value>,
    out: &mut Vec<Violation>,
) {
    let Some(entries) = entries else {
        push(out, format!("{path}/spec/{key}"), format!("needs a {key} array"));
        return;
    };
    for (i, entry) in entries.iter().enumerate() {
        let entry_path = format!("{path}/spec/{key}/{i}");
        check_item_kind(entry, expected_kind, &entry_path, out);
        match entry.get("spec").and_then(|s| s.get("layout")) {
            Some(nested) if nested.is_object() => {
                check_layout(nested, &format!("{entry_path}/spec/layout"), elements, out);
            }
            _ => push(out, format!("{entry_path}/spec/layout"), "nested layout is required"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Value {
        json!({
            "annotations": [],
            "cursorSync": "Off",
            "elements": {"p": {"kind": "LibraryPanel", "spec": {"id": 1, "libraryPanel": {"name": "n", "uid": "u"}}}},
            "layout": {"kind": "GridLayout", "spec": {"items": [{"kind": "GridLayoutItem", "spec": {
                "x": 0, "y": 0, "width": 12, "height": 8,
                "element": {"kind": "ElementReference", "name": "p"}
            }}]}},
            "links": [],
            "preload": false,
            "tags": [],
            "timeSettings": {
                "from": "now-6h", "to": "now", "autoRefresh": "",
                "autoRefreshIntervals": [], "hideTimepicker": false, "fiscalYearStartMonth": 0
            },
            "title": "ok",
            "variables": []
        })
    }

    #[test]
    fn valid_spec_passes() {
        assert_eq!(validate_spec(&valid()), Ok(()));
    }

    #[test]
    fn schema_violations_reported() {
        let mut spec = valid();
        spec["cursorSync"] = json!("Sideways");
        spec["timeSettings"].as_object_mut().unwrap().remove("hideTimepicker");
        spec["title"] = json!(3);

        let err = validate_spec(&spec).unwrap_err();
        let paths: Vec<&str> = err.violations.iter().map(|v| v.path.as_str()).collect();
        assert!(paths.contains(&"/cursorSync"));
        assert!(paths.contains(&"/timeSettings"));
        assert!(paths.contains(&"/title"));
    }

    #[test]
    fn grid_geometry_and_references() {
        let mut spec = valid();
        spec["layout"]["spec"]["items"][0]["spec"]["x"] = json!(-1);
        spec["layout"]["spec"]["items"][0]["spec"]["element"]["name"] = json!("ghost");

        let err = validate_spec(&spec).unwrap_err();
        let paths: Vec<&str> = err.violations.iter().map(|v| v.path.as_str()).collect();
        assert!(paths.contains(&"/layout/spec/items/0/spec/x"));
        assert!(paths.contains(&"/layout/spec/items/0/spec/element/name"));
    }

    #[test]
    fn nested_and_auto_grid_checks() {
        let mut spec = valid();
        spec["layout"] = json!({"kind": "TabsLayout", "spec": {"tabs": [
            {"kind": "TabsLayoutTab", "spec": {"title": "no layout"}},
            {"kind": "TabsLayoutTab", "spec": {"layout": {"kind": "AutoGridLayout", "spec": {
                "columnWidthMode": "huge", "rowHeightMode": "tall", "items": []
            }}}}
        ]}});

        let err = validate_spec(&spec).unwrap_err();
        let paths: Vec<&str> = err.violations.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "/layout/spec/tabs/0/spec/layout",
                "/layout/spec/tabs/1/spec/layout/spec/columnWidthMode",
            ]
        );
    }

    #[test]
    fn rows_require_nested_layout() {
        let mut spec = valid();
        spec["layout"] = json!({"kind": "RowsLayout", "spec": {"rows": [{"kind": "RowsLayoutRow", "spec": {}}]}});
        let err = validate_spec(&spec).unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert_eq!(err.violations[0].path, "/layout/spec/rows/0/spec/layout");
    }
}
