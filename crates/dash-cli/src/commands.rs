//! Subcommand bodies, free of I/O beyond reading the input file

use anyhow::{bail, Context, Result};
use dash_schema::{
    canonicalize, is_v1_shape, is_v2_shape, DashboardDto, DashboardMeta, DashboardResource,
    ObjectMeta, RawDocument,
};
use dash_transform::{document_to_scene, scene_to_document, validate_spec, TransformOptions, ValidationError};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;

pub(crate) fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Classify a payload; a bare object is taken as a legacy dashboard body
pub(crate) fn to_document(value: Value) -> Result<RawDocument> {
    if is_v1_shape(&value) || is_v2_shape(&value) {
        return Ok(RawDocument::from_value(value)?);
    }
    if !value.is_object() {
        bail!("expected a JSON object");
    }
    Ok(RawDocument::V1(DashboardDto::new(value, DashboardMeta::default())))
}

fn to_spec(document: &RawDocument, options: &TransformOptions) -> Result<Value> {
    let scene = document_to_scene(document, options)?;
    Ok(scene_to_document(&scene, options.snapshot)?)
}

pub(crate) fn convert(value: Value, options: &TransformOptions) -> Result<Value> {
    let document = to_document(value)?;
    tracing::debug!(uid = %document.identity(), version = %document.schema_version(), "converting");
    to_spec(&document, options)
}

/// Validate a bare spec or the `spec` of a resource
pub(crate) fn validate(value: &Value) -> Result<(), ValidationError> {
    if is_v2_shape(value) {
        validate_spec(&value["spec"])
    } else {
        validate_spec(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RoundTrip {
    /// JSON pointers where input and output disagree
    pub(crate) differences: Vec<String>,
}

/// A v2 document must come back equal to its canonical spec. A legacy
/// document has no v2 form to compare against, so its converted spec must
/// survive a second pass unchanged.
pub(crate) fn roundtrip(value: Value, options: &TransformOptions) -> Result<RoundTrip> {
    let document = to_document(value)?;
    let first = to_spec(&document, options)?;
    let (expected, actual) = match &document {
        RawDocument::V2(resource) => (canonicalize(&resource.spec), first),
        RawDocument::V1(_) => {
            let again = RawDocument::V2(DashboardResource::new(
                ObjectMeta::named(document.identity()),
                first.clone(),
            ));
            let second = to_spec(&again, options)?;
            (first, second)
        }
    };
    let mut differences = Vec::new();
    diff("", &expected, &actual, &mut differences);
    Ok(RoundTrip { differences })
}

fn escape(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

fn diff(path: &str, left: &Value, right: &Value, out: &mut Vec<String>) {
    match (left, right) {
        (Value::Object(l), Value::Object(r)) => {
            let keys: BTreeSet<&String> = l.keys().chain(r.keys()).collect();
            for key in keys {
                let child = format!("{path}/{}", escape(key));
                match (l.get(key), r.get(key)) {
                    (Some(a), Some(b)) => diff(&child, a, b, out),
                    _ => out.push(child),
                }
            }
        }
        (Value::Array(l), Value::Array(r)) if l.len() == r.len() => {
            for (i, (a, b)) in l.iter().zip(r).enumerate() {
                diff(&format!("{path}/{i}"), a, b, out);
            }
        }
        _ if left != right => out.push(if path.is_empty() { "/".to_string() } else { path.to_string() }),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_test_utils::{minimal_v2_spec, v1_converted_spec, v1_dashboard, v2_rows_spec};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn bare_legacy_body_converts() {
        let spec = convert(v1_dashboard("d1", 1), &TransformOptions::default()).unwrap();
        assert_eq!(spec, canonicalize(&v1_converted_spec()));
    }

    #[test]
    fn wrapped_legacy_document_converts() {
        let doc = json!({"dashboard": v1_dashboard("d1", 1), "meta": {"canEdit": true}});
        let spec = convert(doc, &TransformOptions::default()).unwrap();
        assert_eq!(spec["title"], json!("Service overview"));
    }

    #[test]
    fn non_objects_are_rejected() {
        assert!(to_document(json!([1, 2])).is_err());
    }

    #[test]
    fn validate_spec_or_resource() {
        assert!(validate(&minimal_v2_spec("ok")).is_ok());
        let resource = json!({
            "apiVersion": "dashboard.grafana.app/v2alpha1",
            "kind": "Dashboard",
            "metadata": {"name": "r"},
            "spec": {"title": 5}
        });
        let err = validate(&resource).unwrap_err();
        assert!(!err.violations.is_empty());
    }

    #[test]
    fn resource_round_trips() {
        let resource = json!({
            "apiVersion": "dashboard.grafana.app/v2alpha1",
            "kind": "Dashboard",
            "metadata": {"name": "rows"},
            "spec": v2_rows_spec("Rows")
        });
        let report = roundtrip(resource, &TransformOptions::default()).unwrap();
        assert_eq!(report, RoundTrip::default());
    }

    #[test]
    fn legacy_round_trip_is_stable() {
        let report = roundtrip(v1_dashboard("d1", 1), &TransformOptions::default()).unwrap();
        assert!(report.differences.is_empty(), "{:?}", report.differences);
    }

    #[test]
    fn diff_reports_pointers() {
        let mut out = Vec::new();
        diff(
            "",
            &json!({"a": {"b/c": 1}, "list": [1, 2], "gone": true}),
            &json!({"a": {"b/c": 2}, "list": [1, 2, 3]}),
            &mut out,
        );
        assert_eq!(out, vec!["/a/b~1c", "/gone", "/list"]);
    }

    #[test]
    fn read_json_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", minimal_v2_spec("file")).unwrap();
        let value = read_json(file.path()).unwrap();
        assert_eq!(value["title"], json!("file"));

        write!(file, "garbage").unwrap();
        assert!(read_json(file.path()).is_err());
    }
}
