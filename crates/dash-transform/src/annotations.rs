//! Annotation layers

use crate::error::{TransformError, TransformResult};
use dash_scene::AnnotationLayer;
use dash_schema::v1::LooseObject;
use dash_schema::v2::{
    kinds, AnnotationPanelFilter, AnnotationQuerySpec, DataQueryKind, DataSourceRef, Kinded,
};
use serde_json::{Map, Value};

const ELEMENT: &str = "annotation";

/// Keys of a legacy annotation that map onto typed fields
const KNOWN_KEYS: [&str; 8] = [
    "builtIn",
    "datasource",
    "enable",
    "hide",
    "iconColor",
    "name",
    "target",
    "filter",
];

/// Build a layer from a legacy `annotations.list[]` entry
///
/// # Errors
///
/// `InvalidElement` when the entry is not an object or has no name.
pub fn annotation_from_v1(record: &Value) -> TransformResult<AnnotationLayer> {
    let obj = record
        .as_object()
        .ok_or_else(|| TransformError::invalid_element(ELEMENT, "<unknown>", "not an object"))?;
    let name = record
        .str_field("name")
        .filter(|n| !n.is_empty())
        .ok_or_else(|| TransformError::invalid_element(ELEMENT, "<unnamed>", "missing name"))?;

    let datasource = record.get("datasource").and_then(DataSourceRef::from_loose);
    let query = record.object_field("target").map(|target| DataQueryKind {
        kind: datasource
            .as_ref()
            .and_then(|ds| ds.ds_type.clone())
            .unwrap_or_default(),
        spec: target.clone(),
    });
    let built_in = match record.get("builtIn") {
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::Number(n)) => Some(n.as_i64() == Some(1)),
        _ => None,
    };
    let legacy_options: Map<String, Value> = obj
        .iter()
        .filter(|(k, _)| !KNOWN_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    Ok(AnnotationLayer {
        name: name.to_string(),
        enabled: record.bool_field("enable").unwrap_or(true),
        hidden: record.bool_field("hide").unwrap_or(false),
        icon_color: record.str_field("iconColor").unwrap_or_default().to_string(),
        built_in,
        datasource,
        query,
        filter: record
            .get("filter")
            .and_then(|f| serde_json::from_value::<AnnotationPanelFilter>(f.clone()).ok())
            .filter(|f| !f.is_empty()),
        legacy_options: (!legacy_options.is_empty()).then_some(legacy_options),
    })
}

/// Build a layer from a v2 `annotations[]` entry
///
/// # Errors
///
/// `InvalidElement` when the entry does not parse.
pub fn annotation_from_v2(entry: &Value) -> TransformResult<AnnotationLayer> {
    let typed: Kinded<AnnotationQuerySpec> = serde_json::from_value(entry.clone()).map_err(|e| {
        let name = entry
            .get("spec")
            .and_then(|s| s.str_field("name"))
            .unwrap_or("<unnamed>");
        TransformError::invalid_element(ELEMENT, name, e.to_string())
    })?;
    let spec = typed.spec;
    Ok(AnnotationLayer {
        name: spec.name,
        enabled: spec.enable,
        hidden: spec.hide,
        icon_color: spec.icon_color,
        built_in: spec.built_in,
        datasource: spec.datasource,
        query: spec.query,
        filter: spec.filter,
        legacy_options: spec.legacy_options,
    })
}

/// Serialize a layer; empty panel filters are dropped
#[must_use]
pub fn annotation_to_v2(layer: &AnnotationLayer) -> Kinded<AnnotationQuerySpec> {
    Kinded::new(
        kinds::ANNOTATION_QUERY,
        AnnotationQuerySpec {
            datasource: layer.datasource.clone(),
            query: layer.query.clone(),
            enable: layer.enabled,
            hide: layer.hidden,
            icon_color: layer.icon_color.clone(),
            name: layer.name.clone(),
            built_in: layer.built_in,
            filter: layer.filter.clone().filter(|f| !f.is_empty()),
            legacy_options: layer.legacy_options.clone().filter(|o| !o.is_empty()),
        },
    )
}
