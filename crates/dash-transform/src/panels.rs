//! Panel mapping
//!
//! Legacy panel objects and v2 elements both become [`VizPanel`] nodes;
//! every panel serializes back to exactly one element.

use crate::error::{TransformError, TransformResult};
use dash_scene::{PanelData, PanelTimeRange, SceneQuery, SceneQueryRunner, VizPanel};
use dash_schema::v1::{non_empty, LooseObject};
use dash_schema::v2::{
    kinds, DataLink, DataQueryKind, DataSourceRef, DataTransformerConfig, Element,
    FieldConfigSource, FieldColorModeId, Kinded, LibraryPanelKindSpec, LibraryPanelRef,
    PanelQuerySpec, PanelSpec, QueryGroupSpec, QueryOptionsSpec, VizConfigSpec,
};
use serde_json::{Map, Number, Value};

const ELEMENT: &str = "panel";

/// Plugin used when a legacy panel has no `type`
pub const DEFAULT_PLUGIN: &str = "timeseries";

/// Name of the element a panel serializes to
///
/// Panels loaded from a v2 spec keep their element name as key.
#[must_use]
pub fn element_name(panel: &VizPanel) -> String {
    if panel.key.is_empty() {
        VizPanel::key_for_id(panel.id)
    } else {
        panel.key.clone()
    }
}

/// refId for the query at `index`: A..Z, then AA, AB, ..
#[must_use]
pub fn ref_id_for_index(index: usize) -> String {
    let mut n = index;
    let mut out = Vec::new();
    loop {
        // n % 26 < 26, so the cast cannot truncate
        #[allow(clippy::cast_possible_truncation)]
        out.push(char::from(b'A' + (n % 26) as u8));
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    out.iter().rev().collect()
}

// ---------------------------------------------------------------------------
// v1 -> scene
// ---------------------------------------------------------------------------

/// Build a panel node from a legacy panel object
///
/// # Errors
///
/// `InvalidElement` when the panel has no numeric `id`.
pub fn panel_from_v1(record: &Value) -> TransformResult<VizPanel> {
    let id = record.i64_field("id").ok_or_else(|| {
        let title = record.str_field("title").unwrap_or("<untitled>");
        TransformError::invalid_element(ELEMENT, title, "missing panel id")
    })?;

    let mut panel = VizPanel::new(id, record.str_field("type").unwrap_or(DEFAULT_PLUGIN));
    panel.title = record.str_field("title").unwrap_or_default().to_string();
    panel.description = record.str_field("description").unwrap_or_default().to_string();
    panel.transparent = record.bool_field("transparent");
    panel.links = record
        .array_field("links")
        .map(|links| {
            links
                .iter()
                .filter_map(|l| serde_json::from_value::<DataLink>(l.clone()).ok())
                .collect()
        })
        .unwrap_or_default();

    if let Some(library) = record.object_field("libraryPanel") {
        panel.library_panel = Some(LibraryPanelRef {
            name: string_member(library, "name"),
            uid: string_member(library, "uid"),
        });
        panel.plugin_id = String::new();
        return Ok(panel);
    }

    panel.plugin_version = record.str_field("pluginVersion").unwrap_or_default().to_string();
    panel.options = record.object_field("options").cloned().unwrap_or_default();
    panel.field_config = record
        .get("fieldConfig")
        .and_then(|fc| serde_json::from_value::<FieldConfigSource>(fc.clone()).ok())
        .map(normalize_field_config)
        .unwrap_or_default();

    let panel_ds = record.get("datasource").and_then(DataSourceRef::from_loose);
    let queries = record
        .array_field("targets")
        .map(|targets| {
            targets
                .iter()
                .enumerate()
                .map(|(i, t)| query_from_target(t, i, panel_ds.as_ref()))
                .collect()
        })
        .unwrap_or_default();
    let runner = SceneQueryRunner {
        queries,
        max_data_points: number_field(record, "maxDataPoints"),
        min_interval: non_empty(record, "interval"),
        cache_timeout: non_empty(record, "cacheTimeout"),
        query_caching_ttl: number_field(record, "queryCachingTTL"),
    };
    let transformations = record
        .array_field("transformations")
        .map(|items| {
            items
                .iter()
                .filter_map(|t| serde_json::from_value::<DataTransformerConfig>(t.clone()).ok())
                .map(|t| Kinded::new(t.id.clone(), t))
                .collect()
        })
        .unwrap_or_default();
    panel.data = Some(PanelData::from_parts(runner, transformations));
    panel.time_window = PanelTimeRange::from_parts(
        non_empty(record, "timeFrom"),
        non_empty(record, "timeShift"),
        record.bool_field("hideTimeOverride"),
    );
    Ok(panel)
}

fn string_member(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn number_field(record: &Value, key: &str) -> Option<Number> {
    record.get(key).and_then(|v| match v {
        Value::Number(n) => Some(n.clone()),
        Value::String(s) => s.trim().parse::<i64>().ok().map(Number::from),
        _ => None,
    })
}

fn query_from_target(target: &Value, index: usize, panel_ds: Option<&DataSourceRef>) -> SceneQuery {
    let datasource = target
        .get("datasource")
        .and_then(DataSourceRef::from_loose)
        .or_else(|| panel_ds.cloned());
    let mut spec = target.as_object().cloned().unwrap_or_default();
    for key in ["refId", "hide", "datasource"] {
        spec.remove(key);
    }
    SceneQuery {
        ref_id: non_empty(target, "refId").unwrap_or_else(|| ref_id_for_index(index)),
        hidden: target.bool_field("hide").unwrap_or(false),
        query: DataQueryKind {
            kind: datasource
                .as_ref()
                .and_then(|ds| ds.ds_type.clone())
                .unwrap_or_default(),
            spec,
        },
        datasource,
    }
}

// ---------------------------------------------------------------------------
// v2 <-> scene
// ---------------------------------------------------------------------------

/// Build a panel node from a v2 element
#[must_use]
pub fn panel_from_v2(element: &Element) -> VizPanel {
    match element {
        Element::Panel(spec) => {
            let mut panel = VizPanel::new(spec.id, spec.viz_config.kind.clone());
            panel.title.clone_from(&spec.title);
            panel.description.clone_from(&spec.description);
            panel.links.clone_from(&spec.links);
            panel.transparent = spec.transparent;
            panel.plugin_version.clone_from(&spec.viz_config.spec.plugin_version);
            panel.options.clone_from(&spec.viz_config.spec.options);
            panel.field_config = normalize_field_config(spec.viz_config.spec.field_config.clone());

            let group = &spec.data.spec;
            let runner = SceneQueryRunner {
                queries: group
                    .queries
                    .iter()
                    .enumerate()
                    .map(|(i, q)| SceneQuery {
                        ref_id: if q.spec.ref_id.is_empty() {
                            ref_id_for_index(i)
                        } else {
                            q.spec.ref_id.clone()
                        },
                        hidden: q.spec.hidden,
                        datasource: q.spec.datasource.clone(),
                        query: q.spec.query.clone(),
                    })
                    .collect(),
                max_data_points: group.query_options.max_data_points.clone(),
                min_interval: group.query_options.interval.clone(),
                cache_timeout: group.query_options.cache_timeout.clone(),
                query_caching_ttl: group.query_options.query_caching_ttl.clone(),
            };
            panel.data = Some(PanelData::from_parts(runner, group.transformations.clone()));
            panel.time_window = PanelTimeRange::from_parts(
                group.query_options.time_from.clone(),
                group.query_options.time_shift.clone(),
                group.query_options.hide_time_override,
            );
            panel
        }
        Element::LibraryPanel(spec) => {
            let mut panel = VizPanel::new(spec.id, "");
            panel.title.clone_from(&spec.title);
            panel.library_panel = Some(spec.library_panel.clone());
            panel
        }
    }
}

/// Serialize a panel node into its element
#[must_use]
pub fn panel_to_element(panel: &VizPanel) -> Element {
    if let Some(library) = &panel.library_panel {
        return Element::LibraryPanel(LibraryPanelKindSpec {
            id: panel.id,
            title: panel.title.clone(),
            library_panel: library.clone(),
        });
    }

    let (runner, transformations) = match &panel.data {
        Some(data) => (data.runner().clone(), data.transformations().to_vec()),
        None => (SceneQueryRunner::default(), Vec::new()),
    };
    let window = panel.time_window.clone().unwrap_or_default();
    let group = QueryGroupSpec {
        queries: runner
            .queries
            .into_iter()
            .map(|q| {
                Kinded::new(
                    kinds::PANEL_QUERY,
                    PanelQuerySpec {
                        query: q.query,
                        datasource: q.datasource,
                        ref_id: q.ref_id,
                        hidden: q.hidden,
                    },
                )
            })
            .collect(),
        transformations,
        query_options: QueryOptionsSpec {
            time_from: window.time_from,
            max_data_points: runner.max_data_points,
            time_shift: window.time_shift,
            query_caching_ttl: runner.query_caching_ttl,
            interval: runner.min_interval,
            cache_timeout: runner.cache_timeout,
            hide_time_override: window.hide_time_override,
        },
    };

    Element::Panel(PanelSpec {
        id: panel.id,
        title: panel.title.clone(),
        description: panel.description.clone(),
        links: panel.links.clone(),
        data: Kinded::new(kinds::QUERY_GROUP, group),
        viz_config: Kinded::new(
            panel.plugin_id.clone(),
            VizConfigSpec {
                plugin_version: panel.plugin_version.clone(),
                options: panel.options.clone(),
                field_config: normalize_field_config(panel.field_config.clone()),
            },
        ),
        transparent: panel.transparent,
    })
}

/// Normalize color mode ids to their public spelling
///
/// Defaults are typed and already normalized on parse; override properties
/// with id `color` carry the mode inside a loose value.
#[must_use]
pub fn normalize_field_config(mut config: FieldConfigSource) -> FieldConfigSource {
    for property in config
        .overrides
        .iter_mut()
        .flat_map(|o| o.properties.iter_mut())
        .filter(|p| p.id == "color")
    {
        let Some(Value::Object(color)) = property.value.as_mut() else {
            continue;
        };
        if let Some(Value::String(mode)) = color.get_mut("mode") {
            *mode = FieldColorModeId::parse(mode).as_str().to_string();
        }
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn ref_ids() {
        assert_eq!(ref_id_for_index(0), "A");
        assert_eq!(ref_id_for_index(25), "Z");
        assert_eq!(ref_id_for_index(26), "AA");
        assert_eq!(ref_id_for_index(27), "AB");
        assert_eq!(ref_id_for_index(701), "ZZ");
        assert_eq!(ref_id_for_index(702), "AAA");
    }

    #[test]
    fn legacy_panel_with_transformations_and_window() {
        let panel = panel_from_v1(&json!({
            "id": 4,
            "type": "stat",
            "title": "CPU",
            "datasource": {"type": "prometheus", "uid": "prom"},
            "targets": [{"expr": "up"}, {"refId": "X", "expr": "rate(x[5m])", "hide": true}],
            "transformations": [{"id": "reduce", "options": {"reducers": ["max"]}}],
            "timeFrom": "1h",
            "maxDataPoints": 500
        }))
        .unwrap();

        assert_eq!(panel.key, "panel-4");
        assert_eq!(panel.plugin_id, "stat");
        let data = panel.data.as_ref().unwrap();
        assert!(matches!(data, PanelData::Transformed(_)));
        let runner = data.runner();
        assert_eq!(runner.queries[0].ref_id, "A");
        assert_eq!(runner.queries[1].ref_id, "X");
        assert!(runner.queries[1].hidden);
        assert_eq!(runner.queries[0].query.kind, "prometheus");
        assert_eq!(runner.queries[0].query.spec, json!({"expr": "up"}).as_object().cloned().unwrap());
        assert_eq!(runner.max_data_points, Some(Number::from(500)));
        assert_eq!(
            panel.time_window,
            Some(PanelTimeRange {
                time_from: Some("1h".into()),
                time_shift: None,
                hide_time_override: None,
            })
        );
    }

    #[test]
    fn panel_without_id_is_rejected() {
        assert!(matches!(
            panel_from_v1(&json!({"type": "text", "title": "t"})),
            Err(TransformError::InvalidElement { element: "panel", .. })
        ));
    }

    #[test]
    fn library_panel_reference() {
        let panel = panel_from_v1(&json!({
            "id": 2,
            "title": "Shared",
            "libraryPanel": {"uid": "lib-1", "name": "Shared"}
        }))
        .unwrap();
        assert!(panel.is_library_panel());
        assert!(panel.data.is_none());
        assert!(matches!(panel_to_element(&panel), Element::LibraryPanel(l) if l.library_panel.uid == "lib-1"));
    }

    #[test]
    fn override_color_mode_normalized() {
        let config: FieldConfigSource = serde_json::from_value(json!({
            "defaults": {"color": {"mode": "PALETTE_CLASSIC"}, "unit": "percent"},
            "overrides": [{
                "matcher": {"id": "byName", "options": "cpu"},
                "properties": [{"id": "color", "value": {"mode": "continuous-grylrd"}}]
            }]
        }))
        .unwrap();
        let value = serde_json::to_value(normalize_field_config(config)).unwrap();
        assert_eq!(value["defaults"]["color"]["mode"], json!("palette-classic"));
        assert_eq!(value["defaults"]["unit"], json!("percent"));
        assert_eq!(
            value["overrides"][0]["properties"][0]["value"]["mode"],
            json!("continuous-GrYlRd")
        );
    }

    #[test]
    fn element_survives_scene() {
        let element: Element = serde_json::from_value(json!({
            "kind": "Panel",
            "spec": {
                "id": 1,
                "title": "Requests",
                "description": "",
                "links": [],
                "data": {"kind": "QueryGroup", "spec": {
                    "queries": [{"kind": "PanelQuery", "spec": {
                        "query": {"kind": "prometheus", "spec": {"expr": "up"}},
                        "datasource": {"type": "prometheus", "uid": "prom"},
                        "refId": "A",
                        "hidden": false
                    }}],
                    "transformations": [],
                    "queryOptions": {"timeShift": "1d"}
                }},
                "vizConfig": {"kind": "timeseries", "spec": {
                    "pluginVersion": "11.0.0",
                    "options": {"legend": {"showLegend": true}},
                    "fieldConfig": {"defaults": {}, "overrides": []}
                }}
            }
        }))
        .unwrap();

        let panel = panel_from_v2(&element);
        assert_eq!(panel.time_window.as_ref().and_then(|w| w.time_shift.clone()), Some("1d".into()));
        assert_eq!(panel_to_element(&panel), element);
    }
}
