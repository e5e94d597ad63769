//! Dashboard documents used across test suites
//!
//! [`v1_dashboard`] and [`v1_converted_spec`] describe the same dashboard:
//! the second is what the backend's own legacy-to-v2 conversion returns for
//! the first.

use dash_schema::resource::ANNO_FOLDER;
use dash_schema::{
    AccessInfo, DashboardDto, DashboardMeta, DashboardResource, ObjectMeta, RawDocument,
};
use serde_json::{json, Value};

pub const PROM: &str = "prom";

/// Legacy dashboard body: grid of two panels, three variables, built-in
/// annotations
pub fn v1_dashboard(uid: &str, version: i64) -> Value {
    json!({
        "uid": uid,
        "version": version,
        "title": "Service overview",
        "description": "Latency and errors",
        "tags": ["prod", "service"],
        "editable": true,
        "graphTooltip": 1,
        "timezone": "utc",
        "time": {"from": "now-6h", "to": "now"},
        "refresh": "1m",
        "timepicker": {"refresh_intervals": ["30s", "1m", "5m"]},
        "templating": {"list": [
            {
                "type": "custom",
                "name": "env",
                "query": "dev,prod",
                "current": {"text": "prod", "value": "prod"},
                "options": [
                    {"selected": false, "text": "dev", "value": "dev"},
                    {"selected": true, "text": "prod", "value": "prod"}
                ],
                "hide": 0,
                "multi": false,
                "includeAll": false
            },
            {"type": "constant", "name": "region", "query": "eu-west-1", "hide": 2},
            {"type": "textbox", "name": "filter", "query": "", "current": {"text": "", "value": ""}}
        ]},
        "annotations": {"list": [{
            "builtIn": 1,
            "datasource": {"type": "grafana", "uid": "-- Grafana --"},
            "enable": true,
            "hide": true,
            "iconColor": "rgba(0, 211, 255, 1)",
            "name": "Annotations & Alerts",
            "target": {"limit": 100, "matchAny": false, "tags": [], "type": "dashboard"},
            "type": "dashboard"
        }]},
        "panels": [
            {
                "id": 1,
                "type": "timeseries",
                "title": "Requests",
                "gridPos": {"x": 0, "y": 0, "w": 12, "h": 8},
                "datasource": {"type": "prometheus", "uid": PROM},
                "targets": [{"refId": "A", "expr": "sum(rate(http_requests_total[5m]))"}],
                "fieldConfig": {"defaults": {"unit": "reqps"}, "overrides": []},
                "options": {"legend": {"showLegend": true}}
            },
            {
                "id": 2,
                "type": "stat",
                "title": "Errors",
                "gridPos": {"x": 12, "y": 0, "w": 12, "h": 8},
                "datasource": {"type": "prometheus", "uid": PROM},
                "targets": [{"expr": "sum(errors)"}],
                "timeFrom": "1h",
                "transformations": [{"id": "reduce", "options": {"reducers": ["last"]}}]
            }
        ]
    })
}

/// v2 spec equivalent to [`v1_dashboard`]
pub fn v1_converted_spec() -> Value {
    json!({
        "annotations": [{
            "kind": "AnnotationQuery",
            "spec": {
                "builtIn": true,
                "datasource": {"type": "grafana", "uid": "-- Grafana --"},
                "enable": true,
                "hide": true,
                "iconColor": "rgba(0, 211, 255, 1)",
                "legacyOptions": {"type": "dashboard"},
                "name": "Annotations & Alerts",
                "query": {
                    "kind": "grafana",
                    "spec": {"limit": 100, "matchAny": false, "tags": [], "type": "dashboard"}
                }
            }
        }],
        "cursorSync": "Crosshair",
        "description": "Latency and errors",
        "editable": true,
        "elements": {
            "panel-1": {
                "kind": "Panel",
                "spec": {
                    "id": 1,
                    "title": "Requests",
                    "description": "",
                    "links": [],
                    "data": {"kind": "QueryGroup", "spec": {
                        "queries": [{"kind": "PanelQuery", "spec": {
                            "query": {"kind": "prometheus", "spec": {"expr": "sum(rate(http_requests_total[5m]))"}},
                            "datasource": {"type": "prometheus", "uid": PROM},
                            "refId": "A",
                            "hidden": false
                        }}],
                        "transformations": [],
                        "queryOptions": {}
                    }},
                    "vizConfig": {"kind": "timeseries", "spec": {
                        "pluginVersion": "",
                        "options": {"legend": {"showLegend": true}},
                        "fieldConfig": {"defaults": {"unit": "reqps"}, "overrides": []}
                    }}
                }
            },
            "panel-2": {
                "kind": "Panel",
                "spec": {
                    "id": 2,
                    "title": "Errors",
                    "description": "",
                    "links": [],
                    "data": {"kind": "QueryGroup", "spec": {
                        "queries": [{"kind": "PanelQuery", "spec": {
                            "query": {"kind": "prometheus", "spec": {"expr": "sum(errors)"}},
                            "datasource": {"type": "prometheus", "uid": PROM},
                            "refId": "A",
                            "hidden": false
                        }}],
                        "transformations": [{
                            "kind": "reduce",
                            "spec": {"id": "reduce", "options": {"reducers": ["last"]}}
                        }],
                        "queryOptions": {"timeFrom": "1h"}
                    }},
                    "vizConfig": {"kind": "stat", "spec": {
                        "pluginVersion": "",
                        "options": {},
                        "fieldConfig": {"defaults": {}, "overrides": []}
                    }}
                }
            }
        },
        "layout": {"kind": "GridLayout", "spec": {"items": [
            {"kind": "GridLayoutItem", "spec": {
                "x": 0, "y": 0, "width": 12, "height": 8,
                "element": {"kind": "ElementReference", "name": "panel-1"}
            }},
            {"kind": "GridLayoutItem", "spec": {
                "x": 12, "y": 0, "width": 12, "height": 8,
                "element": {"kind": "ElementReference", "name": "panel-2"}
            }}
        ]}},
        "links": [],
        "preload": false,
        "tags": ["prod", "service"],
        "timeSettings": {
            "timezone": "utc",
            "from": "now-6h",
            "to": "now",
            "autoRefresh": "1m",
            "autoRefreshIntervals": ["30s", "1m", "5m"],
            "hideTimepicker": false,
            "fiscalYearStartMonth": 0
        },
        "title": "Service overview",
        "variables": [
            {"kind": "CustomVariable", "spec": {
                "name": "env",
                "query": "dev,prod",
                "current": {"text": "prod", "value": "prod"},
                "options": [
                    {"selected": false, "text": "dev", "value": "dev"},
                    {"selected": true, "text": "prod", "value": "prod"}
                ],
                "multi": false,
                "includeAll": false,
                "hide": "dontHide",
                "skipUrlSync": false,
                "allowCustomValue": true
            }},
            {"kind": "ConstantVariable", "spec": {
                "name": "region",
                "query": "eu-west-1",
                "current": {"text": "eu-west-1", "value": "eu-west-1"},
                "hide": "hideVariable",
                "skipUrlSync": false
            }},
            {"kind": "TextVariable", "spec": {
                "name": "filter",
                "current": {"text": "", "value": ""},
                "query": "",
                "hide": "dontHide",
                "skipUrlSync": false
            }}
        ]
    })
}

/// v2 spec using a rows layout with a nested grid and a library panel
pub fn v2_rows_spec(title: &str) -> Value {
    json!({
        "annotations": [],
        "cursorSync": "Off",
        "elements": {
            "cpu": {"kind": "Panel", "spec": {
                "id": 7,
                "title": "CPU",
                "description": "Per host",
                "links": [{"title": "Runbook", "url": "https://runbooks/cpu"}],
                "data": {"kind": "QueryGroup", "spec": {
                    "queries": [{"kind": "PanelQuery", "spec": {
                        "query": {"kind": "prometheus", "spec": {"expr": "node_cpu"}},
                        "datasource": {"type": "prometheus", "uid": PROM},
                        "refId": "A",
                        "hidden": false
                    }}],
                    "transformations": [],
                    "queryOptions": {"maxDataPoints": 500, "interval": "1m"}
                }},
                "vizConfig": {"kind": "timeseries", "spec": {
                    "pluginVersion": "11.0.0",
                    "options": {},
                    "fieldConfig": {"defaults": {"color": {"mode": "palette-classic"}}, "overrides": []}
                }}
            }},
            "shared": {"kind": "LibraryPanel", "spec": {
                "id": 8,
                "title": "Shared panel",
                "libraryPanel": {"name": "Shared", "uid": "lib-1"}
            }}
        },
        "layout": {"kind": "RowsLayout", "spec": {"rows": [
            {"kind": "RowsLayoutRow", "spec": {
                "title": "Hosts",
                "collapse": false,
                "layout": {"kind": "GridLayout", "spec": {"items": [
                    {"kind": "GridLayoutItem", "spec": {
                        "x": 0, "y": 0, "width": 24, "height": 8,
                        "element": {"kind": "ElementReference", "name": "cpu"}
                    }}
                ]}}
            }},
            {"kind": "RowsLayoutRow", "spec": {
                "title": "Shared",
                "collapse": true,
                "layout": {"kind": "GridLayout", "spec": {"items": [
                    {"kind": "GridLayoutItem", "spec": {
                        "x": 0, "y": 0, "width": 12, "height": 6,
                        "element": {"kind": "ElementReference", "name": "shared"}
                    }}
                ]}}
            }}
        ]}},
        "links": [{
            "title": "Related",
            "type": "dashboards",
            "icon": "external link",
            "tooltip": "",
            "tags": ["infra"],
            "asDropdown": true,
            "targetBlank": false,
            "includeVars": true,
            "keepTime": true
        }],
        "liveNow": false,
        "preload": true,
        "revision": 3,
        "tags": [],
        "timeSettings": {
            "from": "now-24h",
            "to": "now",
            "autoRefresh": "",
            "autoRefreshIntervals": ["1m", "5m"],
            "hideTimepicker": true,
            "fiscalYearStartMonth": 3,
            "weekStart": "monday"
        },
        "title": title,
        "variables": [
            {"kind": "IntervalVariable", "spec": {
                "name": "step",
                "query": "1m,5m,1h",
                "current": {"text": "5m", "value": "5m"},
                "options": [],
                "auto": false,
                "auto_min": "10s",
                "auto_count": 30,
                "refresh": "onTimeRangeChanged",
                "hide": "dontHide",
                "skipUrlSync": false
            }}
        ]
    })
}

/// Minimal valid v2 spec with the given title
pub fn minimal_v2_spec(title: &str) -> Value {
    json!({
        "annotations": [],
        "cursorSync": "Off",
        "elements": {},
        "layout": {"kind": "GridLayout", "spec": {"items": []}},
        "links": [],
        "preload": false,
        "tags": [],
        "timeSettings": {
            "from": "now-6h",
            "to": "now",
            "autoRefresh": "",
            "autoRefreshIntervals": [],
            "hideTimepicker": false,
            "fiscalYearStartMonth": 0
        },
        "title": title,
        "variables": []
    })
}

/// Legacy dashboard with five variables, the fourth of an unknown kind
pub fn v1_dashboard_with_bad_variable(uid: &str) -> Value {
    let mut dashboard = v1_dashboard(uid, 1);
    dashboard["templating"]["list"] = json!([
        {"type": "custom", "name": "a", "query": "1,2"},
        {"type": "constant", "name": "b", "query": "x"},
        {"type": "textbox", "name": "c", "query": "hello"},
        {"type": "sparkline", "name": "d"},
        {"type": "interval", "name": "e", "query": "1m,5m", "current": {"text": "1m", "value": "1m"}}
    ]);
    dashboard
}

/// v1 document with editable access
pub fn v1_document(uid: &str, version: i64) -> RawDocument {
    v1_document_from(v1_dashboard(uid, version))
}

/// Wrap a legacy body into a v1 document with editable access
pub fn v1_document_from(dashboard: Value) -> RawDocument {
    RawDocument::V1(DashboardDto::new(
        dashboard,
        DashboardMeta {
            can_save: true,
            can_edit: true,
            can_share: true,
            ..DashboardMeta::default()
        },
    ))
}

/// v2 document wrapping `spec`
pub fn v2_document(uid: &str, generation: i64, spec: Value) -> RawDocument {
    RawDocument::V2(
        DashboardResource::new(ObjectMeta::named(uid).with_generation(generation), spec)
            .with_access(AccessInfo {
                can_save: true,
                can_edit: true,
                can_share: true,
                ..AccessInfo::default()
            }),
    )
}

/// v2 document stored in a folder
pub fn v2_document_in_folder(uid: &str, generation: i64, folder_uid: &str) -> RawDocument {
    RawDocument::V2(DashboardResource::new(
        ObjectMeta::named(uid)
            .with_generation(generation)
            .with_annotation(ANNO_FOLDER, folder_uid),
        minimal_v2_spec("In a folder"),
    ))
}
