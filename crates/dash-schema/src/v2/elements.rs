//! Panels, library panels, queries, viz config

use super::Kinded;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

/// Dashboard element, referenced by name from the layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "spec")]
pub enum Element {
    Panel(PanelSpec),
    LibraryPanel(LibraryPanelKindSpec),
}

impl Element {
    /// Panel id of either variant
    #[must_use]
    pub fn id(&self) -> i64 {
        match self {
            Self::Panel(p) => p.id,
            Self::LibraryPanel(l) => l.id,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Panel(p) => &p.title,
            Self::LibraryPanel(l) => &l.title,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelSpec {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub links: Vec<DataLink>,
    pub data: Kinded<QueryGroupSpec>,
    pub viz_config: Kinded<VizConfigSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transparent: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataLink {
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_blank: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryGroupSpec {
    pub queries: Vec<Kinded<PanelQuerySpec>>,
    pub transformations: Vec<Kinded<DataTransformerConfig>>,
    pub query_options: QueryOptionsSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelQuerySpec {
    pub query: DataQueryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasource: Option<DataSourceRef>,
    pub ref_id: String,
    #[serde(default)]
    pub hidden: bool,
}

/// Datasource query; `kind` is the datasource type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataQueryKind {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub spec: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataSourceRef {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ds_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

impl DataSourceRef {
    /// Read a legacy reference; a bare string is taken as the uid
    #[must_use]
    pub fn from_loose(value: &Value) -> Option<Self> {
        match value {
            Value::Object(obj) => Some(Self {
                ds_type: obj.get("type").and_then(Value::as_str).map(str::to_string),
                uid: obj.get("uid").and_then(Value::as_str).map(str::to_string),
            }),
            Value::String(s) if !s.is_empty() => Some(Self {
                ds_type: None,
                uid: Some(s.clone()),
            }),
            _ => None,
        }
    }
}

/// Transformation step; the wrapping kind is the transformer id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataTransformerConfig {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<MatcherConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default)]
    pub options: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatcherConfig {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryOptionsSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_data_points: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_shift: Option<String>,
    #[serde(rename = "queryCachingTTL", skip_serializing_if = "Option::is_none")]
    pub query_caching_ttl: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_time_override: Option<bool>,
}

/// Visualization settings; the wrapping kind is the plugin id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VizConfigSpec {
    pub plugin_version: String,
    pub options: Map<String, Value>,
    pub field_config: FieldConfigSource,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfigSource {
    pub defaults: FieldConfig,
    pub overrides: Vec<FieldOverride>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldOverride {
    pub matcher: MatcherConfig,
    pub properties: Vec<DynamicConfigValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DynamicConfigValue {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Field defaults; only `color` is modelled, the rest passes through
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<FieldColor>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldColor {
    pub mode: FieldColorModeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_by: Option<String>,
}

/// Color mode of a field
///
/// Parsing is forgiving: case is ignored and separators are optional, so the
/// internal spellings (`PaletteClassic`, `continuousGrYlRd`) land on the same
/// variant as the public ones. Serialization always writes the public string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldColorModeId {
    Thresholds,
    PaletteClassic,
    PaletteClassicByName,
    ContinuousGrYlRd,
    ContinuousRdYlGr,
    ContinuousBlYlRd,
    ContinuousYlRd,
    ContinuousBlPu,
    ContinuousYlBl,
    ContinuousBlues,
    ContinuousReds,
    ContinuousGreens,
    ContinuousPurples,
    Fixed,
    Shades,
    /// Value outside the schema, kept as written
    Other(String),
}

impl FieldColorModeId {
    const KNOWN: [Self; 15] = [
        Self::Thresholds,
        Self::PaletteClassic,
        Self::PaletteClassicByName,
        Self::ContinuousGrYlRd,
        Self::ContinuousRdYlGr,
        Self::ContinuousBlYlRd,
        Self::ContinuousYlRd,
        Self::ContinuousBlPu,
        Self::ContinuousYlBl,
        Self::ContinuousBlues,
        Self::ContinuousReds,
        Self::ContinuousGreens,
        Self::ContinuousPurples,
        Self::Fixed,
        Self::Shades,
    ];

    /// Public schema string
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Thresholds => "thresholds",
            Self::PaletteClassic => "palette-classic",
            Self::PaletteClassicByName => "palette-classic-by-name",
            Self::ContinuousGrYlRd => "continuous-GrYlRd",
            Self::ContinuousRdYlGr => "continuous-RdYlGr",
            Self::ContinuousBlYlRd => "continuous-BlYlRd",
            Self::ContinuousYlRd => "continuous-YlRd",
            Self::ContinuousBlPu => "continuous-BlPu",
            Self::ContinuousYlBl => "continuous-YlBl",
            Self::ContinuousBlues => "continuous-blues",
            Self::ContinuousReds => "continuous-reds",
            Self::ContinuousGreens => "continuous-greens",
            Self::ContinuousPurples => "continuous-purples",
            Self::Fixed => "fixed",
            Self::Shades => "shades",
            Self::Other(s) => s,
        }
    }

    /// Normalize any accepted spelling
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let wanted = fold(raw);
        Self::KNOWN
            .into_iter()
            .find(|known| fold(known.as_str()) == wanted)
            .unwrap_or_else(|| Self::Other(raw.to_string()))
    }

    #[inline]
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

fn fold(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

impl From<String> for FieldColorModeId {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<FieldColorModeId> for String {
    fn from(value: FieldColorModeId) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for FieldColorModeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryPanelKindSpec {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    pub library_panel: LibraryPanelRef,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryPanelRef {
    pub name: String,
    pub uid: String,
}
