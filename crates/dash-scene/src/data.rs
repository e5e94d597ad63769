//! Data layers and panel data providers

use dash_schema::v2::{
    AnnotationPanelFilter, DataQueryKind, DataSourceRef, DataTransformerConfig, Kinded,
};
use serde_json::{Map, Number, Value};

/// Annotation query layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationLayer {
    pub name: String,
    pub enabled: bool,
    pub hidden: bool,
    pub icon_color: String,
    pub built_in: Option<bool>,
    pub datasource: Option<DataSourceRef>,
    pub query: Option<DataQueryKind>,
    pub filter: Option<AnnotationPanelFilter>,
    pub legacy_options: Option<Map<String, Value>>,
}

/// Alert state overlay; runtime-only, never persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertStatesLayer {
    pub name: String,
    pub enabled: bool,
}

impl Default for AlertStatesLayer {
    fn default() -> Self {
        Self {
            name: "Alert States".to_string(),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataLayer {
    Annotations(AnnotationLayer),
    AlertStates(AlertStatesLayer),
}

impl DataLayer {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Annotations(a) => &a.name,
            Self::AlertStates(a) => &a.name,
        }
    }
}

/// Ordered data layers of a dashboard
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataLayerSet {
    pub layers: Vec<DataLayer>,
}

impl DataLayerSet {
    #[must_use]
    pub fn new(layers: Vec<DataLayer>) -> Self {
        Self { layers }
    }

    /// Annotation layers in order
    pub fn annotations(&self) -> impl Iterator<Item = &AnnotationLayer> {
        self.layers.iter().filter_map(|l| match l {
            DataLayer::Annotations(a) => Some(a),
            DataLayer::AlertStates(_) => None,
        })
    }

    #[must_use]
    pub fn has_alert_states(&self) -> bool {
        self.layers
            .iter()
            .any(|l| matches!(l, DataLayer::AlertStates(_)))
    }
}

/// One query of a panel
#[derive(Debug, Clone, PartialEq)]
pub struct SceneQuery {
    pub ref_id: String,
    pub hidden: bool,
    pub datasource: Option<DataSourceRef>,
    pub query: DataQueryKind,
}

/// Panel query execution settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneQueryRunner {
    pub queries: Vec<SceneQuery>,
    pub max_data_points: Option<Number>,
    pub min_interval: Option<String>,
    pub cache_timeout: Option<String>,
    pub query_caching_ttl: Option<Number>,
}

/// Transformation pipeline over a query runner
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneDataTransformer {
    pub transformations: Vec<Kinded<DataTransformerConfig>>,
    pub source: SceneQueryRunner,
}

/// Data provider of a panel
#[derive(Debug, Clone, PartialEq)]
pub enum PanelData {
    Query(SceneQueryRunner),
    Transformed(SceneDataTransformer),
}

impl PanelData {
    /// Underlying query runner
    #[must_use]
    pub fn runner(&self) -> &SceneQueryRunner {
        match self {
            Self::Query(r) => r,
            Self::Transformed(t) => &t.source,
        }
    }

    #[must_use]
    pub fn transformations(&self) -> &[Kinded<DataTransformerConfig>] {
        match self {
            Self::Query(_) => &[],
            Self::Transformed(t) => &t.transformations,
        }
    }

    /// Wrap a runner, adding a transformer only when there are transformations
    #[must_use]
    pub fn from_parts(
        runner: SceneQueryRunner,
        transformations: Vec<Kinded<DataTransformerConfig>>,
    ) -> Self {
        if transformations.is_empty() {
            Self::Query(runner)
        } else {
            Self::Transformed(SceneDataTransformer {
                transformations,
                source: runner,
            })
        }
    }
}
