//! Schema generations and cache fingerprints

use serde::{Deserialize, Serialize};
use std::fmt;

/// Major schema generation of a persisted dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    /// Legacy grid/panel JSON (`DashboardDTO`)
    V1,
    /// Structured resource with a separate spec (`DashboardWithAccessInfo`)
    V2,
}

impl SchemaVersion {
    /// The other generation
    #[inline]
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::V1 => Self::V2,
            Self::V2 => Self::V1,
        }
    }

    /// Classify a resource `apiVersion` string such as `v2alpha1` or `dashboard.grafana.app/v1beta1`
    #[must_use]
    pub fn from_api_version(api_version: &str) -> Self {
        let version = api_version.rsplit('/').next().unwrap_or(api_version);
        if version.starts_with("v2") {
            Self::V2
        } else {
            Self::V1
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => write!(f, "v1"),
            Self::V2 => write!(f, "v2"),
        }
    }
}

/// Value compared to decide whether a cached scene is still valid for a fresh document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Fingerprint {
    /// v1: dashboard version plus document creation timestamp
    Legacy {
        /// `dashboard.version`
        version: i64,
        /// `meta.created`
        created: Option<String>,
    },
    /// v2: resource generation
    Resource {
        /// `metadata.generation`
        generation: i64,
    },
}

impl Fingerprint {
    /// Version number visible on the scene root
    #[inline]
    #[must_use]
    pub fn version(&self) -> i64 {
        match self {
            Self::Legacy { version, .. } => *version,
            Self::Resource { generation } => *generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_version_classification() {
        assert_eq!(SchemaVersion::from_api_version("v2alpha1"), SchemaVersion::V2);
        assert_eq!(SchemaVersion::from_api_version("v2beta1"), SchemaVersion::V2);
        assert_eq!(
            SchemaVersion::from_api_version("dashboard.grafana.app/v2alpha1"),
            SchemaVersion::V2
        );
        assert_eq!(
            SchemaVersion::from_api_version("dashboard.grafana.app/v1beta1"),
            SchemaVersion::V1
        );
        assert_eq!(SchemaVersion::from_api_version("v0alpha1"), SchemaVersion::V1);
    }

    #[test]
    fn fingerprint_version() {
        let legacy = Fingerprint::Legacy {
            version: 3,
            created: Some("t0".into()),
        };
        assert_eq!(legacy.version(), 3);
        assert_eq!(Fingerprint::Resource { generation: 7 }.version(), 7);
        assert_eq!(SchemaVersion::V1.other(), SchemaVersion::V2);
    }
}
