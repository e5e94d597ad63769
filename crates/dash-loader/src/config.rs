//! Loader configuration

use dash_transform::TransformOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Errors reading a configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loader configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// How long a fetched document is served from the document cache
    pub document_cache_ttl_ms: u64,
    /// Maximum scenes kept per manager
    pub scene_cache_capacity: u64,
    /// Start new dashboards on the v2 manager
    pub prefer_v2_for_new_dashboards: bool,
    /// Add the alert-states data layer on load
    pub alert_states_layer: bool,
    /// Honour the dashboard's reload-on-params-change flag
    pub reload_on_params_change: bool,
}

impl LoaderConfig {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML text
    ///
    /// # Errors
    ///
    /// `Parse` on malformed TOML or mistyped keys.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read a TOML file
    ///
    /// # Errors
    ///
    /// `Io` when the file cannot be read, `Parse` otherwise.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    #[inline]
    #[must_use]
    pub fn with_document_cache_ttl(mut self, ttl: Duration) -> Self {
        self.document_cache_ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_scene_cache_capacity(mut self, capacity: u64) -> Self {
        self.scene_cache_capacity = capacity;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_prefer_v2_for_new_dashboards(mut self, prefer: bool) -> Self {
        self.prefer_v2_for_new_dashboards = prefer;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_alert_states_layer(mut self, enabled: bool) -> Self {
        self.alert_states_layer = enabled;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_reload_on_params_change(mut self, enabled: bool) -> Self {
        self.reload_on_params_change = enabled;
        self
    }

    #[inline]
    #[must_use]
    pub fn document_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.document_cache_ttl_ms)
    }

    /// Transform options implied by this configuration
    #[must_use]
    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions::new().with_alert_states_layer(self.alert_states_layer)
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            document_cache_ttl_ms: 500,
            scene_cache_capacity: 100,
            prefer_v2_for_new_dashboards: false,
            alert_states_layer: false,
            reload_on_params_change: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = LoaderConfig::default();
        assert_eq!(config.document_cache_ttl(), Duration::from_millis(500));
        assert_eq!(config.scene_cache_capacity, 100);
        assert!(!config.prefer_v2_for_new_dashboards);
        assert!(!config.alert_states_layer);
        assert!(config.reload_on_params_change);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = LoaderConfig::from_toml("alert_states_layer = true\nscene_cache_capacity = 5\n").unwrap();
        assert!(config.alert_states_layer);
        assert_eq!(config.scene_cache_capacity, 5);
        assert_eq!(config.document_cache_ttl_ms, 500);
        assert!(config.transform_options().alert_states_layer);
    }

    #[test]
    fn from_file_and_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "prefer_v2_for_new_dashboards = true").unwrap();
        let config = LoaderConfig::from_file(file.path()).unwrap();
        assert!(config.prefer_v2_for_new_dashboards);

        assert!(matches!(
            LoaderConfig::from_toml("scene_cache_capacity = \"many\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            LoaderConfig::from_file("/nonexistent/loader.toml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn builders() {
        let config = LoaderConfig::new()
            .with_document_cache_ttl(Duration::from_secs(2))
            .with_reload_on_params_change(false);
        assert_eq!(config.document_cache_ttl_ms, 2000);
        assert!(!config.reload_on_params_change);
    }
}
