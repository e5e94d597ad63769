//! Load routes, options and reload parameters

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cache key used for the home route
pub const HOME_CACHE_KEY: &str = "__home__";

/// Repository file being previewed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningTarget {
    pub repo: String,
    pub path: String,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
}

/// How a dashboard is reached
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    #[default]
    Normal,
    Home,
    New,
    Provisioning(ProvisioningTarget),
    Public {
        access_token: String,
    },
    Embedded,
}

/// Options for a dashboard load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub uid: String,
    pub route: Route,
    /// Folder a new dashboard is created in
    pub folder_uid: Option<String>,
    /// Extra query parameters forwarded to the store
    pub params: BTreeMap<String, String>,
}

impl LoadOptions {
    /// Normal route for a uid
    #[must_use]
    pub fn uid(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn home() -> Self {
        Self::default().with_route(Route::Home)
    }

    #[must_use]
    pub fn new_dashboard() -> Self {
        Self::default().with_route(Route::New)
    }

    #[inline]
    #[must_use]
    pub fn with_route(mut self, route: Route) -> Self {
        self.route = route;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_folder(mut self, folder_uid: impl Into<String>) -> Self {
        self.folder_uid = Some(folder_uid.into());
        self
    }

    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Document cache key; `None` for routes that are never cached
    #[must_use]
    pub fn cache_key(&self) -> Option<String> {
        match &self.route {
            Route::Normal | Route::Embedded => Some(self.uid.clone()),
            Route::Home => Some(HOME_CACHE_KEY.to_string()),
            Route::Provisioning(target) => Some(format!("{}/{}", target.repo, target.path)),
            Route::Public { access_token } => Some(access_token.clone()),
            Route::New => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_new(&self) -> bool {
        matches!(self.route, Route::New)
    }
}

/// Parameters passed to a reload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadParams {
    pub version: Option<i64>,
    /// `(from, to)`
    pub time_range: Option<(String, String)>,
    /// Variable name to URL values
    pub variables: BTreeMap<String, Vec<String>>,
    pub scopes: Vec<String>,
}

impl ReloadParams {
    /// Flatten into store query parameters (`from`, `to`, `var-*`, `scopes`)
    #[must_use]
    pub fn to_query(&self) -> BTreeMap<String, String> {
        let mut query = BTreeMap::new();
        if let Some(version) = self.version {
            query.insert("version".to_string(), version.to_string());
        }
        if let Some((from, to)) = &self.time_range {
            query.insert("from".to_string(), from.clone());
            query.insert("to".to_string(), to.clone());
        }
        for (name, values) in &self.variables {
            query.insert(format!("var-{name}"), values.join(","));
        }
        if !self.scopes.is_empty() {
            query.insert("scopes".to_string(), self.scopes.join(","));
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_keys_per_route() {
        assert_eq!(LoadOptions::uid("d1").cache_key().as_deref(), Some("d1"));
        assert_eq!(LoadOptions::home().cache_key().as_deref(), Some(HOME_CACHE_KEY));
        assert_eq!(LoadOptions::new_dashboard().cache_key(), None);
        let public = LoadOptions::default().with_route(Route::Public {
            access_token: "tok".into(),
        });
        assert_eq!(public.cache_key().as_deref(), Some("tok"));
    }

    #[test]
    fn reload_query() {
        let params = ReloadParams {
            time_range: Some(("now-1h".into(), "now".into())),
            variables: BTreeMap::from([("host".to_string(), vec!["a".to_string(), "b".to_string()])]),
            ..ReloadParams::default()
        };
        let query = params.to_query();
        assert_eq!(query["from"], "now-1h");
        assert_eq!(query["var-host"], "a,b");
        assert!(!query.contains_key("scopes"));
    }
}
