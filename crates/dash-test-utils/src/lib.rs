//! Testing utilities for the dashboard workspace
//!
//! Shared fixtures, recording services and a loader harness.

#![allow(missing_docs)]

pub mod fixtures;
pub mod store;

pub use fixtures::*;
pub use store::{RecordingDocumentStore, RecordingLocationService, StoreCall};

use dash_loader::{
    DashboardPageStateManagerV1, DashboardPageStateManagerV2, LoaderConfig, LoaderServices,
    MemoryKeyValueStore, UnifiedDashboardPageStateManager,
};
use std::sync::Arc;

/// Recording services wired into [`LoaderServices`]
#[derive(Debug, Clone)]
pub struct TestEnv {
    pub store: Arc<RecordingDocumentStore>,
    pub location: Arc<RecordingLocationService>,
    pub kv: Arc<MemoryKeyValueStore>,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::at("/d/none")
    }
}

impl TestEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment whose location starts at `path`
    pub fn at(path: &str) -> Self {
        Self {
            store: Arc::new(RecordingDocumentStore::new()),
            location: Arc::new(RecordingLocationService::at(path)),
            kv: Arc::new(MemoryKeyValueStore::new()),
        }
    }

    pub fn services(&self) -> LoaderServices {
        LoaderServices::new(self.store.clone(), self.location.clone(), self.kv.clone())
    }

    pub fn v1_manager(&self) -> DashboardPageStateManagerV1 {
        DashboardPageStateManagerV1::new(self.services(), LoaderConfig::default())
    }

    pub fn v2_manager(&self) -> DashboardPageStateManagerV2 {
        DashboardPageStateManagerV2::new(self.services(), LoaderConfig::default())
    }

    pub fn unified(&self) -> UnifiedDashboardPageStateManager {
        self.unified_with(LoaderConfig::default())
    }

    pub fn unified_with(&self, config: LoaderConfig) -> UnifiedDashboardPageStateManager {
        UnifiedDashboardPageStateManager::new(self.services(), config)
    }
}
