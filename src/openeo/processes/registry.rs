// SPDX-License-Identifier: MIT

use super::{
    module_processes, FilterTemporal, Hants, LoadCollection, Process, ProcessDescription,
    SaveResult, UdfReduceTime,
};
use crate::actinia::Engine;
use crate::error::{DriverError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Process id to translator mapping.
///
/// Filled once at startup and then shared read-only behind an `Arc`.
#[derive(Clone, Default)]
pub struct ProcessRegistry {
    processes: HashMap<String, Arc<dyn Process>>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in process
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(LoadCollection));
        registry.register(Arc::new(FilterTemporal));
        registry.register(Arc::new(Hants));
        registry.register(Arc::new(UdfReduceTime));
        registry.register(Arc::new(SaveResult));
        registry
    }

    /// Add a process; an existing entry with the same id is replaced
    pub fn register(&mut self, process: Arc<dyn Process>) {
        self.processes.insert(process.id().to_string(), process);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Process>> {
        self.processes
            .get(name)
            .cloned()
            .ok_or_else(|| DriverError::UnknownProcess(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.processes.contains_key(name)
    }

    pub fn describe(&self, name: &str) -> Result<ProcessDescription> {
        Ok(self.get(name)?.describe())
    }

    /// All process ids, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.processes.keys().cloned().collect();
        names.sort();
        names
    }

    /// All descriptions, sorted by id
    pub fn descriptions(&self) -> Vec<ProcessDescription> {
        let mut descriptions: Vec<ProcessDescription> =
            self.processes.values().map(|p| p.describe()).collect();
        descriptions.sort_by(|a, b| a.id.cmp(&b.id));
        descriptions
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Import the engine's module catalogue as additional processes.
    ///
    /// Best-effort: a failing engine is logged and leaves the registry as it
    /// was. Modules never replace an already registered process. Returns the
    /// number of processes added.
    pub async fn register_engine_modules(&mut self, engine: &dyn Engine) -> usize {
        log::info!("Requesting module catalogue from engine");

        let modules = match engine.list_modules().await {
            Ok(modules) => modules,
            Err(e) => {
                log::warn!("Engine modules not registered: {}", e);
                return 0;
            }
        };

        let mut added = 0;
        for module in &modules {
            for process in module_processes(module) {
                if self.contains(process.id()) {
                    log::debug!("Engine module '{}' shadowed by existing process", process.id());
                    continue;
                }
                self.register(Arc::new(process));
                added += 1;
            }
        }

        log::info!(
            "Registered {} engine processes from {} modules",
            added,
            modules.len()
        );
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actinia::{ProcessChain, RunHandle, RunReport};
    use crate::openeo::processes::{NodeContext, Translation};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    /// A mock process for testing
    struct MockProcess {
        id: String,
        summary: String,
    }

    impl MockProcess {
        fn new(id: &str, summary: &str) -> Self {
            Self {
                id: id.to_string(),
                summary: summary.to_string(),
            }
        }
    }

    impl Process for MockProcess {
        fn id(&self) -> &str {
            &self.id
        }

        fn describe(&self) -> ProcessDescription {
            ProcessDescription::new(&self.id, &self.summary, "")
        }

        fn translate(&self, _ctx: &NodeContext<'_>) -> Result<Translation> {
            Ok(Translation::default())
        }
    }

    /// Engine whose module listing either succeeds or fails
    struct CatalogueEngine {
        modules: Option<Vec<Value>>,
    }

    #[async_trait]
    impl Engine for CatalogueEngine {
        async fn list_mapsets(&self, _: &str) -> Result<Vec<String>> {
            Ok(vec![])
        }
        async fn list_raster(&self, _: &str, _: &str) -> Result<Vec<String>> {
            Ok(vec![])
        }
        async fn list_vector(&self, _: &str, _: &str) -> Result<Vec<String>> {
            Ok(vec![])
        }
        async fn list_strds(&self, _: &str, _: &str) -> Result<Vec<String>> {
            Ok(vec![])
        }
        async fn list_modules(&self) -> Result<Vec<Value>> {
            self.modules
                .clone()
                .ok_or_else(|| DriverError::engine(500, "catalogue unavailable"))
        }
        async fn submit(&self, _: &str, _: &ProcessChain) -> Result<RunReport> {
            Err(DriverError::engine(501, "not implemented"))
        }
        async fn status(&self, _: &RunHandle) -> Result<RunReport> {
            Err(DriverError::engine(501, "not implemented"))
        }
        async fn cancel(&self, _: &RunHandle) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_register_and_get_process() {
        let mut registry = ProcessRegistry::new();
        registry.register(Arc::new(MockProcess::new("ndvi", "NDVI")));

        let retrieved = registry.get("ndvi").unwrap();
        assert_eq!(retrieved.id(), "ndvi");
        assert_eq!(registry.describe("ndvi").unwrap().summary, "NDVI");
    }

    #[test]
    fn test_get_nonexistent_process() {
        let registry = ProcessRegistry::new();
        assert!(matches!(
            registry.get("nonexistent"),
            Err(DriverError::UnknownProcess(name)) if name == "nonexistent"
        ));
        assert_eq!(registry.describe("nonexistent").unwrap_err().kind(), "UnknownProcess");
    }

    #[test]
    fn test_register_overwrites_existing() {
        let mut registry = ProcessRegistry::new();
        registry.register(Arc::new(MockProcess::new("same_name", "first")));
        registry.register(Arc::new(MockProcess::new("same_name", "second")));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.describe("same_name").unwrap().summary, "second");
    }

    #[test]
    fn test_builtins_sorted() {
        let registry = ProcessRegistry::with_builtins();
        assert_eq!(
            registry.names(),
            vec!["filter_temporal", "hants", "load_collection", "save_result", "udf_reduce_time"]
        );
        let ids: Vec<String> = registry.descriptions().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, registry.names());
    }

    #[test]
    fn test_descriptions_are_stable() {
        let registry = ProcessRegistry::with_builtins();
        assert_eq!(
            registry.describe("hants").unwrap(),
            registry.describe("hants").unwrap()
        );
    }

    #[tokio::test]
    async fn test_register_engine_modules() {
        let engine = CatalogueEngine {
            modules: Some(vec![
                json!({"id": "r.info", "parameters": []}),
                json!({"id": "r.slope.aspect", "parameters": [],
                       "returns": [{"name": "slope"}, {"name": "aspect"}]}),
            ]),
        };
        let mut registry = ProcessRegistry::with_builtins();
        let added = registry.register_engine_modules(&engine).await;

        assert_eq!(added, 3);
        assert!(registry.contains("r_info"));
        assert!(registry.contains("r_slope_aspect_slope"));
        assert!(registry.contains("r_slope_aspect_aspect"));
        assert_eq!(registry.len(), 8);
    }

    #[tokio::test]
    async fn test_engine_modules_do_not_shadow_builtins() {
        let engine = CatalogueEngine {
            modules: Some(vec![json!({"id": "hants", "parameters": []})]),
        };
        let mut registry = ProcessRegistry::with_builtins();
        assert_eq!(registry.register_engine_modules(&engine).await, 0);
        assert_eq!(registry.describe("hants").unwrap().summary, "Harmonic analysis of time series.");
    }

    #[tokio::test]
    async fn test_failing_engine_keeps_builtins() {
        let engine = CatalogueEngine { modules: None };
        let mut registry = ProcessRegistry::with_builtins();
        assert_eq!(registry.register_engine_modules(&engine).await, 0);
        assert_eq!(registry.len(), 5);
    }
}
