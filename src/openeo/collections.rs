// SPDX-License-Identifier: MIT

//! Collection catalogue built from the engine's locations and mapsets

use crate::actinia::{DataType, Engine};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// One dataset available to `load_collection`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    /// `location.mapset.datatype.layer`
    pub id: String,
    pub title: String,
    pub description: String,
    pub license: String,
}

impl Collection {
    fn new(location: &str, mapset: &str, datatype: DataType, layer: &str) -> Self {
        let kind = match datatype {
            DataType::Strds => "Space time raster dataset",
            DataType::Raster => "Raster dataset",
            DataType::Vector => "Vector dataset",
        };
        Self {
            id: format!("{}.{}.{}.{}", location, mapset, datatype, layer),
            title: format!("{} {}", kind, layer),
            description: format!(
                "{} {} of mapset {} in location {}",
                kind, layer, mapset, location
            ),
            license: "proprietary".to_string(),
        }
    }
}

/// Lazily filled, explicitly refreshable collection listing
pub struct CollectionCatalog {
    engine: Arc<dyn Engine>,
    locations: Vec<String>,
    cache: RwLock<Option<Arc<Vec<Collection>>>>,
}

impl CollectionCatalog {
    pub fn new(engine: Arc<dyn Engine>, locations: Vec<String>) -> Self {
        Self {
            engine,
            locations,
            cache: RwLock::new(None),
        }
    }

    /// Cached listing; queries the engine on first use
    pub async fn list(&self) -> Result<Arc<Vec<Collection>>> {
        if let Some(cached) = self.cache.read().await.as_ref() {
            return Ok(cached.clone());
        }

        let mut cache = self.cache.write().await;
        // Filled while we waited for the write lock
        if let Some(cached) = cache.as_ref() {
            return Ok(cached.clone());
        }

        let collections = Arc::new(self.fetch().await?);
        log::info!("Cached {} collections", collections.len());
        *cache = Some(collections.clone());
        Ok(collections)
    }

    /// Drop the cache and list again
    pub async fn refresh(&self) -> Result<Arc<Vec<Collection>>> {
        self.invalidate().await;
        self.list().await
    }

    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }

    async fn fetch(&self) -> Result<Vec<Collection>> {
        let mut collections = Vec::new();
        for location in &self.locations {
            for mapset in self.engine.list_mapsets(location).await? {
                let (strds, raster, vector) = futures::try_join!(
                    self.engine.list_strds(location, &mapset),
                    self.engine.list_raster(location, &mapset),
                    self.engine.list_vector(location, &mapset),
                )?;

                for (datatype, layers) in [
                    (DataType::Strds, strds),
                    (DataType::Raster, raster),
                    (DataType::Vector, vector),
                ] {
                    collections.extend(
                        layers
                            .iter()
                            .map(|layer| Collection::new(location, &mapset, datatype, layer)),
                    );
                }
            }
        }
        Ok(collections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actinia::{ProcessChain, RunHandle, RunReport};
    use crate::error::DriverError;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Engine with one mapset holding one dataset of each kind
    #[derive(Default)]
    struct CatalogueEngine {
        mapset_calls: AtomicUsize,
        fail_vector: AtomicBool,
    }

    #[async_trait]
    impl Engine for CatalogueEngine {
        async fn list_mapsets(&self, _location: &str) -> Result<Vec<String>> {
            self.mapset_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["landsat".to_string()])
        }
        async fn list_raster(&self, _: &str, _: &str) -> Result<Vec<String>> {
            Ok(vec!["elevation".to_string()])
        }
        async fn list_vector(&self, _: &str, _: &str) -> Result<Vec<String>> {
            if self.fail_vector.load(Ordering::SeqCst) {
                return Err(DriverError::engine(400, "mapset is locked"));
            }
            Ok(vec!["roads".to_string()])
        }
        async fn list_strds(&self, _: &str, _: &str) -> Result<Vec<String>> {
            Ok(vec!["lsat5_1987_10".to_string()])
        }
        async fn list_modules(&self) -> Result<Vec<Value>> {
            Ok(vec![])
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

    #[tokio::test]
    async fn test_list_builds_ids() {
        let engine = Arc::new(CatalogueEngine::default());
        let catalog = CollectionCatalog::new(engine, vec!["nc_spm_08".to_string()]);

        let ids: Vec<String> = catalog.list().await.unwrap().iter().map(|c| c.id.clone()).collect();
        assert_eq!(
            ids,
            vec![
                "nc_spm_08.landsat.strds.lsat5_1987_10",
                "nc_spm_08.landsat.raster.elevation",
                "nc_spm_08.landsat.vector.roads",
            ]
        );
    }

    #[tokio::test]
    async fn test_cache_and_refresh() {
        let engine = Arc::new(CatalogueEngine::default());
        let catalog = CollectionCatalog::new(engine.clone(), vec!["nc_spm_08".to_string()]);

        catalog.list().await.unwrap();
        catalog.list().await.unwrap();
        assert_eq!(engine.mapset_calls.load(Ordering::SeqCst), 1);

        catalog.refresh().await.unwrap();
        assert_eq!(engine.mapset_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_engine_failure_is_reported_and_not_cached() {
        let engine = Arc::new(CatalogueEngine::default());
        engine.fail_vector.store(true, Ordering::SeqCst);
        let catalog = CollectionCatalog::new(engine.clone(), vec!["nc_spm_08".to_string()]);

        let err = catalog.list().await.unwrap_err();
        assert_eq!(err.kind(), "EngineError");

        engine.fail_vector.store(false, Ordering::SeqCst);
        assert_eq!(catalog.list().await.unwrap().len(), 3);
    }
}
