//! Stored process graphs addressed by a client-chosen id

use crate::error::{DriverError, Result};
use crate::openeo::graph::ProcessGraph;
use crate::openeo::jobs::Store;
use std::sync::Arc;

pub struct GraphService {
    store: Arc<dyn Store<ProcessGraph>>,
}

impl GraphService {
    pub fn new(store: Arc<dyn Store<ProcessGraph>>) -> Self {
        Self { store }
    }

    pub async fn get(&self, id: &str) -> Result<ProcessGraph> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| DriverError::NotFound(format!("Process graph {}", id)))
    }

    /// Store a graph under `id`, replacing any previous one
    pub async fn put(&self, id: &str, mut graph: ProcessGraph) -> Result<ProcessGraph> {
        if id.trim().is_empty() {
            return Err(DriverError::invalid_parameter("id", "must not be empty"));
        }
        graph.id = Some(id.to_string());
        self.store.put(id, graph.clone()).await?;
        log::info!("Stored process graph {}", id);
        Ok(graph)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        if self.store.delete(id).await? {
            log::info!("Deleted process graph {}", id);
            Ok(())
        } else {
            Err(DriverError::NotFound(format!("Process graph {}", id)))
        }
    }

    pub async fn list(&self) -> Result<Vec<ProcessGraph>> {
        let mut graphs = Vec::new();
        for key in self.store.keys().await? {
            if let Some(graph) = self.store.get(&key).await? {
                graphs.push(graph);
            }
        }
        Ok(graphs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openeo::graph::ProcessNode;
    use crate::openeo::jobs::MemoryStore;

    fn service() -> GraphService {
        GraphService::new(Arc::new(MemoryStore::<ProcessGraph>::new()))
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let graphs = service();
        let graph = ProcessGraph::from_nodes([("load", ProcessNode::new("load_collection"))]);

        let stored = graphs.put("ndvi", graph).await.unwrap();
        assert_eq!(stored.id.as_deref(), Some("ndvi"));
        assert_eq!(graphs.get("ndvi").await.unwrap(), stored);
        assert_eq!(graphs.list().await.unwrap().len(), 1);

        graphs.delete("ndvi").await.unwrap();
        assert_eq!(graphs.get("ndvi").await.unwrap_err().kind(), "NotFound");
        assert_eq!(graphs.delete("ndvi").await.unwrap_err().kind(), "NotFound");
    }

    #[tokio::test]
    async fn test_empty_id_rejected() {
        let graphs = service();
        assert!(graphs.put(" ", ProcessGraph::default()).await.is_err());
    }
}
