use crate::builder::GraphBuilder;
use crate::config::GraphConfig;
use crate::error::Result;
use crate::graph::{BlastRadius, DependencyGraph};
use manifold_store::{ImportExtractor, StructuralIndex};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Lazily rebuilt dependency graph.
///
/// Single writer, many readers: a rebuild runs while readers continue
/// against the previous snapshot, then the new `Arc` is swapped in.
/// Staleness is detected by comparing the index mutation counter.
pub struct GraphHandle {
    index: Arc<StructuralIndex>,
    builder: GraphBuilder,
    config: GraphConfig,
    cached: RwLock<Option<(u64, Arc<DependencyGraph>)>>,
}

impl GraphHandle {
    pub fn new(
        index: Arc<StructuralIndex>,
        extractor: Arc<dyn ImportExtractor>,
        config: GraphConfig,
    ) -> Self {
        let builder = GraphBuilder::new(index.clone(), extractor);
        Self {
            index,
            builder,
            config,
            cached: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Current snapshot, rebuilding first if the index moved on.
    pub async fn snapshot(&self) -> Result<Arc<DependencyGraph>> {
        let version = self.index.version();

        if let Some((cached_version, graph)) = self.cached.read().await.as_ref() {
            if *cached_version == version {
                return Ok(graph.clone());
            }
        }

        let rebuilt = Arc::new(self.builder.build().await?);
        let mut slot = self.cached.write().await;
        // A concurrent rebuild may have landed first; last write wins,
        // both were built from at least `version`.
        *slot = Some((version, rebuilt.clone()));
        Ok(rebuilt)
    }

    pub async fn blast_radius(&self, path: &str) -> Result<BlastRadius> {
        let graph = self.snapshot().await?;
        Ok(graph.blast_radius(path, self.config.depth_cap))
    }

    pub async fn imports(&self, path: &str) -> Result<BTreeSet<String>> {
        let graph = self.snapshot().await?;
        Ok(graph.imports(path))
    }

    pub async fn is_core(&self, path: &str) -> Result<bool> {
        let graph = self.snapshot().await?;
        Ok(graph.is_core(path, self.config.depth_cap, self.config.core_threshold))
    }
}
