use crate::error::Result;
use crate::graph::DependencyGraph;
use manifold_store::{ImportExtractor, StoreError, StructuralIndex};
use std::collections::HashMap;
use std::sync::Arc;

/// Builds a [`DependencyGraph`] snapshot from the structural index.
///
/// Imports stored on the file record at ingest are preferred; bodies
/// are only re-read and re-extracted for records without them.
pub struct GraphBuilder {
    index: Arc<StructuralIndex>,
    extractor: Arc<dyn ImportExtractor>,
}

impl GraphBuilder {
    pub fn new(index: Arc<StructuralIndex>, extractor: Arc<dyn ImportExtractor>) -> Self {
        Self { index, extractor }
    }

    pub async fn build(&self) -> Result<DependencyGraph> {
        let paths = self.index.list_files().await?;

        // Pass 1: module name -> path, text files only.
        let mut module_to_path: HashMap<String, String> = HashMap::new();
        let mut text_paths = Vec::new();
        for path in paths {
            let meta = match self.index.get_meta(&path).await {
                Ok(meta) => meta,
                Err(StoreError::NotFound(_)) => continue,
                Err(err) => return Err(err.into()),
            };
            if !meta.is_text {
                continue;
            }
            if let Some(module) = self.extractor.path_to_module(&path) {
                module_to_path.insert(module, path.clone());
            }
            text_paths.push((path, meta.imports));
        }

        // Pass 2: edges from extracted or stored import sets.
        let mut graph = DependencyGraph::new();
        for (path, stored_imports) in text_paths {
            let from = graph.add_node(&path);
            let imports = match stored_imports {
                Some(imports) => imports,
                None => match self.index.get_body(&path).await {
                    Ok(body) => self
                        .extractor
                        .extract_imports(&String::from_utf8_lossy(&body)),
                    Err(StoreError::NotFound(_)) => continue,
                    Err(err) => return Err(err.into()),
                },
            };

            for module in imports {
                let target = module_to_path.get(&module).or_else(|| {
                    // Tolerate partially qualified references: a suffix
                    // or prefix segment match resolves relative forms.
                    module_to_path.iter().find_map(|(name, candidate)| {
                        (name.ends_with(&format!(".{module}"))
                            || name.starts_with(&format!("{module}.")))
                        .then_some(candidate)
                    })
                });
                if let Some(target) = target {
                    if target != &path {
                        let to = graph.add_node(target);
                        graph.add_edge(from, to);
                    }
                }
            }
        }

        log::debug!(
            "dependency graph rebuilt: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }
}
