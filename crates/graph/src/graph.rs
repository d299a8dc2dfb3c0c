use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Reverse-reachability summary for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlastRadius {
    /// Every file that transitively imports the target
    pub imported_by: BTreeSet<String>,

    /// Greatest BFS level reached before the depth cap
    pub depth: usize,

    /// `imported_by.len()`, the blast radius proper
    pub size: usize,
}

/// Immutable snapshot of the import graph. An edge `u -> v` means file
/// `u` imports the module exported by file `v`.
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub(crate) fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            nodes: HashMap::new(),
        }
    }

    pub(crate) fn add_node(&mut self, path: &str) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(path) {
            return idx;
        }
        let idx = self.graph.add_node(path.to_string());
        self.nodes.insert(path.to_string(), idx);
        idx
    }

    pub(crate) fn add_edge(&mut self, from: NodeIndex, to: NodeIndex) {
        if from != to && self.graph.find_edge(from, to).is_none() {
            self.graph.add_edge(from, to, ());
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.nodes.contains_key(path)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Outbound neighbors: the files `path` imports.
    pub fn imports(&self, path: &str) -> BTreeSet<String> {
        let Some(&idx) = self.nodes.get(path) else {
            return BTreeSet::new();
        };
        self.graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|n| self.graph[n].clone())
            .collect()
    }

    /// Direct importers: files with an edge into `path`.
    pub fn imported_by(&self, path: &str) -> BTreeSet<String> {
        let Some(&idx) = self.nodes.get(path) else {
            return BTreeSet::new();
        };
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .map(|n| self.graph[n].clone())
            .collect()
    }

    /// BFS over reverse edges from `path`, bounded by `depth_cap`.
    pub fn blast_radius(&self, path: &str, depth_cap: usize) -> BlastRadius {
        let mut imported_by = BTreeSet::new();
        let mut max_depth = 0;

        if let Some(&start) = self.nodes.get(path) {
            let mut visited: BTreeSet<NodeIndex> = BTreeSet::new();
            visited.insert(start);
            let mut queue: VecDeque<(NodeIndex, usize)> = VecDeque::new();
            queue.push_back((start, 0));

            while let Some((node, depth)) = queue.pop_front() {
                if depth >= depth_cap {
                    continue;
                }
                for importer in self.graph.neighbors_directed(node, Direction::Incoming) {
                    if visited.insert(importer) {
                        imported_by.insert(self.graph[importer].clone());
                        max_depth = max_depth.max(depth + 1);
                        queue.push_back((importer, depth + 1));
                    }
                }
            }
        }

        BlastRadius {
            size: imported_by.len(),
            imported_by,
            depth: max_depth,
        }
    }

    /// A core module is one whose blast radius reaches the threshold.
    pub fn is_core(&self, path: &str, depth_cap: usize, core_threshold: usize) -> bool {
        self.blast_radius(path, depth_cap).size >= core_threshold
    }
}
