use serde::{Deserialize, Serialize};

/// Configuration for dependency-graph queries
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Maximum BFS depth for blast-radius traversal
    pub depth_cap: usize,

    /// Reverse-reachability size at which a file counts as a core module
    pub core_threshold: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            depth_cap: 10,
            core_threshold: 10,
        }
    }
}
