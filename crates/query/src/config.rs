use serde::{Deserialize, Serialize};

/// Configuration for the query surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Component tolerance for snippet-window neighborhood matches
    pub verify_tolerance: f64,

    /// Context lines kept on each side of a search match
    pub context_lines: usize,

    /// Match groups reported per file before truncating
    pub max_matches_per_file: usize,

    /// K-means iteration cap
    pub cluster_max_iterations: usize,

    /// K-means stops once no centroid moved further than this
    pub cluster_min_movement: f64,

    /// Chaos score bands for the stability outlook (low, high)
    pub chaos_band_low: f64,
    pub chaos_band_high: f64,

    /// Fixed RNG seed for k-means++ initialization, for reproducible
    /// clustering; None derives one from the corpus size
    pub cluster_seed: Option<u64>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            verify_tolerance: 0.05,
            context_lines: 2,
            max_matches_per_file: 5,
            cluster_max_iterations: 50,
            cluster_min_movement: 1e-4,
            chaos_band_low: 0.15,
            chaos_band_high: 0.35,
            cluster_seed: None,
        }
    }
}
