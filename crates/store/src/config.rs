use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the structural index and its KV backends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Per-operation timeout against the external store, in milliseconds
    pub store_timeout_ms: u64,

    /// Backoff schedule for retried transactions, in milliseconds
    pub retry_backoff_ms: Vec<u64>,

    /// Default component-wise tolerance for neighborhood queries
    pub neighbor_default_tolerance: f64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_timeout_ms: 5_000,
            retry_backoff_ms: vec![100, 500, 2_500],
            neighbor_default_tolerance: 0.05,
        }
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.store_timeout_ms == 0 {
            return Err("store_timeout_ms must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.neighbor_default_tolerance) {
            return Err(format!(
                "neighbor_default_tolerance ({}) must be in [0, 1]",
                self.neighbor_default_tolerance
            ));
        }
        Ok(())
    }
}
