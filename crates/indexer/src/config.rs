use manifold_chaos::ChaosConfig;
use manifold_encoder::EncoderConfig;
use serde::{Deserialize, Serialize};

/// Configuration for the ingestion coordinator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    pub encoder: EncoderConfig,
    pub chaos: ChaosConfig,

    /// Files above this size are skipped entirely
    pub max_bytes_per_file: u64,

    /// Files per pipelined store transaction
    pub ingest_batch: usize,

    /// Upper bound on encoder/analyzer workers (actual is min(cores, cap))
    pub worker_cap: usize,

    /// Globs whose matches skip chaos analysis in lite mode
    pub lite_globs: Vec<String>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            encoder: EncoderConfig::default(),
            chaos: ChaosConfig::default(),
            max_bytes_per_file: 512_000,
            ingest_batch: 64,
            worker_cap: 8,
            lite_globs: vec![
                "**/test*".to_string(),
                "**/*_test*".to_string(),
                "**/tests/**".to_string(),
                "**/*.md".to_string(),
                "**/*.rst".to_string(),
                "**/*.txt".to_string(),
            ],
        }
    }
}

impl IndexerConfig {
    /// Worker count: one per core up to the cap.
    pub fn workers(&self) -> usize {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        cores.min(self.worker_cap).max(1)
    }

    pub fn validate(&self) -> Result<(), String> {
        self.encoder.validate()?;
        self.chaos.validate()?;
        if self.max_bytes_per_file == 0 {
            return Err("max_bytes_per_file must be > 0".to_string());
        }
        if self.ingest_batch == 0 {
            return Err("ingest_batch must be > 0".to_string());
        }
        if self.worker_cap == 0 {
            return Err("worker_cap must be > 0".to_string());
        }
        Ok(())
    }
}
