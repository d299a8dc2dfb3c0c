use serde::{Deserialize, Serialize};

/// Summary of one ingest run, persisted under the index meta key and
/// returned to the caller. Tests assert on these fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub text_files: usize,
    pub binary_files: usize,
    pub total_bytes: u64,

    /// Files that received an aggregate signature
    pub signatures: usize,

    /// Files skipped by ignore rules or the size cap
    pub skipped: usize,

    pub errors: usize,

    /// Mean chaos score over profiled files
    pub avg_chaos: f64,

    /// Files whose chaos risk class is HIGH
    pub high_risk_count: usize,

    pub elapsed_ms: u64,

    /// Set when the run stopped at a cancellation point
    #[serde(default)]
    pub cancelled: bool,

    /// First few per-file error messages, for the log
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub error_samples: Vec<String>,
}

impl IngestSummary {
    const MAX_ERROR_SAMPLES: usize = 5;

    pub(crate) fn record_error(&mut self, message: String) {
        self.errors += 1;
        if self.error_samples.len() < Self::MAX_ERROR_SAMPLES {
            self.error_samples.push(message);
        }
    }
}
