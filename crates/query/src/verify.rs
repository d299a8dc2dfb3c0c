use serde::{Deserialize, Serialize};

/// Outcome of verifying a snippet against the corpus.
///
/// Calm windows count toward `safe_coverage` on any neighborhood match
/// within tolerance; hazard-gated windows (reference value above θ)
/// count only on an exact window-signature hit. A snippet lifted
/// verbatim from an indexed file therefore reaches full coverage, while
/// unindexed high-variance content stays gated out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyReport {
    pub verified: bool,

    /// Gated hits over total windows
    pub safe_coverage: f64,

    /// All matched windows over total windows
    pub raw_match_ratio: f64,

    pub coverage_threshold: f64,

    /// Hazard threshold θ computed over the snippet's own signal
    pub hazard_threshold: f64,

    pub total_windows: usize,
    pub matched_windows: usize,
    pub gated_hits: usize,

    /// Indexed paths any window matched, sorted
    pub matched_documents: Vec<String>,
}
