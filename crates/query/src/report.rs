use manifold_chaos::{ChaosProfile, SymbolicState};
use serde::{Deserialize, Serialize};

/// Full chaos analysis for one indexed file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChaosReport {
    pub path: String,
    pub profile: ChaosProfile,
}

/// Coarse maintainability outlook: the file-level chaos score banded
/// into the three symbolic states.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilityOutlook {
    pub path: String,
    pub chaos_score: f64,
    pub state: SymbolicState,
}
