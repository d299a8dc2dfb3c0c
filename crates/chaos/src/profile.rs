use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary risk classification of a file-level chaos score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskClass {
    Low,
    High,
}

impl fmt::Display for RiskClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "LOW",
            Self::High => "HIGH",
        })
    }
}

/// How many windows landed in each symbolic state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolicStateCounts {
    #[serde(rename = "LOW")]
    pub low: usize,
    #[serde(rename = "OSCILLATION")]
    pub oscillation: usize,
    #[serde(rename = "HIGH")]
    pub high: usize,
}

/// File-level chaos profile, serialized to the store as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChaosProfile {
    /// Fraction of windows in PERSISTENT_HIGH
    pub chaos_score: f64,

    /// File-level mean window entropy
    pub entropy: f64,

    /// File-level mean window coherence
    pub coherence: f64,

    pub risk_class: RiskClass,

    /// Hazard threshold θ the delta-sigma stage modulated against
    pub hazard_threshold: f64,

    pub windows_analyzed: usize,

    pub symbolic_states: SymbolicStateCounts,
}
