use serde::{Deserialize, Serialize};
use std::fmt;

/// Weights of the combined-risk mix. Must sum to 1.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskWeights {
    pub chaos: f64,
    pub blast: f64,
    pub churn: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            chaos: 0.4,
            blast: 0.3,
            churn: 0.3,
        }
    }
}

impl RiskWeights {
    pub fn validate(&self) -> Result<(), String> {
        let sum = self.chaos + self.blast + self.churn;
        if (sum - 1.0).abs() > 1e-9 {
            return Err(format!("risk weights must sum to 1 (got {sum})"));
        }
        if [self.chaos, self.blast, self.churn]
            .iter()
            .any(|w| !(0.0..=1.0).contains(w))
        {
            return Err("risk weights must lie in [0, 1]".to_string());
        }
        Ok(())
    }
}

/// Band thresholds, checked top-down.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskBands {
    pub critical: f64,
    pub high: f64,
    pub moderate: f64,
}

impl Default for RiskBands {
    fn default() -> Self {
        Self {
            critical: 0.40,
            high: 0.30,
            moderate: 0.20,
        }
    }
}

impl RiskBands {
    pub fn classify(&self, combined: f64) -> RiskBand {
        if combined >= self.critical {
            RiskBand::Critical
        } else if combined >= self.high {
            RiskBand::High
        } else if combined >= self.moderate {
            RiskBand::Moderate
        } else {
            RiskBand::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskBand {
    Low,
    Moderate,
    High,
    Critical,
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "LOW",
            Self::Moderate => "MODERATE",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        })
    }
}

/// Per-file risk with its component terms, so callers can render the
/// formula alongside the verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskBreakdown {
    pub path: String,
    pub chaos_score: f64,
    pub blast_radius: usize,

    /// `min(blast_radius / 50, 1)`
    pub normalized_blast: f64,

    pub churn: f64,
    pub combined: f64,
    pub band: RiskBand,
}
