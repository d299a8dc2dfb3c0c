use serde::{Deserialize, Serialize};

/// Reference signal the hazard percentile is taken over.
///
/// Adjacent implementations of the pipeline disagreed on this; both are
/// kept behind a switch with the absolute form as the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardReference {
    /// Percentile of |v| (absolute log-variance)
    AbsLogVariance,

    /// Percentile of |v - median(v)|
    MedianCentered,
}

/// Configuration for the chaos analyzer
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChaosConfig {
    /// Sliding bit-window length for the symbolic state machine
    pub state_window: usize,

    /// Percentile (0..=1) of the reference signal used as hazard threshold
    pub hazard_percentile: f64,

    /// Chaos score at or above which a file is classed HIGH risk
    pub high_threshold: f64,

    /// What the hazard percentile is computed over
    pub hazard_reference: HazardReference,
}

impl Default for ChaosConfig {
    fn default() -> Self {
        Self {
            state_window: 5,
            hazard_percentile: 0.75,
            high_threshold: 0.35,
            hazard_reference: HazardReference::AbsLogVariance,
        }
    }
}

impl ChaosConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.state_window < 2 {
            return Err(format!("state_window ({}) must be >= 2", self.state_window));
        }
        if !(0.0..=1.0).contains(&self.hazard_percentile) {
            return Err(format!(
                "hazard_percentile ({}) must be in [0, 1]",
                self.hazard_percentile
            ));
        }
        if !(0.0..=1.0).contains(&self.high_threshold) {
            return Err(format!(
                "high_threshold ({}) must be in [0, 1]",
                self.high_threshold
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ChaosConfig::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_percentile_rejected() {
        let config = ChaosConfig {
            hazard_percentile: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
