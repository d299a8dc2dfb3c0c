use crate::config::{ChaosConfig, HazardReference};

/// Floor applied before taking logs so silent windows do not blow up.
const VARIANCE_EPSILON: f64 = 1e-9;

/// Scale per-window variances into the log domain.
pub fn log_variance_signal(variances: &[f64]) -> Vec<f64> {
    variances
        .iter()
        .map(|&v| v.max(VARIANCE_EPSILON).log10())
        .collect()
}

/// Quantile with linear interpolation between the surrounding order
/// statistics. `p` is in [0, 1]; the input need not be sorted.
pub fn quantile(values: &[f64], p: f64) -> f64 {
    assert!(!values.is_empty(), "quantile of empty slice");
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("NaN in quantile input"));

    let rank = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let weight = rank - lo as f64;
    sorted[lo] * (1.0 - weight) + sorted[hi] * weight
}

/// Per-window values the hazard threshold is a percentile of. A window
/// whose reference value exceeds θ is hazard-gated.
pub fn hazard_reference_signal(signal: &[f64], config: &ChaosConfig) -> Vec<f64> {
    match config.hazard_reference {
        HazardReference::AbsLogVariance => signal.iter().map(|v| v.abs()).collect(),
        HazardReference::MedianCentered => {
            let median = quantile(signal, 0.5);
            signal.iter().map(|v| (v - median).abs()).collect()
        }
    }
}

/// Hazard threshold θ: percentile of the configured reference signal.
pub fn hazard_threshold(signal: &[f64], config: &ChaosConfig) -> f64 {
    quantile(
        &hazard_reference_signal(signal, config),
        config.hazard_percentile,
    )
}

/// First-order delta-sigma modulator quantizing the signal to one bit
/// per window against the hazard threshold.
#[derive(Debug, Clone)]
pub struct DeltaSigmaModulator {
    threshold: f64,
    integrator: f64,
}

impl DeltaSigmaModulator {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            integrator: 0.0,
        }
    }

    /// Integrate one sample and emit the bit. An integrator exactly at
    /// zero emits 1.
    pub fn next(&mut self, value: f64) -> bool {
        self.integrator += value - self.threshold;
        let bit = self.integrator >= 0.0;
        self.integrator -= if bit { self.threshold } else { -self.threshold };
        bit
    }

    pub fn modulate(threshold: f64, signal: &[f64]) -> Vec<bool> {
        let mut modulator = Self::new(threshold);
        signal.iter().map(|&v| modulator.next(v)).collect()
    }
}
