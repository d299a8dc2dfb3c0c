use crate::config::ChaosConfig;
use crate::error::{ChaosError, Result};
use crate::profile::{ChaosProfile, RiskClass, SymbolicStateCounts};
use crate::signal::{hazard_threshold, log_variance_signal, DeltaSigmaModulator};
use crate::states::{StateMachine, SymbolicState};
use manifold_encoder::EncodedWindow;

/// Per-window intermediate record of one analysis run.
#[derive(Debug, Clone)]
pub struct ChaosTrace {
    /// Log-scaled variance signal, one sample per window
    pub signal: Vec<f64>,

    /// Modulated bit stream
    pub bits: Vec<bool>,

    /// Symbolic state after each window
    pub states: Vec<SymbolicState>,

    /// Threshold the modulator ran against
    pub hazard_threshold: f64,
}

/// Symbolic chaos analyzer over encoder windows.
#[derive(Debug, Clone)]
pub struct ChaosAnalyzer {
    config: ChaosConfig,
}

impl ChaosAnalyzer {
    pub fn new(config: ChaosConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChaosConfig {
        &self.config
    }

    /// Run the full pipeline and keep the per-window trace.
    pub fn analyze_trace(&self, windows: &[EncodedWindow]) -> Result<ChaosTrace> {
        if windows.is_empty() {
            return Err(ChaosError::NoWindows);
        }

        let variances: Vec<f64> = windows.iter().map(|w| w.variance).collect();
        let signal = log_variance_signal(&variances);
        let threshold = hazard_threshold(&signal, &self.config);
        let bits = DeltaSigmaModulator::modulate(threshold, &signal);

        let mut machine = StateMachine::new(self.config.state_window);
        let states: Vec<SymbolicState> = bits.iter().map(|&b| machine.push(b)).collect();

        Ok(ChaosTrace {
            signal,
            bits,
            states,
            hazard_threshold: threshold,
        })
    }

    /// Run the full pipeline and reduce to the file-level profile.
    pub fn analyze(&self, windows: &[EncodedWindow]) -> Result<ChaosProfile> {
        let trace = self.analyze_trace(windows)?;

        let mut counts = SymbolicStateCounts::default();
        for state in &trace.states {
            match state {
                SymbolicState::LowFluctuation => counts.low += 1,
                SymbolicState::Oscillation => counts.oscillation += 1,
                SymbolicState::PersistentHigh => counts.high += 1,
            }
        }

        let n = windows.len() as f64;
        let chaos_score = counts.high as f64 / n;
        let entropy = windows.iter().map(|w| w.entropy).sum::<f64>() / n;
        let coherence = windows.iter().map(|w| w.coherence).sum::<f64>() / n;

        // Exactly-at-threshold scores class as HIGH.
        let risk_class = if chaos_score >= self.config.high_threshold {
            RiskClass::High
        } else {
            RiskClass::Low
        };

        Ok(ChaosProfile {
            chaos_score,
            entropy,
            coherence,
            risk_class,
            hazard_threshold: trace.hazard_threshold,
            windows_analyzed: windows.len(),
            symbolic_states: counts,
        })
    }
}
