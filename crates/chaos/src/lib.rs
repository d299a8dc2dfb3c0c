//! # Manifold Chaos Analyzer
//!
//! Signal-first symbolic dynamics over encoder output.
//!
//! ## Pipeline
//!
//! ```text
//! Window variances
//!     │
//!     ├──> log₁₀ scaling (ε floor for silent windows)
//!     │
//!     ├──> hazard threshold θ (percentile of the scaled signal)
//!     │
//!     ├──> delta-sigma 1-bit modulation against θ
//!     │
//!     └──> symbolic state machine
//!            LOW_FLUCTUATION / OSCILLATION / PERSISTENT_HIGH
//!                  └─> chaos score = PERSISTENT_HIGH fraction
//! ```

mod analyzer;
mod config;
mod error;
mod profile;
mod signal;
mod states;

pub use analyzer::{ChaosAnalyzer, ChaosTrace};
pub use config::{ChaosConfig, HazardReference};
pub use error::{ChaosError, Result};
pub use profile::{ChaosProfile, RiskClass, SymbolicStateCounts};
pub use signal::{
    hazard_reference_signal, hazard_threshold, log_variance_signal, quantile,
    DeltaSigmaModulator,
};
pub use states::{StateMachine, SymbolicState};
