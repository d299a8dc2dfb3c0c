//! # Manifold Risk
//!
//! Composes the chaos score, import-graph blast radius, and an external
//! churn signal into one combined risk metric per file:
//!
//! ```text
//! combined = 0.4 * chaos + 0.3 * min(blast_radius / 50, 1) + 0.3 * churn
//! ```
//!
//! Churn comes from a pluggable provider; the default reports zero so
//! the metric degrades gracefully without VCS history.

mod composer;
mod error;
mod types;

pub use composer::{ChurnProvider, NoChurn, RiskComposer};
pub use error::{Result, RiskError};
pub use types::{RiskBand, RiskBands, RiskBreakdown, RiskWeights};
