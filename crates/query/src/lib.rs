//! # Manifold Query
//!
//! Read-only facade over the structural index: substring/regex search
//! with context lines, hazard-gated snippet verification, structural
//! K-means clustering, and per-file chaos reports.
//!
//! Everything here reads through the index; nothing mutates it.

mod cluster;
mod config;
mod error;
mod report;
mod search;
mod surface;
mod verify;

pub use cluster::{Cluster, ClusterMember, ClusterReport};
pub use config::QueryConfig;
pub use error::{QueryError, Result};
pub use report::{ChaosReport, StabilityOutlook};
pub use search::{ContextLine, SearchHit, SearchOutcome};
pub use surface::QuerySurface;
pub use verify::VerifyReport;
