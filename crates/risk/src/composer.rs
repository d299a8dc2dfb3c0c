use crate::error::{Result, RiskError};
use crate::types::{RiskBands, RiskBreakdown, RiskWeights};
use async_trait::async_trait;
use manifold_graph::GraphHandle;
use manifold_store::{CancelToken, StoreError, StructuralIndex};
use std::sync::Arc;

/// Blast radius at which the normalized term saturates.
const BLAST_SATURATION: f64 = 50.0;

/// External churn signal in [0, 1] per path. The repository integrates
/// a VCS-history adapter behind this seam.
#[async_trait]
pub trait ChurnProvider: Send + Sync {
    async fn churn(&self, path: &str) -> f64;
}

/// Default provider: no history, zero churn.
#[derive(Debug, Clone, Default)]
pub struct NoChurn;

#[async_trait]
impl ChurnProvider for NoChurn {
    async fn churn(&self, _path: &str) -> f64 {
        0.0
    }
}

/// Combines chaos, blast radius, and churn into per-file risk.
pub struct RiskComposer {
    index: Arc<StructuralIndex>,
    graph: Arc<GraphHandle>,
    churn: Arc<dyn ChurnProvider>,
    weights: RiskWeights,
    bands: RiskBands,
}

impl RiskComposer {
    pub fn new(index: Arc<StructuralIndex>, graph: Arc<GraphHandle>) -> Self {
        Self {
            index,
            graph,
            churn: Arc::new(NoChurn),
            weights: RiskWeights::default(),
            bands: RiskBands::default(),
        }
    }

    pub fn with_churn(mut self, churn: Arc<dyn ChurnProvider>) -> Self {
        self.churn = churn;
        self
    }

    pub fn with_weights(mut self, weights: RiskWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_bands(mut self, bands: RiskBands) -> Self {
        self.bands = bands;
        self
    }

    /// Combined risk for one file. Requires a chaos profile.
    pub async fn combined_risk(&self, path: &str) -> Result<RiskBreakdown> {
        let chaos = match self.index.get_chaos(path).await {
            Ok(profile) => profile,
            Err(StoreError::NotFound(_)) => {
                return Err(RiskError::NoChaosProfile(path.to_string()))
            }
            Err(err) => return Err(err.into()),
        };
        let blast = self.graph.blast_radius(path).await?;
        let churn = self.churn.churn(path).await.clamp(0.0, 1.0);
        Ok(self.compose(path, chaos.chaos_score, blast.size, churn))
    }

    fn compose(&self, path: &str, chaos_score: f64, blast_radius: usize, churn: f64) -> RiskBreakdown {
        let normalized_blast = (blast_radius as f64 / BLAST_SATURATION).min(1.0);
        let combined = self.weights.chaos * chaos_score
            + self.weights.blast * normalized_blast
            + self.weights.churn * churn;
        RiskBreakdown {
            path: path.to_string(),
            chaos_score,
            blast_radius,
            normalized_blast,
            churn,
            combined,
            band: self.bands.classify(combined),
        }
    }

    /// Top-`limit` files with `combined >= min_risk`, sorted by combined
    /// risk descending, ties by path. Candidates are pre-ranked by
    /// chaos so the graph walk only runs for plausible entries.
    pub async fn scan_critical(
        &self,
        scope_glob: &str,
        min_risk: f64,
        limit: usize,
        cancel: &CancelToken,
    ) -> Result<Vec<RiskBreakdown>> {
        let candidates = self
            .index
            .rank_by_chaos(scope_glob, limit.saturating_mul(5).max(limit), true)
            .await?;

        let mut results = Vec::new();
        for (path, profile) in candidates {
            if cancel.is_cancelled() {
                log::info!("critical scan cancelled after {} files", results.len());
                break;
            }
            let blast = self.graph.blast_radius(&path).await?;
            let churn = self.churn.churn(&path).await.clamp(0.0, 1.0);
            let breakdown = self.compose(&path, profile.chaos_score, blast.size, churn);
            if breakdown.combined >= min_risk {
                results.push(breakdown);
            }
        }

        results.sort_by(|a, b| {
            b.combined
                .partial_cmp(&a.combined)
                .expect("risk scores are finite")
                .then_with(|| a.path.cmp(&b.path))
        });
        results.truncate(limit);
        Ok(results)
    }
}
