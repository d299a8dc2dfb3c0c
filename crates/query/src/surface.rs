use crate::cluster::{kmeans, label_cluster, Cluster, ClusterMember, ClusterReport};
use crate::config::QueryConfig;
use crate::error::{QueryError, Result};
use crate::report::{ChaosReport, StabilityOutlook};
use crate::search::{compile_query, scan_body, SearchOutcome};
use crate::verify::VerifyReport;
use manifold_chaos::{
    hazard_reference_signal, log_variance_signal, quantile, ChaosAnalyzer, ChaosConfig,
    SymbolicState,
};
use manifold_encoder::{EncoderConfig, EncoderError, ManifoldEncoder, Signature};
use manifold_store::{Neighbor, Scope, StructuralIndex, FACT_PATH_PREFIX};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Read-only query facade over the structural index.
pub struct QuerySurface {
    index: Arc<StructuralIndex>,
    encoder: ManifoldEncoder,
    chaos_config: ChaosConfig,
    config: QueryConfig,
}

impl QuerySurface {
    pub fn new(
        index: Arc<StructuralIndex>,
        encoder_config: EncoderConfig,
        chaos_config: ChaosConfig,
        config: QueryConfig,
    ) -> Self {
        Self {
            index,
            encoder: ManifoldEncoder::new(encoder_config),
            chaos_config,
            config,
        }
    }

    pub fn index(&self) -> &Arc<StructuralIndex> {
        &self.index
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    /// Scan indexed bodies (facts included) for a substring or regex.
    pub async fn search_substring(
        &self,
        query: &str,
        file_glob: &str,
        case_sensitive: bool,
        limit: usize,
    ) -> Result<SearchOutcome> {
        let regex = compile_query(query, case_sensitive)?;
        let paths = self.index.list_paths(file_glob).await?;

        let mut outcome = SearchOutcome {
            hits: Vec::new(),
            files_scanned: 0,
            total_matches: 0,
            truncated: false,
        };

        for path in paths {
            if outcome.hits.len() >= limit {
                outcome.truncated = true;
                break;
            }
            if !path.starts_with(FACT_PATH_PREFIX) {
                match self.index.get_meta(&path).await {
                    Ok(meta) if meta.is_text => {}
                    Ok(_) => continue,
                    Err(manifold_store::StoreError::NotFound(_)) => continue,
                    Err(err) => return Err(err.into()),
                }
            }
            let body = self.index.get_body(&path).await?;
            let text = String::from_utf8_lossy(&body);
            outcome.files_scanned += 1;

            if let Some(hit) = scan_body(&path, &text, &regex, &self.config) {
                outcome.total_matches += hit.match_count;
                outcome.hits.push(hit);
            }
        }

        Ok(outcome)
    }

    // ------------------------------------------------------------------
    // Verification
    // ------------------------------------------------------------------

    /// Verify a snippet against the corpus with hazard gating.
    pub async fn verify_snippet(
        &self,
        snippet: &str,
        coverage_threshold: f64,
        scope_glob: &str,
    ) -> Result<VerifyReport> {
        let bytes = snippet.as_bytes();
        let encoded = match self.encoder.encode(bytes) {
            Ok(encoded) => encoded,
            Err(EncoderError::InputTooSmall { len, window_bytes }) => {
                return Err(QueryError::SnippetTooSmall {
                    len,
                    min: window_bytes,
                })
            }
            Err(err) => return Err(err.into()),
        };

        let variances: Vec<f64> = encoded.windows.iter().map(|w| w.variance).collect();
        let signal = log_variance_signal(&variances);
        let reference = hazard_reference_signal(&signal, &self.chaos_config);
        let threshold = quantile(&reference, self.chaos_config.hazard_percentile);

        let scope = Scope::parse(scope_glob)?;
        let corpus = self.index.aggregate_signatures(scope_glob).await?;
        let tolerance = self.config.verify_tolerance;

        let mut exact_holders: HashMap<String, Vec<String>> = HashMap::new();
        let mut matched_documents: BTreeSet<String> = BTreeSet::new();
        let mut matched_windows = 0usize;
        let mut gated_hits = 0usize;

        for (i, window) in encoded.windows.iter().enumerate() {
            let key = window.signature.to_string();
            let holders = match exact_holders.get(&key) {
                Some(cached) => cached.clone(),
                None => {
                    let all = self.index.paths_with_window_signature(&key).await?;
                    let in_scope: Vec<String> =
                        all.into_iter().filter(|p| scope.matches(p)).collect();
                    exact_holders.insert(key.clone(), in_scope.clone());
                    in_scope
                }
            };

            let exact = !holders.is_empty();
            let neighbors: Vec<&str> = corpus
                .iter()
                .filter(|(_, sig)| window.signature.within_tolerance(sig, tolerance))
                .map(|(path, _)| path.as_str())
                .collect();
            let matched = exact || !neighbors.is_empty();

            if matched {
                matched_windows += 1;
                matched_documents.extend(holders.iter().cloned());
                matched_documents.extend(neighbors.iter().map(|p| p.to_string()));
            }

            // Hazard gate: windows above θ are only safe on an exact hit.
            let hazardous = reference[i] > threshold;
            let safe = if hazardous { exact } else { matched };
            if safe {
                gated_hits += 1;
            }
        }

        let total = encoded.windows.len();
        let safe_coverage = gated_hits as f64 / total as f64;
        let raw_match_ratio = matched_windows as f64 / total as f64;
        log::debug!(
            "verify: {gated_hits}/{total} gated hits, {matched_windows} matched, θ={threshold:.4}"
        );

        Ok(VerifyReport {
            verified: safe_coverage >= coverage_threshold,
            safe_coverage,
            raw_match_ratio,
            coverage_threshold,
            hazard_threshold: threshold,
            total_windows: total,
            matched_windows,
            gated_hits,
            matched_documents: matched_documents.into_iter().collect(),
        })
    }

    // ------------------------------------------------------------------
    // Clustering
    // ------------------------------------------------------------------

    /// Group files by structural signature with K-means.
    pub async fn cluster(&self, scope_glob: &str, k: usize) -> Result<ClusterReport> {
        let pairs = self.index.aggregate_signatures(scope_glob).await?;
        if pairs.is_empty() {
            return Err(QueryError::EmptyScope(scope_glob.to_string()));
        }

        let k = k.clamp(1, pairs.len());
        let points: Vec<[f64; 3]> = pairs.iter().map(|(_, sig)| sig.components()).collect();

        let seed = self
            .config
            .cluster_seed
            .unwrap_or(pairs.len() as u64 ^ 0x6d61_6e69);
        let mut rng = StdRng::seed_from_u64(seed);
        let (assignments, centroids, iterations) = kmeans(
            &points,
            k,
            self.config.cluster_max_iterations,
            self.config.cluster_min_movement,
            &mut rng,
        );

        let mut clusters: Vec<Cluster> = centroids
            .iter()
            .map(|centroid| Cluster {
                centroid: *centroid,
                label: String::new(),
                members: Vec::new(),
            })
            .collect();

        for ((path, signature), cluster_idx) in pairs.iter().zip(assignments.iter()) {
            let chaos_score = match self.index.get_chaos(path).await {
                Ok(profile) => profile.chaos_score,
                Err(manifold_store::StoreError::NotFound(_)) => 0.0,
                Err(err) => return Err(err.into()),
            };
            clusters[*cluster_idx].members.push(ClusterMember {
                path: path.clone(),
                signature: *signature,
                chaos_score,
            });
        }

        log::debug!(
            "clustered {} files into {} groups in {} iterations",
            pairs.len(),
            k,
            iterations
        );
        clusters.retain(|c| !c.members.is_empty());
        for cluster in &mut clusters {
            cluster.members.sort_by(|a, b| {
                b.chaos_score
                    .partial_cmp(&a.chaos_score)
                    .expect("chaos scores are finite")
                    .then_with(|| a.path.cmp(&b.path))
            });
            let avg_chaos = cluster.members.iter().map(|m| m.chaos_score).sum::<f64>()
                / cluster.members.len() as f64;
            cluster.label = label_cluster(&cluster.centroid, avg_chaos);
        }

        Ok(ClusterReport {
            files: pairs.len(),
            iterations,
            clusters,
        })
    }

    // ------------------------------------------------------------------
    // Reports and passthroughs
    // ------------------------------------------------------------------

    pub async fn chaos_report(&self, path: &str) -> Result<ChaosReport> {
        let profile = self.index.get_chaos(path).await?;
        Ok(ChaosReport {
            path: path.to_string(),
            profile,
        })
    }

    /// Band the file's chaos score into the three symbolic states.
    pub async fn stability_outlook(&self, path: &str) -> Result<StabilityOutlook> {
        let profile = self.index.get_chaos(path).await?;
        let state = if profile.chaos_score >= self.config.chaos_band_high {
            SymbolicState::PersistentHigh
        } else if profile.chaos_score >= self.config.chaos_band_low {
            SymbolicState::Oscillation
        } else {
            SymbolicState::LowFluctuation
        };
        Ok(StabilityOutlook {
            path: path.to_string(),
            chaos_score: profile.chaos_score,
            state,
        })
    }

    /// Encode free text and report its aggregate signature.
    pub fn compute_signature(&self, text: &str) -> Result<Signature> {
        match self.encoder.encode(text.as_bytes()) {
            Ok(encoded) => Ok(encoded.aggregate),
            Err(EncoderError::InputTooSmall { len, window_bytes }) => {
                Err(QueryError::SnippetTooSmall {
                    len,
                    min: window_bytes,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Structural neighborhood lookup with the configured default
    /// tolerance.
    pub async fn neighbors(
        &self,
        signature: &str,
        scope_glob: &str,
        limit: usize,
    ) -> Result<Vec<Neighbor>> {
        let tolerance = self.index.config().neighbor_default_tolerance;
        Ok(self
            .index
            .neighbors(signature, tolerance, scope_glob, limit)
            .await?)
    }

    /// Analyzer wired the same way ingest runs it, for ad-hoc use.
    pub fn analyzer(&self) -> ChaosAnalyzer {
        ChaosAnalyzer::new(self.chaos_config)
    }
}
