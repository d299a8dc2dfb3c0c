use crate::config::IndexerConfig;
use crate::error::{IndexerError, Result};
use crate::pipeline::{FilePipeline, Outcome};
use crate::scanner::FileScanner;
use crate::stats::IngestSummary;
use manifold_chaos::RiskClass;
use manifold_store::{CancelToken, FileRecord, ImportExtractor, StructuralIndex};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Options for one ingest run.
#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    /// Wipe every prior record under the namespace before walking
    pub clear_first: bool,

    /// Compute chaos profiles for text files
    pub compute_chaos: bool,

    /// Skip chaos analysis for files matching the lite globs
    pub lite: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            clear_first: false,
            compute_chaos: true,
            lite: false,
        }
    }
}

/// Ingestion coordinator: walks a repository root, runs the per-file
/// encode/analyze pipeline on a worker pool, and commits records in
/// batched pipeline transactions.
pub struct RepoIndexer {
    root: PathBuf,
    index: Arc<StructuralIndex>,
    config: IndexerConfig,
    pipeline: Arc<FilePipeline>,
}

impl RepoIndexer {
    pub fn new(
        root: impl AsRef<Path>,
        index: Arc<StructuralIndex>,
        config: IndexerConfig,
    ) -> Result<Self> {
        Self::with_extractor(root, index, config, None)
    }

    /// Build an indexer that also records outbound imports per text
    /// file, for the dependency analyzer to pick up without re-reading
    /// bodies.
    pub fn with_extractor(
        root: impl AsRef<Path>,
        index: Arc<StructuralIndex>,
        config: IndexerConfig,
        extractor: Option<Arc<dyn ImportExtractor>>,
    ) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(IndexerError::InvalidRoot(format!(
                "not a directory: {}",
                root.display()
            )));
        }
        config
            .validate()
            .map_err(IndexerError::InvalidConfig)?;
        let pipeline = Arc::new(FilePipeline::new(&config, extractor)?);
        Ok(Self {
            root,
            index,
            config,
            pipeline,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index(&self) -> &Arc<StructuralIndex> {
        &self.index
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Walk the root and ingest everything that passes the ignore
    /// policy. Returns the run summary, which is also persisted under
    /// the index meta key.
    pub async fn ingest(
        &self,
        opts: IngestOptions,
        cancel: &CancelToken,
    ) -> Result<IngestSummary> {
        let started = Instant::now();
        let mut summary = IngestSummary::default();

        if opts.clear_first {
            log::info!("clear-first ingest: wiping prior records");
            self.index.clear().await?;
        }

        let files = FileScanner::new(&self.root).scan()?;
        log::info!(
            "ingesting {} files from {} ({} workers, batch {})",
            files.len(),
            self.root.display(),
            self.config.workers(),
            self.config.ingest_batch
        );

        let semaphore = Arc::new(Semaphore::new(self.config.workers()));
        let mut chaos_total = 0.0f64;
        let mut chaos_profiled = 0usize;

        for batch_paths in files.chunks(self.config.ingest_batch) {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let mut join_set = JoinSet::new();
            for abs in batch_paths {
                let Some(rel) = self.relative(abs) else {
                    summary.skipped += 1;
                    continue;
                };
                let abs = abs.clone();
                let pipeline = self.pipeline.clone();
                let semaphore = semaphore.clone();
                join_set.spawn(async move {
                    let _permit = semaphore.acquire_owned().await.expect("semaphore open");
                    pipeline.process(&abs, rel, &opts).await
                });
            }

            let mut records: Vec<FileRecord> = Vec::new();
            while let Some(joined) = join_set.join_next().await {
                let outcome = joined.map_err(|e| IndexerError::Other(e.to_string()))?;
                match outcome {
                    Outcome::Indexed(record) => records.push(*record),
                    Outcome::SkippedTooLarge { rel } => {
                        log::debug!("skipping oversized file {rel}");
                        summary.skipped += 1;
                    }
                    Outcome::SkippedEmpty { .. } => summary.skipped += 1,
                    Outcome::Failed { rel, message } => {
                        log::warn!("failed to process {rel}: {message}");
                        summary.record_error(format!("{rel}: {message}"));
                    }
                }
            }

            // Deterministic transaction layout regardless of worker
            // completion order.
            records.sort_by(|a, b| a.path.cmp(&b.path));

            match self.index.put_files(&records).await {
                Ok(()) => {
                    for record in &records {
                        self.tally(record, &mut summary, &mut chaos_total, &mut chaos_profiled);
                    }
                }
                Err(err) => {
                    // The batch transaction gave up after its retries.
                    // Commit the files one by one so a single bad record
                    // cannot take the whole batch down with it.
                    log::warn!(
                        "batch commit of {} files failed: {err}; retrying individually",
                        records.len()
                    );
                    for record in &records {
                        match self.index.put_file(record).await {
                            Ok(()) => self.tally(
                                record,
                                &mut summary,
                                &mut chaos_total,
                                &mut chaos_profiled,
                            ),
                            Err(err) => {
                                log::warn!("failed to store {}: {err}", record.path);
                                summary.record_error(format!("{}: {err}", record.path));
                            }
                        }
                    }
                }
            }
        }

        if chaos_profiled > 0 {
            summary.avg_chaos = chaos_total / chaos_profiled as f64;
        }
        summary.elapsed_ms = started.elapsed().as_millis() as u64;

        self.index
            .set_ingest_meta(&serde_json::to_vec(&summary)?)
            .await?;
        log::info!(
            "ingest finished in {}ms: {} text, {} binary, {} signatures, {} skipped, {} errors",
            summary.elapsed_ms,
            summary.text_files,
            summary.binary_files,
            summary.signatures,
            summary.skipped,
            summary.errors
        );
        Ok(summary)
    }

    fn tally(
        &self,
        record: &FileRecord,
        summary: &mut IngestSummary,
        chaos_total: &mut f64,
        chaos_profiled: &mut usize,
    ) {
        summary.total_bytes += record.meta.size_bytes;
        if record.meta.is_text {
            summary.text_files += 1;
        } else {
            summary.binary_files += 1;
        }
        if record.signature.is_some() {
            summary.signatures += 1;
        }
        if let Some(chaos) = &record.chaos {
            *chaos_total += chaos.chaos_score;
            *chaos_profiled += 1;
            if chaos.risk_class == RiskClass::High {
                summary.high_risk_count += 1;
            }
        }
    }

    /// Re-run the pipeline for a single on-disk file (watcher path).
    pub async fn ingest_one(&self, abs: &Path) -> Result<()> {
        let Some(rel) = self.relative(abs) else {
            return Ok(());
        };
        match self
            .pipeline
            .process(abs, rel, &IngestOptions::default())
            .await
        {
            Outcome::Indexed(record) => {
                self.index.put_file(&record).await?;
                Ok(())
            }
            Outcome::SkippedTooLarge { rel } | Outcome::SkippedEmpty { rel } => {
                log::debug!("watcher skipped {rel}");
                Ok(())
            }
            Outcome::Failed { rel, message } => Err(IndexerError::Other(format!(
                "watcher ingest of {rel} failed: {message}"
            ))),
        }
    }

    /// Drop the record for a deleted on-disk file (watcher path).
    pub async fn remove_one(&self, abs: &Path) -> Result<()> {
        if let Some(rel) = self.relative(abs) {
            self.index.delete_file(&rel).await?;
        }
        Ok(())
    }

    fn relative(&self, abs: &Path) -> Option<String> {
        abs.strip_prefix(&self.root)
            .ok()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
    }
}
