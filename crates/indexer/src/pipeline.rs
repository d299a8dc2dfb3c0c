use crate::config::IndexerConfig;
use crate::error::{IndexerError, Result};
use crate::indexer::IngestOptions;
use crate::scanner::{classify, FileClass};
use globset::{Glob, GlobSet, GlobSetBuilder};
use manifold_chaos::ChaosAnalyzer;
use manifold_encoder::{EncoderError, ManifoldEncoder};
use manifold_store::{FileRecord, ImportExtractor};
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

/// What happened to one candidate file.
pub(crate) enum Outcome {
    Indexed(Box<FileRecord>),
    SkippedTooLarge { rel: String },
    SkippedEmpty { rel: String },
    Failed { rel: String, message: String },
}

/// The per-file encode/analyze stage. Pure CPU after the read, safe to
/// run from any worker.
pub(crate) struct FilePipeline {
    encoder: ManifoldEncoder,
    analyzer: ChaosAnalyzer,
    lite_globs: GlobSet,
    max_bytes: u64,
    extractor: Option<Arc<dyn ImportExtractor>>,
}

impl FilePipeline {
    pub(crate) fn new(
        config: &IndexerConfig,
        extractor: Option<Arc<dyn ImportExtractor>>,
    ) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.lite_globs {
            let glob = Glob::new(pattern).map_err(|e| {
                IndexerError::InvalidConfig(format!("lite glob '{pattern}': {e}"))
            })?;
            builder.add(glob);
        }
        let lite_globs = builder
            .build()
            .map_err(|e| IndexerError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            encoder: ManifoldEncoder::new(config.encoder),
            analyzer: ChaosAnalyzer::new(config.chaos),
            lite_globs,
            max_bytes: config.max_bytes_per_file,
            extractor,
        })
    }

    /// Read, classify, encode, and analyze one file into a record.
    pub(crate) async fn process(
        &self,
        abs: &Path,
        rel: String,
        opts: &IngestOptions,
    ) -> Outcome {
        let metadata = match tokio::fs::metadata(abs).await {
            Ok(meta) => meta,
            Err(err) => {
                return Outcome::Failed {
                    rel,
                    message: err.to_string(),
                }
            }
        };
        if metadata.len() > self.max_bytes {
            return Outcome::SkippedTooLarge { rel };
        }

        let body = match tokio::fs::read(abs).await {
            Ok(body) => body,
            Err(err) => {
                return Outcome::Failed {
                    rel,
                    message: err.to_string(),
                }
            }
        };
        if body.is_empty() {
            return Outcome::SkippedEmpty { rel };
        }

        let modified_at = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Outcome::Indexed(Box::new(self.build_record(abs, rel, body, modified_at, opts)))
    }

    pub(crate) fn build_record(
        &self,
        abs: &Path,
        rel: String,
        body: Vec<u8>,
        modified_at: u64,
        opts: &IngestOptions,
    ) -> FileRecord {
        if classify(abs, &body) == FileClass::Binary {
            return FileRecord::opaque(rel, body, modified_at, false);
        }

        let encoded = match self.encoder.encode(&body) {
            Ok(encoded) => encoded,
            Err(EncoderError::InputTooSmall { .. }) => {
                // Too small to profile: the body is indexed, nothing else.
                return self.with_imports(FileRecord::opaque(rel, body, modified_at, true));
            }
            Err(err) => {
                log::warn!("encoder failed on {rel}: {err}");
                return FileRecord::opaque(rel, body, modified_at, true);
            }
        };

        let wants_chaos = opts.compute_chaos && !(opts.lite && self.lite_globs.is_match(&rel));
        let chaos = if wants_chaos {
            match self.analyzer.analyze(&encoded.windows) {
                Ok(profile) => Some(profile),
                Err(err) => {
                    log::warn!("chaos analysis failed on {rel}: {err}");
                    None
                }
            }
        } else {
            None
        };

        self.with_imports(FileRecord::text(rel, body, modified_at, &encoded, chaos))
    }

    fn with_imports(&self, record: FileRecord) -> FileRecord {
        match &self.extractor {
            Some(extractor) if record.meta.is_text => {
                let body_text = String::from_utf8_lossy(&record.body);
                let imports = extractor.extract_imports(&body_text);
                record.with_imports(imports)
            }
            _ => record,
        }
    }
}
