use crate::compress::{compress, decompress};
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::keys;
use crate::kv::{Batch, KvStore};
use crate::scope::Scope;
use crate::types::{FileMeta, FileRecord, IndexStats, Neighbor, FACT_PATH_PREFIX};
use manifold_chaos::ChaosProfile;
use manifold_encoder::Signature;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

const BODY_FIELD: &str = "body";
const META_FIELD: &str = "meta";

/// Signature-keyed structural index over a [`KvStore`].
///
/// Each file mutation is one pipelined transaction covering the body,
/// the aggregate-signature index, the window-signature index, and the
/// chaos profile, so readers never observe a half-written record.
pub struct StructuralIndex {
    kv: Arc<dyn KvStore>,
    config: StoreConfig,
    version: AtomicU64,
}

/// What the index held for a path before a mutation.
#[derive(Debug, Default)]
struct PriorState {
    signature: Option<String>,
    window_signatures: Vec<String>,
    exists: bool,
}

impl StructuralIndex {
    pub fn new(kv: Arc<dyn KvStore>, config: StoreConfig) -> Self {
        Self {
            kv,
            config,
            version: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Monotonic mutation counter, used by callers that cache derived
    /// structures (e.g. the dependency graph) to detect staleness.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    fn bump_version(&self) {
        self.version.fetch_add(1, Ordering::AcqRel);
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Insert or replace one file record transactionally.
    pub async fn put_file(&self, record: &FileRecord) -> Result<()> {
        self.put_files(std::slice::from_ref(record)).await
    }

    /// Insert or replace several records in one pipelined transaction.
    /// The ingestion coordinator batches up to its configured batch size
    /// per call.
    pub async fn put_files(&self, records: &[FileRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut batch = Batch::new();
        let mut stale_sigs: BTreeSet<String> = BTreeSet::new();
        let mut stale_winsigs: BTreeSet<String> = BTreeSet::new();

        for record in records {
            let prior = self.prior_state(&record.path).await?;
            self.append_put_ops(&mut batch, record, &prior, &mut stale_sigs, &mut stale_winsigs)?;
        }

        self.apply_with_retry(batch).await?;
        self.sweep_empty_signature_entries(&stale_sigs, &stale_winsigs)
            .await;
        self.bump_version();
        Ok(())
    }

    /// Remove a file record along with its signature-index and chaos
    /// entries. Deleting an absent path is a no-op.
    pub async fn delete_file(&self, path: &str) -> Result<()> {
        let prior = self.prior_state(path).await?;
        if !prior.exists {
            return Ok(());
        }

        let mut batch = Batch::new();
        batch
            .del(keys::file_key(path))
            .del(keys::sig_key(path))
            .del(keys::chaos_key(path))
            .set_remove(keys::FILES_KEY, path);
        let mut stale_sigs = BTreeSet::new();
        let mut stale_winsigs = BTreeSet::new();
        if let Some(sig) = &prior.signature {
            batch.set_remove(keys::sigidx_key(sig), path);
            stale_sigs.insert(sig.clone());
        }
        for winsig in &prior.window_signatures {
            batch.set_remove(keys::winsig_key(winsig), path);
            stale_winsigs.insert(winsig.clone());
        }

        self.apply_with_retry(batch).await?;
        self.sweep_empty_signature_entries(&stale_sigs, &stale_winsigs)
            .await;
        self.bump_version();
        Ok(())
    }

    /// Drop everything the index holds: files, signature indexes, chaos
    /// profiles, facts, and the ingest meta record.
    pub async fn clear(&self) -> Result<()> {
        let paths = self.kv.set_members(keys::FILES_KEY).await?;
        let sigs = self.kv.set_members(keys::SIGS_KEY).await?;
        let winsigs = self.kv.set_members(keys::WINSIGS_KEY).await?;
        let facts = self.kv.set_members(keys::FACTS_KEY).await?;

        let mut batch = Batch::new();
        for path in &paths {
            batch
                .del(keys::file_key(path))
                .del(keys::sig_key(path))
                .del(keys::chaos_key(path));
        }
        for sig in &sigs {
            batch.del(keys::sigidx_key(sig));
        }
        for winsig in &winsigs {
            batch.del(keys::winsig_key(winsig));
        }
        for id in &facts {
            batch.del(keys::fact_key(id));
        }
        batch
            .del(keys::FILES_KEY)
            .del(keys::SIGS_KEY)
            .del(keys::WINSIGS_KEY)
            .del(keys::FACTS_KEY)
            .del(keys::INGEST_META_KEY);

        self.apply_with_retry(batch).await?;
        self.bump_version();
        Ok(())
    }

    fn append_put_ops(
        &self,
        batch: &mut Batch,
        record: &FileRecord,
        prior: &PriorState,
        stale_sigs: &mut BTreeSet<String>,
        stale_winsigs: &mut BTreeSet<String>,
    ) -> Result<()> {
        let path = record.path.as_str();
        let meta_json = serde_json::to_vec(&record.meta)?;

        batch.hash_set(
            keys::file_key(path),
            vec![
                (BODY_FIELD.to_string(), compress(&record.body)),
                (META_FIELD.to_string(), meta_json),
            ],
        );
        batch.set_add(keys::FILES_KEY, path);

        let new_sig = record.signature.map(|s| s.to_string());
        match (&prior.signature, &new_sig) {
            (Some(old), Some(new)) if old != new => {
                batch.set_remove(keys::sigidx_key(old), path);
                stale_sigs.insert(old.clone());
            }
            (Some(old), None) => {
                batch.set_remove(keys::sigidx_key(old), path);
                stale_sigs.insert(old.clone());
            }
            _ => {}
        }
        match &new_sig {
            Some(sig) => {
                batch
                    .set(keys::sig_key(path), sig.as_bytes().to_vec())
                    .set_add(keys::sigidx_key(sig), path)
                    .set_add(keys::SIGS_KEY, sig.as_str());
            }
            None => {
                batch.del(keys::sig_key(path));
            }
        }

        match &record.chaos {
            Some(profile) => {
                batch.set(keys::chaos_key(path), serde_json::to_vec(profile)?);
            }
            None => {
                batch.del(keys::chaos_key(path));
            }
        }

        let new_winsigs: BTreeSet<&str> = record
            .meta
            .window_signatures
            .iter()
            .map(String::as_str)
            .collect();
        for old in &prior.window_signatures {
            if !new_winsigs.contains(old.as_str()) {
                batch.set_remove(keys::winsig_key(old), path);
                stale_winsigs.insert(old.clone());
            }
        }
        for winsig in &new_winsigs {
            batch
                .set_add(keys::winsig_key(winsig), path)
                .set_add(keys::WINSIGS_KEY, *winsig);
        }

        Ok(())
    }

    async fn prior_state(&self, path: &str) -> Result<PriorState> {
        let meta_raw = self.kv.hash_get(&keys::file_key(path), META_FIELD).await?;
        let Some(meta_raw) = meta_raw else {
            return Ok(PriorState::default());
        };
        let meta: FileMeta = serde_json::from_slice(&meta_raw)?;
        let signature = self
            .kv
            .get(&keys::sig_key(path))
            .await?
            .map(|raw| String::from_utf8_lossy(&raw).into_owned());
        Ok(PriorState {
            signature,
            window_signatures: meta.window_signatures,
            exists: true,
        })
    }

    /// Drop `sigs`/`winsigs` bookkeeping entries whose member sets have
    /// emptied. Best-effort: a failure here leaves a harmless dangling
    /// catalog entry that expands to no paths.
    async fn sweep_empty_signature_entries(
        &self,
        stale_sigs: &BTreeSet<String>,
        stale_winsigs: &BTreeSet<String>,
    ) {
        for sig in stale_sigs {
            match self.kv.set_members(&keys::sigidx_key(sig)).await {
                Ok(members) if members.is_empty() => {
                    if let Err(err) = self.kv.set_remove(keys::SIGS_KEY, sig).await {
                        log::warn!("signature catalog sweep failed for {sig}: {err}");
                    }
                }
                Ok(_) => {}
                Err(err) => log::warn!("signature catalog sweep failed for {sig}: {err}"),
            }
        }
        for winsig in stale_winsigs {
            match self.kv.set_members(&keys::winsig_key(winsig)).await {
                Ok(members) if members.is_empty() => {
                    if let Err(err) = self.kv.set_remove(keys::WINSIGS_KEY, winsig).await {
                        log::warn!("window-signature sweep failed for {winsig}: {err}");
                    }
                }
                Ok(_) => {}
                Err(err) => log::warn!("window-signature sweep failed for {winsig}: {err}"),
            }
        }
    }

    async fn apply_with_retry(&self, batch: Batch) -> Result<()> {
        let mut attempt = 0usize;
        loop {
            match self.kv.apply(batch.clone()).await {
                Ok(()) => return Ok(()),
                Err(err) if err.is_transient() && attempt < self.config.retry_backoff_ms.len() => {
                    let delay = Duration::from_millis(self.config.retry_backoff_ms[attempt]);
                    log::warn!(
                        "store transaction failed (attempt {}): {err}; retrying in {delay:?}",
                        attempt + 1
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Full record for a path, body decompressed.
    pub async fn get_file(&self, path: &str) -> Result<FileRecord> {
        let fields = self.kv.hash_get_all(&keys::file_key(path)).await?;
        if fields.is_empty() {
            return Err(StoreError::NotFound(path.to_string()));
        }

        let body_raw = fields
            .get(BODY_FIELD)
            .ok_or_else(|| StoreError::CorruptRecord {
                key: keys::file_key(path),
                reason: "missing body field".to_string(),
            })?;
        let body = decompress(body_raw).map_err(|e| StoreError::CorruptRecord {
            key: keys::file_key(path),
            reason: format!("body decompression failed: {e}"),
        })?;
        let meta_raw = fields
            .get(META_FIELD)
            .ok_or_else(|| StoreError::CorruptRecord {
                key: keys::file_key(path),
                reason: "missing meta field".to_string(),
            })?;
        let meta: FileMeta = serde_json::from_slice(meta_raw)?;

        let signature = match self.kv.get(&keys::sig_key(path)).await? {
            Some(raw) => Some(parse_signature_bytes(&raw, path)?),
            None => None,
        };
        let chaos = match self.kv.get(&keys::chaos_key(path)).await? {
            Some(raw) => Some(serde_json::from_slice::<ChaosProfile>(&raw)?),
            None => None,
        };

        Ok(FileRecord {
            path: path.to_string(),
            body,
            meta,
            signature,
            chaos,
        })
    }

    /// Body bytes for a path. Fact paths (`__fact__/<id>`) resolve to
    /// the fact text.
    pub async fn get_body(&self, path: &str) -> Result<Vec<u8>> {
        if let Some(id) = path.strip_prefix(FACT_PATH_PREFIX) {
            return Ok(self.get_fact(id).await?.into_bytes());
        }
        let raw = self
            .kv
            .hash_get(&keys::file_key(path), BODY_FIELD)
            .await?
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        decompress(&raw).map_err(|e| StoreError::CorruptRecord {
            key: keys::file_key(path),
            reason: format!("body decompression failed: {e}"),
        })
    }

    pub async fn get_meta(&self, path: &str) -> Result<FileMeta> {
        let raw = self
            .kv
            .hash_get(&keys::file_key(path), META_FIELD)
            .await?
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        Ok(serde_json::from_slice(&raw)?)
    }

    pub async fn get_signature(&self, path: &str) -> Result<Signature> {
        let raw = self
            .kv
            .get(&keys::sig_key(path))
            .await?
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        parse_signature_bytes(&raw, path)
    }

    pub async fn get_chaos(&self, path: &str) -> Result<ChaosProfile> {
        let raw = self
            .kv
            .get(&keys::chaos_key(path))
            .await?
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Indexed file paths (no facts), sorted.
    pub async fn list_files(&self) -> Result<Vec<String>> {
        let mut paths = self.kv.set_members(keys::FILES_KEY).await?;
        paths.sort();
        Ok(paths)
    }

    /// All paths matching `glob`, fact records included as synthetic
    /// `__fact__/<id>` entries, sorted.
    pub async fn list_paths(&self, glob: &str) -> Result<Vec<String>> {
        let scope = Scope::parse(glob)?;
        let mut paths = self.kv.set_members(keys::FILES_KEY).await?;
        for id in self.kv.set_members(keys::FACTS_KEY).await? {
            paths.push(format!("{FACT_PATH_PREFIX}{id}"));
        }
        paths.retain(|p| scope.matches(p));
        paths.sort();
        Ok(paths)
    }

    /// `(path, aggregate signature)` pairs within a scope, sorted by
    /// path. Feeds the neighborhood search, clustering, and snippet
    /// verification.
    pub async fn aggregate_signatures(&self, glob: &str) -> Result<Vec<(String, Signature)>> {
        let scope = Scope::parse(glob)?;
        let mut out = Vec::new();
        for path in self.list_files().await? {
            if !scope.matches(&path) {
                continue;
            }
            match self.get_signature(&path).await {
                Ok(signature) => out.push((path, signature)),
                Err(StoreError::NotFound(_)) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(out)
    }

    /// Files whose aggregate signature lies within `tolerance` of the
    /// target on every component, ranked by Euclidean distance then
    /// path.
    pub async fn neighbors(
        &self,
        signature: &str,
        tolerance: f64,
        scope_glob: &str,
        limit: usize,
    ) -> Result<Vec<Neighbor>> {
        let target: Signature = signature
            .parse()
            .map_err(|_| StoreError::InvalidSignature(signature.to_string()))?;
        let scope = Scope::parse(scope_glob)?;

        let mut hits = Vec::new();
        let mut catalog = self.kv.set_members(keys::SIGS_KEY).await?;
        catalog.sort();
        for sig_str in catalog {
            let Ok(candidate) = sig_str.parse::<Signature>() else {
                log::warn!("unparseable signature in catalog: {sig_str}");
                continue;
            };
            if !target.within_tolerance(&candidate, tolerance) {
                continue;
            }
            let distance = target.distance(&candidate);
            for path in self.kv.set_members(&keys::sigidx_key(&sig_str)).await? {
                if scope.matches(&path) {
                    hits.push(Neighbor {
                        path,
                        signature: candidate,
                        distance,
                    });
                }
            }
        }

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .expect("signature distances are finite")
                .then_with(|| a.path.cmp(&b.path))
        });
        hits.truncate(limit);
        Ok(hits)
    }

    /// Paths holding at least one window with this exact signature key.
    pub async fn paths_with_window_signature(&self, signature: &str) -> Result<Vec<String>> {
        let mut paths = self.kv.set_members(&keys::winsig_key(signature)).await?;
        paths.sort();
        Ok(paths)
    }

    /// Files ranked by chaos score (descending by default), ties broken
    /// by path so repeated scans over the same corpus are identical.
    pub async fn rank_by_chaos(
        &self,
        scope_glob: &str,
        limit: usize,
        descending: bool,
    ) -> Result<Vec<(String, ChaosProfile)>> {
        let scope = Scope::parse(scope_glob)?;
        let mut ranked = Vec::new();
        for path in self.list_files().await? {
            if !scope.matches(&path) {
                continue;
            }
            match self.get_chaos(&path).await {
                Ok(profile) => ranked.push((path, profile)),
                Err(StoreError::NotFound(_)) => {}
                Err(err) => return Err(err),
            }
        }

        ranked.sort_by(|a, b| {
            let by_score = a
                .1
                .chaos_score
                .partial_cmp(&b.1.chaos_score)
                .expect("chaos scores are finite");
            let by_score = if descending { by_score.reverse() } else { by_score };
            by_score.then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(limit);
        Ok(ranked)
    }

    // ------------------------------------------------------------------
    // Facts
    // ------------------------------------------------------------------

    /// Store a free-text note surfaced as `__fact__/<id>` in listings.
    pub async fn put_fact(&self, id: &str, text: &str) -> Result<()> {
        let mut batch = Batch::new();
        batch
            .set(keys::fact_key(id), text.as_bytes().to_vec())
            .set_add(keys::FACTS_KEY, id);
        self.apply_with_retry(batch).await?;
        self.bump_version();
        Ok(())
    }

    pub async fn get_fact(&self, id: &str) -> Result<String> {
        let raw = self
            .kv
            .get(&keys::fact_key(id))
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("{FACT_PATH_PREFIX}{id}")))?;
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }

    pub async fn delete_fact(&self, id: &str) -> Result<()> {
        let mut batch = Batch::new();
        batch
            .del(keys::fact_key(id))
            .set_remove(keys::FACTS_KEY, id);
        self.apply_with_retry(batch).await?;
        self.bump_version();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Meta
    // ------------------------------------------------------------------

    /// Persist the last ingest summary (opaque JSON bytes).
    pub async fn set_ingest_meta(&self, payload: &[u8]) -> Result<()> {
        self.kv.set(keys::INGEST_META_KEY, payload).await
    }

    pub async fn get_ingest_meta(&self) -> Result<Option<Vec<u8>>> {
        self.kv.get(keys::INGEST_META_KEY).await
    }

    pub async fn stats(&self) -> Result<IndexStats> {
        let paths = self.list_files().await?;
        let mut stats = IndexStats {
            files: paths.len(),
            facts: self.kv.set_members(keys::FACTS_KEY).await?.len(),
            ..Default::default()
        };
        for path in &paths {
            if self.kv.get(&keys::sig_key(path)).await?.is_some() {
                stats.signatures += 1;
            }
            if self.kv.get(&keys::chaos_key(path)).await?.is_some() {
                stats.chaos_profiles += 1;
            }
        }
        Ok(stats)
    }
}

fn parse_signature_bytes(raw: &[u8], path: &str) -> Result<Signature> {
    let text = std::str::from_utf8(raw).map_err(|_| StoreError::CorruptRecord {
        key: keys::sig_key(path),
        reason: "signature is not UTF-8".to_string(),
    })?;
    text.parse()
        .map_err(|_| StoreError::CorruptRecord {
            key: keys::sig_key(path),
            reason: format!("unparseable signature '{text}'"),
        })
}
