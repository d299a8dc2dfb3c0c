//! Key families, opaque to callers. Everything lives under the
//! `manifold:` namespace so a shared store can be cleared in one sweep.

pub(crate) const NS: &str = "manifold";

pub(crate) const FILES_KEY: &str = "manifold:files";
pub(crate) const SIGS_KEY: &str = "manifold:sigs";
pub(crate) const WINSIGS_KEY: &str = "manifold:winsigs";
pub(crate) const FACTS_KEY: &str = "manifold:facts";
pub(crate) const INGEST_META_KEY: &str = "manifold:meta:ingest";

pub(crate) fn file_key(path: &str) -> String {
    format!("{NS}:file:{path}")
}

pub(crate) fn sig_key(path: &str) -> String {
    format!("{NS}:sig:{path}")
}

pub(crate) fn chaos_key(path: &str) -> String {
    format!("{NS}:chaos:{path}")
}

pub(crate) fn sigidx_key(signature: &str) -> String {
    format!("{NS}:sigidx:{signature}")
}

pub(crate) fn winsig_key(signature: &str) -> String {
    format!("{NS}:winsig:{signature}")
}

pub(crate) fn fact_key(id: &str) -> String {
    format!("{NS}:fact:{id}")
}
