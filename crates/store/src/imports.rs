use std::collections::BTreeSet;

/// Pluggable import extraction. The structural index stores whatever
/// module references the extractor reports; actual source parsing is an
/// external concern.
pub trait ImportExtractor: Send + Sync {
    /// Module names referenced by this body.
    fn extract_imports(&self, body: &str) -> BTreeSet<String>;

    /// Module name a repository-relative path exports, if any.
    fn path_to_module(&self, path: &str) -> Option<String>;
}
