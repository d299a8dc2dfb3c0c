use crate::error::Result;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Directory names excluded from the walk and the watcher.
pub(crate) const EXCLUDED_DIRS: &[&str] = &[
    ".git",
    "__pycache__",
    ".venv",
    "venv",
    "node_modules",
    "target",
    "build",
    "dist",
    ".mypy_cache",
    ".pytest_cache",
    ".tox",
    ".eggs",
];

/// Extensions stored as opaque binary: body indexed, no signature or
/// chaos profile.
const BINARY_EXTENSIONS: &[&str] = &[
    "class", "dll", "exe", "bin", "dat", "db", "sqlite", "pkl", "npy", "npz", "h5", "wasm",
    "ttf", "otf", "woff", "woff2", "eot", "png", "jpg", "jpeg", "gif", "bmp", "ico", "wav",
    "mp3", "mp4", "webm", "pdf", "zip", "gz", "so", "o", "a", "dylib",
];

/// How many leading bytes the text heuristic inspects.
const SNIFF_BYTES: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    Text,
    Binary,
}

/// Scanner for candidate files under a repository root.
pub struct FileScanner {
    root: PathBuf,
}

impl FileScanner {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Walk the root, skipping hidden directories and the exclusion
    /// set. Returns sorted absolute paths so ingest order is stable.
    pub fn scan(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        let walker = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .filter_entry(|entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let Some(name) = entry.file_name().to_str() else {
                    return false;
                };
                if entry.file_type().is_some_and(|ft| ft.is_dir()) {
                    return !is_excluded_dir(name);
                }
                true
            })
            .build();

        for result in walker {
            match result {
                Ok(entry) => {
                    if entry.file_type().is_some_and(|ft| ft.is_file()) {
                        files.push(entry.path().to_path_buf());
                    }
                }
                Err(e) => log::warn!("failed to read entry: {e}"),
            }
        }

        files.sort();
        log::info!("scanner found {} candidate files", files.len());
        Ok(files)
    }

    /// True when the path is inside the root and not under an excluded
    /// or hidden directory. Used by the watcher for event filtering.
    pub fn is_relevant(&self, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return false;
        };
        for component in relative.components() {
            if let std::path::Component::Normal(name) = component {
                let name = name.to_string_lossy();
                if is_excluded_dir(&name) {
                    return false;
                }
            }
        }
        true
    }
}

fn is_excluded_dir(name: &str) -> bool {
    name.starts_with('.') && name != "." || EXCLUDED_DIRS.contains(&name)
}

/// Classify a body as text or binary: declared binary extensions, a
/// NUL-byte check, and a UTF-8 sniff over the leading bytes.
pub fn classify(path: &Path, body: &[u8]) -> FileClass {
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        if BINARY_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) {
            return FileClass::Binary;
        }
    }

    let prefix = &body[..body.len().min(SNIFF_BYTES)];
    if prefix.contains(&0) {
        return FileClass::Binary;
    }
    match std::str::from_utf8(prefix) {
        Ok(_) => FileClass::Text,
        // A multi-byte char cut at the sniff boundary is still text.
        Err(err) if err.valid_up_to() + 4 > prefix.len() => FileClass::Text,
        Err(_) => FileClass::Binary,
    }
}
