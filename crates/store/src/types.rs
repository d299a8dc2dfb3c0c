use manifold_chaos::ChaosProfile;
use manifold_encoder::{EncodedFile, Signature};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Prefix under which fact records appear in path listings.
pub const FACT_PATH_PREFIX: &str = "__fact__/";

/// Metadata stored beside the compressed body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMeta {
    pub size_bytes: u64,

    /// Unix seconds of the on-disk mtime at ingest
    pub modified_at: u64,

    pub is_text: bool,

    /// Distinct window signature keys of this body, sorted. Needed to
    /// clean the window-signature index on replace/delete.
    #[serde(default)]
    pub window_signatures: Vec<String>,

    /// Outbound module references, when an extractor ran at ingest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imports: Option<BTreeSet<String>>,
}

/// A logical file entry keyed by repository-relative path.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    pub path: String,
    pub body: Vec<u8>,
    pub meta: FileMeta,
    pub signature: Option<Signature>,
    pub chaos: Option<ChaosProfile>,
}

impl FileRecord {
    /// Record for a text file that went through the encoder.
    pub fn text(
        path: impl Into<String>,
        body: Vec<u8>,
        modified_at: u64,
        encoded: &EncodedFile,
        chaos: Option<ChaosProfile>,
    ) -> Self {
        let size_bytes = body.len() as u64;
        Self {
            path: path.into(),
            body,
            meta: FileMeta {
                size_bytes,
                modified_at,
                is_text: true,
                window_signatures: encoded.window_signature_keys(),
                imports: None,
            },
            signature: Some(encoded.aggregate),
            chaos,
        }
    }

    /// Record for a binary (or too-small) file: body only, no
    /// signature, no chaos profile.
    pub fn opaque(path: impl Into<String>, body: Vec<u8>, modified_at: u64, is_text: bool) -> Self {
        let size_bytes = body.len() as u64;
        Self {
            path: path.into(),
            body,
            meta: FileMeta {
                size_bytes,
                modified_at,
                is_text,
                window_signatures: Vec::new(),
                imports: None,
            },
            signature: None,
            chaos: None,
        }
    }

    pub fn with_imports(mut self, imports: BTreeSet<String>) -> Self {
        self.meta.imports = Some(imports);
        self
    }
}

/// One neighborhood query hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neighbor {
    pub path: String,
    pub signature: Signature,

    /// Euclidean distance in (C, S, E) space
    pub distance: f64,
}

/// Counters over the whole index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub files: usize,
    pub signatures: usize,
    pub chaos_profiles: usize,
    pub facts: usize,
}
