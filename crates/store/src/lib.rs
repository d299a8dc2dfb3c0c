//! # Manifold Store
//!
//! Structural index over an external key/value store.
//!
//! ## Layout
//!
//! ```text
//! StructuralIndex
//!     │
//!     ├──> KvStore trait (strings, sets, hashes, atomic batches)
//!     │      ├─> ValkeyStore (RESP, pipelined MULTI/EXEC)
//!     │      └─> MemoryStore (in-process, test double)
//!     │
//!     └──> Key families
//!            file:<path>    body (gzip) + metadata
//!            sig:<path>     aggregate signature
//!            chaos:<path>   chaos profile (JSON)
//!            sigidx:<sig>   paths sharing an aggregate signature
//!            winsig:<sig>   paths holding a window with that signature
//!            fact:<id>      free-text fact records
//! ```
//!
//! Writers issue one pipelined transaction per file so readers observe
//! either the old or the new record, never a mix.

mod cancel;
mod compress;
mod config;
mod error;
mod imports;
mod index;
mod keys;
mod kv;
mod memory;
mod scope;
mod types;
mod valkey;

pub use cancel::{cancel_pair, CancelHandle, CancelToken};
pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use imports::ImportExtractor;
pub use index::StructuralIndex;
pub use kv::{Batch, BatchOp, KvStore};
pub use memory::{MemoryDump, MemoryStore};
pub use scope::Scope;
pub use types::{FileMeta, FileRecord, IndexStats, Neighbor, FACT_PATH_PREFIX};
pub use valkey::ValkeyStore;
