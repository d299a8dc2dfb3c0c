//! # Manifold Indexer
//!
//! Repository ingestion for the structural index.
//!
//! ## Pipeline
//!
//! ```text
//! Directory
//!     │
//!     ├──> File Scanner (ignore rules, binary sniff, size cap)
//!     │      └─> candidate files
//!     │
//!     ├──> Worker pool (encoder + chaos analyzer per file)
//!     │      └─> file records
//!     │
//!     └──> Committer (batched pipeline transactions)
//!            └─> StructuralIndex
//! ```
//!
//! A debounced filesystem watcher feeds the same per-file pipeline for
//! incremental updates.
//!
//! ## Example
//!
//! ```no_run
//! use manifold_indexer::{IndexerConfig, IngestOptions, RepoIndexer};
//! use manifold_store::{CancelToken, MemoryStore, StoreConfig, StructuralIndex};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let index = Arc::new(StructuralIndex::new(
//!         Arc::new(MemoryStore::new()),
//!         StoreConfig::default(),
//!     ));
//!     let indexer = RepoIndexer::new("/path/to/repo", index, IndexerConfig::default())?;
//!     let summary = indexer
//!         .ingest(IngestOptions::default(), &CancelToken::never())
//!         .await?;
//!     println!("indexed {} text files", summary.text_files);
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod indexer;
mod pipeline;
mod scanner;
mod stats;
mod watcher;

pub use config::IndexerConfig;
pub use error::{IndexerError, Result};
pub use indexer::{IngestOptions, RepoIndexer};
pub use scanner::{FileClass, FileScanner};
pub use stats::IngestSummary;
pub use watcher::{DebounceState, EventKind, FileEvent, RepoWatcher, WatcherConfig};
