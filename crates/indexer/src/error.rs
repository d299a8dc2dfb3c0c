use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store error: {0}")]
    Store(#[from] manifold_store::StoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid root: {0}")]
    InvalidRoot(String),

    #[error("invalid indexer config: {0}")]
    InvalidConfig(String),

    #[error("watcher error: {0}")]
    Watcher(String),

    #[error("{0}")]
    Other(String),
}
