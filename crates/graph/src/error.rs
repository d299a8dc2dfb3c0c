use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("store error: {0}")]
    Store(#[from] manifold_store::StoreError),

    #[error("file not in dependency graph: {0}")]
    NodeNotFound(String),
}
