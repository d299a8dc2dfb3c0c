use thiserror::Error;

pub type Result<T> = std::result::Result<T, RiskError>;

#[derive(Error, Debug)]
pub enum RiskError {
    #[error("store error: {0}")]
    Store(#[from] manifold_store::StoreError),

    #[error("graph error: {0}")]
    Graph(#[from] manifold_graph::GraphError),

    #[error("no chaos profile for {0}")]
    NoChaosProfile(String),
}
