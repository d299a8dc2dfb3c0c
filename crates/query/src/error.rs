use thiserror::Error;

pub type Result<T> = std::result::Result<T, QueryError>;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("store error: {0}")]
    Store(#[from] manifold_store::StoreError),

    #[error("encoder error: {0}")]
    Encoder(#[from] manifold_encoder::EncoderError),

    #[error("invalid regex '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("snippet too small: {len} bytes, need at least {min}")]
    SnippetTooSmall { len: usize, min: usize },

    #[error("nothing to cluster: no signatures match scope '{0}'")]
    EmptyScope(String),

    #[error("operation cancelled")]
    Cancelled,
}
