use thiserror::Error;

pub type Result<T> = std::result::Result<T, EncoderError>;

#[derive(Error, Debug)]
pub enum EncoderError {
    #[error("input too small: {len} bytes, need at least {window_bytes}")]
    InputTooSmall { len: usize, window_bytes: usize },

    #[error("invalid signature '{0}': expected c<C>_s<S>_e<E> with components in [0, 1]")]
    InvalidSignature(String),

    #[error("invalid encoder config: {0}")]
    InvalidConfig(String),
}
