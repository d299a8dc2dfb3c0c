use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChaosError>;

#[derive(Error, Debug)]
pub enum ChaosError {
    #[error("no windows to analyze: input was below one full window")]
    NoWindows,

    #[error("invalid chaos config: {0}")]
    InvalidConfig(String),
}
