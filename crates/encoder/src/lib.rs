//! # Manifold Encoder
//!
//! Turns a byte stream into structural signatures.
//!
//! ## Pipeline
//!
//! ```text
//! Bytes
//!     │
//!     ├──> Sliding windows (W bytes, stride S)
//!     │      └─> mean / variance / histogram per window
//!     │
//!     ├──> Window metrics
//!     │      └─> coherence, stability, entropy in [0, 1]
//!     │
//!     └──> Signatures
//!            └─> quantized "c…_s…_e…" keys + file aggregate
//! ```
//!
//! ## Example
//!
//! ```
//! use manifold_encoder::{EncoderConfig, ManifoldEncoder};
//!
//! let encoder = ManifoldEncoder::new(EncoderConfig::default());
//! let encoded = encoder.encode(&vec![b'x'; 256]).unwrap();
//!
//! assert!(!encoded.windows.is_empty());
//! println!("aggregate: {}", encoded.aggregate);
//! ```

mod config;
mod encoder;
mod error;
mod signature;
mod window;

pub use config::EncoderConfig;
pub use encoder::{EncodedFile, ManifoldEncoder};
pub use error::{EncoderError, Result};
pub use signature::Signature;
pub use window::EncodedWindow;
