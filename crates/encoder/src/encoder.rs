use crate::config::EncoderConfig;
use crate::error::{EncoderError, Result};
use crate::signature::Signature;
use crate::window::{byte_windows, window_stats, EncodedWindow};
use serde::{Deserialize, Serialize};

/// Encoding result for one byte buffer: per-window signatures plus the
/// file-level aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedFile {
    pub windows: Vec<EncodedWindow>,
    pub aggregate: Signature,
}

impl EncodedFile {
    /// Distinct window signature keys, sorted.
    pub fn window_signature_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.windows.iter().map(|w| w.signature.to_string()).collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

/// Byte manifold encoder. Pure and deterministic: identical input and
/// config produce bit-identical output on every platform.
#[derive(Debug, Clone)]
pub struct ManifoldEncoder {
    config: EncoderConfig,
}

impl ManifoldEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Encode a byte buffer into window signatures and an aggregate.
    ///
    /// Inputs shorter than one window are rejected with
    /// [`EncoderError::InputTooSmall`]; nothing else fails.
    pub fn encode(&self, bytes: &[u8]) -> Result<EncodedFile> {
        let EncoderConfig {
            window_bytes,
            stride_bytes,
            signature_precision,
        } = self.config;

        if bytes.len() < window_bytes {
            return Err(EncoderError::InputTooSmall {
                len: bytes.len(),
                window_bytes,
            });
        }

        let mut windows = Vec::new();
        let mut prev_coherence: Option<f64> = None;

        for (offset, window) in byte_windows(bytes, window_bytes, stride_bytes) {
            let stats = window_stats(offset, window);
            let stability = match prev_coherence {
                Some(prev) => 1.0 - (stats.coherence - prev).abs(),
                None => 1.0,
            };
            prev_coherence = Some(stats.coherence);

            let signature = Signature::quantize(
                stats.coherence,
                stability,
                stats.entropy,
                signature_precision,
            );
            windows.push(EncodedWindow {
                offset: stats.offset,
                len: stats.len,
                variance: stats.variance,
                coherence: stats.coherence,
                stability,
                entropy: stats.entropy,
                signature,
            });
        }

        let aggregate = aggregate_signature(&windows, signature_precision);
        Ok(EncodedFile { windows, aggregate })
    }
}

/// Component-wise mean of the quantized window signatures, rounded once.
fn aggregate_signature(windows: &[EncodedWindow], precision: u8) -> Signature {
    let n = windows.len() as f64;
    let mut c = 0.0;
    let mut s = 0.0;
    let mut e = 0.0;
    for window in windows {
        c += window.signature.coherence();
        s += window.signature.stability();
        e += window.signature.entropy();
    }
    Signature::quantize(c / n, s / n, e / n, precision)
}
