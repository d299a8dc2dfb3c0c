use crate::signature::Signature;
use serde::{Deserialize, Serialize};

/// Variance of a uniform byte distribution, used to normalize coherence.
pub(crate) const UNIFORM_BYTE_VARIANCE: f64 = 255.0 * 255.0 / 12.0;

/// A single encoded window with its byte range and metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedWindow {
    /// Byte offset of the window start
    pub offset: usize,

    /// Window length in bytes
    pub len: usize,

    /// Raw population variance of the window's byte values
    pub variance: f64,

    /// 1 - normalized variance, clamped to [0, 1] (unquantized)
    pub coherence: f64,

    /// 1 - |ΔC| against the prior window (unquantized, 1.0 for the first)
    pub stability: f64,

    /// Shannon entropy of the byte histogram over 8 bits (unquantized)
    pub entropy: f64,

    /// Quantized signature key for this window
    pub signature: Signature,
}

/// Raw per-window statistics before stability is known.
pub(crate) struct WindowStats {
    pub offset: usize,
    pub len: usize,
    pub variance: f64,
    pub coherence: f64,
    pub entropy: f64,
}

/// Slide full-length windows of `window_bytes` advancing by
/// `stride_bytes`. When the stride does not land on the last possible
/// start, a final anchor window at `len - window_bytes` covers the
/// tail, so every emitted window is exactly `window_bytes` long and the
/// last bytes are always represented.
pub(crate) fn byte_windows<'a>(
    data: &'a [u8],
    window_bytes: usize,
    stride_bytes: usize,
) -> Vec<(usize, &'a [u8])> {
    if data.len() < window_bytes {
        return Vec::new();
    }
    let last_start = data.len() - window_bytes;
    let mut windows: Vec<(usize, &[u8])> = (0..=last_start)
        .step_by(stride_bytes)
        .map(|offset| (offset, &data[offset..offset + window_bytes]))
        .collect();
    if last_start % stride_bytes != 0 {
        windows.push((last_start, &data[last_start..]));
    }
    windows
}

/// Compute mean/variance/entropy for one window. Accumulators are
/// fixed-width integers so the result is bit-identical across platforms.
pub(crate) fn window_stats(offset: usize, window: &[u8]) -> WindowStats {
    let n = window.len() as u64;
    let mut sum: u64 = 0;
    let mut sum_sq: u64 = 0;
    let mut histogram = [0u32; 256];

    for &byte in window {
        sum += u64::from(byte);
        sum_sq += u64::from(byte) * u64::from(byte);
        histogram[usize::from(byte)] += 1;
    }

    let mean = sum as f64 / n as f64;
    let variance = (sum_sq as f64 / n as f64 - mean * mean).max(0.0);
    let coherence = (1.0 - variance / UNIFORM_BYTE_VARIANCE).clamp(0.0, 1.0);

    let mut entropy_bits = 0.0f64;
    for &count in &histogram {
        if count == 0 {
            continue;
        }
        let p = f64::from(count) / n as f64;
        entropy_bits -= p * p.log2();
    }

    WindowStats {
        offset,
        len: window.len(),
        variance,
        coherence,
        entropy: entropy_bits / 8.0,
    }
}
