use serde::{Deserialize, Serialize};

/// Configuration for the byte manifold encoder
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Window size in bytes
    pub window_bytes: usize,

    /// Stride between window starts in bytes (must be <= window_bytes)
    pub stride_bytes: usize,

    /// Decimal digits kept in each signature component
    pub signature_precision: u8,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            window_bytes: 64,
            stride_bytes: 48,
            signature_precision: 3,
        }
    }
}

impl EncoderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.window_bytes == 0 {
            return Err("window_bytes must be > 0".to_string());
        }

        if self.stride_bytes == 0 || self.stride_bytes > self.window_bytes {
            return Err(format!(
                "stride_bytes ({}) must be in 1..={}",
                self.stride_bytes, self.window_bytes
            ));
        }

        if self.signature_precision == 0 || self.signature_precision > 9 {
            return Err(format!(
                "signature_precision ({}) must be in 1..=9",
                self.signature_precision
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(EncoderConfig::default().validate().is_ok());
    }

    #[test]
    fn stride_larger_than_window_rejected() {
        let config = EncoderConfig {
            window_bytes: 64,
            stride_bytes: 65,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_precision_rejected() {
        let config = EncoderConfig {
            signature_precision: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
