use crate::error::EncoderError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Structural signature: coherence / stability / entropy quantized to a
/// fixed decimal precision. Canonical form is `c<C>_s<S>_e<E>` with
/// exactly `precision` fractional digits per component, e.g.
/// `c0.418_s0.760_e0.957`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Signature {
    coherence: f64,
    stability: f64,
    entropy: f64,
    precision: u8,
}

impl Signature {
    /// Quantize the raw components with round-half-even and build the
    /// signature. Inputs are clamped to [0, 1].
    pub fn quantize(coherence: f64, stability: f64, entropy: f64, precision: u8) -> Self {
        Self {
            coherence: quantize_component(coherence, precision),
            stability: quantize_component(stability, precision),
            entropy: quantize_component(entropy, precision),
            precision,
        }
    }

    pub fn coherence(&self) -> f64 {
        self.coherence
    }

    pub fn stability(&self) -> f64 {
        self.stability
    }

    pub fn entropy(&self) -> f64 {
        self.entropy
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// True when every component differs by at most `tolerance`.
    pub fn within_tolerance(&self, other: &Self, tolerance: f64) -> bool {
        (self.coherence - other.coherence).abs() <= tolerance
            && (self.stability - other.stability).abs() <= tolerance
            && (self.entropy - other.entropy).abs() <= tolerance
    }

    /// Euclidean distance in (C, S, E) space.
    pub fn distance(&self, other: &Self) -> f64 {
        let dc = self.coherence - other.coherence;
        let ds = self.stability - other.stability;
        let de = self.entropy - other.entropy;
        (dc * dc + ds * ds + de * de).sqrt()
    }

    pub fn components(&self) -> [f64; 3] {
        [self.coherence, self.stability, self.entropy]
    }
}

fn quantize_component(value: f64, precision: u8) -> f64 {
    let clamped = value.clamp(0.0, 1.0);
    let scale = 10f64.powi(i32::from(precision));
    (clamped * scale).round_ties_even() / scale
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = usize::from(self.precision);
        write!(
            f,
            "c{:.p$}_s{:.p$}_e{:.p$}",
            self.coherence, self.stability, self.entropy
        )
    }
}

impl FromStr for Signature {
    type Err = EncoderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EncoderError::InvalidSignature(s.to_string());

        let mut parts = s.split('_');
        let c_part = parts.next().ok_or_else(invalid)?;
        let s_part = parts.next().ok_or_else(invalid)?;
        let e_part = parts.next().ok_or_else(invalid)?;
        if parts.next().is_some() {
            return Err(invalid());
        }

        let c_digits = strip_component(c_part, 'c').ok_or_else(invalid)?;
        let s_digits = strip_component(s_part, 's').ok_or_else(invalid)?;
        let e_digits = strip_component(e_part, 'e').ok_or_else(invalid)?;

        // All three components must carry the same number of fractional
        // digits for the string to be canonical.
        let precision = fraction_digits(c_digits).ok_or_else(invalid)?;
        if fraction_digits(s_digits) != Some(precision) || fraction_digits(e_digits) != Some(precision) {
            return Err(invalid());
        }
        if precision == 0 || precision > 9 {
            return Err(invalid());
        }

        let coherence: f64 = c_digits.parse().map_err(|_| invalid())?;
        let stability: f64 = s_digits.parse().map_err(|_| invalid())?;
        let entropy: f64 = e_digits.parse().map_err(|_| invalid())?;
        for value in [coherence, stability, entropy] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid());
            }
        }

        Ok(Self {
            coherence,
            stability,
            entropy,
            precision,
        })
    }
}

/// Strip the component tag and require a `[01].<digits>` shape with a
/// leading integer digit (`.3` is rejected, `0.3` is accepted).
fn strip_component(part: &str, tag: char) -> Option<&str> {
    let rest = part.strip_prefix(tag)?;
    let (int_part, _frac) = rest.split_once('.')?;
    if int_part != "0" && int_part != "1" {
        return None;
    }
    Some(rest)
}

fn fraction_digits(number: &str) -> Option<u8> {
    let (_, frac) = number.split_once('.')?;
    if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    u8::try_from(frac.len()).ok()
}

impl From<Signature> for String {
    fn from(sig: Signature) -> Self {
        sig.to_string()
    }
}

impl TryFrom<String> for Signature {
    type Error = EncoderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
