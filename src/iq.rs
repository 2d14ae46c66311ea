//! Complex sample buffers
//!
//! Converts receiver-native interleaved 8-bit I/Q into complex baseband samples and
//! provides the full-scale normalization used for dBFS estimates.
//!
//! **Layout** (HackRF `.cs8`): `I0 Q0 I1 Q1 ...`, each a signed 8-bit integer.

use rustfft::num_complex::Complex64;
use snafu::ensure;

use crate::error::{OddByteCountSnafu, Result};

/// Convert raw interleaved cs8 bytes into complex samples
///
/// Each byte is reinterpreted as `i8`; no scaling is applied, so samples span
/// `[-128, 127]` on both axes.
pub fn from_cs8(bytes: &[u8]) -> Result<Vec<Complex64>> {
    ensure!(bytes.len() % 2 == 0, OddByteCountSnafu { len: bytes.len() });

    Ok(bytes
        .chunks_exact(2)
        .map(|pair| Complex64::new(pair[0] as i8 as f64, pair[1] as i8 as f64))
        .collect())
}

/// Same as [`from_cs8`] for a buffer already typed as `i8`
pub fn from_interleaved_i8(raw: &[i8]) -> Result<Vec<Complex64>> {
    ensure!(raw.len() % 2 == 0, OddByteCountSnafu { len: raw.len() });

    Ok(raw
        .chunks_exact(2)
        .map(|pair| Complex64::new(pair[0] as f64, pair[1] as f64))
        .collect())
}

/// Normalize I and Q independently to full scale
///
/// Returns a copy where the in-phase channel is divided by `max|I|` and the
/// quadrature channel by `max|Q|`. A channel whose maximum is zero is copied
/// unchanged instead of producing NaN.
pub fn normalize_full_scale(samples: &[Complex64]) -> Vec<Complex64> {
    let i_max = samples.iter().fold(0.0f64, |acc, s| acc.max(s.re.abs()));
    let q_max = samples.iter().fold(0.0f64, |acc, s| acc.max(s.im.abs()));

    let i_scale = if i_max > 0.0 && i_max.is_finite() { 1.0 / i_max } else { 1.0 };
    let q_scale = if q_max > 0.0 && q_max.is_finite() { 1.0 / q_max } else { 1.0 };

    samples
        .iter()
        .map(|s| Complex64::new(s.re * i_scale, s.im * q_scale))
        .collect()
}
