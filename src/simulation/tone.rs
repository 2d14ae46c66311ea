use core::f64::consts::PI;

use rustfft::num_complex::Complex64;

/// Complex exponential at `freq_hz` offset from baseband
///
/// # Arguments
/// * `num_samples` - Output length
/// * `freq_hz` - Baseband offset (negative values rotate clockwise)
/// * `sample_rate_hz` - Sample rate
/// * `amplitude` - Peak magnitude
/// * `phase` - Initial phase in radians
pub fn tone(num_samples: usize, freq_hz: f64, sample_rate_hz: f64, amplitude: f64, phase: f64) -> Vec<Complex64> {
    let w = 2.0 * PI * freq_hz / sample_rate_hz;
    (0..num_samples)
        .map(|i| Complex64::from_polar(amplitude, w * i as f64 + phase))
        .collect()
}

/// Mix `other` into `samples` sample by sample, stopping at the shorter length
pub fn add_into(samples: &mut [Complex64], other: &[Complex64]) {
    for (s, o) in samples.iter_mut().zip(other) {
        *s += *o;
    }
}
