use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};
use rustfft::num_complex::Complex64;

use crate::scale::DEFAULT_IMPEDANCE_OHMS;

/// Circular complex white Gaussian noise with total power `power` (V²)
///
/// Each of I and Q carries half the power.
pub fn awgn(num_samples: usize, power: f64, seed: u64) -> Vec<Complex64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let sigma = (power.max(0.0) / 2.0).sqrt();

    (0..num_samples)
        .map(|_| {
            let i: f64 = StandardNormal.sample(&mut rng);
            let q: f64 = StandardNormal.sample(&mut rng);
            Complex64::new(i * sigma, q * sigma)
        })
        .collect()
}

/// Real Gaussian samples with the given mean and standard deviation
pub fn gaussian_vector(num_samples: usize, mean: f64, sigma: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..num_samples)
        .map(|_| {
            let z: f64 = StandardNormal.sample(&mut rng);
            mean + z * sigma
        })
        .collect()
}

/// Total noise power (V²) that yields a flat density of `density_dbm` dBm/Hz
/// across `sample_rate_hz` into the default 50 ohm load
pub fn noise_power_for_density_dbm(density_dbm: f64, sample_rate_hz: f64) -> f64 {
    let watts_per_hz = 10.0f64.powf(density_dbm / 10.0) / 1000.0;
    watts_per_hz * DEFAULT_IMPEDANCE_OHMS * sample_rate_hz
}

/// Quantize samples to interleaved signed 8-bit I/Q bytes, saturating at ±127/-128
pub fn quantize_cs8(samples: &[Complex64]) -> Vec<u8> {
    let q = |x: f64| x.round().clamp(-128.0, 127.0) as i8 as u8;
    samples.iter().flat_map(|s| [q(s.re), q(s.im)]).collect()
}
