//! Synthetic capture generation
//!
//! Deterministic (seeded) tones and noise for exercising the pipeline without a receiver.

mod noise;
mod tone;

pub use noise::{awgn, gaussian_vector, noise_power_for_density_dbm, quantize_cs8};
pub use tone::{add_into, tone};
