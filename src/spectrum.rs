//! Frequency/power pairs shared by the stitcher and the comparator.

use snafu::ensure;

use crate::error::{EmptySpectrumSnafu, LengthMismatchSnafu, Result};

/// A spectrum sampled on an explicit frequency axis
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    pub frequencies: Vec<f64>,
    pub power: Vec<f64>,
}

impl Spectrum {
    /// Pair an axis with its values; both must be non-empty and the same length
    pub fn new(frequencies: Vec<f64>, power: Vec<f64>) -> Result<Self> {
        let spectrum = Self { frequencies, power };
        spectrum.validate()?;
        Ok(spectrum)
    }

    /// Re-check the invariants of [`Spectrum::new`] on a value built field by field
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.frequencies.len() == self.power.len(),
            LengthMismatchSnafu { frequencies: self.frequencies.len(), power: self.power.len() }
        );
        ensure!(!self.frequencies.is_empty(), EmptySpectrumSnafu);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.power.len()
    }

    pub fn is_empty(&self) -> bool {
        self.power.is_empty()
    }

    /// Index of the bin whose frequency is nearest to `freq_hz` (first one on ties)
    pub fn closest_index(&self, freq_hz: f64) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, f) in self.frequencies.iter().enumerate() {
            let diff = (f - freq_hz).abs();
            match best {
                Some((_, d)) if diff >= d => {}
                _ => best = Some((i, diff)),
            }
        }
        best.map(|(i, _)| i)
    }

    /// Power at the bin nearest to `freq_hz`
    pub fn power_at(&self, freq_hz: f64) -> Option<f64> {
        self.closest_index(freq_hz).map(|i| self.power[i])
    }

    /// First and last frequency of the axis
    pub fn frequency_range(&self) -> Option<(f64, f64)> {
        Some((*self.frequencies.first()?, *self.frequencies.last()?))
    }

    /// True when every frequency is larger than the one before it
    pub fn is_strictly_increasing(&self) -> bool {
        self.frequencies.windows(2).all(|w| w[1] > w[0])
    }
}
