//! Cross-instrument spectrum comparison
//!
//! Two spectra captured by different receivers rarely share a frequency axis. The
//! reference axis is kept as is and the candidate is linearly interpolated onto
//! it, clamping to the candidate's boundary values outside its range.
//!
//! Both axes must be sorted by increasing frequency; this is not re-checked. Length
//! and emptiness are, since [`Spectrum`] fields are public.

use tracing::{debug, instrument, warn};

use crate::error::Result;
use crate::scale::{sanitize, PowerScale};
use crate::spectrum::Spectrum;

/// How the candidate spectrum is aligned to the reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    /// Interpolate the candidate onto the reference axis
    #[default]
    Interpolate,
    /// Compare index by index over the common prefix, ignoring frequencies
    Truncate,
}

/// Summary statistics of an error vector (dB)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorSummary {
    pub mean_db: f64,
    pub mean_abs_db: f64,
    pub rms_db: f64,
    pub std_dev_db: f64,
    pub max_abs_db: f64,
    /// Reference frequency where the largest absolute error occurs
    pub max_abs_frequency_hz: f64,
}

impl ErrorSummary {
    fn from_error(frequencies: &[f64], error: &[f64]) -> Self {
        let n = error.len().max(1) as f64;
        let mean = error.iter().sum::<f64>() / n;
        let mean_abs = error.iter().map(|e| e.abs()).sum::<f64>() / n;
        let rms = (error.iter().map(|e| e * e).sum::<f64>() / n).sqrt();
        let variance = error.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / n;

        let (max_idx, max_abs) = error
            .iter()
            .map(|e| e.abs())
            .enumerate()
            .fold((0, 0.0), |(bi, bv), (i, v)| if v > bv { (i, v) } else { (bi, bv) });

        Self {
            mean_db: mean,
            mean_abs_db: mean_abs,
            rms_db: rms,
            std_dev_db: variance.sqrt(),
            max_abs_db: max_abs,
            max_abs_frequency_hz: frequencies.get(max_idx).copied().unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    /// Reference axis (or its common prefix in truncate mode)
    pub frequencies: Vec<f64>,
    pub reference_power: Vec<f64>,
    pub candidate_power_interpolated: Vec<f64>,
    /// `candidate - reference` per bin
    pub error: Vec<f64>,
    pub summary: ErrorSummary,
}

/// Linear interpolation of `(xp, fp)` at `x`, clamped to the end values
///
/// `xp` must be sorted ascending, non-empty and as long as `fp`.
fn interp_clamped(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let last = xp.len() - 1;
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[last] {
        return fp[last];
    }

    // First index with xp[i] > x; 1..=last here
    let hi = xp.partition_point(|&v| v <= x);
    let lo = hi - 1;
    let dx = xp[hi] - xp[lo];
    if dx <= 0.0 {
        return fp[lo];
    }
    let t = (x - xp[lo]) / dx;
    fp[lo] + t * (fp[hi] - fp[lo])
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CrossInstrumentComparator {
    alignment: Alignment,
    /// Scale of both inputs; picks the floor for non-finite values
    scale: PowerScale,
}

impl CrossInstrumentComparator {
    pub fn new(alignment: Alignment) -> Self {
        Self {
            alignment,
            scale: PowerScale::default(),
        }
    }

    pub fn with_scale(mut self, scale: PowerScale) -> Self {
        self.scale = scale;
        self
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    pub fn scale(&self) -> PowerScale {
        self.scale
    }

    /// Compare `candidate` against `reference`
    ///
    /// Fails with `LengthMismatch` or `EmptySpectrum` when either input breaks the
    /// [`Spectrum`] invariants. Non-finite power values on either side are replaced by
    /// the floor of the configured scale before alignment.
    #[instrument(skip(self, reference, candidate), fields(reference = reference.len(), candidate = candidate.len()))]
    pub fn compare(&self, reference: &Spectrum, candidate: &Spectrum) -> Result<ComparisonResult> {
        reference.validate()?;
        candidate.validate()?;

        let mut ref_power = reference.power.clone();
        let mut cand_power = candidate.power.clone();
        let clamped = sanitize(&mut ref_power, self.scale) + sanitize(&mut cand_power, self.scale);
        if clamped > 0 {
            warn!(clamped, "non-finite power values floored before comparison");
        }

        let (frequencies, reference_power, candidate_power_interpolated) = match self.alignment {
            Alignment::Interpolate => {
                let interpolated = reference
                    .frequencies
                    .iter()
                    .map(|&f| interp_clamped(f, &candidate.frequencies, &cand_power))
                    .collect();
                (reference.frequencies.clone(), ref_power, interpolated)
            }
            Alignment::Truncate => {
                let n = reference.len().min(candidate.len());
                if reference.len() != candidate.len() {
                    debug!(kept = n, "truncating to common length");
                }
                ref_power.truncate(n);
                cand_power.truncate(n);
                (reference.frequencies[..n].to_vec(), ref_power, cand_power)
            }
        };

        let error: Vec<f64> = candidate_power_interpolated
            .iter()
            .zip(&reference_power)
            .map(|(c, r)| c - r)
            .collect();
        let summary = ErrorSummary::from_error(&frequencies, &error);

        debug!(
            mean_db = summary.mean_db,
            rms_db = summary.rms_db,
            max_abs_db = summary.max_abs_db,
            "comparison done"
        );

        Ok(ComparisonResult {
            frequencies,
            reference_power,
            candidate_power_interpolated,
            error,
            summary,
        })
    }
}
