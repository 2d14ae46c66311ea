//! Noise floor estimation by histogram mode
//!
//! The noise floor is the power level where PSD bins cluster most densely. A
//! fixed-width histogram mode is used instead of a percentile: signal peaks occupy an
//! unknown share of the band, which biases percentiles but barely moves the mode.
//!
//! **Algorithm** (bin width `δ`):
//! - Bin centers start at `min + δ/4` and advance in `δ/2` steps while below `max`.
//! - Each center counts the samples in `[c - δ/2, c + δ/2)`.
//! - The center with the highest count wins; ties go to the lowest center.
//!
//! A bin width that would need more than [`MAX_HISTOGRAM_BINS`] centers for the data
//! span is rejected with `BinWidthTooSmall`.

use snafu::{ensure, OptionExt};
use tracing::{debug, instrument, warn};

use crate::error::{
    BinWidthTooSmallSnafu, EmptyPowerSnafu, InvalidBinWidthSnafu, NoHistogramBinSnafu,
    NoUsableSegmentsSnafu, Result,
};
use crate::welch::PsdSegment;

pub const DEFAULT_BIN_WIDTH_DB: f64 = 2.0;

/// Upper bound on histogram bins evaluated per detection
pub const MAX_HISTOGRAM_BINS: usize = 1 << 20;

/// Result of one noise floor detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseFloorEstimate {
    /// Center of the most populated histogram bin
    pub center_power_db: f64,
    pub bin_width_db: f64,
    /// Samples that fell inside the winning bin
    pub supporting_sample_count: usize,
}

/// Noise floor of one sweep segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentNoiseFloor {
    pub center_freq_hz: f64,
    pub estimate: NoiseFloorEstimate,
}

/// Noise floor across a whole sweep
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseFloorSurvey {
    pub segments: Vec<SegmentNoiseFloor>,
    pub mean_db: f64,
    pub min_db: f64,
    pub max_db: f64,
    /// Center frequency of the segment with the lowest floor
    pub min_center_freq_hz: f64,
    /// Center frequency of the segment with the highest floor
    pub max_center_freq_hz: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseFloorDetector {
    bin_width_db: f64,
}

impl Default for NoiseFloorDetector {
    fn default() -> Self {
        Self { bin_width_db: DEFAULT_BIN_WIDTH_DB }
    }
}

impl NoiseFloorDetector {
    pub fn new(bin_width_db: f64) -> Result<Self> {
        ensure!(
            bin_width_db.is_finite() && bin_width_db > 0.0,
            InvalidBinWidthSnafu { bin_width_db }
        );
        Ok(Self { bin_width_db })
    }

    pub fn bin_width_db(&self) -> f64 {
        self.bin_width_db
    }

    /// Estimate the noise floor of one PSD vector (in dB)
    ///
    /// Non-finite samples are ignored. Fails with `EmptyPower` for an empty vector,
    /// `NoHistogramBin` when no finite sample exists and `BinWidthTooSmall` when the
    /// span needs more than [`MAX_HISTOGRAM_BINS`] bins.
    pub fn detect(&self, power: &[f64]) -> Result<NoiseFloorEstimate> {
        ensure!(!power.is_empty(), EmptyPowerSnafu);

        let mut sorted: Vec<f64> = power.iter().copied().filter(|p| p.is_finite()).collect();
        ensure!(!sorted.is_empty(), NoHistogramBinSnafu);
        sorted.sort_by(f64::total_cmp);

        let min = sorted[0];
        let max = sorted[sorted.len() - 1];
        let half = self.bin_width_db / 2.0;
        let start = min + self.bin_width_db / 4.0;

        let span_db = max - min;
        let bins_needed = ((max - start) / half).max(0.0).floor() + 1.0;
        ensure!(
            bins_needed <= MAX_HISTOGRAM_BINS as f64,
            BinWidthTooSmallSnafu {
                bin_width_db: self.bin_width_db,
                span_db,
                bins: bins_needed.min(usize::MAX as f64) as usize,
                max_bins: MAX_HISTOGRAM_BINS,
            }
        );

        let mut best: Option<(f64, usize)> = None;
        let mut k = 0usize;
        loop {
            let center = start + k as f64 * half;
            // A constant vector still gets its one bin
            if center >= max && k > 0 {
                break;
            }

            let lower = sorted.partition_point(|&p| p < center - half);
            let upper = sorted.partition_point(|&p| p < center + half);
            let count = upper - lower;

            if count > 0 && best.map_or(true, |(_, c)| count > c) {
                best = Some((center, count));
            }
            k += 1;
        }

        let (center_power_db, supporting_sample_count) = best.context(NoHistogramBinSnafu)?;
        debug!(center_power_db, supporting_sample_count, bins = k, "noise floor detected");

        Ok(NoiseFloorEstimate {
            center_power_db,
            bin_width_db: self.bin_width_db,
            supporting_sample_count,
        })
    }

    /// Detect the noise floor of every segment of a sweep and summarize
    ///
    /// Segments whose detection fails are skipped with a warning. Fails with
    /// `NoUsableSegments` when none succeeds.
    #[instrument(skip(self, segments), fields(segments = segments.len()))]
    pub fn survey(&self, segments: &[PsdSegment]) -> Result<NoiseFloorSurvey> {
        let mut ordered: Vec<&PsdSegment> = segments.iter().collect();
        ordered.sort_by(|a, b| a.center_freq_hz.total_cmp(&b.center_freq_hz));

        let mut floors = Vec::with_capacity(ordered.len());
        for segment in ordered {
            match self.detect(&segment.power) {
                Ok(estimate) => floors.push(SegmentNoiseFloor {
                    center_freq_hz: segment.center_freq_hz,
                    estimate,
                }),
                Err(e) => {
                    warn!(center_freq_hz = segment.center_freq_hz, error = %e, "noise floor skipped");
                }
            }
        }

        ensure!(!floors.is_empty(), NoUsableSegmentsSnafu);

        let mut min = floors[0];
        let mut max = floors[0];
        let mut sum = 0.0;
        for f in &floors {
            let level = f.estimate.center_power_db;
            sum += level;
            if level < min.estimate.center_power_db {
                min = *f;
            }
            if level > max.estimate.center_power_db {
                max = *f;
            }
        }

        Ok(NoiseFloorSurvey {
            mean_db: sum / floors.len() as f64,
            min_db: min.estimate.center_power_db,
            max_db: max.estimate.center_power_db,
            min_center_freq_hz: min.center_freq_hz,
            max_center_freq_hz: max.center_freq_hz,
            segments: floors,
        })
    }
}
