//! Wide-band spectrum assembly
//!
//! Joins per-capture PSDs from a frequency sweep into one continuous spectrum.
//!
//! **Per segment**:
//! 1. Drop `trim_bins` from both ends (anti-alias filter roll-off).
//! 2. Repair the zero-IF DC spike at the center bin by copying in the bins one DC
//!    width further out on each side, which keeps the local noise statistics.
//! 3. Place the bins on the absolute frequency axis.
//!
//! Segments are concatenated in ascending center frequency without averaging. Short
//! segments are skipped or left uncleaned with a [`StitchWarning`]; overlapping
//! segments are rejected unless [`OverlapPolicy::Allow`] is set.

use snafu::ensure;
use tracing::{debug, instrument, warn};

use crate::error::{LengthMismatchSnafu, NoUsableSegmentsSnafu, OverlappingSegmentsSnafu, Result};
use crate::scale;
use crate::spectrum::Spectrum;
use crate::welch::PsdSegment;

/// What to do when a segment starts at or below the previous segment's last bin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Fail the stitch with `OverlappingSegments`
    #[default]
    Reject,
    /// Concatenate anyway; the axis stops being monotonic
    Allow,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StitchConfig {
    /// Bins discarded from each end of every segment
    pub trim_bins: usize,
    /// Half-width of the DC spike repair; 0 disables it
    pub dc_half_width: usize,
    pub overlap_policy: OverlapPolicy,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            trim_bins: 3,
            dc_half_width: 10,
            overlap_policy: OverlapPolicy::Reject,
        }
    }
}

impl StitchConfig {
    pub fn new(trim_bins: usize, dc_half_width: usize) -> Self {
        Self {
            trim_bins,
            dc_half_width,
            ..Self::default()
        }
    }

    pub fn with_overlap_policy(mut self, policy: OverlapPolicy) -> Self {
        self.overlap_policy = policy;
        self
    }
}

/// Degraded-but-continuing conditions met while stitching
#[derive(Debug, Clone, PartialEq)]
pub enum StitchWarning {
    /// Segment had too few bins to survive edge trimming and was dropped
    SegmentTooShort { center_freq_hz: f64, len: usize, trim_bins: usize },
    /// Segment was kept but its DC spike could not be repaired
    DcNotRemoved { center_freq_hz: f64, len: usize, dc_half_width: usize },
    /// Segment overlapped its predecessor and was concatenated anyway
    Overlap { previous_end_hz: f64, next_start_hz: f64 },
    /// NaN/Inf bins were replaced by the scale's floor value
    NonFiniteClamped { center_freq_hz: f64, count: usize },
}

/// Assembled wide-band spectrum plus everything that went wrong on the way
#[derive(Debug, Clone, PartialEq)]
pub struct StitchedSpectrum {
    pub frequencies: Vec<f64>,
    pub power: Vec<f64>,
    pub warnings: Vec<StitchWarning>,
    /// Number of input segments that contributed bins
    pub segments_used: usize,
}

impl StitchedSpectrum {
    pub fn len(&self) -> usize {
        self.power.len()
    }

    pub fn is_empty(&self) -> bool {
        self.power.is_empty()
    }

    pub fn into_spectrum(self) -> Spectrum {
        Spectrum {
            frequencies: self.frequencies,
            power: self.power,
        }
    }
}

/// Drop `trim` bins from both ends; `None` when fewer than `2·trim + 1` bins exist
pub fn trim_edges(values: &[f64], trim: usize) -> Option<&[f64]> {
    if values.len() < 2 * trim + 1 {
        return None;
    }
    Some(&values[trim..values.len() - trim])
}

/// Replace the DC spike around the center bin with mirrored neighbours
///
/// With `c = len/2` and `n = n_dc`, bins `[c-n, c)` take the values of `[c-2n, c-n)` and
/// bins `[c, c+n)` take the values of `[c+n, c+2n)`. Returns `None` when either source
/// window is shorter than `n`, leaving the caller to keep the segment as it was.
pub fn remove_dc_spike(power: &[f64], n_dc: usize) -> Option<Vec<f64>> {
    let len = power.len();
    let center = len / 2;

    if n_dc == 0 {
        return Some(power.to_vec());
    }
    if center < 2 * n_dc || center + 2 * n_dc > len {
        return None;
    }

    let mut cleaned = power.to_vec();
    cleaned[center - n_dc..center].copy_from_slice(&power[center - 2 * n_dc..center - n_dc]);
    cleaned[center..center + n_dc].copy_from_slice(&power[center + n_dc..center + 2 * n_dc]);
    Some(cleaned)
}

/// Assembles sweep segments into a [`StitchedSpectrum`]
#[derive(Debug, Clone, Default)]
pub struct SpectrumStitcher {
    config: StitchConfig,
}

impl SpectrumStitcher {
    pub fn new(config: StitchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StitchConfig {
        &self.config
    }

    /// Trim, clean and concatenate `segments` in ascending center frequency
    ///
    /// # Returns
    /// The stitched spectrum, `NoUsableSegments` when every segment was skipped,
    /// `LengthMismatch` when a segment's axis and power differ in length, or
    /// `OverlappingSegments` under [`OverlapPolicy::Reject`].
    #[instrument(skip(self, segments), fields(segments = segments.len()))]
    pub fn stitch(&self, segments: &[PsdSegment]) -> Result<StitchedSpectrum> {
        let trim = self.config.trim_bins;
        let n_dc = self.config.dc_half_width;

        let mut ordered: Vec<&PsdSegment> = segments.iter().collect();
        ordered.sort_by(|a, b| a.center_freq_hz.total_cmp(&b.center_freq_hz));

        let mut frequencies = Vec::new();
        let mut power = Vec::new();
        let mut warnings = Vec::new();
        let mut segments_used = 0;

        for segment in ordered {
            let center_freq_hz = segment.center_freq_hz;
            let axis = segment.absolute_frequencies();
            ensure!(
                axis.len() == segment.power.len(),
                LengthMismatchSnafu { frequencies: axis.len(), power: segment.power.len() }
            );

            let (Some(seg_freqs), Some(seg_power)) =
                (trim_edges(&axis, trim), trim_edges(&segment.power, trim))
            else {
                warn!(center_freq_hz, len = segment.len(), trim, "segment too short to trim, skipping");
                warnings.push(StitchWarning::SegmentTooShort {
                    center_freq_hz,
                    len: segment.len(),
                    trim_bins: trim,
                });
                continue;
            };

            let mut cleaned = match remove_dc_spike(seg_power, n_dc) {
                Some(cleaned) => cleaned,
                None => {
                    warn!(center_freq_hz, len = seg_power.len(), n_dc, "segment too short for DC spike removal");
                    warnings.push(StitchWarning::DcNotRemoved {
                        center_freq_hz,
                        len: seg_power.len(),
                        dc_half_width: n_dc,
                    });
                    seg_power.to_vec()
                }
            };

            let clamped = scale::sanitize(&mut cleaned, segment.scale);
            if clamped > 0 {
                warn!(center_freq_hz, count = clamped, "non-finite bins clamped");
                warnings.push(StitchWarning::NonFiniteClamped { center_freq_hz, count: clamped });
            }

            if let (Some(&previous_end_hz), Some(&next_start_hz)) = (frequencies.last(), seg_freqs.first()) {
                if next_start_hz <= previous_end_hz {
                    match self.config.overlap_policy {
                        OverlapPolicy::Reject => {
                            return OverlappingSegmentsSnafu { previous_end_hz, next_start_hz }.fail();
                        }
                        OverlapPolicy::Allow => {
                            warn!(previous_end_hz, next_start_hz, "overlapping segments concatenated");
                            warnings.push(StitchWarning::Overlap { previous_end_hz, next_start_hz });
                        }
                    }
                }
            }

            frequencies.extend_from_slice(seg_freqs);
            power.extend(cleaned);
            segments_used += 1;
        }

        if segments_used == 0 {
            return NoUsableSegmentsSnafu.fail();
        }

        debug!(bins = power.len(), segments_used, warnings = warnings.len(), "stitch complete");

        Ok(StitchedSpectrum {
            frequencies,
            power,
            warnings,
            segments_used,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::PowerScale;

    fn ramp(len: usize) -> Vec<f64> {
        (0..len).map(|i| i as f64).collect()
    }

    #[test]
    fn test_trim_edges() {
        let v = ramp(10);
        assert_eq!(trim_edges(&v, 3), Some(&v[3..7]));
        assert_eq!(trim_edges(&ramp(7), 3).map(|s| s.len()), Some(1));
        assert_eq!(trim_edges(&ramp(6), 3), None);
        assert_eq!(trim_edges(&v, 0), Some(&v[..]));
    }

    #[test]
    fn test_remove_dc_spike_mirrors_neighbours() {
        let mut p = vec![-100.0; 40];
        for (i, v) in p.iter_mut().enumerate() {
            *v = -100.0 + i as f64 * 0.01;
        }
        p[20] = 0.0; // spike at center
        p[19] = -20.0;
        let cleaned = remove_dc_spike(&p, 4).unwrap();

        // [16, 20) <- [12, 16), [20, 24) <- [24, 28)
        assert_eq!(&cleaned[16..20], &p[12..16]);
        assert_eq!(&cleaned[20..24], &p[24..28]);
        assert_eq!(&cleaned[..16], &p[..16]);
        assert_eq!(&cleaned[24..], &p[24..]);
        assert!(cleaned.iter().all(|&v| v < -99.0));
    }

    #[test]
    fn test_remove_dc_spike_idempotent() {
        let p: Vec<f64> = (0..64).map(|i| ((i * 37) % 11) as f64 - 90.0).collect();
        let once = remove_dc_spike(&p, 10).unwrap();
        let twice = remove_dc_spike(&once, 10).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_remove_dc_spike_too_short() {
        assert!(remove_dc_spike(&ramp(39), 10).is_none());
        assert!(remove_dc_spike(&ramp(40), 10).is_some());
        assert_eq!(remove_dc_spike(&ramp(3), 0), Some(ramp(3)));
    }

    #[test]
    fn test_short_segment_skipped_with_warning() {
        crate::tracing_init::init_test_tracing();
        let good = PsdSegment::from_power(vec![-90.0; 64], 1e6, 64e3, PowerScale::DecibelMilliwatt);
        let short = PsdSegment::from_power(vec![-90.0; 5], 2e6, 5e3, PowerScale::DecibelMilliwatt);

        let stitched = SpectrumStitcher::new(StitchConfig::new(3, 4)).stitch(&[short, good]).unwrap();
        assert_eq!(stitched.segments_used, 1);
        assert_eq!(stitched.len(), 58);
        assert!(matches!(
            stitched.warnings[0],
            StitchWarning::SegmentTooShort { len: 5, .. }
        ));
    }

    #[test]
    fn test_dc_skip_keeps_segment() {
        let seg = PsdSegment::from_power(vec![-90.0; 20], 1e6, 20e3, PowerScale::DecibelMilliwatt);
        let stitched = SpectrumStitcher::new(StitchConfig::new(1, 10)).stitch(&[seg]).unwrap();
        assert_eq!(stitched.len(), 18);
        assert!(matches!(stitched.warnings[0], StitchWarning::DcNotRemoved { .. }));
    }

    #[test]
    fn test_all_segments_skipped_is_error() {
        let seg = PsdSegment::from_power(vec![-90.0; 4], 1e6, 4e3, PowerScale::DecibelMilliwatt);
        let result = SpectrumStitcher::default().stitch(&[seg]);
        assert!(matches!(result, Err(crate::PsdError::NoUsableSegments)));
        assert!(matches!(
            SpectrumStitcher::default().stitch(&[]),
            Err(crate::PsdError::NoUsableSegments)
        ));
    }

    #[test]
    fn test_orders_by_center_frequency() {
        let hi = PsdSegment::from_power(vec![-50.0; 32], 3e6, 1e6, PowerScale::DecibelMilliwatt);
        let lo = PsdSegment::from_power(vec![-60.0; 32], 2e6, 1e6, PowerScale::DecibelMilliwatt);

        let stitched = SpectrumStitcher::new(StitchConfig::new(0, 0)).stitch(&[hi, lo]).unwrap();
        assert_eq!(stitched.power[0], -60.0);
        assert_eq!(stitched.power[63], -50.0);
        assert!(stitched.frequencies.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_overlap_rejected_or_allowed() {
        let a = PsdSegment::from_power(vec![-60.0; 32], 2.0e6, 1e6, PowerScale::DecibelMilliwatt);
        let b = PsdSegment::from_power(vec![-60.0; 32], 2.5e6, 1e6, PowerScale::DecibelMilliwatt);

        let rejected = SpectrumStitcher::new(StitchConfig::new(0, 0)).stitch(&[a.clone(), b.clone()]);
        assert!(matches!(rejected, Err(crate::PsdError::OverlappingSegments { .. })));

        let allowed = SpectrumStitcher::new(StitchConfig::new(0, 0).with_overlap_policy(OverlapPolicy::Allow))
            .stitch(&[a, b])
            .unwrap();
        assert_eq!(allowed.len(), 64);
        assert!(matches!(allowed.warnings[0], StitchWarning::Overlap { .. }));
    }

    #[test]
    fn test_non_finite_clamped() {
        let mut power = vec![-80.0; 32];
        power[2] = f64::NAN;
        power[30] = f64::NEG_INFINITY;
        let seg = PsdSegment::from_power(power, 1e6, 1e6, PowerScale::DecibelMilliwatt);

        let stitched = SpectrumStitcher::new(StitchConfig::new(0, 0)).stitch(&[seg]).unwrap();
        assert!(stitched.power.iter().all(|p| p.is_finite()));
        assert_eq!(stitched.power[2], crate::scale::DB_FLOOR);
        assert!(matches!(
            stitched.warnings[0],
            StitchWarning::NonFiniteClamped { count: 2, .. }
        ));
    }

    #[test]
    fn test_axis_and_power_length_must_match() {
        let mut seg = PsdSegment::from_power(vec![-70.0; 64], 1e6, 1e6, PowerScale::DecibelMilliwatt);
        seg.frequencies = Some((0..70).map(|i| 0.5e6 + i as f64 * 1e4).collect());

        let result = SpectrumStitcher::default().stitch(&[seg]);
        assert!(matches!(
            result,
            Err(crate::PsdError::LengthMismatch { frequencies: 70, power: 64 })
        ));
    }
}
