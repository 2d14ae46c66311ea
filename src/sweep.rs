//! Frequency sweep planning and processing
//!
//! A sweep retunes the receiver across a wide band in fixed steps, takes one capture
//! per center frequency, estimates each capture's PSD and stitches the results.
//! Acquisition itself sits behind [`CaptureSource`]; retry policy belongs to the
//! caller.

use std::time::Duration;

use rayon::prelude::*;
use rustfft::num_complex::Complex64;
use snafu::ensure;
use tracing::{debug, info, instrument, warn};

use crate::error::{InvalidSweepPlanSnafu, NoUsableSegmentsSnafu, PsdError, Result};
use crate::stitch::{SpectrumStitcher, StitchConfig, StitchedSpectrum};
use crate::welch::{EstimatorConfig, PsdSegment, WelchEstimator};

/// Center frequencies of a sweep: `start, start + step, ...` strictly below `stop`
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPlan {
    start_hz: f64,
    stop_hz: f64,
    step_hz: f64,
}

impl SweepPlan {
    pub fn new(start_hz: f64, stop_hz: f64, step_hz: f64) -> Result<Self> {
        ensure!(
            start_hz.is_finite()
                && stop_hz.is_finite()
                && step_hz.is_finite()
                && step_hz > 0.0
                && stop_hz > start_hz,
            InvalidSweepPlanSnafu { start_hz, stop_hz, step_hz }
        );
        Ok(Self { start_hz, stop_hz, step_hz })
    }

    /// Center frequency of a span between two edges
    pub fn span_center(start_hz: f64, end_hz: f64) -> f64 {
        (start_hz + end_hz) / 2.0
    }

    pub fn step_hz(&self) -> f64 {
        self.step_hz
    }

    pub fn centers(&self) -> Vec<f64> {
        let mut centers = Vec::new();
        let mut k = 0usize;
        loop {
            let center = self.start_hz + k as f64 * self.step_hz;
            if center >= self.stop_hz {
                break;
            }
            centers.push(center);
            k += 1;
        }
        centers
    }

    pub fn len(&self) -> usize {
        self.centers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Acquisition collaborator: one tuned capture per request
///
/// Implementations return [`PsdError::CaptureFailed`] when the device or transport
/// does not deliver a buffer within `timeout`.
pub trait CaptureSource {
    fn capture(&mut self, center_freq_hz: f64, timeout: Duration) -> Result<Vec<Complex64>>;
}

/// One capture tagged with the frequency it was tuned to
#[derive(Debug, Clone)]
pub struct Capture {
    pub center_freq_hz: f64,
    pub samples: Vec<Complex64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    /// Estimator settings shared by every capture; the center frequency is replaced
    pub estimator: EstimatorConfig,
    pub stitch: StitchConfig,
    pub capture_timeout: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            estimator: EstimatorConfig::default(),
            stitch: StitchConfig::default(),
            capture_timeout: Duration::from_secs(5),
        }
    }
}

impl SweepConfig {
    pub fn new(estimator: EstimatorConfig, stitch: StitchConfig) -> Self {
        Self {
            estimator,
            stitch,
            ..Self::default()
        }
    }

    pub fn with_capture_timeout(mut self, timeout: Duration) -> Self {
        self.capture_timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FailedCapture {
    pub center_freq_hz: f64,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct SweepOutcome {
    pub spectrum: StitchedSpectrum,
    /// Per-capture PSDs in capture order
    pub segments: Vec<PsdSegment>,
    pub failed_captures: Vec<FailedCapture>,
}

#[derive(Debug, Clone)]
pub struct SweepProcessor {
    config: SweepConfig,
    stitcher: SpectrumStitcher,
}

impl SweepProcessor {
    pub fn new(config: SweepConfig) -> Result<Self> {
        config.estimator.validate()?;
        Ok(Self {
            stitcher: SpectrumStitcher::new(config.stitch.clone()),
            config,
        })
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Estimate the PSD of every capture in parallel
    ///
    /// Results keep the order of `captures`. The first estimation error aborts.
    pub fn estimate_all(&self, captures: &[Capture]) -> Result<Vec<PsdSegment>> {
        captures
            .par_iter()
            .map(|capture| {
                let config = self.config.estimator.clone().with_center_freq(capture.center_freq_hz);
                WelchEstimator::new(config)?.estimate(&capture.samples)
            })
            .collect()
    }

    /// Estimate and stitch a set of captures
    pub fn process(&self, captures: &[Capture]) -> Result<StitchedSpectrum> {
        let segments = self.estimate_all(captures)?;
        self.stitcher.stitch(&segments)
    }

    /// Capture every center of `plan` one at a time, then estimate and stitch
    ///
    /// A failed or empty capture is recorded in [`SweepOutcome::failed_captures`] and
    /// the sweep goes on. Fails with `NoUsableSegments` when nothing was captured.
    #[instrument(skip(self, source, plan), fields(centers = plan.len()))]
    pub fn acquire_and_process<S: CaptureSource>(&self, source: &mut S, plan: &SweepPlan) -> Result<SweepOutcome> {
        let mut captures = Vec::new();
        let mut failed_captures = Vec::new();

        for center_freq_hz in plan.centers() {
            match source.capture(center_freq_hz, self.config.capture_timeout) {
                Ok(samples) if samples.is_empty() => {
                    warn!(center_freq_hz, "capture returned no samples");
                    failed_captures.push(FailedCapture {
                        center_freq_hz,
                        reason: PsdError::EmptyBuffer.to_string(),
                    });
                }
                Ok(samples) => {
                    debug!(center_freq_hz, samples = samples.len(), "captured");
                    captures.push(Capture { center_freq_hz, samples });
                }
                Err(e) => {
                    warn!(center_freq_hz, error = %e, "capture failed");
                    failed_captures.push(FailedCapture {
                        center_freq_hz,
                        reason: e.to_string(),
                    });
                }
            }
        }

        ensure!(!captures.is_empty(), NoUsableSegmentsSnafu);

        let segments = self.estimate_all(&captures)?;
        let spectrum = self.stitcher.stitch(&segments)?;

        info!(
            captured = captures.len(),
            failed = failed_captures.len(),
            bins = spectrum.len(),
            "sweep processed"
        );

        Ok(SweepOutcome {
            spectrum,
            segments,
            failed_captures,
        })
    }
}
