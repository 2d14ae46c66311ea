//! Welch power spectral density estimation
//!
//! Turns one complex baseband capture into a scaled, center-shifted PSD.
//!
//! **Algorithm**:
//! 1. Segment length `N = next_pow2(ceil(fs / rbw))`, so the achieved RBW `fs/N` never
//!    exceeds the requested one. Buffers shorter than `N` are processed as a single
//!    segment of their own length (degraded, no averaging).
//! 2. Split into segments overlapping by `round(N · overlap)` samples, optionally remove
//!    each segment's mean, apply the window, FFT, accumulate `|X|²`.
//! 3. Average, scale to a density (`1 / (fs · Σw²)`), FFT-shift so DC lands at `N/2`.
//! 4. Hand the raw density to the [`ScaleConverter`].
//!
//! For dBFS the samples are first normalized to full scale on a private copy.

use rustfft::num_complex::Complex64;
use rustfft::FftPlanner;
use snafu::{ensure, OptionExt};
use tracing::{debug, instrument, warn};

use crate::error::{
    EmptyBufferSnafu, InvalidImpedanceSnafu, InvalidOverlapSnafu, InvalidRbwSnafu,
    InvalidSampleRateSnafu, Result,
};
use crate::iq::normalize_full_scale;
use crate::scale::{PowerScale, ScaleConverter};
use crate::window::WindowKind;

/// Per-segment trend removal applied before windowing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Detrend {
    None,
    /// Subtract the segment's complex mean
    #[default]
    Constant,
}

/// Configuration for the Welch estimator
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorConfig {
    /// RF center frequency of the capture (Hz)
    pub center_freq_hz: f64,
    /// Complex sample rate (Hz)
    pub sample_rate_hz: f64,
    /// Requested resolution bandwidth (Hz)
    pub rbw_hz: f64,
    pub window: WindowKind,
    /// Fractional segment overlap in [0, 1)
    pub overlap: f64,
    pub detrend: Detrend,
    /// Antenna impedance; `Some` enables impedance correction
    pub impedance_ohms: Option<f64>,
    pub scale: PowerScale,
    /// Emit the absolute frequency axis alongside the power
    pub emit_frequencies: bool,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            center_freq_hz: 0.0,
            sample_rate_hz: 20e6,
            rbw_hz: 10e3,
            window: WindowKind::Hamming,
            overlap: 0.5,
            detrend: Detrend::Constant,
            impedance_ohms: None,
            scale: PowerScale::DecibelMilliwatt,
            emit_frequencies: true,
        }
    }
}

impl EstimatorConfig {
    pub fn new(center_freq_hz: f64, sample_rate_hz: f64, rbw_hz: f64) -> Self {
        Self {
            center_freq_hz,
            sample_rate_hz,
            rbw_hz,
            ..Self::default()
        }
    }

    pub fn with_center_freq(mut self, center_freq_hz: f64) -> Self {
        self.center_freq_hz = center_freq_hz;
        self
    }

    pub fn with_window(mut self, window: WindowKind) -> Self {
        self.window = window;
        self
    }

    pub fn with_overlap(mut self, overlap: f64) -> Self {
        self.overlap = overlap;
        self
    }

    pub fn with_detrend(mut self, detrend: Detrend) -> Self {
        self.detrend = detrend;
        self
    }

    pub fn with_impedance(mut self, ohms: f64) -> Self {
        self.impedance_ohms = Some(ohms);
        self
    }

    pub fn with_scale(mut self, scale: PowerScale) -> Self {
        self.scale = scale;
        self
    }

    pub fn without_frequencies(mut self) -> Self {
        self.emit_frequencies = false;
        self
    }

    /// Reject configurations that cannot produce a PSD
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.rbw_hz.is_finite() && self.rbw_hz > 0.0,
            InvalidRbwSnafu { rbw_hz: self.rbw_hz }
        );
        ensure!(
            self.sample_rate_hz.is_finite() && self.sample_rate_hz > 0.0,
            InvalidSampleRateSnafu { sample_rate_hz: self.sample_rate_hz }
        );
        ensure!(
            (0.0..1.0).contains(&self.overlap),
            InvalidOverlapSnafu { overlap: self.overlap }
        );
        if let Some(ohms) = self.impedance_ohms {
            ensure!(ohms.is_finite() && ohms > 0.0, InvalidImpedanceSnafu { ohms });
        }
        ensure!(
            segment_length_for_rbw(self.sample_rate_hz, self.rbw_hz).is_some(),
            InvalidRbwSnafu { rbw_hz: self.rbw_hz }
        );
        Ok(())
    }
}

/// One estimated PSD for a single capture
#[derive(Debug, Clone, PartialEq)]
pub struct PsdSegment {
    /// Absolute frequency of each bin (Hz), present when requested
    pub frequencies: Option<Vec<f64>>,
    /// Power per bin in `scale`
    pub power: Vec<f64>,
    pub center_freq_hz: f64,
    /// Captured bandwidth, equal to the sample rate for complex input
    pub span_hz: f64,
    /// Achieved resolution bandwidth `fs / segment_len`
    pub rbw_hz: f64,
    pub segment_len: usize,
    pub segments_averaged: usize,
    pub window: WindowKind,
    pub scale: PowerScale,
    /// Single-segment fallback was used because the buffer was shorter than `segment_len`
    pub degraded: bool,
}

impl PsdSegment {
    /// Build a segment from an externally supplied PSD with no frequency axis
    ///
    /// The bins are assumed to cover `span_hz` around `center_freq_hz` in FFT-shifted order.
    pub fn from_power(power: Vec<f64>, center_freq_hz: f64, span_hz: f64, scale: PowerScale) -> Self {
        let segment_len = power.len();
        let rbw_hz = if segment_len > 0 { span_hz / segment_len as f64 } else { span_hz };
        Self {
            frequencies: None,
            power,
            center_freq_hz,
            span_hz,
            rbw_hz,
            segment_len,
            segments_averaged: 1,
            window: WindowKind::Rectangular,
            scale,
            degraded: false,
        }
    }

    pub fn len(&self) -> usize {
        self.power.len()
    }

    pub fn is_empty(&self) -> bool {
        self.power.is_empty()
    }

    /// Absolute frequency axis, derived from span and center when not stored
    pub fn absolute_frequencies(&self) -> Vec<f64> {
        match &self.frequencies {
            Some(f) => f.clone(),
            None => frequency_axis(self.power.len(), self.span_hz, self.center_freq_hz),
        }
    }

    /// Equivalent noise bandwidth of the estimate (Hz)
    pub fn enbw_hz(&self) -> f64 {
        self.window.enbw_hz(self.segment_len, self.span_hz)
    }
}

/// Largest segment length an RBW may ask for
pub const MAX_SEGMENT_LEN: usize = 1 << (usize::BITS - 1);

/// Smallest power of two `N` with `fs / N <= rbw`
///
/// Returns `None` when that power of two does not fit in `usize` or either input is
/// not a positive finite number.
pub fn segment_length_for_rbw(sample_rate_hz: f64, rbw_hz: f64) -> Option<usize> {
    let ideal = (sample_rate_hz / rbw_hz).ceil();
    if !ideal.is_finite() || ideal > MAX_SEGMENT_LEN as f64 || rbw_hz <= 0.0 || sample_rate_hz <= 0.0 {
        return None;
    }
    let ideal = if ideal < 1.0 { 1 } else { ideal as usize };
    ideal.checked_next_power_of_two()
}

/// FFT-shifted bin offsets (`fftshift(fftfreq(n, 1/fs))`)
pub fn shifted_fftfreq(n: usize, sample_rate_hz: f64) -> Vec<f64> {
    let df = sample_rate_hz / n as f64;
    let half = (n / 2) as f64;
    (0..n).map(|i| (i as f64 - half) * df).collect()
}

/// Absolute frequency axis for `n` shifted bins around `center_freq_hz`
pub fn frequency_axis(n: usize, sample_rate_hz: f64, center_freq_hz: f64) -> Vec<f64> {
    shifted_fftfreq(n, sample_rate_hz)
        .into_iter()
        .map(|f| f + center_freq_hz)
        .collect()
}

/// Move bin 0 to index `n/2`
pub fn fftshift<T>(data: &mut [T]) {
    let half = data.len() / 2;
    data.rotate_right(half);
}

/// Welch PSD estimator, configured once and reusable across captures
#[derive(Debug, Clone)]
pub struct WelchEstimator {
    config: EstimatorConfig,
    converter: ScaleConverter,
    segment_len: usize,
}

impl WelchEstimator {
    /// Validate the configuration and derive the segment length
    pub fn new(config: EstimatorConfig) -> Result<Self> {
        config.validate()?;

        let segment_len = segment_length_for_rbw(config.sample_rate_hz, config.rbw_hz)
            .context(InvalidRbwSnafu { rbw_hz: config.rbw_hz })?;
        debug!(
            segment_len,
            achieved_rbw_hz = config.sample_rate_hz / segment_len as f64,
            requested_rbw_hz = config.rbw_hz,
            "welch estimator configured"
        );

        Ok(Self {
            converter: ScaleConverter::new(config.impedance_ohms),
            config,
            segment_len,
        })
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Segment length used when the buffer is long enough
    pub fn segment_len(&self) -> usize {
        self.segment_len
    }

    /// Achieved resolution bandwidth for full-length buffers
    pub fn achieved_rbw_hz(&self) -> f64 {
        self.config.sample_rate_hz / self.segment_len as f64
    }

    /// Estimate the PSD of one capture
    ///
    /// # Arguments
    /// * `samples` - Complex baseband capture (not modified)
    ///
    /// # Returns
    /// A [`PsdSegment`] in the configured scale, or `EmptyBuffer` for an empty capture
    #[instrument(skip(self, samples), fields(samples = samples.len(), center_hz = self.config.center_freq_hz))]
    pub fn estimate(&self, samples: &[Complex64]) -> Result<PsdSegment> {
        ensure!(!samples.is_empty(), EmptyBufferSnafu);

        let mut nperseg = self.segment_len;
        let degraded = samples.len() < nperseg;
        if degraded {
            warn!(
                samples = samples.len(),
                wanted = nperseg,
                "buffer shorter than segment length, using a single unaveraged segment"
            );
            nperseg = samples.len();
        }

        let noverlap = ((nperseg as f64 * self.config.overlap).round() as usize).min(nperseg - 1);

        let (raw, segments_averaged) = if self.config.scale == PowerScale::DecibelFullScale {
            let normalized = normalize_full_scale(samples);
            self.averaged_periodogram(&normalized, nperseg, noverlap)
        } else {
            self.averaged_periodogram(samples, nperseg, noverlap)
        };

        let power = self.converter.convert(&raw, self.config.scale);

        let frequencies = if self.config.emit_frequencies {
            Some(frequency_axis(nperseg, self.config.sample_rate_hz, self.config.center_freq_hz))
        } else {
            None
        };

        debug!(nperseg, noverlap, segments_averaged, "psd estimated");

        Ok(PsdSegment {
            frequencies,
            power,
            center_freq_hz: self.config.center_freq_hz,
            span_hz: self.config.sample_rate_hz,
            rbw_hz: self.config.sample_rate_hz / nperseg as f64,
            segment_len: nperseg,
            segments_averaged,
            window: self.config.window,
            scale: self.config.scale,
            degraded,
        })
    }

    /// Averaged, density-scaled, shifted periodogram in V²/Hz
    ///
    /// Requires `samples.len() >= nperseg > noverlap`.
    fn averaged_periodogram(
        &self,
        samples: &[Complex64],
        nperseg: usize,
        noverlap: usize,
    ) -> (Vec<f64>, usize) {
        let window = self.config.window.coefficients(nperseg);
        let step = nperseg - noverlap;
        let n_segments = (samples.len() - noverlap) / step;

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(nperseg);

        let mut buffer = vec![Complex64::new(0.0, 0.0); nperseg];
        let mut acc = vec![0.0f64; nperseg];

        for k in 0..n_segments {
            let start = k * step;
            let segment = &samples[start..start + nperseg];

            let mean = match self.config.detrend {
                Detrend::Constant => segment.iter().sum::<Complex64>() / nperseg as f64,
                Detrend::None => Complex64::new(0.0, 0.0),
            };

            for ((b, &s), &w) in buffer.iter_mut().zip(segment).zip(&window) {
                *b = (s - mean) * w;
            }

            fft.process(&mut buffer);

            for (a, b) in acc.iter_mut().zip(&buffer) {
                *a += b.norm_sqr();
            }
        }

        let window_power: f64 = window.iter().map(|w| w * w).sum();
        let scale = 1.0 / (self.config.sample_rate_hz * window_power * n_segments as f64);
        for p in acc.iter_mut() {
            *p *= scale;
        }

        fftshift(&mut acc);
        (acc, n_segments)
    }
}
