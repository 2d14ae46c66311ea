//! Error types shared by every stage of the PSD pipeline.

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PsdError {
    /// Requested resolution bandwidth is zero, negative or not finite
    #[snafu(display("resolution bandwidth must be positive, got {rbw_hz} Hz"))]
    InvalidRbw { rbw_hz: f64 },

    #[snafu(display("sample rate must be positive, got {sample_rate_hz} Hz"))]
    InvalidSampleRate { sample_rate_hz: f64 },

    #[snafu(display("overlap fraction must be in [0, 1), got {overlap}"))]
    InvalidOverlap { overlap: f64 },

    #[snafu(display("antenna impedance must be positive, got {ohms} ohm"))]
    InvalidImpedance { ohms: f64 },

    /// Sample buffer handed to the estimator has no samples
    #[snafu(display("sample buffer is empty"))]
    EmptyBuffer,

    /// Interleaved I/Q bytes must come in pairs
    #[snafu(display("interleaved I/Q buffer has odd length {len}"))]
    OddByteCount { len: usize },

    #[snafu(display("power vector is empty"))]
    EmptyPower,

    #[snafu(display("histogram bin width must be positive, got {bin_width_db} dB"))]
    InvalidBinWidth { bin_width_db: f64 },

    /// The data span would need more histogram bins than the detector allows
    #[snafu(display("bin width {bin_width_db} dB is too small for a {span_db} dB span ({bins} bins, max {max_bins})"))]
    BinWidthTooSmall { bin_width_db: f64, span_db: f64, bins: usize, max_bins: usize },

    /// Every histogram bin was empty (only non-finite samples)
    #[snafu(display("no histogram bin collected a finite sample"))]
    NoHistogramBin,

    #[snafu(display("frequency axis has {frequencies} points but power has {power}"))]
    LengthMismatch { frequencies: usize, power: usize },

    #[snafu(display("spectrum has no points"))]
    EmptySpectrum,

    /// Adjacent sweep segments share frequency bins
    #[snafu(display(
        "segments overlap: previous ends at {previous_end_hz} Hz, next starts at {next_start_hz} Hz"
    ))]
    OverlappingSegments { previous_end_hz: f64, next_start_hz: f64 },

    /// Every segment was skipped while stitching or surveying
    #[snafu(display("no segment produced usable data"))]
    NoUsableSegments,

    #[snafu(display("unknown window kind '{name}'"))]
    UnknownWindow { name: String },

    #[snafu(display("unknown power scale '{name}'"))]
    UnknownScale { name: String },

    #[snafu(display("invalid sweep plan: start {start_hz} Hz, stop {stop_hz} Hz, step {step_hz} Hz"))]
    InvalidSweepPlan { start_hz: f64, stop_hz: f64, step_hz: f64 },

    #[snafu(display("capture at {center_freq_hz} Hz failed: {reason}"))]
    CaptureFailed { center_freq_hz: f64, reason: String },
}

pub type Result<T, E = PsdError> = std::result::Result<T, E>;
