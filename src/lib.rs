//! Wide-band RF spectrum estimation
//!
//! Welch PSD estimation of complex baseband captures, unit scaling, sweep stitching,
//! noise floor detection and cross-instrument comparison.

pub mod compare;
pub mod error;
pub mod iq;
pub mod noise_floor;
pub mod scale;
pub mod simulation;
pub mod spectrum;
pub mod stitch;
pub mod sweep;
pub mod tracing_init;
pub mod welch;
pub mod window;

pub use compare::{Alignment, ComparisonResult, CrossInstrumentComparator, ErrorSummary};
pub use error::{PsdError, Result};
pub use noise_floor::{NoiseFloorDetector, NoiseFloorEstimate, NoiseFloorSurvey};
pub use scale::{PowerScale, ScaleConverter};
pub use spectrum::Spectrum;
pub use stitch::{OverlapPolicy, SpectrumStitcher, StitchConfig, StitchWarning, StitchedSpectrum};
pub use sweep::{CaptureSource, SweepConfig, SweepOutcome, SweepPlan, SweepProcessor};
pub use welch::{Detrend, EstimatorConfig, PsdSegment, WelchEstimator};
pub use window::WindowKind;
