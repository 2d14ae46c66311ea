///! Window functions for Welch segment tapering
///!
///! Coefficients are periodic (DFT-even): the cosine terms use `2πn/N` rather than
///! `2πn/(N-1)`, which is the form spectral estimators expect.

use core::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::error::{PsdError, UnknownWindowSnafu};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowKind {
    Rectangular,
    Hann,
    #[default]
    Hamming,
    Blackman,
    /// Flat-top: widest main lobe, best amplitude accuracy
    FlatTop,
}

impl WindowKind {
    /// Generate `len` window coefficients
    pub fn coefficients(&self, len: usize) -> Vec<f64> {
        if len == 1 {
            return vec![1.0];
        }

        let n = len as f64;
        (0..len)
            .map(|i| {
                let x = 2.0 * PI * i as f64 / n;
                match self {
                    WindowKind::Rectangular => 1.0,
                    WindowKind::Hann => 0.5 - 0.5 * x.cos(),
                    WindowKind::Hamming => 0.54 - 0.46 * x.cos(),
                    WindowKind::Blackman => 0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos(),
                    WindowKind::FlatTop => {
                        0.21557895 - 0.41663158 * x.cos() + 0.277263158 * (2.0 * x).cos()
                            - 0.083578947 * (3.0 * x).cos()
                            + 0.006947368 * (4.0 * x).cos()
                    }
                }
            })
            .collect()
    }

    /// Equivalent noise bandwidth in bins: `N·Σw² / (Σw)²`
    pub fn enbw_bins(&self, len: usize) -> f64 {
        let w = self.coefficients(len);
        let sum: f64 = w.iter().sum();
        let sum_sq: f64 = w.iter().map(|c| c * c).sum();
        if sum == 0.0 {
            return 1.0;
        }
        len as f64 * sum_sq / (sum * sum)
    }

    /// Equivalent noise bandwidth in Hz for a segment of `len` samples at `sample_rate_hz`
    pub fn enbw_hz(&self, len: usize, sample_rate_hz: f64) -> f64 {
        self.enbw_bins(len) * sample_rate_hz / len as f64
    }
}

impl FromStr for WindowKind {
    type Err = PsdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rectangular" | "rect" | "boxcar" | "none" => Ok(WindowKind::Rectangular),
            "hann" | "hanning" => Ok(WindowKind::Hann),
            "hamming" => Ok(WindowKind::Hamming),
            "blackman" => Ok(WindowKind::Blackman),
            "flattop" | "flat-top" | "flat_top" => Ok(WindowKind::FlatTop),
            _ => UnknownWindowSnafu { name: s }.fail(),
        }
    }
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WindowKind::Rectangular => "rectangular",
            WindowKind::Hann => "hann",
            WindowKind::Hamming => "hamming",
            WindowKind::Blackman => "blackman",
            WindowKind::FlatTop => "flattop",
        };
        write!(f, "{}", name)
    }
}
