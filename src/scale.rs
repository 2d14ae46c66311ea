//! Power spectrum unit conversion
//!
//! Welch output is a raw density in V²/Hz referenced to the sample values. The
//! [`ScaleConverter`] turns it into the unit the caller asked for:
//!
//! | scale              | value                                  |
//! |--------------------|----------------------------------------|
//! | `VoltageDensity`   | `Pxx` (V²/Hz)                          |
//! | `LinearDensity`    | `Pxx / R` when an impedance is given   |
//! | `DecibelDensity`   | `10·log10(P + ε)`                      |
//! | `DecibelMilliwatt` | `10·log10(Pxx/R · 1000 + ε)`           |
//! | `DecibelMicrovolt` | dBm + 107                              |
//! | `DecibelMillivolt` | dBm + 47                               |
//! | `DecibelFullScale` | `10·log10(Pxx_norm + ε)`               |
//!
//! Full-scale normalization of the samples happens in the estimator, before the
//! transform; here dBFS is a plain log against a 1.0 reference with no impedance
//! term.

use std::fmt;
use std::str::FromStr;

use crate::error::{PsdError, UnknownScaleSnafu};

/// Guard added before every logarithm
pub const EPSILON: f64 = 1e-20;

/// Value substituted for non-finite decibel results: `10·log10(ε)`
pub const DB_FLOOR: f64 = -200.0;

/// Impedance assumed for dBm when the configuration carries none
pub const DEFAULT_IMPEDANCE_OHMS: f64 = 50.0;

const DBM_TO_DBUV: f64 = 107.0;
const DBM_TO_DBMV: f64 = 47.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PowerScale {
    /// V²/Hz, never impedance corrected
    VoltageDensity,
    /// W/Hz when an impedance is configured, V²/Hz otherwise
    LinearDensity,
    DecibelDensity,
    #[default]
    DecibelMilliwatt,
    DecibelMicrovolt,
    DecibelMillivolt,
    DecibelFullScale,
}

impl PowerScale {
    pub fn is_decibel(&self) -> bool {
        !matches!(self, PowerScale::VoltageDensity | PowerScale::LinearDensity)
    }

    /// Replacement for NaN/Inf in this scale
    pub fn floor_value(&self) -> f64 {
        if self.is_decibel() {
            DB_FLOOR
        } else {
            0.0
        }
    }
}

impl FromStr for PowerScale {
    type Err = PsdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v2/hz" | "v^2/hz" => Ok(PowerScale::VoltageDensity),
            "w/hz" | "linear" => Ok(PowerScale::LinearDensity),
            "db" | "db/hz" => Ok(PowerScale::DecibelDensity),
            "dbm" | "dbm/hz" => Ok(PowerScale::DecibelMilliwatt),
            "dbuv" => Ok(PowerScale::DecibelMicrovolt),
            "dbmv" => Ok(PowerScale::DecibelMillivolt),
            "dbfs" => Ok(PowerScale::DecibelFullScale),
            _ => UnknownScaleSnafu { name: s }.fail(),
        }
    }
}

impl fmt::Display for PowerScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PowerScale::VoltageDensity => "V2/Hz",
            PowerScale::LinearDensity => "W/Hz",
            PowerScale::DecibelDensity => "dB",
            PowerScale::DecibelMilliwatt => "dBm",
            PowerScale::DecibelMicrovolt => "dBuV",
            PowerScale::DecibelMillivolt => "dBmV",
            PowerScale::DecibelFullScale => "dBFS",
        };
        write!(f, "{}", name)
    }
}

/// `10·log10(x + ε)`
pub fn to_db(linear: f64) -> f64 {
    10.0 * (linear + EPSILON).log10()
}

/// Inverse of [`to_db`], ignoring the ε floor
pub fn from_db(db: f64) -> f64 {
    10.0f64.powf(db / 10.0)
}

/// Convert a per-Hz decibel density into power within one RBW (DANL form)
pub fn rbw_adjusted(power_db: &[f64], rbw_hz: f64) -> Vec<f64> {
    let offset = 10.0 * rbw_hz.log10();
    power_db.iter().map(|p| p + offset).collect()
}

/// Replace NaN/Inf with the floor value of `scale`
pub fn sanitize(values: &mut [f64], scale: PowerScale) -> usize {
    let floor = scale.floor_value();
    let mut replaced = 0;
    for v in values.iter_mut().filter(|v| !v.is_finite()) {
        *v = floor;
        replaced += 1;
    }
    replaced
}

/// Converts raw Welch densities into physical units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleConverter {
    impedance_ohms: Option<f64>,
}

impl ScaleConverter {
    /// `impedance_ohms` toggles impedance correction for the linear scale
    pub fn new(impedance_ohms: Option<f64>) -> Self {
        Self { impedance_ohms }
    }

    pub fn impedance_ohms(&self) -> Option<f64> {
        self.impedance_ohms
    }

    /// Convert a raw V²/Hz density into `scale`
    ///
    /// For [`PowerScale::DecibelFullScale`] the input must already be the density of
    /// full-scale normalized samples. The output never contains NaN or Inf.
    pub fn convert(&self, raw: &[f64], scale: PowerScale) -> Vec<f64> {
        let mut out: Vec<f64> = match scale {
            PowerScale::VoltageDensity => raw.to_vec(),
            PowerScale::LinearDensity => raw.iter().map(|&p| self.corrected(p)).collect(),
            PowerScale::DecibelDensity => raw.iter().map(|&p| to_db(self.corrected(p))).collect(),
            PowerScale::DecibelMilliwatt => raw.iter().map(|&p| self.dbm(p)).collect(),
            PowerScale::DecibelMicrovolt => raw.iter().map(|&p| self.dbm(p) + DBM_TO_DBUV).collect(),
            PowerScale::DecibelMillivolt => raw.iter().map(|&p| self.dbm(p) + DBM_TO_DBMV).collect(),
            PowerScale::DecibelFullScale => raw.iter().map(|&p| to_db(p)).collect(),
        };

        sanitize(&mut out, scale);
        out
    }

    fn corrected(&self, p: f64) -> f64 {
        match self.impedance_ohms {
            Some(r) => p / r,
            None => p,
        }
    }

    fn dbm(&self, p: f64) -> f64 {
        let watts = p / self.impedance_ohms.unwrap_or(DEFAULT_IMPEDANCE_OHMS);
        to_db(watts * 1000.0)
    }
}
