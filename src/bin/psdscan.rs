//! PSD of a single HackRF capture
//!
//! Reads an interleaved signed 8-bit I/Q file, estimates its Welch PSD and prints
//! it as CSV.
//!
//! **Usage**:
//! ```bash
//! cargo run --bin psdscan -- capture.cs8 100e6 20e6 10e3 dBm
//! ```
//!
//! **Output**:
//! `frequency_hz,power` rows on stdout, the detected noise floor on stderr.

use rfsweep::tracing_init::init_tracing;
use rfsweep::{iq, EstimatorConfig, NoiseFloorDetector, PowerScale, WelchEstimator};
use std::env;
use std::fs;
use std::io::{self, BufWriter, Write};

fn parse_hz(name: &str, value: &str) -> Result<f64, String> {
    value
        .parse::<f64>()
        .map_err(|e| format!("Invalid {} '{}': {}", name, value, e))
}

fn run(args: &[String]) -> Result<(), String> {
    let path = &args[1];
    let center_freq_hz = parse_hz("center frequency", &args[2])?;
    let sample_rate_hz = parse_hz("sample rate", &args[3])?;
    let rbw_hz = parse_hz("RBW", &args[4])?;
    let scale = match args.get(5) {
        Some(name) => name.parse::<PowerScale>().map_err(|e| e.to_string())?,
        None => PowerScale::default(),
    };

    let bytes = fs::read(path).map_err(|e| format!("Failed to read '{}': {}", path, e))?;
    let samples = iq::from_cs8(&bytes).map_err(|e| e.to_string())?;

    let config = EstimatorConfig::new(center_freq_hz, sample_rate_hz, rbw_hz).with_scale(scale);
    let estimator = WelchEstimator::new(config).map_err(|e| e.to_string())?;
    let psd = estimator.estimate(&samples).map_err(|e| e.to_string())?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let write_err = |e: io::Error| format!("Failed to write output: {}", e);
    writeln!(out, "frequency_hz,{}", psd.scale).map_err(write_err)?;
    for (f, p) in psd.absolute_frequencies().iter().zip(&psd.power) {
        writeln!(out, "{:.1},{:.4}", f, p).map_err(write_err)?;
    }
    out.flush().map_err(write_err)?;

    if psd.scale.is_decibel() {
        match NoiseFloorDetector::default().detect(&psd.power) {
            Ok(floor) => eprintln!(
                "Noise floor: {:.2} {} ({} of {} bins)",
                floor.center_power_db,
                psd.scale,
                floor.supporting_sample_count,
                psd.len()
            ),
            Err(e) => eprintln!("Noise floor not detected: {}", e),
        }
    }

    if psd.degraded {
        eprintln!(
            "Warning: capture shorter than one segment, RBW degraded to {:.1} Hz",
            psd.rbw_hz
        );
    }

    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 5 || args.len() > 6 {
        eprintln!(
            "Usage: {} <file.cs8> <center_hz> <sample_rate_hz> <rbw_hz> [scale]",
            args[0]
        );
        eprintln!();
        eprintln!("Scales: V2/Hz, W/Hz, dB, dBm (default), dBuV, dBmV, dBFS");
        std::process::exit(1);
    }

    init_tracing();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
