//! Integration tests for noise floor detection on estimated spectra

use rfsweep::noise_floor::DEFAULT_BIN_WIDTH_DB;
use rfsweep::simulation::{add_into, awgn, gaussian_vector, noise_power_for_density_dbm, tone};
use rfsweep::{EstimatorConfig, NoiseFloorDetector, WelchEstimator};

use test_utils::{init_test_tracing, RBW, SAMPLE_RATE};

#[test]
fn test_synthetic_gaussian_floor() {
    let power = gaussian_vector(10_000, -90.0, 1.0, 99);
    let estimate = NoiseFloorDetector::default().detect(&power).unwrap();
    assert!((estimate.center_power_db + 90.0).abs() <= DEFAULT_BIN_WIDTH_DB / 2.0);
}

#[test]
fn test_floor_under_strong_signals() {
    init_test_tracing();
    let n = 200_000;
    let mut samples = awgn(n, noise_power_for_density_dbm(-120.0, SAMPLE_RATE), 12);
    // A handful of carriers 30-45 dB above the floor
    for (k, &offset) in [-7e6, -3.3e6, 0.4e6, 2.1e6, 6.8e6].iter().enumerate() {
        let amplitude = 1e-3 * (k + 1) as f64;
        add_into(&mut samples, &tone(n, offset, SAMPLE_RATE, amplitude, 0.0));
    }

    let psd = WelchEstimator::new(EstimatorConfig::new(433e6, SAMPLE_RATE, RBW))
        .unwrap()
        .estimate(&samples)
        .unwrap();

    let estimate = NoiseFloorDetector::new(1.0).unwrap().detect(&psd.power).unwrap();
    assert!(
        (estimate.center_power_db + 120.0).abs() < 1.5,
        "floor {:.2}",
        estimate.center_power_db
    );
}

#[test]
fn test_survey_across_sweep() {
    let levels = [(100e6, -110.0), (120e6, -100.0), (140e6, -105.0)];
    let segments: Vec<_> = levels
        .iter()
        .enumerate()
        .map(|(i, &(fc, density))| {
            let samples = awgn(60_000, noise_power_for_density_dbm(density, SAMPLE_RATE), i as u64);
            WelchEstimator::new(EstimatorConfig::new(fc, SAMPLE_RATE, RBW))
                .unwrap()
                .estimate(&samples)
                .unwrap()
        })
        .collect();

    let survey = NoiseFloorDetector::default().survey(&segments).unwrap();
    assert_eq!(survey.segments.len(), 3);
    assert_eq!(survey.min_center_freq_hz, 100e6);
    assert_eq!(survey.max_center_freq_hz, 120e6);
    assert!((survey.min_db + 110.0).abs() < 1.5);
    assert!((survey.max_db + 100.0).abs() < 1.5);
    assert!((survey.mean_db + 105.0).abs() < 1.5);
}
