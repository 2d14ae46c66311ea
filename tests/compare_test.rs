//! Integration tests comparing spectra from two measurement paths

use rfsweep::simulation::{awgn, noise_power_for_density_dbm};
use rfsweep::{Alignment, CrossInstrumentComparator, EstimatorConfig, Spectrum, WelchEstimator};

use test_utils::{init_test_tracing, SAMPLE_RATE};

fn density_spectrum(rbw: f64, seed: u64) -> Spectrum {
    let samples = awgn(400_000, noise_power_for_density_dbm(-110.0, SAMPLE_RATE), seed);
    let psd = WelchEstimator::new(EstimatorConfig::new(2.4e9, SAMPLE_RATE, rbw))
        .unwrap()
        .estimate(&samples)
        .unwrap();
    Spectrum::new(psd.absolute_frequencies(), psd.power).unwrap()
}

#[test]
fn test_identical_spectra() {
    let s = density_spectrum(10e3, 1);
    let result = CrossInstrumentComparator::default().compare(&s, &s).unwrap();
    assert!(result.error.iter().all(|&e| e == 0.0));
    assert_eq!(result.summary.max_abs_db, 0.0);
}

#[test]
fn test_different_resolutions_agree() {
    init_test_tracing();
    // 2048-point reference against a 512-point candidate of the same noise field
    let reference = density_spectrum(10e3, 1);
    let candidate = density_spectrum(40e3, 2);
    assert_eq!(reference.len(), 2048);
    assert_eq!(candidate.len(), 512);

    let result = CrossInstrumentComparator::default().compare(&reference, &candidate).unwrap();
    assert_eq!(result.frequencies, reference.frequencies);
    assert_eq!(result.error.len(), 2048);

    // Densities are resolution independent; skip the DC bins removed by detrending
    let body: Vec<f64> = result
        .error
        .iter()
        .enumerate()
        .filter(|(i, _)| (*i as isize - 1024).abs() > 8)
        .map(|(_, &e)| e)
        .collect();
    let mean = body.iter().sum::<f64>() / body.len() as f64;
    assert!(mean.abs() < 0.5, "mean error {:.3} dB", mean);
}

#[test]
fn test_truncate_alignment() {
    let reference = Spectrum::new(vec![1e6, 2e6, 3e6, 4e6], vec![-80.0, -81.0, -82.0, -83.0]).unwrap();
    let candidate = Spectrum::new(vec![5e6, 6e6, 7e6], vec![-79.0, -81.0, -84.0]).unwrap();

    let result = CrossInstrumentComparator::new(Alignment::Truncate)
        .compare(&reference, &candidate)
        .unwrap();
    assert_eq!(result.error, vec![1.0, 0.0, -2.0]);
    assert_eq!(result.summary.max_abs_db, 2.0);
    assert_eq!(result.summary.max_abs_frequency_hz, 3e6);
}
