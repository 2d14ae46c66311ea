//! Integration tests for Welch PSD estimation of full captures

use rfsweep::noise_floor::NoiseFloorDetector;
use rfsweep::simulation::{awgn, noise_power_for_density_dbm};
use rfsweep::{iq, EstimatorConfig, PowerScale, WelchEstimator, WindowKind};

use test_utils::{argmax, estimate_at, init_test_tracing, noisy_tone, noisy_tone_cs8, RBW, SAMPLE_RATE};

const CENTER: f64 = 100e6;

fn check_reference_geometry(num_samples: usize) {
    let samples = noisy_tone(num_samples, 1.25e6, 0.1, 1e-6, 3);
    let psd = estimate_at(CENTER, &samples);

    assert_eq!(psd.segment_len, 2048);
    assert_eq!(psd.power.len(), 2048);
    assert!(!psd.degraded);
    assert_eq!(psd.rbw_hz, SAMPLE_RATE / 2048.0);
    assert!(psd.rbw_hz <= RBW);

    let freqs = psd.frequencies.as_ref().expect("frequencies emitted");
    let df = SAMPLE_RATE / 2048.0;
    assert_eq!(freqs.len(), 2048);
    assert!((freqs[0] - (CENTER - SAMPLE_RATE / 2.0)).abs() < 1e-3);
    assert!((freqs[2047] - (CENTER + SAMPLE_RATE / 2.0 - df)).abs() < 1e-3);
    assert!((freqs[1024] - CENTER).abs() < 1e-3);
    assert!(psd.power.iter().all(|p| p.is_finite()));

    // 1.25 MHz is exactly 128 bins above DC
    assert_eq!(argmax(&psd.power), 1024 + 128);
}

#[test]
fn test_reference_geometry_short_capture() {
    init_test_tracing();
    check_reference_geometry(200_000);

    let psd = estimate_at(CENTER, &noisy_tone(200_000, 0.0, 0.0, 1e-6, 4));
    // (200000 - 1024) / 1024 full segments at 50% overlap
    assert_eq!(psd.segments_averaged, 194);
}

#[test]
#[ignore] // 20M samples, run with --ignored
fn test_reference_geometry_full_capture() {
    init_test_tracing();
    check_reference_geometry(20_000_000);
}

#[test]
fn test_noise_density_in_dbm() {
    init_test_tracing();
    let power = noise_power_for_density_dbm(-100.0, SAMPLE_RATE);
    let samples = awgn(400_000, power, 11);

    for window in [WindowKind::Hamming, WindowKind::Hann, WindowKind::Blackman] {
        let config = EstimatorConfig::new(CENTER, SAMPLE_RATE, RBW).with_window(window);
        let psd = WelchEstimator::new(config).unwrap().estimate(&samples).unwrap();

        let floor = NoiseFloorDetector::new(0.5).unwrap().detect(&psd.power).unwrap();
        assert!(
            (floor.center_power_db + 100.0).abs() < 1.0,
            "{} floor {:.2} dBm/Hz",
            window,
            floor.center_power_db
        );
    }
}

#[test]
fn test_cs8_capture_to_psd() {
    init_test_tracing();
    let bytes = noisy_tone_cs8(100_000, -2.5e6, 21);
    let samples = iq::from_cs8(&bytes).unwrap();
    assert_eq!(samples.len(), 100_000);

    for scale in [PowerScale::DecibelMilliwatt, PowerScale::DecibelFullScale, PowerScale::DecibelMicrovolt] {
        let config = EstimatorConfig::new(CENTER, SAMPLE_RATE, RBW).with_scale(scale);
        let psd = WelchEstimator::new(config).unwrap().estimate(&samples).unwrap();
        assert_eq!(psd.scale, scale);
        assert!(psd.power.iter().all(|p| p.is_finite()));
        // -2.5 MHz is 256 bins below DC
        assert_eq!(argmax(&psd.power), 1024 - 256, "{}", scale);
    }
}

#[test]
fn test_odd_cs8_rejected() {
    assert!(iq::from_cs8(&[1, 2, 3]).is_err());
}

#[test]
fn test_enbw_reported() {
    let psd = estimate_at(CENTER, &noisy_tone(10_000, 0.0, 0.0, 1e-6, 5));
    // Hamming ENBW is about 1.36 bins
    let bins = psd.enbw_hz() / psd.rbw_hz;
    assert!((bins - 1.363).abs() < 0.01, "enbw {} bins", bins);
}
