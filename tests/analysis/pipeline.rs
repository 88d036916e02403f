//! Whole-sample and batch analysis.

use crate::test_helpers::{rox_config, rox_sample, sample_trace, with_noise};
use cefrag::error::CefragError;
use cefrag::pipeline::{analyze, analyze_batch, analyze_peaks, Sample};
use ndarray::Array1;

#[test]
fn test_analysis_is_deterministic() {
    let mut sample = rox_sample("noisy.fsa", &[(180.0, 1200.0), (188.0, 700.0), (320.0, 900.0)]);
    sample.trace = with_noise(&sample.trace, 8.0, 42);
    sample.size_standard = with_noise(&sample.size_standard, 5.0, 43);
    let config = rox_config();

    let first = analyze(&config, &sample).unwrap();
    let second = analyze(&config, &sample).unwrap();

    assert_eq!(first.peaks.assignment, second.peaks.assignment);
    assert_eq!(first.peaks.calibrated, second.peaks.calibrated);
    assert_eq!(first.peaks.peaks, second.peaks.peaks);
    assert_eq!(first.quantified, second.quantified);
    assert_eq!(first.quantified.len(), 3);
}

#[test]
fn test_no_peaks_short_circuits_quantification() {
    let sample = rox_sample("blank.fsa", &[]);
    let analysis = analyze(&rox_config(), &sample).unwrap();

    assert!(!analysis.found_peaks());
    assert!(analysis.fits.is_empty());
    assert!(analysis.quantified.is_empty());

    let (mse, r2) = analysis.peaks.calibration_fit();
    assert!(mse < 0.5);
    assert!(r2 > 0.9999);
}

#[test]
fn test_peaks_only_analysis() {
    let sample = rox_sample("peaks.fsa", &[(150.0, 900.0), (400.0, 1100.0)]);
    let analysis = analyze_peaks(&rox_config(), &sample).unwrap();

    let rows = analysis.assigned_peaks();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].assay_number, 1);
    assert_eq!(rows[1].assay_number, 2);
    assert!(rows.iter().all(|row| row.peak_name == "1"));
}

#[test]
fn test_batch_isolates_failing_sample() {
    let good = rox_sample("good.fsa", &[(200.0, 1000.0), (210.0, 500.0)]);
    let bad = Sample::new(
        "bad.fsa",
        Array1::zeros(good.trace.len()),
        sample_trace(&[(200.0, 1000.0)]),
    );

    let results = analyze_batch(&rox_config(), &[good.clone(), bad, good]).unwrap();

    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(CefragError::NoCombination(_))));
    let first = results[0].as_ref().unwrap();
    let third = results[2].as_ref().unwrap();
    assert_eq!(first.quantified[0].file_name, "good.fsa");
    assert_eq!(first.quantified, third.quantified);
}

#[test]
fn test_unknown_ladder_is_configuration_error() {
    let sample = rox_sample("any.fsa", &[]);
    let mut config = rox_config();
    config.ladder = "GS1200".to_string();
    let err = analyze(&config, &sample).unwrap_err();
    assert!(matches!(err, CefragError::LadderNotFound(_)));
    assert!(!err.is_data_quality());
}
