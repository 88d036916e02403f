//! Peak fits and quotients on synthetic runs.

use crate::test_helpers::{rox_config, rox_sample};
use approx::assert_relative_eq;
use cefrag::error::CefragError;
use cefrag::pipeline::Analyzer;
use cefrag::quantify::{QuantificationSettings, Quantifier};

#[test]
fn test_single_peak_quotient_is_zero() {
    let sample = rox_sample("single.fsa", &[(250.0, 1500.0)]);
    let analysis = Analyzer::new(&rox_config()).unwrap().analyze(&sample).unwrap();

    assert_eq!(analysis.quantified.len(), 1);
    let row = &analysis.quantified[0];
    assert_eq!(row.quotient, 0.0);
    assert_eq!(row.peak_number, 1);
    assert_eq!(row.peak_name, "Peak 1");
    assert_eq!(row.file_name, "single.fsa");
    assert!(row.r_value > 0.99);
    assert!((row.basepairs - 250.0).abs() < 0.6);
    assert_relative_eq!(row.peak_height, 1500.0, epsilon = 1e-9);
    assert_relative_eq!(row.fitted_peak_height, 1500.0, max_relative = 0.01);
    // Area of a unit-spaced Gaussian with height 1500 and sigma 3
    assert_relative_eq!(row.area, 1500.0 * 3.0 * 2.5066282746310002, max_relative = 0.01);
}

#[test]
fn test_two_peak_quotient() {
    let sample = rox_sample("pair.fsa", &[(200.0, 1000.0), (210.0, 500.0)]);
    let analysis = Analyzer::new(&rox_config()).unwrap().analyze(&sample).unwrap();

    assert_eq!(analysis.fits.len(), 1);
    let fit = &analysis.fits[0];
    assert_eq!(fit.peaks.len(), 2);
    assert_relative_eq!(fit.peaks[1].area / fit.peaks[0].area, 0.5, epsilon = 0.01);
    assert_relative_eq!(fit.quotient, 0.5, epsilon = 0.01);
    assert!(analysis.quantified.iter().all(|row| row.quotient == fit.quotient));
}

#[test]
fn test_cutoff_reverses_two_peak_quotient() {
    let sample = rox_sample("pair.fsa", &[(200.0, 1000.0), (210.0, 500.0)]);

    let mut below = rox_config();
    below.quantification.cutoff = Some(300.0);
    let flipped = Analyzer::new(&below).unwrap().analyze(&sample).unwrap();
    assert_relative_eq!(flipped.fits[0].quotient, 2.0, epsilon = 0.04);

    let mut above = rox_config();
    above.quantification.cutoff = Some(150.0);
    let kept = Analyzer::new(&above).unwrap().analyze(&sample).unwrap();
    assert_relative_eq!(kept.fits[0].quotient, 0.5, epsilon = 0.01);
}

#[test]
fn test_many_peak_quotient_uses_last_peak() {
    let sample = rox_sample(
        "four.fsa",
        &[(200.0, 400.0), (210.0, 800.0), (220.0, 600.0), (230.0, 2400.0)],
    );
    let analysis = Analyzer::new(&rox_config()).unwrap().analyze(&sample).unwrap();

    let fit = &analysis.fits[0];
    assert_eq!(fit.peaks.len(), 4);
    assert_relative_eq!(fit.quotient, 4.0, epsilon = 0.08);
    assert_eq!(analysis.quantified[3].peak_number, 4);
}

#[test]
fn test_each_peak_shape() {
    let sample = rox_sample("shapes.fsa", &[(200.0, 1000.0), (210.0, 500.0)]);
    for model in ["gauss", "voigt", "lorentzian"] {
        let mut config = rox_config();
        config.quantification.peak_model = model.to_string();
        let analysis = Analyzer::new(&config).unwrap().analyze(&sample).unwrap();

        let rows = &analysis.quantified;
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.model == model));
        assert!(rows.iter().all(|row| row.area > 0.0));
        // Same shape for both peaks, so the ratio survives a shape mismatch
        assert_relative_eq!(rows[0].quotient, 0.5, epsilon = 0.05);
    }
}

#[test]
fn test_assay_index_out_of_range() {
    let sample = rox_sample("pair.fsa", &[(200.0, 1000.0), (300.0, 800.0)]);
    let analysis = Analyzer::new(&rox_config()).unwrap().analyze_peaks(&sample).unwrap();
    let quantifier = Quantifier::new(QuantificationSettings::default());

    assert!(quantifier.fit_assay(&analysis.peaks, 1).is_ok());
    let err = quantifier.fit_assay(&analysis.peaks, 2).unwrap_err();
    assert!(matches!(err, CefragError::AssayIndexOutOfRange { index: 2, count: 2 }));
    assert!(!err.is_data_quality());
}
