//! Ladder assignment on a synthetic ROX size standard.

use crate::test_helpers::{ladder_times, size_standard, with_noise};
use cefrag::error::CefragError;
use cefrag::ladder::{LadderAssigner, LadderFamily, LadderParameters, ScoringMethod};
use ndarray::Array1;

fn rox_assigner(scoring: ScoringMethod) -> LadderAssigner {
    let mut params = LadderParameters::from_family(LadderFamily::Rox);
    params.scoring = scoring;
    LadderAssigner::new(params).unwrap()
}

#[test]
fn test_assignment_skips_artifacts() {
    let assigner = rox_assigner(ScoringMethod::SplineCurvature);
    let assignment = assigner.assign(size_standard().view()).unwrap();

    assert_eq!(assignment.times, ladder_times());
    assert_eq!(assignment.sizes, LadderFamily::Rox.definition().sizes.to_vec());
    assert!(assignment.candidates > 1);
}

#[test]
fn test_assignment_cardinality_and_order() {
    let assigner = rox_assigner(ScoringMethod::SplineCurvature);
    for seed in 0..3 {
        let trace = with_noise(&size_standard(), 5.0, seed);
        let assignment = assigner.assign(trace.view()).unwrap();
        assert_eq!(assignment.times.len(), 16);
        assert!(assignment.times.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn test_noisy_assignment_is_deterministic() {
    let assigner = rox_assigner(ScoringMethod::SplineCurvature);
    let trace = with_noise(&size_standard(), 5.0, 7);
    let first = assigner.assign(trace.view()).unwrap();
    let second = assigner.assign(trace.view()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.score.to_bits(), second.score.to_bits());
}

#[test]
fn test_detected_peaks_are_bounded() {
    let assigner = rox_assigner(ScoringMethod::SplineCurvature);
    let peaks = assigner.detect_peaks(size_standard().view());
    // 16 rungs and two artifacts, below the cap of 16 + 3
    assert_eq!(peaks.len(), 18);
    assert_eq!(peaks[0], 700);
}

#[test]
fn test_sparse_trace_has_no_combination() {
    let assigner = rox_assigner(ScoringMethod::SplineCurvature);
    let times = ladder_times();
    let mut trace = Array1::zeros(3600);
    for &t in &times[..5] {
        trace[t] = 1000.0;
    }
    let err = assigner.assign(trace.view()).unwrap_err();
    assert!(matches!(err, CefragError::NoCombination(_)));
}

#[test]
fn test_derivative_scoring_methods_agree_on_clean_ladder() {
    let trace = size_standard();
    let curvature = rox_assigner(ScoringMethod::SplineCurvature)
        .assign(trace.view())
        .unwrap();
    let first = rox_assigner(ScoringMethod::FirstDerivative)
        .assign(trace.view())
        .unwrap();
    assert_eq!(first.times, curvature.times);
}
