//! Calibration of a synthetic ROX run.

use crate::test_helpers::{ladder_times, sample_trace, size_standard, time_at};
use cefrag::calibration::{CalibrationModel, CalibrationRecipe, INITIAL_KNOTS};
use cefrag::ladder::{LadderAssigner, LadderFamily, LadderParameters};

fn calibrate() -> (CalibrationModel, cefrag::calibration::CalibratedTrace) {
    let assigner = LadderAssigner::new(LadderParameters::from_family(LadderFamily::Rox)).unwrap();
    let assignment = assigner.assign(size_standard().view()).unwrap();
    let trace = sample_trace(&[(200.0, 1000.0)]);
    CalibrationModel::calibrate(
        &assignment,
        CalibrationRecipe::for_family(LadderFamily::Rox),
        trace.view(),
    )
    .unwrap()
}

#[test]
fn test_model_recovers_sizes() {
    let (model, _) = calibrate();

    assert!(model.n_knots() >= INITIAL_KNOTS);
    assert!(model.attempts() <= 10);
    assert!(model.r2() > 0.9999);
    assert!(model.mse() < 0.5);

    for (&bp, &t) in LadderFamily::Rox.definition().sizes.iter().zip(&ladder_times()) {
        assert!((model.predict(t as f64) - bp).abs() < 1.0, "size {}", bp);
    }
    // Between rungs as well
    assert!((model.predict(time_at(222.0)) - 222.0).abs() < 1.0);
}

#[test]
fn test_calibrated_trace_is_injective_and_non_negative() {
    let (model, calibrated) = calibrate();

    assert!(calibrated.is_injective());
    assert!(calibrated.points().iter().all(|p| p.basepairs >= 0.0));
    for point in calibrated.points().iter().step_by(97) {
        assert_eq!(point.basepairs, model.predict(point.time as f64));
    }
    // Times before the size axis crosses zero are dropped
    assert!(calibrated.points()[0].time > 900);
}
