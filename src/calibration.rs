//! Time to basepair calibration.
//!
//! A spline regression maps assigned ladder peak times onto the reference
//! sizes. The model is refit with more knots until it assigns a distinct
//! basepair value to every non-negative point of the sample trace.

use crate::error::{CefragError, Result};
use crate::ladder::{LadderAssignment, LadderFamily};
use crate::spline::SplineRegression;
use crate::utils::stats::{mean_squared_error, r2_score};
use ndarray::ArrayView1;
use serde::Serialize;
use tracing::{debug, info};

/// Knot count of the first calibration attempt.
pub const INITIAL_KNOTS: usize = 2;

/// Number of knot counts tried before giving up.
pub const MAX_ATTEMPTS: usize = 10;

/// Spline degree and knot offset used for a ladder family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalibrationRecipe {
    pub degree: usize,
    /// Added to the escalating knot count.
    pub knot_offset: usize,
}

impl CalibrationRecipe {
    pub fn for_family(family: LadderFamily) -> Self {
        match family {
            LadderFamily::Rox => Self {
                degree: 4,
                knot_offset: 4,
            },
            LadderFamily::Liz | LadderFamily::Orange => Self {
                degree: 3,
                knot_offset: 0,
            },
        }
    }

    /// Base knots of the spline basis for an escalation step.
    pub fn basis_knots(&self, n_knots: usize) -> usize {
        n_knots + self.knot_offset
    }
}

/// One sample of the calibrated trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibratedPoint {
    pub time: usize,
    pub intensity: f64,
    pub basepairs: f64,
}

/// The sample trace labelled with basepairs, restricted to `basepairs >= 0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CalibratedTrace {
    points: Vec<CalibratedPoint>,
}

impl CalibratedTrace {
    fn label(model: &SplineRegression, trace: ArrayView1<f64>) -> Self {
        let points = trace
            .iter()
            .enumerate()
            .map(|(time, &intensity)| CalibratedPoint {
                time,
                intensity,
                basepairs: model.predict_one(time as f64),
            })
            .filter(|p| p.basepairs >= 0.0)
            .collect();
        Self { points }
    }

    /// Wrap already labelled points, in time order.
    pub fn from_points(points: Vec<CalibratedPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[CalibratedPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn basepairs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.basepairs).collect()
    }

    pub fn intensities(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.intensity).collect()
    }

    /// Whether no two points share a basepair value.
    pub fn is_injective(&self) -> bool {
        let mut values = self.basepairs();
        values.sort_by(f64::total_cmp);
        values.windows(2).all(|w| w[0] != w[1])
    }
}

/// A frozen time to basepair model.
#[derive(Debug, Clone)]
pub struct CalibrationModel {
    recipe: CalibrationRecipe,
    n_knots: usize,
    attempts: usize,
    regression: SplineRegression,
    mse: f64,
    r2: f64,
}

impl CalibrationModel {
    /// Fit the ladder and label the sample trace, escalating the knot count
    /// until the labelling is injective.
    pub fn calibrate(
        assignment: &LadderAssignment,
        recipe: CalibrationRecipe,
        trace: ArrayView1<f64>,
    ) -> Result<(Self, CalibratedTrace)> {
        Self::calibrate_with(assignment, recipe, trace, SplineRegression::fit)
    }

    /// [`calibrate`](Self::calibrate) with a custom regression step.
    ///
    /// `fit` receives the ladder times, the reference sizes, the basis knot
    /// count and the spline degree of each attempt.
    pub fn calibrate_with<F>(
        assignment: &LadderAssignment,
        recipe: CalibrationRecipe,
        trace: ArrayView1<f64>,
        fit: F,
    ) -> Result<(Self, CalibratedTrace)>
    where
        F: Fn(&[f64], &[f64], usize, usize) -> Result<SplineRegression>,
    {
        let times = assignment.times_f64();

        for attempt in 1..=MAX_ATTEMPTS {
            let n_knots = INITIAL_KNOTS + attempt - 1;
            let regression = fit(
                &times,
                &assignment.sizes,
                recipe.basis_knots(n_knots),
                recipe.degree,
            )?;
            let calibrated = CalibratedTrace::label(&regression, trace);

            if calibrated.is_injective() {
                let predicted = regression.predict(&times);
                let mse = mean_squared_error(&assignment.sizes, &predicted);
                let r2 = r2_score(&assignment.sizes, &predicted);
                info!(
                    degree = recipe.degree,
                    knots = recipe.basis_knots(n_knots),
                    attempts = attempt,
                    mse,
                    r2,
                    "ladder calibration accepted"
                );
                let model = Self {
                    recipe,
                    n_knots,
                    attempts: attempt,
                    regression,
                    mse,
                    r2,
                };
                return Ok((model, calibrated));
            }

            debug!(
                attempt,
                knots = recipe.basis_knots(n_knots),
                "calibrated basepairs not unique, adding a knot"
            );
        }

        Err(CefragError::ModelFitting(format!(
            "basepairs were not unique after {} knot counts",
            MAX_ATTEMPTS
        )))
    }

    /// Basepair value at an acquisition time.
    pub fn predict(&self, time: f64) -> f64 {
        self.regression.predict_one(time)
    }

    pub fn predict_many(&self, times: &[f64]) -> Vec<f64> {
        self.regression.predict(times)
    }

    pub fn recipe(&self) -> CalibrationRecipe {
        self.recipe
    }

    /// Escalation knot count of the accepted model (before the recipe offset).
    pub fn n_knots(&self) -> usize {
        self.n_knots
    }

    /// Number of fits performed, including the accepted one.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Mean squared error on the ladder points.
    pub fn mse(&self) -> f64 {
        self.mse
    }

    /// Coefficient of determination on the ladder points.
    pub fn r2(&self) -> f64 {
        self.r2
    }
}
