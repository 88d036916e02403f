//! Not-a-knot cubic interpolating splines.
//!
//! Only the knot second derivatives are needed for ladder scoring. They are a
//! linear function of the ordinates, so the map is assembled once per set of
//! abscissae and applied to each candidate as a matrix-vector product.

use crate::error::{CefragError, Result};
use nalgebra::{DMatrix, DVector};

/// Linear map from spline ordinates to the second derivative at each knot.
#[derive(Debug, Clone)]
pub struct CurvatureOperator {
    knots: Vec<f64>,
    matrix: DMatrix<f64>,
}

impl CurvatureOperator {
    /// Build the operator for strictly increasing abscissae.
    pub fn new(knots: &[f64]) -> Result<Self> {
        if knots.windows(2).any(|w| w[1] <= w[0] || !w[0].is_finite()) {
            return Err(CefragError::InvalidInput(
                "spline knots must be finite and strictly increasing".to_string(),
            ));
        }

        let n = knots.len();
        let matrix = match n {
            0..=2 => DMatrix::zeros(n, n),
            3 => Self::parabola(knots),
            _ => Self::not_a_knot(knots)?,
        };

        Ok(Self {
            knots: knots.to_vec(),
            matrix,
        })
    }

    /// Three knots: the not-a-knot spline is the interpolating parabola.
    fn parabola(x: &[f64]) -> DMatrix<f64> {
        let (h0, h1) = (x[1] - x[0], x[2] - x[1]);
        let row = [
            2.0 / (h0 * (h0 + h1)),
            -2.0 / (h0 * h1),
            2.0 / (h1 * (h0 + h1)),
        ];
        DMatrix::from_fn(3, 3, |_, j| row[j])
    }

    fn not_a_knot(x: &[f64]) -> Result<DMatrix<f64>> {
        let n = x.len();
        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();

        // A * M = B * y
        let mut a = DMatrix::zeros(n, n);
        let mut b = DMatrix::zeros(n, n);

        // Continuous third derivative at x[1] and x[n-2]
        a[(0, 0)] = h[1];
        a[(0, 1)] = -(h[0] + h[1]);
        a[(0, 2)] = h[0];
        a[(n - 1, n - 3)] = h[n - 2];
        a[(n - 1, n - 2)] = -(h[n - 3] + h[n - 2]);
        a[(n - 1, n - 1)] = h[n - 3];

        for i in 1..n - 1 {
            a[(i, i - 1)] = h[i - 1];
            a[(i, i)] = 2.0 * (h[i - 1] + h[i]);
            a[(i, i + 1)] = h[i];

            b[(i, i - 1)] = 6.0 / h[i - 1];
            b[(i, i)] = -6.0 / h[i - 1] - 6.0 / h[i];
            b[(i, i + 1)] = 6.0 / h[i];
        }

        a.lu().solve(&b).ok_or_else(|| {
            CefragError::LinearAlgebraError("singular not-a-knot spline system".to_string())
        })
    }

    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// Second derivative of the interpolating spline at every knot.
    pub fn second_derivatives(&self, ordinates: &[f64]) -> Result<Vec<f64>> {
        if ordinates.len() != self.knots.len() {
            return Err(CefragError::DimensionMismatch(format!(
                "Expected {} ordinates, got {}",
                self.knots.len(),
                ordinates.len()
            )));
        }
        let y = DVector::from_column_slice(ordinates);
        Ok((&self.matrix * y).iter().copied().collect())
    }

    /// Largest absolute second derivative over the knots.
    pub fn max_abs_curvature(&self, ordinates: &[f64]) -> Result<f64> {
        Ok(self
            .second_derivatives(ordinates)?
            .into_iter()
            .fold(0.0, |acc, m| acc.max(m.abs())))
    }
}
