//! Uniform B-spline basis and spline regression.
//!
//! The basis uses `n_knots` equally spaced knots over the fitted range,
//! extended by `degree` knots of the same spacing on both sides. Outside the
//! fitted range each basis function continues the polynomial piece of the
//! nearest interval, so predictions extrapolate smoothly.

use crate::error::{CefragError, Result};
use nalgebra::{DMatrix, DVector};

/// A uniform-knot B-spline basis of a given degree.
#[derive(Debug, Clone, PartialEq)]
pub struct BSplineBasis {
    knots: Vec<f64>,
    degree: usize,
}

impl BSplineBasis {
    /// Basis over `[min, max]` with `n_knots` base knots.
    pub fn uniform(min: f64, max: f64, n_knots: usize, degree: usize) -> Result<Self> {
        if n_knots < 2 {
            return Err(CefragError::InvalidInput(format!(
                "a spline basis needs at least 2 knots, got {}",
                n_knots
            )));
        }
        if !(min.is_finite() && max.is_finite()) || max <= min {
            return Err(CefragError::InvalidInput(format!(
                "invalid spline range [{}, {}]",
                min, max
            )));
        }

        let spacing = (max - min) / (n_knots - 1) as f64;
        let first = min - degree as f64 * spacing;
        let count = n_knots + 2 * degree;
        let knots = (0..count).map(|i| first + i as f64 * spacing).collect();

        Ok(Self { knots, degree })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// Number of basis functions.
    pub fn n_splines(&self) -> usize {
        self.knots.len() - self.degree - 1
    }

    /// Values of every basis function at `x`.
    pub fn evaluate(&self, x: f64) -> Vec<f64> {
        let k = self.degree;
        let t = &self.knots;
        let n = self.n_splines();

        // Knot interval, clamped to the fitted range for extrapolation
        let mut l = k;
        while l + 1 < n && t[l + 1] <= x {
            l += 1;
        }

        // Cox-de Boor recursion for the k+1 functions supported on interval l
        let mut local = vec![0.0; k + 1];
        let mut left = vec![0.0; k + 1];
        let mut right = vec![0.0; k + 1];
        local[0] = 1.0;
        for j in 1..=k {
            left[j] = x - t[l + 1 - j];
            right[j] = t[l + j] - x;
            let mut saved = 0.0;
            for r in 0..j {
                let temp = local[r] / (right[r + 1] + left[j - r]);
                local[r] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }
            local[j] = saved;
        }

        let mut row = vec![0.0; n];
        for (offset, value) in local.into_iter().enumerate() {
            row[l - k + offset] = value;
        }
        row
    }

    /// Design matrix with one row per sample.
    pub fn design_matrix(&self, xs: &[f64]) -> DMatrix<f64> {
        let mut matrix = DMatrix::zeros(xs.len(), self.n_splines());
        for (i, &x) in xs.iter().enumerate() {
            for (j, value) in self.evaluate(x).into_iter().enumerate() {
                matrix[(i, j)] = value;
            }
        }
        matrix
    }
}

/// Ordinary least squares on a B-spline basis with an intercept.
#[derive(Debug, Clone)]
pub struct SplineRegression {
    basis: BSplineBasis,
    coefficients: DVector<f64>,
    intercept: f64,
}

impl SplineRegression {
    /// Fit `y ~ basis(x)` with a uniform basis spanning the range of `x`.
    ///
    /// Columns and target are centred before solving; the system is solved
    /// by SVD, which returns the minimum-norm coefficients when the basis is
    /// rank deficient.
    pub fn fit(x: &[f64], y: &[f64], n_knots: usize, degree: usize) -> Result<Self> {
        if x.len() != y.len() {
            return Err(CefragError::DimensionMismatch(format!(
                "Expected {} targets, got {}",
                x.len(),
                y.len()
            )));
        }
        if x.is_empty() {
            return Err(CefragError::InvalidInput(
                "cannot fit a spline to no points".to_string(),
            ));
        }

        let min = x.iter().copied().fold(f64::INFINITY, f64::min);
        let max = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let basis = BSplineBasis::uniform(min, max, n_knots, degree)?;

        let mut design = basis.design_matrix(x);
        let column_means: Vec<f64> = design
            .column_iter()
            .map(|col| col.sum() / x.len() as f64)
            .collect();
        for (j, mean) in column_means.iter().enumerate() {
            design.column_mut(j).add_scalar_mut(-mean);
        }
        let y_mean = y.iter().sum::<f64>() / y.len() as f64;
        let target = DVector::from_iterator(y.len(), y.iter().map(|v| v - y_mean));

        let (rows, cols) = design.shape();
        let svd = design.svd(true, true);
        let max_sv = svd.singular_values.max();
        let eps = max_sv * rows.max(cols) as f64 * f64::EPSILON;
        let coefficients = svd
            .solve(&target, eps)
            .map_err(|e| CefragError::LinearAlgebraError(e.to_string()))?;

        let intercept = y_mean
            - column_means
                .iter()
                .zip(coefficients.iter())
                .map(|(m, c)| m * c)
                .sum::<f64>();

        Ok(Self {
            basis,
            coefficients,
            intercept,
        })
    }

    pub fn basis(&self) -> &BSplineBasis {
        &self.basis
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn coefficients(&self) -> &DVector<f64> {
        &self.coefficients
    }

    pub fn predict_one(&self, x: f64) -> f64 {
        self.intercept
            + self
                .basis
                .evaluate(x)
                .iter()
                .zip(self.coefficients.iter())
                .map(|(b, c)| b * c)
                .sum::<f64>()
    }

    pub fn predict(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.predict_one(x)).collect()
    }
}
