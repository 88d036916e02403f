//! Integration tests for the Problem trait and the optimizer behind it.

use approx::assert_relative_eq;
use cefrag::lm::{DecompositionMethod, LevenbergMarquardt};
use cefrag::{CefragError, Problem, Result};
use ndarray::{array, Array1, Array2};

/// A simple linear model for testing: f(x) = a * x + b
struct LinearModel {
    x_data: Array1<f64>,
    y_data: Array1<f64>,
}

impl LinearModel {
    /// Create a test problem with known solution: y = 2x + 3
    fn create_test_problem() -> Self {
        Self {
            x_data: array![1.0, 2.0, 3.0, 4.0, 5.0],
            y_data: array![5.0, 7.0, 9.0, 11.0, 13.0],
        }
    }
}

impl Problem for LinearModel {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        if params.len() != 2 {
            return Err(CefragError::DimensionMismatch(format!(
                "Expected 2 parameters, got {}",
                params.len()
            )));
        }

        Ok(self.x_data.mapv(|x| params[0] * x + params[1]) - &self.y_data)
    }

    fn parameter_count(&self) -> usize {
        2
    }

    fn residual_count(&self) -> usize {
        self.x_data.len()
    }

    fn jacobian(&self, _params: &Array1<f64>) -> Result<Array2<f64>> {
        let n = self.x_data.len();
        let mut jac = Array2::zeros((n, 2));
        for i in 0..n {
            jac[[i, 0]] = self.x_data[i];
            jac[[i, 1]] = 1.0;
        }
        Ok(jac)
    }
}

/// Unnormalised Gaussian f(x) = a * exp(-(x - c)^2 / (2 s^2)), numeric Jacobian
struct GaussianProblem {
    x_data: Array1<f64>,
    y_data: Array1<f64>,
}

impl GaussianProblem {
    fn new(a: f64, c: f64, s: f64) -> Self {
        let x_data = Array1::range(0.0, 40.0, 1.0);
        let y_data = x_data.mapv(|x: f64| a * (-(x - c).powi(2) / (2.0 * s * s)).exp());
        Self { x_data, y_data }
    }
}

impl Problem for GaussianProblem {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let (a, c, s) = (params[0], params[1], params[2]);
        let predicted = self
            .x_data
            .mapv(|x| a * (-(x - c).powi(2) / (2.0 * s * s)).exp());
        Ok(predicted - &self.y_data)
    }

    fn parameter_count(&self) -> usize {
        3
    }

    fn residual_count(&self) -> usize {
        self.x_data.len()
    }
}

#[test]
fn test_linear_model_residuals_and_cost() {
    let model = LinearModel::create_test_problem();

    let residuals = model.eval(&array![2.0, 3.0]).unwrap();
    assert_eq!(residuals.len(), model.residual_count());
    for r in residuals.iter() {
        assert_relative_eq!(*r, 0.0, epsilon = 1e-10);
    }

    // With parameters [1, 1], residuals are -(x + 2)
    let residuals = model.eval(&array![1.0, 1.0]).unwrap();
    let expected = array![-3.0, -4.0, -5.0, -6.0, -7.0];
    for i in 0..residuals.len() {
        assert_relative_eq!(residuals[i], expected[i], epsilon = 1e-10);
    }
    assert_relative_eq!(model.eval_cost(&array![1.0, 1.0]).unwrap(), 135.0, epsilon = 1e-10);
}

#[test]
fn test_parameter_mismatch() {
    let model = LinearModel::create_test_problem();
    assert!(model.eval(&array![1.0]).is_err());
    assert!(model.eval(&array![1.0, 2.0, 3.0]).is_err());
}

#[test]
fn test_minimize_linear_model() {
    let model = LinearModel::create_test_problem();
    let result = LevenbergMarquardt::with_default_config()
        .minimize(&model, array![0.0, 0.0])
        .unwrap();

    assert!(result.success, "{}", result.message);
    assert_relative_eq!(result.params[0], 2.0, epsilon = 1e-6);
    assert_relative_eq!(result.params[1], 3.0, epsilon = 1e-6);
    assert!(result.cost < 1e-10);
}

#[test]
fn test_minimize_gaussian_with_each_decomposition() {
    let problem = GaussianProblem::new(800.0, 18.5, 3.0);
    for method in [
        DecompositionMethod::Cholesky,
        DecompositionMethod::SVD,
        DecompositionMethod::Auto,
    ] {
        let result = LevenbergMarquardt::with_default_config()
            .with_decomposition_method(method)
            .minimize(&problem, array![600.0, 20.0, 4.0])
            .unwrap();

        assert_relative_eq!(result.params[0], 800.0, epsilon = 1e-3);
        assert_relative_eq!(result.params[1], 18.5, epsilon = 1e-5);
        assert_relative_eq!(result.params[2].abs(), 3.0, epsilon = 1e-5);
    }
}

#[test]
fn test_iteration_limit_reports_failure() {
    let problem = GaussianProblem::new(800.0, 18.5, 3.0);
    let result = LevenbergMarquardt::with_default_config()
        .with_max_iterations(1)
        .minimize(&problem, array![100.0, 25.0, 8.0])
        .unwrap();
    assert!(!result.success);
    assert_eq!(result.iterations, 1);
}
