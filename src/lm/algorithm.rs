//! Implementation of the Levenberg-Marquardt algorithm.
//!
//! This module contains the core implementation of the Levenberg-Marquardt algorithm
//! for nonlinear least-squares optimization.

use nalgebra::{DMatrix, DVector};
use ndarray::Array1;
use std::fmt;

use crate::error::{CefragError, Result};
use crate::problem::Problem;
use crate::utils::matrix_convert::{
    nalgebra_vec_to_ndarray, ndarray_to_nalgebra, ndarray_vec_to_nalgebra,
};

use super::config::{DecompositionMethod, LmConfig};

/// Result of the Levenberg-Marquardt optimization.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Optimized parameter values
    pub params: Array1<f64>,

    /// Residuals at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared residuals
    pub cost: f64,

    /// Number of iterations performed
    pub iterations: usize,

    /// Number of function evaluations
    pub func_evals: usize,

    /// Whether the optimization succeeded
    pub success: bool,

    /// A message describing the result
    pub message: String,
}

impl fmt::Display for LmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        writeln!(f, "  Parameters: {:?}", self.params)?;
        Ok(())
    }
}

/// Status of the iteration.
enum IterationStatus {
    /// Continue iteration
    Continue,

    /// Converged successfully
    Converged(String),
}

/// The Levenberg-Marquardt optimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    /// Configuration options
    config: LmConfig,
}

impl LevenbergMarquardt {
    /// Create a new Levenberg-Marquardt optimizer with the given configuration.
    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    /// Create a new Levenberg-Marquardt optimizer with default configuration.
    pub fn with_default_config() -> Self {
        Self::default()
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set the method used for solving the linear system.
    pub fn with_decomposition_method(mut self, method: DecompositionMethod) -> Self {
        self.config.decomposition_method = method;
        self
    }

    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    /// Minimize the sum of squared residuals for the given problem.
    ///
    /// # Arguments
    ///
    /// * `problem` - The problem to solve
    /// * `initial_params` - Initial guess for the parameter values
    ///
    /// # Returns
    ///
    /// * `Result<LmResult>` - The result of the optimization. Running out of
    ///   iterations or damping is reported through `success == false`, with the
    ///   best parameters found so far.
    pub fn minimize<P: Problem>(&self, problem: &P, initial_params: Array1<f64>) -> Result<LmResult> {
        let n_params = problem.parameter_count();
        if initial_params.len() != n_params {
            return Err(CefragError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                n_params,
                initial_params.len()
            )));
        }

        let mut params = initial_params;
        let mut lambda = self.config.initial_lambda;

        let mut residuals = problem.eval(&params)?;
        let mut cost: f64 = residuals.iter().map(|r| r.powi(2)).sum();
        let mut func_evals = 1;
        let mut iterations = 0;

        if !cost.is_finite() {
            return Err(CefragError::ConvergenceFailure(
                "Initial cost is not finite".to_string(),
            ));
        }

        loop {
            if iterations >= self.config.max_iterations {
                return Ok(self.finish(
                    params,
                    residuals,
                    cost,
                    iterations,
                    func_evals,
                    false,
                    format!("Maximum iterations ({}) reached", self.config.max_iterations),
                ));
            }

            let jacobian = ndarray_to_nalgebra(&problem.jacobian(&params)?)?;
            func_evals += n_params;
            let r = ndarray_vec_to_nalgebra(&residuals)?;

            // Gradient g = J^T r
            let jt = jacobian.transpose();
            let g = &jt * &r;
            let gradient_norm = g.amax();
            if gradient_norm < self.config.gtol {
                return Ok(self.finish(
                    params,
                    residuals,
                    cost,
                    iterations,
                    func_evals,
                    true,
                    format!(
                        "Gradient convergence: ||g|| = {:.2e} < {:.2e}",
                        gradient_norm, self.config.gtol
                    ),
                ));
            }

            let jtj = &jt * &jacobian;

            // Inner loop: raise damping until a step reduces the cost
            let status = loop {
                let step = self.calculate_step(&jtj, &g, lambda)?;
                let new_params = &params + &step;
                let new_residuals = problem.eval(&new_params)?;
                func_evals += 1;
                let new_cost: f64 = new_residuals.iter().map(|r| r.powi(2)).sum();

                if new_cost.is_finite() && new_cost < cost {
                    let param_scale = params.iter().map(|p| p.abs()).fold(0.0, f64::max);
                    let param_change = step.iter().map(|s| s.abs()).fold(0.0, f64::max);
                    let cost_change = (cost - new_cost) / cost.max(f64::MIN_POSITIVE);

                    let status = if param_change <= self.config.xtol * (param_scale + self.config.xtol)
                    {
                        IterationStatus::Converged(format!(
                            "Parameter convergence: |dx| = {:.2e}",
                            param_change
                        ))
                    } else if cost_change <= self.config.ftol {
                        IterationStatus::Converged(format!(
                            "Cost convergence: |df|/|f| = {:.2e} < {:.2e}",
                            cost_change, self.config.ftol
                        ))
                    } else {
                        IterationStatus::Continue
                    };

                    params = new_params;
                    residuals = new_residuals;
                    cost = new_cost;
                    lambda = (lambda * self.config.lambda_down_factor).max(self.config.min_lambda);
                    iterations += 1;
                    break status;
                }

                // Step rejected - increase lambda and try again
                lambda *= self.config.lambda_up_factor;
                if lambda > self.config.max_lambda {
                    return Ok(self.finish(
                        params,
                        residuals,
                        cost,
                        iterations,
                        func_evals,
                        true,
                        "No further reduction of the cost is possible".to_string(),
                    ));
                }
            };

            if let IterationStatus::Converged(message) = status {
                return Ok(self.finish(params, residuals, cost, iterations, func_evals, true, message));
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        params: Array1<f64>,
        residuals: Array1<f64>,
        cost: f64,
        iterations: usize,
        func_evals: usize,
        success: bool,
        message: String,
    ) -> LmResult {
        LmResult {
            params,
            residuals,
            cost,
            iterations,
            func_evals,
            success,
            message,
        }
    }

    /// Calculate the Levenberg-Marquardt step.
    ///
    /// Solves (J^T J + λ diag(J^T J)) δ = -J^T r. Columns with a vanishing
    /// diagonal get unit damping so the system stays regular.
    fn calculate_step(&self, jtj: &DMatrix<f64>, g: &DVector<f64>, lambda: f64) -> Result<Array1<f64>> {
        let n = jtj.nrows();
        let mut a = jtj.clone();
        for i in 0..n {
            let scale = if jtj[(i, i)] > 0.0 { jtj[(i, i)] } else { 1.0 };
            a[(i, i)] += lambda * scale;
        }
        let rhs = -g;

        let solution = match self.config.decomposition_method {
            DecompositionMethod::Cholesky => a
                .cholesky()
                .map(|chol| chol.solve(&rhs))
                .ok_or_else(|| {
                    CefragError::LinearAlgebraError(
                        "Damped normal matrix is not positive definite".to_string(),
                    )
                })?,
            DecompositionMethod::SVD => Self::solve_svd(a, &rhs)?,
            DecompositionMethod::Auto => match a.clone().cholesky() {
                Some(chol) => chol.solve(&rhs),
                None => Self::solve_svd(a, &rhs)?,
            },
        };

        nalgebra_vec_to_ndarray(&solution)
    }

    /// Solve the system using SVD decomposition.
    fn solve_svd(a: DMatrix<f64>, rhs: &DVector<f64>) -> Result<DVector<f64>> {
        a.svd(true, true)
            .solve(rhs, 1e-12)
            .map_err(|e| CefragError::LinearAlgebraError(e.to_string()))
    }
}
