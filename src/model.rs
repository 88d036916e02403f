//! Model trait and fitting helper.
//!
//! This module defines the Model trait, which provides a common interface for
//! fitting peak shapes to a slice of trace data, and the adapter that turns a
//! model into a bounded least-squares [`Problem`].

use crate::error::{CefragError, Result};
use crate::lm::LevenbergMarquardt;
use crate::parameters::Parameters;
use crate::problem::Problem;
use crate::utils::stats::r2_score;
use ndarray::Array1;
use std::fmt;

/// A trait representing a model that can be fit to data.
///
/// Models provide a way to define a mathematical function with parameters
/// that can be fit to data. Models can evaluate the function at given x values,
/// calculate residuals against observed data, and guess starting values.
pub trait Model {
    /// Returns a reference to the model's parameters.
    fn parameters(&self) -> &Parameters;

    /// Returns a mutable reference to the model's parameters.
    fn parameters_mut(&mut self) -> &mut Parameters;

    /// Evaluates the model at the given x values using an explicit parameter set.
    ///
    /// # Arguments
    ///
    /// * `params` - Parameter values laid out like [`Model::parameters`]
    /// * `x` - The independent variable values at which to evaluate the model
    fn eval_with(&self, params: &Parameters, x: &Array1<f64>) -> Result<Array1<f64>>;

    /// Evaluates the model at the given x values using the current parameter values.
    fn eval(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        self.eval_with(self.parameters(), x)
    }

    /// Calculates the residuals (y_obs - y_pred) using the current parameter values.
    fn residuals(&self, x: &Array1<f64>, y: &Array1<f64>) -> Result<Array1<f64>> {
        let y_pred = self.eval(x)?;

        if y.len() != y_pred.len() {
            return Err(CefragError::DimensionMismatch(format!(
                "Expected {} observed values, got {}",
                y_pred.len(),
                y.len()
            )));
        }

        Ok(y - &y_pred)
    }

    /// Initialize the model's parameters from data.
    ///
    /// The default implementation keeps the current values.
    fn guess_parameters(&mut self, _x: &Array1<f64>, _y: &Array1<f64>) -> Result<()> {
        Ok(())
    }

    /// Returns the number of varying parameters in the model.
    fn varying_parameter_count(&self) -> usize {
        self.parameters().varying().len()
    }

    /// Returns the names of all parameters in the model.
    fn parameter_names(&self) -> Vec<String> {
        self.parameters().names()
    }
}

/// An adapter that implements [`Problem`] for Model implementations.
///
/// The optimizer works on the internal (unbounded) coordinates of the varying
/// parameters; every evaluation maps them back through the bounds transform.
pub struct ModelProblem<'a, M: Model> {
    model: &'a M,
    x_data: &'a Array1<f64>,
    y_data: &'a Array1<f64>,
}

impl<'a, M: Model> ModelProblem<'a, M> {
    pub fn new(model: &'a M, x_data: &'a Array1<f64>, y_data: &'a Array1<f64>) -> Self {
        Self {
            model,
            x_data,
            y_data,
        }
    }

    /// Get the number of data points
    pub fn ndata(&self) -> usize {
        self.x_data.len()
    }

    /// Get the number of varying parameters
    pub fn nvarys(&self) -> usize {
        self.model.varying_parameter_count()
    }

    /// Parameter set obtained by applying internal optimizer values.
    pub fn parameters_from_internal(&self, internal: &Array1<f64>) -> Result<Parameters> {
        let mut params = self.model.parameters().clone();
        params.update_from_internal(internal)?;
        Ok(params)
    }
}

impl<'a, M: Model> Problem for ModelProblem<'a, M> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let trial = self.parameters_from_internal(params)?;
        let y_pred = self.model.eval_with(&trial, self.x_data)?;
        Ok(self.y_data - &y_pred)
    }

    fn parameter_count(&self) -> usize {
        self.nvarys()
    }

    fn residual_count(&self) -> usize {
        self.ndata()
    }
}

/// Fit a model to data.
///
/// The model's parameters are used as the starting point and are replaced by
/// the optimized values on return.
///
/// # Arguments
///
/// * `model` - The model to fit
/// * `x_data` - The independent variable values
/// * `y_data` - The observed dependent variable values
///
/// # Returns
///
/// * `Result<FitResult>` - The result of the fit
pub fn fit<M: Model>(model: &mut M, x_data: &Array1<f64>, y_data: &Array1<f64>) -> Result<FitResult> {
    fit_with(model, x_data, y_data, &LevenbergMarquardt::with_default_config())
}

/// Fit a model to data with an explicitly configured optimizer.
pub fn fit_with<M: Model>(
    model: &mut M,
    x_data: &Array1<f64>,
    y_data: &Array1<f64>,
    optimizer: &LevenbergMarquardt,
) -> Result<FitResult> {
    if x_data.len() != y_data.len() {
        return Err(CefragError::DimensionMismatch(format!(
            "Expected x and y data to have the same length, got {} and {}",
            x_data.len(),
            y_data.len()
        )));
    }
    if x_data.is_empty() {
        return Err(CefragError::InvalidInput(
            "Cannot fit a model to an empty window".to_string(),
        ));
    }

    let initial = model.parameters().varying_internal_values()?;
    let (lm_result, params) = {
        let problem = ModelProblem::new(&*model, x_data, y_data);
        let lm_result = optimizer.minimize(&problem, initial)?;
        let params = problem.parameters_from_internal(&lm_result.params)?;
        (lm_result, params)
    };
    *model.parameters_mut() = params;

    let best_fit = model.eval(x_data)?;
    let chisqr = lm_result.cost;
    let nvarys = model.varying_parameter_count();
    let ndata = x_data.len();
    let redchi = if ndata > nvarys {
        chisqr / (ndata - nvarys) as f64
    } else {
        f64::NAN
    };

    Ok(FitResult {
        success: lm_result.success,
        cost: chisqr,
        chisqr,
        redchi,
        r_squared: r2_score(&y_data.to_vec(), &best_fit.to_vec()),
        residuals: lm_result.residuals,
        best_fit,
        iterations: lm_result.iterations,
        nfev: lm_result.func_evals,
        message: lm_result.message,
        params: model.parameters().clone(),
    })
}

/// Result of fitting a model to data
#[derive(Debug, Clone)]
pub struct FitResult {
    /// Whether the fit succeeded
    pub success: bool,

    /// Sum of squared residuals
    pub cost: f64,

    /// Chi-square (identical to `cost` for unweighted fits)
    pub chisqr: f64,

    /// Reduced chi-square
    pub redchi: f64,

    /// Coefficient of determination of the fit
    pub r_squared: f64,

    /// Residuals at the solution (y_obs - y_fit)
    pub residuals: Array1<f64>,

    /// Model evaluated at the optimized parameters
    pub best_fit: Array1<f64>,

    /// Number of iterations performed
    pub iterations: usize,

    /// Number of function evaluations
    pub nfev: usize,

    /// A message describing the result
    pub message: String,

    /// Optimized parameters
    pub params: Parameters,
}

impl fmt::Display for FitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[[Fit Statistics]]")?;
        writeln!(f, "    # function evals   = {}", self.nfev)?;
        writeln!(f, "    # data points      = {}", self.residuals.len())?;
        writeln!(f, "    chi-square         = {:.6e}", self.chisqr)?;
        writeln!(f, "    reduced chi-square = {:.6e}", self.redchi)?;
        writeln!(f, "    R-squared          = {:.6}", self.r_squared)?;
        writeln!(f, "    success            = {} ({})", self.success, self.message)?;
        writeln!(f, "[[Variables]]")?;
        for param in self.params.iter() {
            let marker = if param.vary { "" } else { " (fixed)" };
            writeln!(f, "    {:<10} = {:.6e}{}", param.name(), param.value(), marker)?;
        }
        Ok(())
    }
}
