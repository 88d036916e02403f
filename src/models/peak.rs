//! Peak models for fitting electropherogram peaks.
//!
//! All three models are area-normalised: `amplitude` is the integrated area
//! under the curve, which is what the quotient calculation compares.

use crate::error::{CefragError, Result};
use crate::model::Model;
use crate::models::faddeeva::faddeeva;
use crate::parameters::{Parameter, Parameters};
use ndarray::Array1;
use std::f64::consts::{PI, SQRT_2};

const SQRT_2PI: f64 = 2.5066282746310002;

/// Common interface for the derived quantities of a fitted peak.
pub trait PeakModel: Model {
    /// Maximum value of the peak function.
    fn height(&self) -> Result<f64>;

    /// Full width at half maximum.
    fn fwhm(&self) -> Result<f64>;

    /// Integrated area under the peak.
    fn area(&self) -> Result<f64>;
}

/// Names of the amplitude, center and sigma parameters for a prefix.
fn names(prefix: &str) -> [String; 3] {
    [
        format!("{}amplitude", prefix),
        format!("{}center", prefix),
        format!("{}sigma", prefix),
    ]
}

fn peak_parameters(prefix: &str) -> Result<Parameters> {
    let [amplitude, center, sigma] = names(prefix);
    let mut params = Parameters::new();
    params.add(Parameter::new(&amplitude, 1.0))?;
    params.add(Parameter::new(&center, 0.0))?;
    params.add(Parameter::with_min(&sigma, 1.0, 0.0))?;
    Ok(params)
}

fn peak_values(params: &Parameters, prefix: &str) -> Result<(f64, f64, f64)> {
    let [amplitude, center, sigma] = names(prefix);
    Ok((
        params.value_of(&amplitude)?,
        params.value_of(&center)?,
        params.value_of(&sigma)?,
    ))
}

/// Starting values for a single peak.
///
/// The center is the x of the maximum and sigma a sixth of the x range,
/// unless more than two samples lie above half maximum; then both come from
/// the spread of those samples. The amplitude estimate is
/// `3 * (max - min) * sigma * ampscale`.
pub fn guess_from_peak(
    x: &Array1<f64>,
    y: &Array1<f64>,
    ampscale: f64,
    sigscale: f64,
) -> Result<(f64, f64, f64)> {
    if x.len() != y.len() || x.is_empty() {
        return Err(CefragError::DimensionMismatch(
            "x and y must have the same non-zero length".to_string(),
        ));
    }

    let max_y = y.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min_y = y.iter().copied().fold(f64::INFINITY, f64::min);
    let max_x = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min_x = x.iter().copied().fold(f64::INFINITY, f64::min);

    // First index of the maximum
    let max_idx = y
        .iter()
        .enumerate()
        .fold(0, |best, (i, &v)| if v > y[best] { i } else { best });

    let height = (max_y - min_y) * 3.0;
    let mut center = x[max_idx];
    let mut sigma = (max_x - min_x) / 6.0;

    let half_max = (max_y + min_y) / 2.0;
    let above: Vec<f64> = x
        .iter()
        .zip(y.iter())
        .filter(|(_, &yv)| yv > half_max)
        .map(|(&xv, _)| xv)
        .collect();
    if above.len() > 2 {
        let hi = above.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let lo = above.iter().copied().fold(f64::INFINITY, f64::min);
        sigma = (hi - lo) / 2.0;
        center = above.iter().sum::<f64>() / above.len() as f64;
    }

    let amplitude = height * sigma * ampscale;
    Ok((amplitude, center, sigma * sigscale))
}

fn apply_guess(params: &mut Parameters, prefix: &str, guess: (f64, f64, f64)) -> Result<()> {
    let [amplitude, center, sigma] = names(prefix);
    params.set_value(&amplitude, guess.0)?;
    params.set_value(&center, guess.1)?;
    params.set_value(&sigma, guess.2)?;
    Ok(())
}

/// A Gaussian peak model.
///
/// f(x) = amplitude / (sigma * sqrt(2π)) * exp(-(x - center)² / (2 * sigma²))
#[derive(Debug, Clone)]
pub struct GaussianModel {
    params: Parameters,
    prefix: String,
}

impl GaussianModel {
    pub fn new(prefix: &str) -> Result<Self> {
        Ok(Self {
            params: peak_parameters(prefix)?,
            prefix: prefix.to_string(),
        })
    }
}

impl Model for GaussianModel {
    fn parameters(&self) -> &Parameters {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.params
    }

    fn eval_with(&self, params: &Parameters, x: &Array1<f64>) -> Result<Array1<f64>> {
        let (amplitude, center, sigma) = peak_values(params, &self.prefix)?;
        let sigma = sigma.max(f64::EPSILON);
        Ok(x.mapv(|xv| {
            let arg = (xv - center) / sigma;
            amplitude / (sigma * SQRT_2PI) * (-0.5 * arg * arg).exp()
        }))
    }

    fn guess_parameters(&mut self, x: &Array1<f64>, y: &Array1<f64>) -> Result<()> {
        let guess = guess_from_peak(x, y, 1.0, 1.0)?;
        apply_guess(&mut self.params, &self.prefix, guess)
    }
}

impl PeakModel for GaussianModel {
    fn height(&self) -> Result<f64> {
        let (amplitude, _, sigma) = peak_values(&self.params, &self.prefix)?;
        Ok(amplitude / (sigma.max(f64::EPSILON) * SQRT_2PI))
    }

    fn fwhm(&self) -> Result<f64> {
        let (_, _, sigma) = peak_values(&self.params, &self.prefix)?;
        Ok(2.354820 * sigma)
    }

    fn area(&self) -> Result<f64> {
        Ok(peak_values(&self.params, &self.prefix)?.0)
    }
}

/// A Lorentzian peak model.
///
/// f(x) = amplitude / π * sigma / ((x - center)² + sigma²)
#[derive(Debug, Clone)]
pub struct LorentzianModel {
    params: Parameters,
    prefix: String,
}

impl LorentzianModel {
    pub fn new(prefix: &str) -> Result<Self> {
        Ok(Self {
            params: peak_parameters(prefix)?,
            prefix: prefix.to_string(),
        })
    }
}

impl Model for LorentzianModel {
    fn parameters(&self) -> &Parameters {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.params
    }

    fn eval_with(&self, params: &Parameters, x: &Array1<f64>) -> Result<Array1<f64>> {
        let (amplitude, center, sigma) = peak_values(params, &self.prefix)?;
        let sigma = sigma.max(f64::EPSILON);
        Ok(x.mapv(|xv| {
            let diff = xv - center;
            amplitude / PI * sigma / (diff * diff + sigma * sigma)
        }))
    }

    fn guess_parameters(&mut self, x: &Array1<f64>, y: &Array1<f64>) -> Result<()> {
        let guess = guess_from_peak(x, y, 1.25, 1.0)?;
        apply_guess(&mut self.params, &self.prefix, guess)
    }
}

impl PeakModel for LorentzianModel {
    fn height(&self) -> Result<f64> {
        let (amplitude, _, sigma) = peak_values(&self.params, &self.prefix)?;
        Ok(amplitude / (PI * sigma.max(f64::EPSILON)))
    }

    fn fwhm(&self) -> Result<f64> {
        let (_, _, sigma) = peak_values(&self.params, &self.prefix)?;
        Ok(2.0 * sigma)
    }

    fn area(&self) -> Result<f64> {
        Ok(peak_values(&self.params, &self.prefix)?.0)
    }
}

/// A Voigt peak model with the Lorentzian width tied to sigma.
///
/// f(x) = amplitude * Re[w(z)] / (sigma * sqrt(2π)), z = (x - center + iγ) / (sigma * sqrt(2)),
/// with γ = sigma and w the Faddeeva function.
#[derive(Debug, Clone)]
pub struct VoigtModel {
    params: Parameters,
    prefix: String,
}

impl VoigtModel {
    pub fn new(prefix: &str) -> Result<Self> {
        Ok(Self {
            params: peak_parameters(prefix)?,
            prefix: prefix.to_string(),
        })
    }

    /// The Lorentzian half width, constrained to equal sigma.
    pub fn gamma(&self) -> Result<f64> {
        Ok(peak_values(&self.params, &self.prefix)?.2)
    }
}

fn voigt(x: f64, amplitude: f64, center: f64, sigma: f64, gamma: f64) -> f64 {
    let scale = sigma * SQRT_2;
    let w = faddeeva((x - center) / scale, gamma / scale);
    amplitude * w.re / (sigma * SQRT_2PI)
}

impl Model for VoigtModel {
    fn parameters(&self) -> &Parameters {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.params
    }

    fn eval_with(&self, params: &Parameters, x: &Array1<f64>) -> Result<Array1<f64>> {
        let (amplitude, center, sigma) = peak_values(params, &self.prefix)?;
        let sigma = sigma.max(f64::EPSILON);
        Ok(x.mapv(|xv| voigt(xv, amplitude, center, sigma, sigma)))
    }

    fn guess_parameters(&mut self, x: &Array1<f64>, y: &Array1<f64>) -> Result<()> {
        let guess = guess_from_peak(x, y, 1.5, 0.65)?;
        apply_guess(&mut self.params, &self.prefix, guess)
    }
}

impl PeakModel for VoigtModel {
    fn height(&self) -> Result<f64> {
        let (amplitude, center, sigma) = peak_values(&self.params, &self.prefix)?;
        let sigma = sigma.max(f64::EPSILON);
        Ok(voigt(center, amplitude, center, sigma, sigma))
    }

    fn fwhm(&self) -> Result<f64> {
        let (_, _, sigma) = peak_values(&self.params, &self.prefix)?;
        let gamma = sigma;
        Ok(1.0692 * gamma + (0.8664 * gamma * gamma + 5.545083 * sigma * sigma).sqrt())
    }

    fn area(&self) -> Result<f64> {
        Ok(peak_values(&self.params, &self.prefix)?.0)
    }
}
