//! Peak-shape models for quantifying electropherogram peaks.
//!
//! This module provides the Gaussian, Lorentzian and Voigt models and the
//! [`PeakShape`] selector used by the quantification stage.

use crate::error::{CefragError, Result};
use crate::model::{fit, FitResult, Model};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod faddeeva;
mod peak;

// Re-export the models
pub use faddeeva::faddeeva;
pub use peak::{guess_from_peak, GaussianModel, LorentzianModel, PeakModel, VoigtModel};

/// The peak shape fitted to each peak window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeakShape {
    #[default]
    #[serde(alias = "gaussian")]
    Gauss,
    Voigt,
    Lorentzian,
}

impl PeakShape {
    /// Name used in reports and output rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            PeakShape::Gauss => "gauss",
            PeakShape::Voigt => "voigt",
            PeakShape::Lorentzian => "lorentzian",
        }
    }

    /// Guess starting values from the window and fit the shape to it.
    pub fn fit(&self, x: &Array1<f64>, y: &Array1<f64>) -> Result<PeakFit> {
        match self {
            PeakShape::Gauss => fit_peak(GaussianModel::new("")?, x, y),
            PeakShape::Voigt => fit_peak(VoigtModel::new("")?, x, y),
            PeakShape::Lorentzian => fit_peak(LorentzianModel::new("")?, x, y),
        }
    }
}

/// A fitted peak shape and the quantities derived from its parameters.
#[derive(Debug, Clone)]
pub struct PeakFit {
    pub result: FitResult,
    /// Integrated area under the fitted curve.
    pub area: f64,
    pub height: f64,
    pub fwhm: f64,
}

impl fmt::Display for PeakFit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.result, f)
    }
}

fn fit_peak<M: PeakModel>(mut model: M, x: &Array1<f64>, y: &Array1<f64>) -> Result<PeakFit> {
    model.guess_parameters(x, y)?;
    let result = fit(&mut model, x, y)?;
    Ok(PeakFit {
        area: model.area()?,
        height: model.height()?,
        fwhm: model.fwhm()?,
        result,
    })
}

impl fmt::Display for PeakShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeakShape {
    type Err = CefragError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gauss" | "gaussian" => Ok(PeakShape::Gauss),
            "voigt" => Ok(PeakShape::Voigt),
            "lorentzian" => Ok(PeakShape::Lorentzian),
            other => Err(CefragError::NotImplemented(other.to_string())),
        }
    }
}
