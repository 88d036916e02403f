//! Parameter definition and implementation
//!
//! A `Parameter` is a named fit value with optional bounds. Peak models own a
//! small ordered set of them (amplitude, center, sigma, ...).

use crate::parameters::bounds::{Bounds, BoundsError, BoundsTransform};
use thiserror::Error;

/// Errors that can occur when working with parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("Bounds error: {0}")]
    BoundsError(#[from] BoundsError),

    #[error("Parameter '{name}' not found")]
    ParameterNotFound { name: String },

    #[error("Parameter '{name}' already exists")]
    DuplicateParameter { name: String },
}

/// A parameter of a fit model
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Name of the parameter
    pub name: String,

    value: f64,

    /// Whether this parameter is varied during optimization
    pub vary: bool,

    bounds: Bounds,
}

impl Parameter {
    /// Create an unbounded, varying parameter.
    pub fn new(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            vary: true,
            bounds: Bounds::default(),
        }
    }

    /// Create a varying parameter restricted to `[min, max]`.
    pub fn with_bounds(name: &str, value: f64, min: f64, max: f64) -> Result<Self, ParameterError> {
        let bounds = Bounds::new(min, max)?;
        Ok(Self {
            name: name.to_string(),
            value: bounds.clamp(value),
            vary: true,
            bounds,
        })
    }

    /// Create a varying parameter with only a lower limit.
    pub fn with_min(name: &str, value: f64, min: f64) -> Self {
        let bounds = Bounds::min_only(min);
        Self {
            name: name.to_string(),
            value: bounds.clamp(value),
            vary: true,
            bounds,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Set the value, clamping it into the parameter bounds.
    pub fn set_value(&mut self, value: f64) -> Result<(), ParameterError> {
        if !value.is_finite() {
            return Err(BoundsError::InfiniteValue.into());
        }
        self.value = self.bounds.clamp(value);
        Ok(())
    }

    pub fn min(&self) -> f64 {
        self.bounds.min
    }

    pub fn max(&self) -> f64 {
        self.bounds.max
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn bounds_transform(&self) -> BoundsTransform {
        BoundsTransform::new(self.bounds)
    }

    /// Value in the optimizer's unbounded coordinates.
    pub fn to_internal(&self) -> Result<f64, ParameterError> {
        Ok(self.bounds_transform().to_internal(self.value)?)
    }

    /// Map an optimizer coordinate back to a bounded parameter value.
    pub fn from_internal(&self, internal_value: f64) -> f64 {
        self.bounds_transform().to_external(internal_value)
    }
}
