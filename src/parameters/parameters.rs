//! Ordered parameter collection
//!
//! Parameters are kept in insertion order so that a model's parameter vector
//! has a stable layout (`[amplitude, center, sigma, ...]`) for the optimizer
//! and for analytic Jacobian columns.

use crate::error::CefragError;
use crate::parameters::parameter::{Parameter, ParameterError};
use ndarray::Array1;

/// An ordered collection of named parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    params: Vec<Parameter>,
}

impl Parameters {
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add a parameter, rejecting duplicate names.
    pub fn add(&mut self, param: Parameter) -> Result<(), ParameterError> {
        if self.contains(param.name()) {
            return Err(ParameterError::DuplicateParameter {
                name: param.name().to_string(),
            });
        }
        self.params.push(param);
        Ok(())
    }

    pub fn add_param(&mut self, name: &str, value: f64) -> Result<(), ParameterError> {
        self.add(Parameter::new(name, value))
    }

    pub fn add_param_with_bounds(
        &mut self,
        name: &str,
        value: f64,
        min: f64,
        max: f64,
    ) -> Result<(), ParameterError> {
        self.add(Parameter::with_bounds(name, value, min, max)?)
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.params.iter_mut().find(|p| p.name() == name)
    }

    /// Value of a named parameter, or a `ParameterNotFound` error.
    pub fn value_of(&self, name: &str) -> Result<f64, ParameterError> {
        self.get(name)
            .map(Parameter::value)
            .ok_or_else(|| ParameterError::ParameterNotFound {
                name: name.to_string(),
            })
    }

    /// Set the value of a named parameter.
    pub fn set_value(&mut self, name: &str, value: f64) -> Result<(), ParameterError> {
        self.get_mut(name)
            .ok_or_else(|| ParameterError::ParameterNotFound {
                name: name.to_string(),
            })?
            .set_value(value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.params.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    /// Parameters that are varied during optimization, in order.
    pub fn varying(&self) -> Vec<&Parameter> {
        self.params.iter().filter(|p| p.vary).collect()
    }

    /// Internal (unbounded) values of the varying parameters.
    pub fn varying_internal_values(&self) -> Result<Array1<f64>, ParameterError> {
        let values = self
            .params
            .iter()
            .filter(|p| p.vary)
            .map(Parameter::to_internal)
            .collect::<Result<Vec<f64>, ParameterError>>()?;
        Ok(Array1::from_vec(values))
    }

    /// Update the varying parameters from internal optimizer coordinates.
    pub fn update_from_internal(&mut self, values: &Array1<f64>) -> crate::error::Result<()> {
        let varying = self.params.iter().filter(|p| p.vary).count();
        if values.len() != varying {
            return Err(CefragError::DimensionMismatch(format!(
                "Expected {} internal values, got {}",
                varying,
                values.len()
            )));
        }

        for (param, &value) in self.params.iter_mut().filter(|p| p.vary).zip(values.iter()) {
            let external = param.from_internal(value);
            param.set_value(external)?;
        }
        Ok(())
    }
}
