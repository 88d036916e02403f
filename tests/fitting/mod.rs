//! Tests of the least-squares layer used for peak fitting.

pub mod peak_models;
pub mod problem_trait;
