//! Levenberg-Marquardt algorithm implementation.
//!
//! This module provides the nonlinear least-squares optimizer used to fit
//! peak-shape models to the raw sample trace.

pub mod algorithm;
pub mod config;

// Re-export key types
pub use algorithm::{LevenbergMarquardt, LmResult};
pub use config::{DecompositionMethod, LmConfig};
