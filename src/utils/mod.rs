//! Utility functions and helpers for the cefrag library.

pub mod finite_difference;
pub mod matrix_convert;
pub mod stats;

// Re-export commonly used utilities
pub use matrix_convert::{nalgebra_vec_to_ndarray, ndarray_to_nalgebra, ndarray_vec_to_nalgebra};
