//! Spline tools used by ladder scoring and size calibration.

pub mod bspline;
pub mod cubic;

pub use bspline::{BSplineBasis, SplineRegression};
pub use cubic::CurvatureOperator;
