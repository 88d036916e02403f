//! # Parameter System
//!
//! Named, bounded fit parameters used by the peak-shape models. Bounds are
//! enforced with a Minuit-style transform so the Levenberg-Marquardt optimizer
//! can work on unconstrained internal values.

pub mod bounds;
pub mod parameter;
pub mod parameters;

// Re-export key types
pub use bounds::{Bounds, BoundsError, BoundsTransform};
pub use parameter::{Parameter, ParameterError};
pub use parameters::Parameters;
