//! # cefrag
//!
//! `cefrag` sizes and quantifies DNA fragments from capillary-electrophoresis
//! traces.
//!
//! The library provides:
//! - Ladder peak assignment by a bounded path search over candidate peaks,
//!   scored by the curvature of an interpolating spline
//! - A spline-regression time to basepair calibration that adds knots until
//!   every sample point gets a distinct size
//! - Peak grouping into assays, automatically by basepair gaps or by a table
//!   of named windows
//! - Gaussian, Voigt and Lorentzian peak fits with a Levenberg-Marquardt
//!   optimizer, and per-assay area quotients
//!
//! ## Basic Usage
//!
//! ```no_run
//! use cefrag::{AnalysisConfig, Analyzer, Sample};
//! use ndarray::Array1;
//!
//! let config = AnalysisConfig::from_json(r#"{ "ladder": "ROX" }"#).unwrap();
//! let analyzer = Analyzer::new(&config).unwrap();
//!
//! let sample = Sample::new("run01.fsa", Array1::zeros(6000), Array1::zeros(6000));
//! let analysis = analyzer.analyze(&sample).unwrap();
//! for row in &analysis.quantified {
//!     println!("{} {} {:.3}", row.assay_name, row.peak_name, row.quotient);
//! }
//! ```

// Public modules
pub mod error;

// Parameter system
pub mod parameters;

// Least-squares fitting
pub mod lm;
pub mod model;
pub mod models;
pub mod problem;
pub mod utils;

// Fragment analysis
pub mod calibration;
pub mod config;
pub mod ladder;
pub mod peaks;
pub mod pipeline;
pub mod quantify;
pub mod signal;
pub mod spline;

// Re-exports for convenience
pub use calibration::{CalibratedTrace, CalibrationModel};
pub use config::AnalysisConfig;
pub use error::{CefragError, Result};
pub use ladder::{LadderAssigner, LadderAssignment, LadderFamily, LadderParameters};
pub use lm::LevenbergMarquardt;
pub use models::PeakShape;
pub use peaks::{CustomPeakTable, PeakFinder, PeakTable};
pub use pipeline::{Analyzer, PeakAnalysis, Sample, SampleAnalysis};
pub use problem::Problem;
pub use quantify::{QuantifiedPeak, Quantifier};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
