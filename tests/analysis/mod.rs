//! End-to-end tests of the fragment-analysis stages on synthetic runs.

pub mod calibration;
pub mod ladder_assignment;
pub mod peak_finding;
pub mod pipeline;
pub mod quantification;
