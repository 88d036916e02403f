//! Size-standard ladders and ladder peak assignment.
//!
//! A ladder family names a fixed set of reference fragment sizes together
//! with the detection defaults that suit it. [`LadderAssigner`] matches the
//! detected size-standard peaks against those sizes.

use crate::error::{CefragError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod assigner;
mod graph;

pub use assigner::{LadderAssigner, LadderAssignment};
pub use graph::PeakGraph;

/// GeneScan 600 LIZ.
const LIZ_SIZES: [f64; 36] = [
    20.0, 40.0, 60.0, 80.0, 100.0, 114.0, 120.0, 140.0, 160.0, 180.0, 200.0, 214.0, 220.0, 240.0,
    250.0, 260.0, 280.0, 300.0, 314.0, 320.0, 340.0, 360.0, 380.0, 400.0, 414.0, 420.0, 440.0,
    460.0, 480.0, 500.0, 514.0, 520.0, 540.0, 560.0, 580.0, 600.0,
];

/// GeneScan 500 ROX and GeneScan 500 ORANGE share the same fragments.
const GS500_SIZES: [f64; 16] = [
    35.0, 50.0, 75.0, 100.0, 139.0, 150.0, 160.0, 200.0, 250.0, 300.0, 340.0, 350.0, 400.0,
    450.0, 490.0, 500.0,
];

/// The supported size-standard families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LadderFamily {
    Liz,
    Rox,
    Orange,
}

impl LadderFamily {
    pub const ALL: [LadderFamily; 3] = [LadderFamily::Liz, LadderFamily::Rox, LadderFamily::Orange];

    pub fn name(&self) -> &'static str {
        match self {
            LadderFamily::Liz => "LIZ",
            LadderFamily::Rox => "ROX",
            LadderFamily::Orange => "ORANGE",
        }
    }

    /// Reference sizes and detection defaults of the family.
    pub fn definition(&self) -> LadderDefinition {
        match self {
            LadderFamily::Liz => LadderDefinition {
                family: *self,
                sizes: &LIZ_SIZES,
                channel: "DATA105",
                min_height: 100.0,
                min_interpeak_distance: 20,
                max_ladder_trace_distance: 100,
            },
            LadderFamily::Rox => LadderDefinition {
                family: *self,
                sizes: &GS500_SIZES,
                channel: "DATA4",
                min_height: 100.0,
                min_interpeak_distance: 20,
                max_ladder_trace_distance: 250,
            },
            LadderFamily::Orange => LadderDefinition {
                family: *self,
                sizes: &GS500_SIZES,
                channel: "DATA205",
                min_height: 100.0,
                min_interpeak_distance: 20,
                max_ladder_trace_distance: 250,
            },
        }
    }
}

impl fmt::Display for LadderFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LadderFamily {
    type Err = CefragError;

    fn from_str(s: &str) -> Result<Self> {
        LadderFamily::ALL
            .into_iter()
            .find(|family| family.name() == s)
            .ok_or_else(|| CefragError::LadderNotFound(s.to_string()))
    }
}

/// Built-in description of a ladder family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LadderDefinition {
    pub family: LadderFamily,
    pub sizes: &'static [f64],
    pub channel: &'static str,
    pub min_height: f64,
    pub min_interpeak_distance: usize,
    pub max_ladder_trace_distance: usize,
}

/// How a candidate ladder combination is scored. Lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMethod {
    /// Maximum absolute second derivative of the interpolating cubic spline
    /// through (reference size, peak time).
    #[default]
    SplineCurvature,
    /// Maximum absolute gradient of the interval deviations after scaling
    /// the candidate onto the reference range.
    FirstDerivative,
    /// As `FirstDerivative`, with the gradient taken twice.
    SecondDerivative,
}

/// Resolved ladder settings for one analysis: family defaults with any
/// caller overrides applied.
#[derive(Debug, Clone, PartialEq)]
pub struct LadderParameters {
    pub family: LadderFamily,
    pub sizes: Vec<f64>,
    pub min_height: f64,
    pub min_interpeak_distance: usize,
    pub max_ladder_trace_distance: usize,
    /// Detected peaks kept beyond the number of reference sizes.
    pub peak_count_padding: usize,
    pub scoring: ScoringMethod,
}

impl LadderParameters {
    /// Family defaults with a padding of 3 and spline-curvature scoring.
    pub fn from_family(family: LadderFamily) -> Self {
        let def = family.definition();
        Self {
            family,
            sizes: def.sizes.to_vec(),
            min_height: def.min_height,
            min_interpeak_distance: def.min_interpeak_distance,
            max_ladder_trace_distance: def.max_ladder_trace_distance,
            peak_count_padding: 3,
            scoring: ScoringMethod::default(),
        }
    }

    /// Number of reference sizes to match.
    pub fn ref_count(&self) -> usize {
        self.sizes.len()
    }

    /// Largest number of detected peaks entering the graph search.
    pub fn max_peak_count(&self) -> usize {
        self.ref_count() + self.peak_count_padding
    }
}
