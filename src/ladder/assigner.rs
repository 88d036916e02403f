//! Assignment of detected size-standard peaks to reference ladder sizes.

use super::graph::PeakGraph;
use super::{LadderParameters, ScoringMethod};
use crate::error::{CefragError, Result};
use crate::signal::{find_peaks, PeakCriteria};
use crate::spline::CurvatureOperator;
use crate::utils::stats::{diff, gradient, minmax_scale};
use ndarray::ArrayView1;
use tracing::debug;

/// The chosen ladder combination.
#[derive(Debug, Clone, PartialEq)]
pub struct LadderAssignment {
    /// Peak times matched one-to-one with the reference sizes, strictly increasing.
    pub times: Vec<usize>,
    /// Reference sizes in the same order.
    pub sizes: Vec<f64>,
    /// Score of the winning combination (lower is better).
    pub score: f64,
    /// Number of candidate combinations scored.
    pub candidates: usize,
}

impl LadderAssignment {
    pub fn times_f64(&self) -> Vec<f64> {
        self.times.iter().map(|&t| t as f64).collect()
    }
}

/// Matches the size-standard channel against a reference ladder.
#[derive(Debug, Clone)]
pub struct LadderAssigner {
    params: LadderParameters,
    curvature: CurvatureOperator,
}

impl LadderAssigner {
    pub fn new(params: LadderParameters) -> Result<Self> {
        let curvature = CurvatureOperator::new(&params.sizes)?;
        Ok(Self { params, curvature })
    }

    pub fn parameters(&self) -> &LadderParameters {
        &self.params
    }

    /// Find the ladder peaks in the size-standard trace.
    pub fn assign(&self, size_standard: ArrayView1<f64>) -> Result<LadderAssignment> {
        let peaks = self.detect_peaks(size_standard);
        let graph = PeakGraph::build(&peaks, self.params.max_ladder_trace_distance);
        debug!(
            peaks = peaks.len(),
            edges = graph.edge_count(),
            "built ladder peak graph"
        );

        let candidates = graph.windows(self.params.ref_count())?;
        debug!(candidates = candidates.len(), "scoring ladder combinations");

        let (best, score) = self.best_candidate(&candidates)?;
        Ok(LadderAssignment {
            times: best.clone(),
            sizes: self.params.sizes.clone(),
            score,
            candidates: candidates.len(),
        })
    }

    /// Peaks above the minimum height and distance, reduced to the tallest
    /// `max_peak_count` and returned in time order.
    pub fn detect_peaks(&self, size_standard: ArrayView1<f64>) -> Vec<usize> {
        let criteria = PeakCriteria::new()
            .with_height(self.params.min_height)
            .with_distance(self.params.min_interpeak_distance);
        let mut peaks = find_peaks(size_standard, &criteria);

        // Tallest first; equal heights keep time order
        peaks.sort_by(|&a, &b| size_standard[b].total_cmp(&size_standard[a]));
        peaks.truncate(self.params.max_peak_count());
        peaks.sort_unstable();
        peaks
    }

    /// Lowest-scoring candidate; ties keep the earliest.
    fn best_candidate<'a>(&self, candidates: &'a [Vec<usize>]) -> Result<(&'a Vec<usize>, f64)> {
        let mut best: Option<(&Vec<usize>, f64)> = None;
        for candidate in candidates {
            let score = self.score(candidate)?;
            let score = if score.is_nan() { f64::INFINITY } else { score };
            match best {
                Some((_, best_score)) if score >= best_score => {}
                _ => best = Some((candidate, score)),
            }
        }
        best.ok_or_else(|| CefragError::NoCombination("no candidate combinations".to_string()))
    }

    /// Score a candidate combination of peak times.
    pub fn score(&self, candidate: &[usize]) -> Result<f64> {
        let times: Vec<f64> = candidate.iter().map(|&t| t as f64).collect();
        match self.params.scoring {
            ScoringMethod::SplineCurvature => self.curvature.max_abs_curvature(&times),
            ScoringMethod::FirstDerivative => {
                Ok(max_abs(&gradient(&self.interval_deviation(&times))))
            }
            ScoringMethod::SecondDerivative => Ok(max_abs(&gradient(&gradient(
                &self.interval_deviation(&times),
            )))),
        }
    }

    /// Candidate intervals, after scaling onto the reference range, minus
    /// the reference intervals.
    fn interval_deviation(&self, times: &[f64]) -> Vec<f64> {
        let sizes = &self.params.sizes;
        let (lo, hi) = match (sizes.first(), sizes.last()) {
            (Some(&lo), Some(&hi)) => (lo, hi),
            _ => return Vec::new(),
        };
        let scaled = minmax_scale(times, lo, hi);
        diff(&scaled)
            .into_iter()
            .zip(diff(sizes))
            .map(|(c, r)| c - r)
            .collect()
    }
}

fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0, |acc, v| acc.max(v.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ladder::LadderFamily;
    use ndarray::Array1;

    fn params(sizes: &[f64], max_distance: usize) -> LadderParameters {
        LadderParameters {
            family: LadderFamily::Rox,
            sizes: sizes.to_vec(),
            min_height: 50.0,
            min_interpeak_distance: 5,
            max_ladder_trace_distance: max_distance,
            peak_count_padding: 3,
            scoring: ScoringMethod::SplineCurvature,
        }
    }

    /// Narrow triangular spikes at the given times.
    fn spikes(len: usize, peaks: &[(usize, f64)]) -> Array1<f64> {
        let mut trace = Array1::zeros(len);
        for &(t, h) in peaks {
            trace[t] = h;
            trace[t - 1] = h / 2.0;
            trace[t + 1] = h / 2.0;
        }
        trace
    }

    #[test]
    fn test_detect_keeps_tallest_in_time_order() {
        let mut p = params(&[10.0, 20.0], 100);
        p.peak_count_padding = 1;
        let assigner = LadderAssigner::new(p).unwrap();
        let trace = spikes(200, &[(20, 300.0), (50, 80.0), (90, 500.0), (140, 200.0)]);
        // Three kept: the 80 spike is dropped
        assert_eq!(assigner.detect_peaks(trace.view()), vec![20, 90, 140]);
    }

    #[test]
    fn test_assign_skips_spurious_peak() {
        // Ladder at times 100 + 10 * size, one extra artifact between rungs
        let sizes = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0];
        let mut peaks: Vec<(usize, f64)> =
            sizes.iter().map(|&s| (100 + 10 * s as usize, 400.0)).collect();
        peaks.push((345, 300.0));
        peaks.sort_by_key(|p| p.0);
        let trace = spikes(1000, &peaks);

        let assigner = LadderAssigner::new(params(&sizes, 120)).unwrap();
        let assignment = assigner.assign(trace.view()).unwrap();

        assert_eq!(assignment.times, vec![200, 300, 400, 500, 600, 700]);
        assert!(assignment.score < 1e-9);
        assert!(assignment.candidates > 1);
    }

    #[test]
    fn test_first_derivative_prefers_even_spacing() {
        let sizes = [10.0, 20.0, 30.0, 40.0];
        let mut p = params(&sizes, 100);
        p.scoring = ScoringMethod::FirstDerivative;
        let assigner = LadderAssigner::new(p).unwrap();

        let even = assigner.score(&[100, 200, 300, 400]).unwrap();
        let uneven = assigner.score(&[100, 150, 300, 400]).unwrap();
        assert!(even < 1e-9);
        assert!(uneven > even);

        let mut p = params(&sizes, 100);
        p.scoring = ScoringMethod::SecondDerivative;
        let assigner = LadderAssigner::new(p).unwrap();
        assert!(assigner.score(&[100, 200, 300, 400]).unwrap() < 1e-9);
    }

    #[test]
    fn test_too_few_peaks_is_no_combination() {
        let sizes = [10.0, 20.0, 30.0, 40.0, 50.0];
        let trace = spikes(600, &[(100, 400.0), (200, 400.0), (300, 400.0)]);
        let assigner = LadderAssigner::new(params(&sizes, 150)).unwrap();
        let err = assigner.assign(trace.view()).unwrap_err();
        assert!(matches!(err, CefragError::NoCombination(_)));
        assert!(err.is_data_quality());
    }
}
