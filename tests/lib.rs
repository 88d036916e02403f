//! Main test file for cefrag
//!
//! This file organizes and includes all test modules for the library.

// Least-squares fitting tests
mod fitting;

// Fragment-analysis pipeline tests
mod analysis;

/// Test helpers - synthetic runs with a known time to basepair map
pub mod test_helpers {
    use cefrag::config::AnalysisConfig;
    use cefrag::ladder::LadderFamily;
    use cefrag::pipeline::Sample;
    use ndarray::Array1;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rand_distr::{Distribution, Normal};

    /// Samples per trace.
    pub const TRACE_LEN: usize = 3600;

    /// Peak width in samples.
    pub const SIGMA: f64 = 3.0;

    /// Acquisition time of a fragment size. Slightly convex, like real runs.
    pub fn time_at(bp: f64) -> f64 {
        1000.0 + 3.8 * bp + 0.001 * bp * bp
    }

    /// Rounded acquisition times of the ROX ladder rungs.
    pub fn ladder_times() -> Vec<usize> {
        LadderFamily::Rox
            .definition()
            .sizes
            .iter()
            .map(|&bp| time_at(bp).round() as usize)
            .collect()
    }

    /// Sum of Gaussian peaks centred at integer sample positions.
    pub fn gaussian_trace(peaks: &[(usize, f64)]) -> Array1<f64> {
        Array1::from_shape_fn(TRACE_LEN, |t| {
            peaks
                .iter()
                .map(|&(center, height)| {
                    let z = (t as f64 - center as f64) / SIGMA;
                    height * (-0.5 * z * z).exp()
                })
                .sum()
        })
    }

    /// ROX size standard with a primer artifact before the ladder and a
    /// spurious peak between two rungs.
    pub fn size_standard() -> Array1<f64> {
        let mut peaks: Vec<(usize, f64)> = ladder_times().into_iter().map(|t| (t, 1500.0)).collect();
        peaks.push((700, 4000.0));
        peaks.push((time_at(120.0).round() as usize, 700.0));
        gaussian_trace(&peaks)
    }

    /// Sample channel with peaks given as (basepairs, height).
    pub fn sample_trace(peaks: &[(f64, f64)]) -> Array1<f64> {
        let peaks: Vec<(usize, f64)> = peaks
            .iter()
            .map(|&(bp, height)| (time_at(bp).round() as usize, height))
            .collect();
        gaussian_trace(&peaks)
    }

    /// Add seeded Gaussian noise.
    pub fn with_noise(trace: &Array1<f64>, sd: f64, seed: u64) -> Array1<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let normal = Normal::new(0.0, sd).unwrap();
        trace.mapv(|v| v + normal.sample(&mut rng))
    }

    pub fn rox_sample(file_name: &str, peaks: &[(f64, f64)]) -> Sample {
        Sample::new(file_name, size_standard(), sample_trace(peaks))
    }

    pub fn rox_config() -> AnalysisConfig {
        AnalysisConfig {
            ladder: "ROX".to_string(),
            ..Default::default()
        }
    }
}
