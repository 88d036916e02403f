//! Peak-shape fits against noisy synthetic peaks.

use approx::assert_relative_eq;
use cefrag::model::{fit, Model};
use cefrag::models::{GaussianModel, PeakModel, PeakShape, VoigtModel};
use ndarray::Array1;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

const SQRT_2PI: f64 = 2.5066282746310002;

/// Area-normalised Gaussian with seeded noise.
fn noisy_gaussian(area: f64, center: f64, sigma: f64, noise: f64, seed: u64) -> (Array1<f64>, Array1<f64>) {
    let x = Array1::range(center - 15.0, center + 16.0, 1.0);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let normal = Normal::new(0.0, noise).unwrap();
    let y = x.mapv(|v: f64| {
        let z = (v - center) / sigma;
        area / (sigma * SQRT_2PI) * (-0.5 * z * z).exp() + normal.sample(&mut rng)
    });
    (x, y)
}

#[test]
fn test_gaussian_recovers_parameters_under_noise() {
    let (x, y) = noisy_gaussian(6000.0, 1800.0, 3.0, 5.0, 11);
    let mut model = GaussianModel::new("").unwrap();
    model.guess_parameters(&x, &y).unwrap();
    let result = fit(&mut model, &x, &y).unwrap();

    assert!(result.success, "{}", result.message);
    let params = model.parameters();
    assert_relative_eq!(params.value_of("amplitude").unwrap(), 6000.0, max_relative = 0.02);
    assert_relative_eq!(params.value_of("center").unwrap(), 1800.0, epsilon = 0.05);
    assert_relative_eq!(params.value_of("sigma").unwrap(), 3.0, max_relative = 0.02);
    assert!(result.r_squared > 0.99);

    // Derived quantities follow from the fitted parameters
    assert_relative_eq!(model.area().unwrap(), params.value_of("amplitude").unwrap());
    assert_relative_eq!(model.fwhm().unwrap(), 2.3548200 * params.value_of("sigma").unwrap(), epsilon = 1e-6);
}

#[test]
fn test_fit_is_reproducible() {
    let (x, y) = noisy_gaussian(6000.0, 1800.0, 3.0, 5.0, 3);
    let first = PeakShape::Voigt.fit(&x, &y).unwrap();
    let second = PeakShape::Voigt.fit(&x, &y).unwrap();
    assert_eq!(first.result.best_fit, second.result.best_fit);
    assert_eq!(first.area, second.area);
    assert_eq!(first.to_string(), second.to_string());
}

#[test]
fn test_voigt_fits_gaussian_peak_closely() {
    let (x, y) = noisy_gaussian(6000.0, 1800.0, 3.0, 2.0, 5);
    let mut model = VoigtModel::new("").unwrap();
    model.guess_parameters(&x, &y).unwrap();
    let result = fit(&mut model, &x, &y).unwrap();

    assert!(result.r_squared > 0.95);
    assert_relative_eq!(model.parameters().value_of("center").unwrap(), 1800.0, epsilon = 0.1);
    assert!(model.gamma().unwrap() > 0.0);
}

#[test]
fn test_report_mentions_each_parameter() {
    let (x, y) = noisy_gaussian(3000.0, 500.0, 2.5, 1.0, 9);
    let report = PeakShape::Lorentzian.fit(&x, &y).unwrap().to_string();
    for name in ["amplitude", "center", "sigma", "R-squared"] {
        assert!(report.contains(name), "missing {} in\n{}", name, report);
    }
}
