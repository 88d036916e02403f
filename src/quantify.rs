//! Peak-shape fitting and per-assay quotients.
//!
//! Every grouped peak gets a width window measured on the raw intensities of
//! the search region. The window is widened outward to whole samples and
//! padded, then a peak shape is fitted to intensity against time inside it.
//! The fitted amplitudes of an assay give its quotient.

use crate::error::Result;
use crate::models::PeakShape;
use crate::peaks::{Assay, PeakTable};
use crate::signal::peak_widths;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::debug;

/// Settings of the quantification stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantificationSettings {
    pub peak_model: PeakShape,
    /// Basepair cutoff that reverses the quotient of two-peak assays whose
    /// fit windows lie below it.
    pub cutoff: Option<f64>,
    /// Relative height at which peak widths are measured.
    pub rel_height: f64,
    /// Samples added on both sides of a width window.
    pub padding: usize,
}

impl Default for QuantificationSettings {
    fn default() -> Self {
        Self {
            peak_model: PeakShape::Gauss,
            cutoff: None,
            rel_height: 0.95,
            padding: 4,
        }
    }
}

/// A fitted peak with its window.
#[derive(Debug, Clone)]
pub struct FittedPeak {
    pub peak_name: String,
    /// Window in search-region positions.
    pub window: Range<usize>,
    /// Acquisition times of the window.
    pub x: Array1<f64>,
    /// Raw intensities of the window.
    pub y: Array1<f64>,
    pub best_fit: Array1<f64>,
    /// Basepairs of the tallest raw sample in the window.
    pub basepairs: f64,
    pub peak_height: f64,
    /// Fitted curve at the tallest raw sample.
    pub fitted_peak_height: f64,
    /// Fitted amplitude.
    pub area: f64,
    /// R-squared truncated to three decimals.
    pub r_value: f64,
    pub report: String,
}

/// The fits of one assay and its quotient.
#[derive(Debug, Clone)]
pub struct AssayFit {
    pub assay_number: usize,
    pub assay_name: String,
    pub model: PeakShape,
    pub peaks: Vec<FittedPeak>,
    pub quotient: f64,
}

impl AssayFit {
    /// Output rows, one per peak.
    pub fn rows(&self, file_name: &str) -> Vec<QuantifiedPeak> {
        self.peaks
            .iter()
            .map(|peak| QuantifiedPeak {
                file_name: file_name.to_string(),
                assay_number: self.assay_number,
                assay_name: self.assay_name.clone(),
                peak_name: peak.peak_name.clone(),
                basepairs: peak.basepairs,
                peak_height: peak.peak_height,
                fitted_peak_height: peak.fitted_peak_height,
                area: peak.area,
                r_value: peak.r_value,
                quotient: self.quotient,
                peak_number: self.peaks.len(),
                model: self.model.as_str().to_string(),
            })
            .collect()
    }
}

/// One row of the quantified peak table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantifiedPeak {
    pub file_name: String,
    pub assay_number: usize,
    pub assay_name: String,
    pub peak_name: String,
    pub basepairs: f64,
    pub peak_height: f64,
    pub fitted_peak_height: f64,
    pub area: f64,
    pub r_value: f64,
    pub quotient: f64,
    pub peak_number: usize,
    pub model: String,
}

/// Quotient of an assay from its fitted amplitudes in basepair order.
///
/// One peak gives 0. Two peaks give the second over the first, or the first
/// over the second when a cutoff is set and `mean_basepairs` lies below it.
/// More peaks give the last over the mean of the others.
pub fn quotient(areas: &[f64], mean_basepairs: f64, cutoff: Option<f64>) -> f64 {
    match areas {
        [] | [_] => 0.0,
        [first, second] => match cutoff {
            Some(cutoff) if mean_basepairs < cutoff => first / second,
            _ => second / first,
        },
        [others @ .., last] => {
            let mean = others.iter().sum::<f64>() / others.len() as f64;
            last / mean
        }
    }
}

/// R-squared as reported with three truncated decimals.
pub fn truncate_r_value(r_squared: f64) -> f64 {
    (r_squared * 1000.0).trunc() / 1000.0
}

/// Fits peak shapes to the assays of a [`PeakTable`].
#[derive(Debug, Clone, Default)]
pub struct Quantifier {
    settings: QuantificationSettings,
}

impl Quantifier {
    pub fn new(settings: QuantificationSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &QuantificationSettings {
        &self.settings
    }

    /// Padded fit window of every peak of an assay, in search-region positions.
    pub fn windows(&self, table: &PeakTable, assay: &Assay) -> Vec<Range<usize>> {
        let intensities = table.region_intensities();
        let positions: Vec<usize> = assay.peaks.iter().map(|p| p.position).collect();
        let len = intensities.len();

        peak_widths(intensities.view(), &positions, self.settings.rel_height)
            .into_iter()
            .map(|w| {
                let left = w.left_ip.floor().max(0.0) as usize;
                let right = w.right_ip.ceil() as usize;
                let start = left.saturating_sub(self.settings.padding);
                let end = (right + self.settings.padding).min(len);
                start..end
            })
            .collect()
    }

    /// Fit the assay at a 0-based index.
    pub fn fit_assay(&self, table: &PeakTable, index: usize) -> Result<AssayFit> {
        let assay = table.assay(index)?;
        let region = table.region();
        let model = self.settings.peak_model;

        let mut peaks = Vec::with_capacity(assay.peaks.len());
        let mut window_basepairs = Vec::new();
        for (i, window) in self.windows(table, assay).into_iter().enumerate() {
            let points = &region[window.clone()];
            let x: Array1<f64> = points.iter().map(|p| p.time as f64).collect();
            let y: Array1<f64> = points.iter().map(|p| p.intensity).collect();
            window_basepairs.extend(points.iter().map(|p| p.basepairs));

            let peak = model.fit(&x, &y)?;
            let area = peak.area;
            let fit = peak.result;

            // First sample at the window maximum
            let top = y
                .iter()
                .enumerate()
                .fold(0, |best, (j, &v)| if v > y[best] { j } else { best });

            let peak_name = format!("Peak {}", i + 1);
            let report = format!("[[Model]]\n    {} ({})\n{}", model, peak_name, fit);
            peaks.push(FittedPeak {
                peak_name,
                basepairs: points[top].basepairs,
                peak_height: y[top],
                fitted_peak_height: fit.best_fit[top],
                area,
                r_value: truncate_r_value(fit.r_squared),
                report,
                window,
                best_fit: fit.best_fit,
                x,
                y,
            });
        }

        let areas: Vec<f64> = peaks.iter().map(|p| p.area).collect();
        let mean_basepairs = if window_basepairs.is_empty() {
            f64::NAN
        } else {
            window_basepairs.iter().sum::<f64>() / window_basepairs.len() as f64
        };
        let quotient = quotient(&areas, mean_basepairs, self.settings.cutoff);
        debug!(
            assay = assay.name.as_str(),
            peaks = peaks.len(),
            quotient,
            "fitted assay"
        );

        Ok(AssayFit {
            assay_number: assay.number,
            assay_name: assay.name.clone(),
            model,
            peaks,
            quotient,
        })
    }

    /// Fit every assay of the table.
    pub fn fit_all(&self, table: &PeakTable) -> Result<Vec<AssayFit>> {
        (0..table.assay_count())
            .map(|index| self.fit_assay(table, index))
            .collect()
    }

    /// The quantified peak table of a sample.
    pub fn quantify(&self, table: &PeakTable, file_name: &str) -> Result<Vec<QuantifiedPeak>> {
        Ok(self
            .fit_all(table)?
            .iter()
            .flat_map(|fit| fit.rows(file_name))
            .collect())
    }
}
