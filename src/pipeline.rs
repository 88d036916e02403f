//! End-to-end analysis of fragment-analysis samples.
//!
//! A sample runs through ladder assignment, calibration, peak finding and,
//! unless only the peak table is wanted, quantification. Samples are
//! independent of each other, so a batch can be analysed in parallel.

use crate::calibration::{CalibratedTrace, CalibrationModel, CalibrationRecipe};
use crate::config::AnalysisConfig;
use crate::error::{CefragError, Result};
use crate::ladder::{LadderAssigner, LadderAssignment};
use crate::peaks::{AssignedPeak, CustomPeakTable, PeakFinder, PeakTable};
use crate::quantify::{AssayFit, QuantifiedPeak, Quantifier};
use ndarray::Array1;
use tracing::{error, info};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// The two traces of one run, indexed by acquisition time.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub file_name: String,
    pub size_standard: Array1<f64>,
    pub trace: Array1<f64>,
}

impl Sample {
    pub fn new(
        file_name: impl Into<String>,
        size_standard: Array1<f64>,
        trace: Array1<f64>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            size_standard,
            trace,
        }
    }
}

/// A sample analysed up to peak grouping.
#[derive(Debug, Clone)]
pub struct PeakAnalysis {
    pub file_name: String,
    pub assignment: LadderAssignment,
    pub calibration: CalibrationModel,
    pub calibrated: CalibratedTrace,
    pub peaks: PeakTable,
}

impl PeakAnalysis {
    pub fn found_peaks(&self) -> bool {
        self.peaks.found_peaks()
    }

    /// Goodness of fit of the calibration on the ladder points.
    pub fn calibration_fit(&self) -> (f64, f64) {
        (self.calibration.mse(), self.calibration.r2())
    }

    pub fn assigned_peaks(&self) -> Vec<AssignedPeak> {
        self.peaks.assigned_peaks()
    }
}

/// A fully analysed sample. Without peaks, `fits` and `quantified` are empty.
#[derive(Debug, Clone)]
pub struct SampleAnalysis {
    pub peaks: PeakAnalysis,
    pub fits: Vec<AssayFit>,
    pub quantified: Vec<QuantifiedPeak>,
}

impl SampleAnalysis {
    pub fn found_peaks(&self) -> bool {
        self.peaks.found_peaks()
    }
}

/// The configured pipeline, reusable across samples.
#[derive(Debug, Clone)]
pub struct Analyzer {
    assigner: LadderAssigner,
    recipe: CalibrationRecipe,
    finder: PeakFinder,
    quantifier: Quantifier,
}

impl Analyzer {
    /// Resolve the config. Unknown ladder or peak model names fail here,
    /// before any sample is touched.
    pub fn new(config: &AnalysisConfig) -> Result<Self> {
        let ladder = config.ladder_parameters()?;
        let recipe = CalibrationRecipe::for_family(ladder.family);
        Ok(Self {
            assigner: LadderAssigner::new(ladder)?,
            recipe,
            finder: PeakFinder::new(config.peak_finder),
            quantifier: Quantifier::new(config.quantification_settings()?),
        })
    }

    /// Group peaks by the windows of a custom peak table.
    pub fn with_custom_table(mut self, table: CustomPeakTable) -> Self {
        self.finder = self.finder.with_custom_table(table);
        self
    }

    pub fn analyze_peaks(&self, sample: &Sample) -> Result<PeakAnalysis> {
        if sample.size_standard.len() != sample.trace.len() {
            return Err(CefragError::DimensionMismatch(format!(
                "{}: size standard has {} samples, trace has {}",
                sample.file_name,
                sample.size_standard.len(),
                sample.trace.len()
            )));
        }

        let assignment = self.assigner.assign(sample.size_standard.view())?;
        let (calibration, calibrated) =
            CalibrationModel::calibrate(&assignment, self.recipe, sample.trace.view())?;
        let peaks = self.finder.find(&calibrated);

        Ok(PeakAnalysis {
            file_name: sample.file_name.clone(),
            assignment,
            calibration,
            calibrated,
            peaks,
        })
    }

    pub fn analyze(&self, sample: &Sample) -> Result<SampleAnalysis> {
        let peaks = self.analyze_peaks(sample)?;
        if !peaks.found_peaks() {
            return Ok(SampleAnalysis {
                peaks,
                fits: Vec::new(),
                quantified: Vec::new(),
            });
        }

        let fits = self.quantifier.fit_all(&peaks.peaks)?;
        let quantified = fits
            .iter()
            .flat_map(|fit| fit.rows(&peaks.file_name))
            .collect::<Vec<_>>();
        info!(
            file = peaks.file_name.as_str(),
            assays = fits.len(),
            peaks = quantified.len(),
            "sample quantified"
        );
        Ok(SampleAnalysis {
            peaks,
            fits,
            quantified,
        })
    }

    /// Analyse independent samples. A failing sample is logged and reported
    /// in its own slot; the others are unaffected.
    pub fn analyze_batch(&self, samples: &[Sample]) -> Vec<Result<SampleAnalysis>> {
        #[cfg(feature = "parallel")]
        let results = samples.par_iter().map(|s| self.analyze_logged(s)).collect();

        #[cfg(not(feature = "parallel"))]
        let results = samples.iter().map(|s| self.analyze_logged(s)).collect();

        results
    }

    fn analyze_logged(&self, sample: &Sample) -> Result<SampleAnalysis> {
        self.analyze(sample).map_err(|err| {
            error!(
                file = sample.file_name.as_str(),
                data_quality = err.is_data_quality(),
                "sample could not be analysed: {}",
                err
            );
            err
        })
    }
}

/// Analyse one sample up to peak grouping.
pub fn analyze_peaks(config: &AnalysisConfig, sample: &Sample) -> Result<PeakAnalysis> {
    Analyzer::new(config)?.analyze_peaks(sample)
}

/// Analyse one sample through quantification.
pub fn analyze(config: &AnalysisConfig, sample: &Sample) -> Result<SampleAnalysis> {
    Analyzer::new(config)?.analyze(sample)
}

/// Analyse many samples with one config.
pub fn analyze_batch(
    config: &AnalysisConfig,
    samples: &[Sample],
) -> Result<Vec<Result<SampleAnalysis>>> {
    Ok(Analyzer::new(config)?.analyze_batch(samples))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_before_any_sample() {
        let mut config = AnalysisConfig::default();
        config.quantification.peak_model = "spline".to_string();
        assert!(matches!(
            Analyzer::new(&config),
            Err(CefragError::NotImplemented(_))
        ));
    }

    #[test]
    fn test_trace_length_mismatch() {
        let sample = Sample::new("bad.fsa", Array1::zeros(100), Array1::zeros(90));
        let err = analyze_peaks(&AnalysisConfig::default(), &sample).unwrap_err();
        assert!(matches!(err, CefragError::DimensionMismatch(_)));
    }

    #[test]
    fn test_flat_size_standard_fails_per_sample() {
        let flat = Sample::new("flat.fsa", Array1::zeros(500), Array1::zeros(500));
        let results = analyze_batch(&AnalysisConfig::default(), &[flat.clone(), flat]).unwrap();
        assert_eq!(results.len(), 2);
        for result in results {
            let err = result.unwrap_err();
            assert!(matches!(err, CefragError::NoCombination(_)));
            assert!(err.is_data_quality());
        }
    }
}
