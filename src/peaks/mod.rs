//! Peak detection on the calibrated sample trace and grouping into assays.
//!
//! Peaks are searched above a basepair offset and a minimum height. They are
//! then grouped either automatically, by basepair gaps, or by a
//! [`CustomPeakTable`] of named windows.

use crate::calibration::{CalibratedPoint, CalibratedTrace};
use crate::error::{CefragError, Result};
use crate::signal::{find_peaks, PeakCriteria};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

mod custom;
pub mod grouping;

pub use custom::{CustomPeakTable, CustomPeakWindow, WhichPeaks, REQUIRED_COLUMNS};

/// A peak detected in the sample trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeakRecord {
    /// Acquisition time index in the raw trace.
    pub time: usize,
    /// Index within the search region.
    pub position: usize,
    pub basepairs: f64,
    /// Raw intensity at the peak.
    pub height: f64,
}

/// A group of peaks analysed together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assay {
    /// 1-based position among the assays of the sample.
    pub number: usize,
    pub name: String,
    /// Peaks in the order they were selected.
    pub peaks: Vec<PeakRecord>,
}

/// One row of the raw assigned-peak table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignedPeak {
    pub assay_number: usize,
    pub assay_name: String,
    pub peak_name: String,
    pub time: usize,
    pub basepairs: f64,
    pub peak_height: f64,
}

/// Settings of the peak search and of automatic grouping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakFinderSettings {
    /// Automatic-mode ratio filter against the tallest peak of the assay.
    pub min_ratio: f64,
    /// Peaks are searched only above this basepair value.
    pub search_peaks_start: f64,
    /// Minimum raw intensity of a sample peak.
    pub peak_height: f64,
    /// Basepair gap that starts a new automatic assay.
    pub distance_between_assays: f64,
}

impl Default for PeakFinderSettings {
    fn default() -> Self {
        Self {
            min_ratio: 0.15,
            search_peaks_start: 110.0,
            peak_height: 350.0,
            distance_between_assays: 15.0,
        }
    }
}

/// Detected peaks grouped into assays, together with the search region they
/// were found in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakTable {
    region: Vec<CalibratedPoint>,
    assays: Vec<Assay>,
}

impl PeakTable {
    /// Whether any peak survived filtering.
    pub fn found_peaks(&self) -> bool {
        self.assays.iter().any(|a| !a.peaks.is_empty())
    }

    pub fn assays(&self) -> &[Assay] {
        &self.assays
    }

    pub fn assay_count(&self) -> usize {
        self.assays.len()
    }

    /// The assay at a 0-based index.
    pub fn assay(&self, index: usize) -> Result<&Assay> {
        self.assays
            .get(index)
            .ok_or(CefragError::AssayIndexOutOfRange {
                index,
                count: self.assays.len(),
            })
    }

    pub fn peak_count(&self) -> usize {
        self.assays.iter().map(|a| a.peaks.len()).sum()
    }

    /// Calibrated points above the search start, in time order.
    pub fn region(&self) -> &[CalibratedPoint] {
        &self.region
    }

    /// Raw intensities of the search region.
    pub fn region_intensities(&self) -> Array1<f64> {
        self.region.iter().map(|p| p.intensity).collect()
    }

    /// The raw assigned-peak table. Peak names restart at 1 in every assay.
    pub fn assigned_peaks(&self) -> Vec<AssignedPeak> {
        self.assays
            .iter()
            .flat_map(|assay| {
                assay.peaks.iter().enumerate().map(move |(i, peak)| AssignedPeak {
                    assay_number: assay.number,
                    assay_name: assay.name.clone(),
                    peak_name: format!("{}", i + 1),
                    time: peak.time,
                    basepairs: peak.basepairs,
                    peak_height: peak.height,
                })
            })
            .collect()
    }
}

/// Finds and groups the peaks of a calibrated sample trace.
#[derive(Debug, Clone, Default)]
pub struct PeakFinder {
    settings: PeakFinderSettings,
    custom: Option<CustomPeakTable>,
}

impl PeakFinder {
    /// A finder in automatic grouping mode.
    pub fn new(settings: PeakFinderSettings) -> Self {
        Self {
            settings,
            custom: None,
        }
    }

    /// Switch to custom grouping with a validated table.
    pub fn with_custom_table(mut self, table: CustomPeakTable) -> Self {
        self.custom = Some(table);
        self
    }

    pub fn settings(&self) -> &PeakFinderSettings {
        &self.settings
    }

    pub fn custom_table(&self) -> Option<&CustomPeakTable> {
        self.custom.as_ref()
    }

    pub fn find(&self, calibrated: &CalibratedTrace) -> PeakTable {
        let region: Vec<CalibratedPoint> = calibrated
            .points()
            .iter()
            .filter(|p| p.basepairs > self.settings.search_peaks_start)
            .copied()
            .collect();
        let detected = self.detect(&region);
        debug!(
            region = region.len(),
            detected = detected.len(),
            "searched sample trace for peaks"
        );

        let groups: Vec<(String, Vec<PeakRecord>)> = match &self.custom {
            Some(table) => table
                .windows()
                .iter()
                .map(|w| (w.name.clone(), w.select(&detected)))
                .collect(),
            None => grouping::split_by_gap(&detected, self.settings.distance_between_assays)
                .into_iter()
                .map(|group| grouping::ratio_filter(&group, self.settings.min_ratio))
                .enumerate()
                .map(|(i, peaks)| ((i + 1).to_string(), peaks))
                .collect(),
        };

        let assays: Vec<Assay> = groups
            .into_iter()
            .filter(|(_, peaks)| !peaks.is_empty())
            .enumerate()
            .map(|(i, (name, peaks))| Assay {
                number: i + 1,
                name,
                peaks,
            })
            .collect();

        let table = PeakTable { region, assays };
        if table.found_peaks() {
            info!(
                assays = table.assay_count(),
                peaks = table.peak_count(),
                "grouped sample peaks"
            );
        } else {
            warn!("no peaks found");
        }
        table
    }

    fn detect(&self, region: &[CalibratedPoint]) -> Vec<PeakRecord> {
        let intensities: Array1<f64> = region.iter().map(|p| p.intensity).collect();
        let criteria = PeakCriteria::new().with_height(self.settings.peak_height);
        find_peaks(intensities.view(), &criteria)
            .into_iter()
            .map(|position| {
                let point = region[position];
                PeakRecord {
                    time: point.time,
                    position,
                    basepairs: point.basepairs,
                    height: point.intensity,
                }
            })
            .collect()
    }
}
