//! Peak finding and assay grouping after calibration.

use crate::test_helpers::{rox_config, rox_sample};
use cefrag::error::CefragError;
use cefrag::peaks::{CustomPeakTable, CustomPeakWindow, WhichPeaks};
use cefrag::pipeline::Analyzer;

fn window(which: WhichPeaks) -> CustomPeakWindow {
    CustomPeakWindow {
        name: "TMEM".to_string(),
        start: 130,
        stop: 300,
        amount: 1,
        min_ratio: 0.1,
        which,
        peak_distance: 0.0,
    }
}

fn near(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 0.6
}

#[test]
fn test_automatic_assays_split_by_gap() {
    let sample = rox_sample(
        "auto.fsa",
        &[
            (100.0, 3000.0), // below the search start
            (141.0, 1200.0),
            (150.0, 900.0),
            (156.0, 100.0), // under the height threshold
            (281.0, 2000.0),
            (290.0, 250.0), // under the height threshold
        ],
    );
    let analysis = Analyzer::new(&rox_config()).unwrap().analyze_peaks(&sample).unwrap();

    assert!(analysis.found_peaks());
    let assays = analysis.peaks.assays();
    assert_eq!(assays.len(), 2);
    assert_eq!(assays[0].peaks.len(), 2);
    assert!(near(assays[0].peaks[0].basepairs, 141.0));
    assert!(near(assays[0].peaks[1].basepairs, 150.0));
    assert_eq!(assays[1].peaks.len(), 1);
    assert!(near(assays[1].peaks[0].basepairs, 281.0));

    let rows = analysis.assigned_peaks();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2].assay_name, "2");
}

#[test]
fn test_ratio_filter_within_automatic_assay() {
    let sample = rox_sample("ratio.fsa", &[(200.0, 4000.0), (210.0, 500.0)]);
    let analysis = Analyzer::new(&rox_config()).unwrap().analyze_peaks(&sample).unwrap();
    // 500 / 4000 is below the 0.15 default ratio
    assert_eq!(analysis.peaks.peak_count(), 1);
}

#[test]
fn test_custom_first_keeps_lowest_position() {
    let sample = rox_sample("first.fsa", &[(141.0, 800.0), (281.0, 2000.0)]);
    let table = CustomPeakTable::new(vec![window(WhichPeaks::First)]).unwrap();
    let analysis = Analyzer::new(&rox_config())
        .unwrap()
        .with_custom_table(table)
        .analyze_peaks(&sample)
        .unwrap();

    let assays = analysis.peaks.assays();
    assert_eq!(assays.len(), 1);
    assert_eq!(assays[0].name, "TMEM");
    assert_eq!(assays[0].peaks.len(), 1);
    assert!(near(assays[0].peaks[0].basepairs, 141.0));
}

#[test]
fn test_custom_largest_keeps_tallest() {
    let sample = rox_sample("largest.fsa", &[(141.0, 800.0), (281.0, 2000.0)]);
    let table = CustomPeakTable::new(vec![window(WhichPeaks::Largest)]).unwrap();
    let analysis = Analyzer::new(&rox_config())
        .unwrap()
        .with_custom_table(table)
        .analyze_peaks(&sample)
        .unwrap();

    let peaks = &analysis.peaks.assays()[0].peaks;
    assert_eq!(peaks.len(), 1);
    assert!(near(peaks[0].basepairs, 281.0));
}

#[test]
fn test_custom_peak_distance() {
    let sample = rox_sample("distance.fsa", &[(200.0, 1000.0), (204.0, 900.0), (230.0, 950.0)]);
    let csv = "name,start,stop,amount,min_ratio,which,peak_distance\n\
               MSI,190,260,0,0.1,,10\n";
    let table = CustomPeakTable::parse_csv(csv).unwrap();
    let analysis = Analyzer::new(&rox_config())
        .unwrap()
        .with_custom_table(table)
        .analyze_peaks(&sample)
        .unwrap();

    let peaks = &analysis.peaks.assays()[0].peaks;
    assert_eq!(peaks.len(), 2);
    assert!(near(peaks[1].basepairs, 204.0));
}

#[test]
fn test_invalid_tables_rejected_before_detection() {
    let overlapping = CustomPeakTable::new(vec![
        CustomPeakWindow {
            name: "a".to_string(),
            ..window(WhichPeaks::First)
        },
        CustomPeakWindow {
            name: "b".to_string(),
            start: 250,
            stop: 400,
            ..window(WhichPeaks::First)
        },
    ]);
    assert!(matches!(
        overlapping,
        Err(CefragError::OverlappingInterval { start: 250 })
    ));

    let csv = "name,begin,stop,amount,min_ratio,which,peak_distance\nA,100,200,1,0.1,FIRST,0\n";
    assert!(matches!(
        CustomPeakTable::parse_csv(csv),
        Err(CefragError::WrongColumns { .. })
    ));
}

#[test]
fn test_no_peaks_flag() {
    let sample = rox_sample("empty.fsa", &[(200.0, 120.0)]);
    let analysis = Analyzer::new(&rox_config()).unwrap().analyze_peaks(&sample).unwrap();
    assert!(!analysis.found_peaks());
    assert!(analysis.assigned_peaks().is_empty());
}
