//! Caller-defined assay windows.
//!
//! A custom peak table names basepair windows and how many peaks to keep in
//! each. Tables are validated on construction, so a [`CustomPeakTable`] that
//! exists never has overlapping windows.

use super::grouping;
use super::PeakRecord;
use crate::error::{CefragError, Result};
use nom::{
    branch::alt,
    bytes::complete::take_while,
    character::complete::{char, line_ending},
    multi::separated_list1,
    sequence::delimited,
    IResult, Parser,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Columns a custom peak table must have, in canonical order.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "name",
    "start",
    "stop",
    "amount",
    "min_ratio",
    "which",
    "peak_distance",
];

/// Which peaks of a window are kept when `amount` limits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WhichPeaks {
    /// The tallest peaks.
    #[default]
    Largest,
    /// The peaks with the lowest basepair positions.
    First,
}

impl fmt::Display for WhichPeaks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WhichPeaks::Largest => f.write_str("LARGEST"),
            WhichPeaks::First => f.write_str("FIRST"),
        }
    }
}

impl FromStr for WhichPeaks {
    type Err = CefragError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "" | "LARGEST" => Ok(WhichPeaks::Largest),
            "FIRST" => Ok(WhichPeaks::First),
            other => Err(CefragError::InvalidCustomPeaks(format!(
                "'which' must be LARGEST or FIRST, got '{}'",
                other
            ))),
        }
    }
}

/// One named basepair window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomPeakWindow {
    pub name: String,
    pub start: i64,
    pub stop: i64,
    /// Maximum number of peaks to keep; 0 keeps every peak.
    pub amount: usize,
    pub min_ratio: f64,
    pub which: WhichPeaks,
    /// Maximum basepair gap to the preceding peak; 0 disables the check.
    pub peak_distance: f64,
}

impl CustomPeakWindow {
    /// Apply the window to peaks detected over the whole search region.
    pub fn select(&self, peaks: &[PeakRecord]) -> Vec<PeakRecord> {
        let inside = grouping::within(peaks, self.start as f64, self.stop as f64);
        if inside.is_empty() {
            return inside;
        }
        let mut kept = grouping::ratio_filter(&inside, self.min_ratio);
        if self.amount > 0 {
            kept = match self.which {
                WhichPeaks::Largest => grouping::largest(&kept, self.amount),
                WhichPeaks::First => grouping::first(&kept, self.amount),
            };
        }
        if self.peak_distance != 0.0 {
            kept = grouping::distance_filter(&kept, self.peak_distance);
        }
        kept
    }

    fn overlap_start(&self, other: &CustomPeakWindow) -> Option<i64> {
        let lo = self.start.max(other.start);
        let hi = self.stop.min(other.stop);
        (lo < hi).then_some(lo)
    }
}

/// A validated list of custom assay windows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomPeakTable {
    windows: Vec<CustomPeakWindow>,
}

impl CustomPeakTable {
    /// Validate the windows.
    ///
    /// Fails with [`CefragError::OverlappingInterval`] when two `[start, stop)`
    /// windows share a position. The reported value is the lowest shared
    /// position of the first window (in table order) that overlaps an
    /// earlier one.
    pub fn new(windows: Vec<CustomPeakWindow>) -> Result<Self> {
        for (j, later) in windows.iter().enumerate() {
            let first_shared = windows[..j]
                .iter()
                .filter_map(|earlier| earlier.overlap_start(later))
                .min();
            if let Some(start) = first_shared {
                warn!(
                    window = later.name.as_str(),
                    start, "overlapping intervals in custom peak table"
                );
                return Err(CefragError::OverlappingInterval { start });
            }
        }
        Ok(Self { windows })
    }

    /// Parse a comma-separated table with a header row.
    ///
    /// The header must name exactly the [`REQUIRED_COLUMNS`], in any order.
    /// Empty numeric cells read as 0 and an empty `which` as `LARGEST`.
    /// Fields may be wrapped in double quotes.
    pub fn parse_csv(input: &str) -> Result<Self> {
        let (rest, records) = records(input)
            .map_err(|e| CefragError::InvalidCustomPeaks(format!("{}", e)))?;
        if !rest.trim().is_empty() {
            return Err(CefragError::InvalidCustomPeaks(format!(
                "unparsed input: '{}'",
                rest
            )));
        }

        let mut records = records
            .into_iter()
            .filter(|record| record.iter().any(|field| !field.trim().is_empty()));
        let header: Vec<String> = records
            .next()
            .map(|record| record.iter().map(|f| f.trim().to_string()).collect())
            .unwrap_or_default();
        let columns = ColumnIndex::from_header(&header)?;

        let windows = records
            .enumerate()
            .map(|(row, record)| columns.window(row + 1, &record))
            .collect::<Result<Vec<_>>>()?;
        Self::new(windows)
    }

    pub fn windows(&self) -> &[CustomPeakWindow] {
        &self.windows
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

/// Positions of the required columns in a header row.
struct ColumnIndex {
    positions: [usize; REQUIRED_COLUMNS.len()],
    width: usize,
}

impl ColumnIndex {
    fn from_header(header: &[String]) -> Result<Self> {
        let mut found: Vec<&str> = header.iter().map(String::as_str).collect();
        found.sort_unstable();
        let mut expected = REQUIRED_COLUMNS.to_vec();
        expected.sort_unstable();

        if found != expected {
            warn!(?header, expected = ?REQUIRED_COLUMNS, "wrong columns in custom peak table");
            return Err(CefragError::WrongColumns {
                found: header.to_vec(),
                expected: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            });
        }

        let mut positions = [0; REQUIRED_COLUMNS.len()];
        for (slot, column) in positions.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = header.iter().position(|h| h == column).unwrap_or_default();
        }
        Ok(Self {
            positions,
            width: header.len(),
        })
    }

    fn window(&self, row: usize, record: &[&str]) -> Result<CustomPeakWindow> {
        if record.len() != self.width {
            return Err(CefragError::InvalidCustomPeaks(format!(
                "row {} has {} fields, expected {}",
                row,
                record.len(),
                self.width
            )));
        }
        let cell = |column: usize| record[self.positions[column]].trim();

        Ok(CustomPeakWindow {
            name: cell(0).to_string(),
            start: number(row, REQUIRED_COLUMNS[1], cell(1))?,
            stop: number(row, REQUIRED_COLUMNS[2], cell(2))?,
            amount: number(row, REQUIRED_COLUMNS[3], cell(3))?,
            min_ratio: number(row, REQUIRED_COLUMNS[4], cell(4))?,
            which: cell(5).parse()?,
            peak_distance: number(row, REQUIRED_COLUMNS[6], cell(6))?,
        })
    }
}

fn number<T>(row: usize, column: &str, cell: &str) -> Result<T>
where
    T: FromStr + Default,
{
    if cell.is_empty() {
        return Ok(T::default());
    }
    cell.parse().map_err(|_| {
        CefragError::InvalidCustomPeaks(format!(
            "row {}: '{}' is not a valid {}",
            row, cell, column
        ))
    })
}

// CSV grammar

fn field(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
        take_while(|c: char| c != ',' && c != '\n' && c != '\r'),
    ))
    .parse(input)
}

fn record(input: &str) -> IResult<&str, Vec<&str>> {
    separated_list1(char(','), field).parse(input)
}

fn records(input: &str) -> IResult<&str, Vec<Vec<&str>>> {
    separated_list1(line_ending, record).parse(input)
}
