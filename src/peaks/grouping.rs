//! Filtering stages for grouping detected peaks into assays.
//!
//! Every stage takes a slice of peak records and returns a new collection,
//! so each filtering policy can be checked on its own.

use super::PeakRecord;

/// Split peaks (in time order) into groups, starting a new group whenever the
/// basepair gap to the previous peak exceeds `max_gap`.
pub fn split_by_gap(peaks: &[PeakRecord], max_gap: f64) -> Vec<Vec<PeakRecord>> {
    let mut groups: Vec<Vec<PeakRecord>> = Vec::new();
    let mut previous: Option<f64> = None;

    for peak in peaks {
        let opens = match previous {
            None => true,
            Some(bp) => peak.basepairs - bp > max_gap,
        };
        match groups.last_mut() {
            Some(group) if !opens => group.push(*peak),
            _ => groups.push(vec![*peak]),
        }
        previous = Some(peak.basepairs);
    }
    groups
}

/// Keep peaks whose height is strictly above `min_ratio` of the tallest one.
pub fn ratio_filter(peaks: &[PeakRecord], min_ratio: f64) -> Vec<PeakRecord> {
    let max = peaks
        .iter()
        .map(|p| p.height)
        .fold(f64::NEG_INFINITY, f64::max);
    peaks
        .iter()
        .filter(|p| p.height / max > min_ratio)
        .copied()
        .collect()
}

/// Peaks with basepairs strictly between `start` and `stop`.
pub fn within(peaks: &[PeakRecord], start: f64, stop: f64) -> Vec<PeakRecord> {
    peaks
        .iter()
        .filter(|p| start < p.basepairs && p.basepairs < stop)
        .copied()
        .collect()
}

/// Keep peaks whose descending height rank is at most `amount`.
///
/// Ties share the average of the ranks they span, so two equally tall peaks
/// competing for the last place are both dropped. Order is preserved.
pub fn largest(peaks: &[PeakRecord], amount: usize) -> Vec<PeakRecord> {
    peaks
        .iter()
        .filter(|p| {
            let taller = peaks.iter().filter(|q| q.height > p.height).count();
            let equal = peaks.iter().filter(|q| q.height == p.height).count();
            let rank = taller as f64 + (equal as f64 + 1.0) / 2.0;
            rank <= amount as f64
        })
        .copied()
        .collect()
}

/// The first `amount` peaks by basepair position.
pub fn first(peaks: &[PeakRecord], amount: usize) -> Vec<PeakRecord> {
    let mut sorted = peaks.to_vec();
    sorted.sort_by(|a, b| a.basepairs.total_cmp(&b.basepairs));
    sorted.truncate(amount);
    sorted
}

/// Drop peaks further than `max_distance` basepairs from the preceding peak.
///
/// Distances are taken against the input sequence, the first peak counting
/// as distance 0.
pub fn distance_filter(peaks: &[PeakRecord], max_distance: f64) -> Vec<PeakRecord> {
    let mut kept = Vec::with_capacity(peaks.len());
    for (i, peak) in peaks.iter().enumerate() {
        let distance = if i == 0 {
            0.0
        } else {
            peak.basepairs - peaks[i - 1].basepairs
        };
        if distance <= max_distance {
            kept.push(*peak);
        }
    }
    kept
}
