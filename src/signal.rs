//! One-dimensional peak detection.
//!
//! Local-maximum search with height and distance criteria, topographic
//! prominence, and width at a relative height. The results match the
//! conventions of `scipy.signal` so that peak positions and width windows
//! line up with those produced by common fragment-analysis tooling.

use ndarray::ArrayView1;

/// Criteria for [`find_peaks`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeakCriteria {
    /// Minimum peak height (inclusive).
    pub height: Option<f64>,

    /// Minimum horizontal distance in samples between neighbouring peaks.
    /// Smaller peaks are removed first until the condition holds.
    pub distance: Option<usize>,
}

impl PeakCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    pub fn with_distance(mut self, distance: usize) -> Self {
        self.distance = Some(distance);
        self
    }
}

/// Prominence of a peak and the bases it was measured from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prominence {
    pub prominence: f64,
    pub left_base: usize,
    pub right_base: usize,
}

/// Width of a peak at a relative height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakWidth {
    /// Right minus left interpolated position.
    pub width: f64,
    /// Height at which the width was evaluated.
    pub width_height: f64,
    /// Interpolated left intersection.
    pub left_ip: f64,
    /// Interpolated right intersection.
    pub right_ip: f64,
}

/// Indices of all local maxima. Flat peaks report their (lower) midpoint.
pub fn local_maxima(x: ArrayView1<f64>) -> Vec<usize> {
    let n = x.len();
    let mut peaks = Vec::new();
    if n < 3 {
        return peaks;
    }

    let i_max = n - 1;
    let mut i = 1;
    while i < i_max {
        if x[i - 1] < x[i] {
            let mut i_ahead = i + 1;
            while i_ahead < i_max && x[i_ahead] == x[i] {
                i_ahead += 1;
            }
            if x[i_ahead] < x[i] {
                let left = i;
                let right = i_ahead - 1;
                peaks.push((left + right) / 2);
                i = i_ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// Find peaks satisfying the given criteria, in increasing index order.
///
/// The height criterion is applied before the distance criterion.
pub fn find_peaks(x: ArrayView1<f64>, criteria: &PeakCriteria) -> Vec<usize> {
    let mut peaks = local_maxima(x);

    if let Some(height) = criteria.height {
        peaks.retain(|&p| x[p] >= height);
    }

    if let Some(distance) = criteria.distance {
        peaks = select_by_distance(x, &peaks, distance);
    }

    peaks
}

/// Suppress peaks closer than `distance` to a taller one.
fn select_by_distance(x: ArrayView1<f64>, peaks: &[usize], distance: usize) -> Vec<usize> {
    let n = peaks.len();
    if n < 2 || distance <= 1 {
        return peaks.to_vec();
    }

    let mut keep = vec![true; n];
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| x[peaks[a]].total_cmp(&x[peaks[b]]));

    for &j in order.iter().rev() {
        if !keep[j] {
            continue;
        }

        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < distance {
            keep[k - 1] = false;
            k -= 1;
        }

        let mut k = j + 1;
        while k < n && peaks[k] - peaks[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&p, k)| k.then_some(p))
        .collect()
}

/// Topographic prominence of each peak, searching the whole signal.
pub fn peak_prominences(x: ArrayView1<f64>, peaks: &[usize]) -> Vec<Prominence> {
    peaks
        .iter()
        .map(|&peak| {
            let height = x[peak];

            let mut left_base = peak;
            let mut left_min = height;
            let mut i = peak as isize;
            while i >= 0 && x[i as usize] <= height {
                if x[i as usize] < left_min {
                    left_min = x[i as usize];
                    left_base = i as usize;
                }
                i -= 1;
            }

            let mut right_base = peak;
            let mut right_min = height;
            let mut i = peak;
            while i < x.len() && x[i] <= height {
                if x[i] < right_min {
                    right_min = x[i];
                    right_base = i;
                }
                i += 1;
            }

            Prominence {
                prominence: height - left_min.max(right_min),
                left_base,
                right_base,
            }
        })
        .collect()
}

/// Width of each peak at `rel_height` of its prominence.
///
/// `rel_height = 1.0` measures at the lowest contour line, `0.5` at half
/// prominence. Intersections are linearly interpolated between samples.
pub fn peak_widths(x: ArrayView1<f64>, peaks: &[usize], rel_height: f64) -> Vec<PeakWidth> {
    peak_prominences(x, peaks)
        .into_iter()
        .zip(peaks)
        .map(|(prom, &peak)| {
            let width_height = x[peak] - prom.prominence * rel_height;

            let mut i = peak;
            while prom.left_base < i && width_height < x[i] {
                i -= 1;
            }
            let mut left_ip = i as f64;
            if x[i] < width_height {
                left_ip += (width_height - x[i]) / (x[i + 1] - x[i]);
            }

            let mut i = peak;
            while i < prom.right_base && width_height < x[i] {
                i += 1;
            }
            let mut right_ip = i as f64;
            if x[i] < width_height {
                right_ip -= (width_height - x[i]) / (x[i - 1] - x[i]);
            }

            PeakWidth {
                width: right_ip - left_ip,
                width_height,
                left_ip,
                right_ip,
            }
        })
        .collect()
}
