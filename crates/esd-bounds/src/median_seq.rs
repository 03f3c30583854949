// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bound for dispersion-corrected median-shift objectives.
//!
//! The objective family is `g(k) * u(median) * h(smd / k)` where `g` is
//! a coverage term, `u` a median utility, and `h` rewards a low average
//! absolute deviation from the median. For a refinement of size `k`
//! whose median is the selection value at index `z`, the deviation sum
//! is minimized by the `k` values closest around `z`, so it suffices to
//! scan median indices and window sizes over the sorted selection.
//! Prefix deviation arrays make each window sum O(1).

use esd_core::{EsdError, OptimisticEstimator, SelectionData};

use crate::utility::{CoverageScale, DeviationReduction, ShiftDirection, ShiftUtility};

/// Optimistic estimator for median-shift objectives with a deviation
/// correction term.
///
/// Median indices are visited from the utility's favourable end, high
/// values first for a positive shift and low values first for a
/// negative one, so the scan can stop at the first zero-utility median.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MedianSequenceBound {
    scale: CoverageScale,
    utility: ShiftUtility,
    dispersion: DeviationReduction,
    size_window: Option<usize>,
}

impl MedianSequenceBound {
    /// Exhaustive variant: every admissible window size is tried for
    /// every median index.
    pub fn new(
        scale: CoverageScale,
        utility: ShiftUtility,
        dispersion: DeviationReduction,
    ) -> Self {
        Self {
            scale,
            utility,
            dispersion,
            size_window: None,
        }
    }

    /// Restricts the size scan to `window` steps around the best size of
    /// the previous median index. Cheaper, and exact as long as the best
    /// size drifts slowly between neighbouring medians; with an
    /// adversarial value distribution the result may fall below the
    /// exhaustive bound.
    pub fn with_size_window(mut self, window: usize) -> Result<Self, EsdError> {
        if window == 0 {
            return Err(EsdError::invalid_input(
                "size window must be at least 1 step wide",
            ));
        }
        self.size_window = Some(window);
        Ok(self)
    }
}

impl OptimisticEstimator for MedianSequenceBound {
    fn name(&self) -> &'static str {
        "median-sequence"
    }

    fn estimate(&self, selection: &SelectionData) -> f64 {
        let mut values = selection.target().to_vec();
        values.reverse(); // ascending
        let m = values.len();
        if m == 0 {
            return f64::NEG_INFINITY;
        }
        let left = left_deviations(&values);
        let right = right_deviations(&values);

        let mut best = f64::NEG_INFINITY;
        let mut size_star = 0usize;
        let indices: Box<dyn Iterator<Item = usize>> = match self.utility.direction() {
            ShiftDirection::Negative => Box::new(0..m),
            ShiftDirection::Positive => Box::new((0..m).rev()),
        };
        for z in indices {
            let median_utility = self.utility.at(values[z]);
            if median_utility == 0.0 {
                // Utilities only shrink from here on; every remaining
                // candidate would score zero.
                return best.max(0.0);
            }
            // z has z+1 values at or below it and m-z-1 above it.
            let max_size = (2 * (z + 1)).min(2 * (m - z - 1) + 1);
            let (lo, hi) = match self.size_window {
                Some(window) => (
                    size_star.saturating_sub(window).max(1),
                    (size_star + window).min(max_size),
                ),
                None => (1, max_size),
            };
            let mut best_for_median = f64::NEG_INFINITY;
            for size in lo..=hi {
                let a = z - (size - 1) / 2;
                let b = z + (size - 1).div_ceil(2);
                let smd = window_deviation_sum(&values, &left, &right, z, a, b);
                let value =
                    self.scale.at(size) * median_utility * self.dispersion.at(smd / size as f64);
                if value > best_for_median {
                    size_star = size;
                    best_for_median = value;
                }
                if value > best {
                    best = value;
                }
            }
        }
        best.max(0.0)
    }
}

/// Sum of absolute deviations from `values[z]` over the index window
/// `[a, b]`, assembled from the prefix arrays.
fn window_deviation_sum(
    values: &[f64],
    left: &[f64],
    right: &[f64],
    z: usize,
    a: usize,
    b: usize,
) -> f64 {
    let m = values.len();
    let d_az = values[z] - values[a];
    let d_zb = values[b] - values[z];
    // left[z] counts deviations of all indices below z; subtract the
    // part below a, which is left[a] shifted to the pivot z by the a
    // values it aggregates.
    left[z] - left[a] - a as f64 * d_az + right[z] - right[b] - (m - 1 - b) as f64 * d_zb
}

/// `left[i]` is the sum of `values[i] - values[j]` over all `j < i` of
/// an ascending array.
fn left_deviations(values: &[f64]) -> Vec<f64> {
    let mut deviations = vec![0.0; values.len()];
    for i in 1..values.len() {
        deviations[i] = deviations[i - 1] + i as f64 * (values[i] - values[i - 1]);
    }
    deviations
}

/// `right[i]` is the sum of `values[j] - values[i]` over all `j > i`.
fn right_deviations(values: &[f64]) -> Vec<f64> {
    let m = values.len();
    let mut deviations = vec![0.0; m];
    for i in (0..m.saturating_sub(1)).rev() {
        deviations[i] =
            deviations[i + 1] + (m - i - 1) as f64 * (values[i + 1] - values[i]);
    }
    deviations
}
