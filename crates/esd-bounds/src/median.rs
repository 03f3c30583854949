// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-size bounds for median-shift objectives.
//!
//! Medians of even-sized groups use the lower middle element
//! throughout, so the median of a size-`k` group is its
//! `ceil(k / 2)`-th smallest value. Among all size-`k` refinements of a
//! selection, the median is extremized by keeping the `k` most extreme
//! values, which turns the bound into a linear scan over sizes against
//! the sorted selection.

use esd_core::{OptimisticEstimator, SelectionData};

use crate::utility::{CoverageScale, ShiftUtility};

/// Bound for positive median-shift objectives. The size-`k` candidate
/// keeps the `k` largest values; its median is the selection's
/// `(floor(k / 2) + 1)`-th largest value.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TopKMedianBound {
    scale: CoverageScale,
    utility: ShiftUtility,
}

impl TopKMedianBound {
    pub fn new(scale: CoverageScale, utility: ShiftUtility) -> Self {
        Self { scale, utility }
    }
}

impl OptimisticEstimator for TopKMedianBound {
    fn name(&self) -> &'static str {
        "top-k-median"
    }

    fn estimate(&self, selection: &SelectionData) -> f64 {
        let values = selection.target();
        let mut best = f64::NEG_INFINITY;
        for size in 1..=values.len() {
            let median = values[size / 2];
            let candidate = self.scale.at(size) * self.utility.at(median);
            if candidate > best {
                best = candidate;
            }
        }
        best
    }
}

/// Bound for negative median-shift objectives. The size-`k` candidate
/// keeps the `k` smallest values instead.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BottomKMedianBound {
    scale: CoverageScale,
    utility: ShiftUtility,
}

impl BottomKMedianBound {
    pub fn new(scale: CoverageScale, utility: ShiftUtility) -> Self {
        Self { scale, utility }
    }
}

impl OptimisticEstimator for BottomKMedianBound {
    fn name(&self) -> &'static str {
        "bottom-k-median"
    }

    fn estimate(&self, selection: &SelectionData) -> f64 {
        let values = selection.target();
        let n = values.len();
        let mut best = f64::NEG_INFINITY;
        for size in 1..=n {
            // ceil(size / 2)-th smallest of the bottom `size` values.
            let median = values[n - size.div_ceil(2)];
            let candidate = self.scale.at(size) * self.utility.at(median);
            if candidate > best {
                best = candidate;
            }
        }
        best
    }
}
