// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-size bounds for mean-shift objectives.
//!
//! For an objective `g(k) * u(mean)` with non-decreasing coverage term
//! `g` and monotone utility `u`, the best refinement of size `k` keeps
//! the `k` most extreme values of the selection. Scanning all sizes and
//! keeping running means gives a tight bound in one pass over the
//! sorted selection.

use esd_core::{OptimisticEstimator, SelectionData};

use crate::utility::{CoverageScale, ShiftUtility};

/// Bound for positive mean-shift objectives: for every size `k` the
/// candidate refinement is the `k` largest selected values.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TopKMeanBound {
    scale: CoverageScale,
    utility: ShiftUtility,
}

impl TopKMeanBound {
    pub fn new(scale: CoverageScale, utility: ShiftUtility) -> Self {
        Self { scale, utility }
    }
}

impl OptimisticEstimator for TopKMeanBound {
    fn name(&self) -> &'static str {
        "top-k-mean"
    }

    fn estimate(&self, selection: &SelectionData) -> f64 {
        best_over_prefixes(selection.target().iter().copied(), self.scale, self.utility)
    }
}

/// Bound for negative mean-shift objectives: the candidate of size `k`
/// keeps the `k` smallest selected values instead.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BottomKMeanBound {
    scale: CoverageScale,
    utility: ShiftUtility,
}

impl BottomKMeanBound {
    pub fn new(scale: CoverageScale, utility: ShiftUtility) -> Self {
        Self { scale, utility }
    }
}

impl OptimisticEstimator for BottomKMeanBound {
    fn name(&self) -> &'static str {
        "bottom-k-mean"
    }

    fn estimate(&self, selection: &SelectionData) -> f64 {
        best_over_prefixes(
            selection.target().iter().rev().copied(),
            self.scale,
            self.utility,
        )
    }
}

fn best_over_prefixes(
    values: impl Iterator<Item = f64>,
    scale: CoverageScale,
    utility: ShiftUtility,
) -> f64 {
    let mut best = f64::NEG_INFINITY;
    let mut running_mean = 0.0;
    for (i, value) in values.enumerate() {
        let size = i + 1;
        // Incremental mean of the first `size` values.
        running_mean += (value - running_mean) / size as f64;
        let candidate = scale.at(size) * utility.at(running_mean);
        if candidate > best {
            best = candidate;
        }
    }
    best
}
