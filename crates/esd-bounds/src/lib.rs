// SPDX-License-Identifier: MIT OR Apache-2.0

//! Optimistic estimator families for exceptional subgroup mining.
//!
//! Each estimator takes a selection (the rows covered by one search
//! node) and returns an upper bound on the objective value of every
//! refinement of that selection. Branch-and-bound search uses these
//! bounds to prune: a node whose bound falls below the best known
//! subgroup cannot contain a better one.
//!
//! Three families are provided:
//!
//! * per-size bounds for mean-shift objectives ([`TopKMeanBound`],
//!   [`BottomKMeanBound`]) and median-shift objectives
//!   ([`TopKMedianBound`], [`BottomKMedianBound`]),
//! * a dispersion-corrected median bound ([`MedianSequenceBound`]),
//! * a tight two-dimensional bound for balanced coverage mean-shift
//!   objectives over a binary control attribute
//!   ([`BalancedMeanShiftBound`]).
//!
//! The shared objective building blocks live in [`utility`].

#![forbid(unsafe_code)]

mod ccs;
mod mean;
mod median;
mod median_seq;
pub mod utility;

pub use ccs::{
    BalancedBoundConfig, BalancedEstimation, BalancedMeanShiftBound, CcsMeasures, CtOptimum,
};
pub use mean::{BottomKMeanBound, TopKMeanBound};
pub use median::{BottomKMedianBound, TopKMedianBound};
pub use median_seq::MedianSequenceBound;
pub use utility::{CoverageScale, DeviationReduction, ShiftDirection, ShiftUtility};
