// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core data model for exceptional subgroup discovery bounds.
//!
//! The crate provides the shared vocabulary of the `esd-*` workspace:
//!
//! * [`PopulationData`] and [`PopulationStatistics`]: the analysed rows,
//!   sorted once by descending target value, plus their global aggregates.
//! * [`SelectionData`] and [`SelectionStatistics`]: the rows of one
//!   search node and the cumulative per-category tables derived from
//!   them in a single pass.
//! * [`OptimisticEstimator`] and [`SupportEstimator`]: the trait bound
//!   families implement, and the adaptor a branch-and-bound engine calls
//!   with raw support sets.
//!
//! The actual bound families live in `esd-bounds`; the 1-D convex
//! searches they rely on live in `esd-minimize`.

#![forbid(unsafe_code)]

mod error;
mod population;
mod selection;
mod support;

pub use error::EsdError;
pub use population::{PopulationData, PopulationStatistics};
pub use selection::{SelectionData, SelectionStatistics};
pub use support::{OptimisticEstimator, SupportEstimator, SupportSet};
