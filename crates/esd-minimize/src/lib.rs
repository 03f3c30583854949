// SPDX-License-Identifier: MIT OR Apache-2.0

//! Minimization of convex integer sequences.
//!
//! The bound computations in `esd-bounds` repeatedly need the minimum of
//! a unimodal sequence over a half-open index range. Three strategies
//! are provided behind one interface: plain [linear
//! scan](SearchAlgorithm::Linear) for arbitrary sequences, [ternary
//! search](SearchAlgorithm::Ternary) with two evaluations per iteration,
//! and a [reuse variant](SearchAlgorithm::BinaryReuse) that keeps one
//! endpoint evaluation alive across iterations and so gets close to one
//! evaluation per iteration.
//!
//! All searches return the smallest index among the minimizers, which
//! keeps results deterministic across strategies and lets callers swap
//! strategies without changing observable behaviour.

#![forbid(unsafe_code)]

mod search;
mod value;

pub use search::{minimize, minimize_by, minimize_counted, Minimum, MinimumBy, SearchAlgorithm};
pub use value::{Indexed, SequenceValue};
