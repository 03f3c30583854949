// SPDX-License-Identifier: MIT OR Apache-2.0

//! Support sets and the estimator trait.

use std::collections::{BTreeSet, HashSet};

use crate::population::PopulationData;
use crate::selection::SelectionData;

/// Row membership test for one search node.
///
/// Search engines keep supports in whatever structure suits their
/// refinement operator; the bounds only ever need membership queries
/// and the size.
pub trait SupportSet {
    /// Whether the original table row `row` belongs to the node.
    fn contains(&self, row: usize) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SupportSet for BTreeSet<usize> {
    fn contains(&self, row: usize) -> bool {
        BTreeSet::contains(self, &row)
    }

    fn len(&self) -> usize {
        BTreeSet::len(self)
    }
}

impl SupportSet for HashSet<usize> {
    fn contains(&self, row: usize) -> bool {
        HashSet::contains(self, &row)
    }

    fn len(&self) -> usize {
        HashSet::len(self)
    }
}

impl<S: SupportSet + ?Sized> SupportSet for &S {
    fn contains(&self, row: usize) -> bool {
        (**self).contains(row)
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}

/// An optimistic estimator: an upper bound on the objective of every
/// refinement of a search node.
///
/// Soundness is the defining contract. For a node with selection `S`,
/// `estimate` must be at least the objective value of every sub-selection
/// of `S` that the refinement operator can reach. A pruned node whose
/// bound was too small silently loses results, so implementations favour
/// looseness over cleverness whenever the two conflict.
///
/// The estimate of an empty selection is `f64::NEG_INFINITY` so that
/// exhausted nodes compare below every real objective value.
pub trait OptimisticEstimator {
    /// Short stable name used in traces and benchmark reports.
    fn name(&self) -> &'static str;

    fn estimate(&self, selection: &SelectionData) -> f64;
}

impl<E: OptimisticEstimator + ?Sized> OptimisticEstimator for &E {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn estimate(&self, selection: &SelectionData) -> f64 {
        (**self).estimate(selection)
    }
}

impl<E: OptimisticEstimator + ?Sized> OptimisticEstimator for Box<E> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn estimate(&self, selection: &SelectionData) -> f64 {
        (**self).estimate(selection)
    }
}

/// Adaptor that turns supports into selections for a wrapped estimator.
///
/// This is the surface a branch-and-bound engine talks to: it hands over
/// the node's support set and gets the bound back, without dealing with
/// sorted selections itself.
pub struct SupportEstimator<'a, E> {
    population: &'a PopulationData,
    estimator: E,
}

impl<'a, E: OptimisticEstimator> SupportEstimator<'a, E> {
    pub fn new(population: &'a PopulationData, estimator: E) -> Self {
        Self {
            population,
            estimator,
        }
    }

    pub fn population(&self) -> &PopulationData {
        self.population
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    pub fn estimate<S: SupportSet>(&self, support: &S) -> f64 {
        let selection = SelectionData::from_support(self.population, support);
        self.estimator.estimate(&selection)
    }
}
