// SPDX-License-Identifier: MIT OR Apache-2.0

//! Selections and their sorted statistics.
//!
//! A selection is the restriction of the population to the rows covered
//! by one search node. Because the population is already sorted, a
//! selection is always in descending target order as well, and a single
//! pass over it yields the cumulative tables every bound family reads.

use crate::population::PopulationData;
use crate::support::SupportSet;
use crate::EsdError;

/// The rows of one search node, in descending target order.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SelectionData {
    target: Vec<f64>,
    control: Vec<usize>,
    category_counts: Vec<usize>,
}

impl SelectionData {
    /// Restricts `population` to the rows in `support`. Support membership
    /// is tested against original row identifiers, not sorted positions.
    pub fn from_support<S: SupportSet>(population: &PopulationData, support: &S) -> Self {
        let mut target = Vec::with_capacity(support.len().min(population.len()));
        let mut control = Vec::with_capacity(target.capacity());
        let mut category_counts = vec![0usize; population.num_categories()];
        for pos in 0..population.len() {
            if support.contains(population.row_index()[pos]) {
                let cat = population.control()[pos];
                target.push(population.target()[pos]);
                control.push(cat);
                category_counts[cat] += 1;
            }
        }
        Self {
            target,
            control,
            category_counts,
        }
    }

    /// The selection covering the whole population (the search root).
    pub fn full(population: &PopulationData) -> Self {
        Self {
            target: population.target().to_vec(),
            control: population.control().to_vec(),
            category_counts: population.category_counts().to_vec(),
        }
    }

    /// Builds a selection from already-extracted members. `target` must be
    /// sorted descending and aligned with `control`.
    pub fn from_members(
        target: Vec<f64>,
        control: Vec<usize>,
        num_categories: usize,
    ) -> Result<Self, EsdError> {
        if target.len() != control.len() {
            return Err(EsdError::invalid_input(format!(
                "target length {} != control length {}",
                target.len(),
                control.len()
            )));
        }
        if num_categories == 0 {
            return Err(EsdError::invalid_input(
                "number of control categories must be positive",
            ));
        }
        let mut category_counts = vec![0usize; num_categories];
        for (pos, (&v, &cat)) in target.iter().zip(&control).enumerate() {
            if !v.is_finite() {
                return Err(EsdError::invalid_input(format!(
                    "non-finite target value {v} at position {pos}"
                )));
            }
            if pos > 0 && v > target[pos - 1] {
                return Err(EsdError::invalid_input(format!(
                    "selection is not sorted by descending target at position {pos}"
                )));
            }
            if cat >= num_categories {
                return Err(EsdError::category_mismatch(format!(
                    "control value {cat} at position {pos} is outside 0..{num_categories}"
                )));
            }
            category_counts[cat] += 1;
        }
        Ok(Self {
            target,
            control,
            category_counts,
        })
    }

    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    pub fn num_categories(&self) -> usize {
        self.category_counts.len()
    }

    /// Selected target values in descending order.
    pub fn target(&self) -> &[f64] {
        &self.target
    }

    /// Control categories aligned with [`target`](Self::target).
    pub fn control(&self) -> &[usize] {
        &self.control
    }

    /// Number of selected rows per control category.
    pub fn category_counts(&self) -> &[usize] {
        &self.category_counts
    }
}

/// Cumulative per-category tables of one selection, built in a single
/// pass over its sorted rows.
///
/// For a selection of size `n` with `cnt[c]` rows in category `c`:
///
/// * `cum_count[c]` has length `n + 1`; entry `r` is the number of
///   category-`c` rows among the `r` highest-valued selected rows.
/// * `cum_sum[c]` has length `cnt[c] + 1`; entry `k` is the sum of the
///   `k` largest category-`c` values.
/// * `rank_of[c]` has length `cnt[c]`; entry `k` is the global rank
///   (position in the selection) of the `(k+1)`-th largest category-`c`
///   value.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionStatistics {
    cum_count: Vec<Vec<usize>>,
    cum_sum: Vec<Vec<f64>>,
    rank_of: Vec<Vec<usize>>,
    category_counts: Vec<usize>,
    num_sel: usize,
}

impl SelectionStatistics {
    pub fn new(selection: &SelectionData) -> Self {
        let num_sel = selection.len();
        let num_cat = selection.num_categories();
        let category_counts = selection.category_counts().to_vec();

        let mut cum_count = vec![vec![0usize; num_sel + 1]; num_cat];
        let mut cum_sum: Vec<Vec<f64>> = category_counts
            .iter()
            .map(|&cnt| vec![0.0; cnt + 1])
            .collect();
        let mut rank_of: Vec<Vec<usize>> = category_counts
            .iter()
            .map(|&cnt| vec![0usize; cnt])
            .collect();

        let mut running = vec![0usize; num_cat];
        for (i, (&value, &cat)) in selection
            .target()
            .iter()
            .zip(selection.control())
            .enumerate()
        {
            running[cat] += 1;
            for (c, run) in running.iter().enumerate() {
                cum_count[c][i + 1] = *run;
            }
            let k = running[cat];
            cum_sum[cat][k] = cum_sum[cat][k - 1] + value;
            rank_of[cat][k - 1] = i;
        }

        Self {
            cum_count,
            cum_sum,
            rank_of,
            category_counts,
            num_sel,
        }
    }

    /// Selection size.
    pub fn num_sel(&self) -> usize {
        self.num_sel
    }

    pub fn num_categories(&self) -> usize {
        self.category_counts.len()
    }

    pub fn category_counts(&self) -> &[usize] {
        &self.category_counts
    }

    /// Number of category-`cat` rows among the `rank` highest-valued
    /// selected rows.
    pub fn count_at(&self, cat: usize, rank: usize) -> usize {
        assert!(
            rank <= self.num_sel,
            "rank {rank} out of range 0..={}",
            self.num_sel
        );
        self.cum_count[cat][rank]
    }

    /// Per-category counts at the given prefix of the global ranking.
    /// This is the `rank`-th point of the top-rank path through class
    /// count space.
    pub fn path_point(&self, rank: usize) -> Vec<usize> {
        assert!(
            rank <= self.num_sel,
            "rank {rank} out of range 0..={}",
            self.num_sel
        );
        self.cum_count.iter().map(|counts| counts[rank]).collect()
    }

    /// Sum of the `count` largest category-`cat` values.
    pub fn sum_of_top(&self, cat: usize, count: usize) -> f64 {
        assert!(
            count <= self.category_counts[cat],
            "count {count} exceeds category {cat} size {}",
            self.category_counts[cat]
        );
        self.cum_sum[cat][count]
    }

    /// Global rank of the `(k+1)`-th largest category-`cat` value.
    pub fn rank_of(&self, cat: usize, k: usize) -> usize {
        assert!(
            k < self.category_counts[cat],
            "index {k} exceeds category {cat} size {}",
            self.category_counts[cat]
        );
        self.rank_of[cat][k]
    }

    /// Sum of all selected values.
    pub fn sum(&self) -> f64 {
        self.cum_sum
            .iter()
            .map(|sums| sums[sums.len() - 1])
            .sum()
    }

    /// Mean of the selection. Requires a non-empty selection.
    pub fn mean(&self) -> f64 {
        assert!(self.num_sel > 0, "mean of an empty selection is undefined");
        self.sum() / self.num_sel as f64
    }

    /// Largest selected value. Requires a non-empty selection.
    pub fn max(&self) -> f64 {
        assert!(self.num_sel > 0, "max of an empty selection is undefined");
        self.cum_sum
            .iter()
            .zip(&self.category_counts)
            .filter(|&(_, &cnt)| cnt > 0)
            .map(|(sums, _)| sums[1])
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Smallest selected value. Requires a non-empty selection.
    pub fn min(&self) -> f64 {
        assert!(self.num_sel > 0, "min of an empty selection is undefined");
        // The last prefix-sum increment of a category is its smallest value.
        self.cum_sum
            .iter()
            .zip(&self.category_counts)
            .filter(|&(_, &cnt)| cnt > 0)
            .map(|(sums, &cnt)| sums[cnt] - sums[cnt - 1])
            .fold(f64::INFINITY, f64::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn example_population() -> PopulationData {
        PopulationData::from_columns(
            &[7.0, 9.0, 3.0, 8.0, 5.0, 1.0],
            &[0, 0, 0, 1, 1, 1],
            2,
        )
        .unwrap()
    }

    fn example_selection() -> SelectionData {
        // Sorted selection: 9/c0, 8/c1, 7/c0, 5/c1, 3/c0
        let support: BTreeSet<usize> = [0, 1, 2, 3, 4].into_iter().collect();
        SelectionData::from_support(&example_population(), &support)
    }

    #[test]
    fn from_support_keeps_sorted_order() {
        let sel = example_selection();
        assert_eq!(sel.target(), &[9.0, 8.0, 7.0, 5.0, 3.0]);
        assert_eq!(sel.control(), &[0, 1, 0, 1, 0]);
        assert_eq!(sel.category_counts(), &[3, 2]);

        let support: BTreeSet<usize> = [2, 3].into_iter().collect();
        let sel = SelectionData::from_support(&example_population(), &support);
        assert_eq!(sel.target(), &[8.0, 3.0]);
        assert_eq!(sel.control(), &[1, 0]);
    }

    #[test]
    fn full_selection_covers_population() {
        let pop = example_population();
        let sel = SelectionData::full(&pop);
        assert_eq!(sel.len(), pop.len());
        assert_eq!(sel.target(), pop.target());
        assert_eq!(sel.category_counts(), pop.category_counts());
    }

    #[test]
    fn from_members_validates() {
        assert!(SelectionData::from_members(vec![3.0, 5.0], vec![0, 0], 1).is_err());
        assert!(SelectionData::from_members(vec![5.0], vec![1], 1).is_err());
        assert!(SelectionData::from_members(vec![f64::NAN], vec![0], 1).is_err());
        let sel = SelectionData::from_members(vec![5.0, 3.0], vec![0, 1], 2).unwrap();
        assert_eq!(sel.category_counts(), &[1, 1]);
    }

    #[test]
    fn cumulative_tables() {
        let stats = SelectionStatistics::new(&example_selection());
        assert_eq!(stats.num_sel(), 5);

        // cum_count per rank prefix
        assert_eq!(stats.path_point(0), vec![0, 0]);
        assert_eq!(stats.path_point(1), vec![1, 0]);
        assert_eq!(stats.path_point(2), vec![1, 1]);
        assert_eq!(stats.path_point(3), vec![2, 1]);
        assert_eq!(stats.path_point(5), vec![3, 2]);

        // cum_sum of top-k per category
        assert_eq!(stats.sum_of_top(0, 0), 0.0);
        assert_eq!(stats.sum_of_top(0, 1), 9.0);
        assert_eq!(stats.sum_of_top(0, 2), 16.0);
        assert_eq!(stats.sum_of_top(0, 3), 19.0);
        assert_eq!(stats.sum_of_top(1, 2), 13.0);

        // global ranks of per-category order statistics
        assert_eq!(stats.rank_of(0, 0), 0);
        assert_eq!(stats.rank_of(0, 1), 2);
        assert_eq!(stats.rank_of(0, 2), 4);
        assert_eq!(stats.rank_of(1, 0), 1);
        assert_eq!(stats.rank_of(1, 1), 3);

        assert_eq!(stats.sum(), 32.0);
        assert_eq!(stats.mean(), 6.4);
        assert_eq!(stats.max(), 9.0);
        assert_eq!(stats.min(), 3.0);
    }

    #[test]
    fn extremes_skip_empty_categories() {
        let sel = SelectionData::from_members(vec![7.0, 2.0], vec![0, 0], 2).unwrap();
        let stats = SelectionStatistics::new(&sel);
        assert_eq!(stats.category_counts(), &[2, 0]);
        assert_eq!(stats.max(), 7.0);
        assert_eq!(stats.min(), 2.0);
    }

    #[test]
    fn empty_selection_statistics() {
        let sel = SelectionData::from_members(vec![], vec![], 2).unwrap();
        let stats = SelectionStatistics::new(&sel);
        assert_eq!(stats.num_sel(), 0);
        assert_eq!(stats.path_point(0), vec![0, 0]);
        assert_eq!(stats.sum(), 0.0);
    }

    #[test]
    #[should_panic(expected = "rank 6 out of range")]
    fn path_point_rejects_out_of_range_rank() {
        let stats = SelectionStatistics::new(&example_selection());
        let _ = stats.path_point(6);
    }
}
