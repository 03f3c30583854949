// SPDX-License-Identifier: MIT OR Apache-2.0

//! Population-level view of the mining table.
//!
//! All bound computations work on a fixed population: the rows of the
//! analysed table that carry a usable target value, sorted once by
//! descending target. Sorting up front is what makes the per-size bounds
//! and the class-count-space walk cheap; every selection later inherits
//! this order for free.

use crate::selection::SelectionStatistics;
use crate::EsdError;

/// Target and control columns of the population, sorted by descending
/// target value.
///
/// Position `i` holds the `i`-th largest target value, its control
/// category, and the index of the original table row it came from.
/// Construction validates the inputs once so that the per-node hot path
/// can stay assertion-only.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PopulationData {
    target: Vec<f64>,
    control: Vec<usize>,
    row_index: Vec<usize>,
    category_counts: Vec<usize>,
}

impl PopulationData {
    /// Builds the population from raw table columns.
    ///
    /// `target` and `control` must have equal length and every control
    /// value must lie in `0..num_categories`. Rows with a non-finite
    /// target are skipped; surviving rows are sorted by descending target
    /// (ties broken by original row index, so construction is
    /// deterministic).
    pub fn from_columns(
        target: &[f64],
        control: &[usize],
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
        for (row, &cat) in control.iter().enumerate() {
            if cat >= num_categories {
                return Err(EsdError::category_mismatch(format!(
                    "control value {cat} at row {row} is outside 0..{num_categories}"
                )));
            }
        }

        let mut order: Vec<usize> = (0..target.len())
            .filter(|&row| target[row].is_finite())
            .collect();
        order.sort_by(|&a, &b| target[b].total_cmp(&target[a]).then(a.cmp(&b)));

        let mut category_counts = vec![0usize; num_categories];
        let mut sorted_target = Vec::with_capacity(order.len());
        let mut sorted_control = Vec::with_capacity(order.len());
        for &row in &order {
            sorted_target.push(target[row]);
            sorted_control.push(control[row]);
            category_counts[control[row]] += 1;
        }

        Ok(Self {
            target: sorted_target,
            control: sorted_control,
            row_index: order,
            category_counts,
        })
    }

    /// Builds the population from accessor closures and a pre-sorted row
    /// order, the shape the data usually has inside a mining engine that
    /// keeps its own sorted index.
    ///
    /// `sorted_rows` must list row identifiers in descending target order;
    /// the order is verified. Values must be finite.
    pub fn from_sorted_rows(
        value_of: impl Fn(usize) -> f64,
        category_of: impl Fn(usize) -> usize,
        sorted_rows: &[usize],
        num_categories: usize,
    ) -> Result<Self, EsdError> {
        if num_categories == 0 {
            return Err(EsdError::invalid_input(
                "number of control categories must be positive",
            ));
        }
        let mut target = Vec::with_capacity(sorted_rows.len());
        let mut control = Vec::with_capacity(sorted_rows.len());
        let mut category_counts = vec![0usize; num_categories];
        for (pos, &row) in sorted_rows.iter().enumerate() {
            let value = value_of(row);
            if !value.is_finite() {
                return Err(EsdError::invalid_input(format!(
                    "non-finite target value {value} at row {row}"
                )));
            }
            if let Some(&prev) = target.last()
                && value > prev
            {
                return Err(EsdError::invalid_input(format!(
                    "rows are not sorted by descending target at position {pos}"
                )));
            }
            let cat = category_of(row);
            if cat >= num_categories {
                return Err(EsdError::category_mismatch(format!(
                    "control value {cat} at row {row} is outside 0..{num_categories}"
                )));
            }
            target.push(value);
            control.push(cat);
            category_counts[cat] += 1;
        }
        Ok(Self {
            target,
            control,
            row_index: sorted_rows.to_vec(),
            category_counts,
        })
    }

    /// Number of usable rows. This is also the coverage denominator.
    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    pub fn num_categories(&self) -> usize {
        self.category_counts.len()
    }

    /// Target values in descending order.
    pub fn target(&self) -> &[f64] {
        &self.target
    }

    /// Control categories aligned with [`target`](Self::target).
    pub fn control(&self) -> &[usize] {
        &self.control
    }

    /// Original row identifier for each sorted position.
    pub fn row_index(&self) -> &[usize] {
        &self.row_index
    }

    /// Number of rows per control category.
    pub fn category_counts(&self) -> &[usize] {
        &self.category_counts
    }
}

/// Summary statistics of the population needed by the bound families:
/// global mean, global maximum, and the control category distribution.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PopulationStatistics {
    mean: f64,
    max: f64,
    min: f64,
    category_counts: Vec<usize>,
    category_probabilities: Vec<f64>,
    num_rows: usize,
}

impl PopulationStatistics {
    /// Computes the statistics of a non-empty population.
    pub fn from_population(population: &PopulationData) -> Result<Self, EsdError> {
        if population.is_empty() {
            return Err(EsdError::invalid_input(
                "population statistics require at least one row",
            ));
        }
        let sum: f64 = population.target().iter().sum();
        let num_rows = population.len();
        // Descending order puts the extremes at the ends.
        let max = population.target()[0];
        let min = population.target()[num_rows - 1];
        Self::from_parts(population.category_counts().to_vec(), sum / num_rows as f64, max, min)
    }

    /// Treats a non-empty selection as the population of a nested search,
    /// the recursive use an engine makes when it re-anchors bounds on a
    /// subgroup instead of the whole table.
    pub fn from_selection(statistics: &SelectionStatistics) -> Result<Self, EsdError> {
        if statistics.num_sel() == 0 {
            return Err(EsdError::invalid_input(
                "population statistics require at least one row",
            ));
        }
        Self::from_parts(
            statistics.category_counts().to_vec(),
            statistics.mean(),
            statistics.max(),
            statistics.min(),
        )
    }

    /// Builds statistics from externally computed parts. Used when the
    /// engine already tracks the global aggregates.
    pub fn from_parts(
        category_counts: Vec<usize>,
        mean: f64,
        max: f64,
        min: f64,
    ) -> Result<Self, EsdError> {
        let num_rows: usize = category_counts.iter().sum();
        if num_rows == 0 {
            return Err(EsdError::invalid_input(
                "population statistics require at least one row",
            ));
        }
        if !mean.is_finite() || !max.is_finite() || !min.is_finite() {
            return Err(EsdError::invalid_input(format!(
                "population aggregates must be finite (mean {mean}, max {max}, min {min})"
            )));
        }
        let category_probabilities = category_counts
            .iter()
            .map(|&cnt| cnt as f64 / num_rows as f64)
            .collect();
        Ok(Self {
            mean,
            max,
            min,
            category_counts,
            category_probabilities,
            num_rows,
        })
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_categories(&self) -> usize {
        self.category_counts.len()
    }

    pub fn category_counts(&self) -> &[usize] {
        &self.category_counts
    }

    /// Relative frequency of category `cat` in the population.
    pub fn category_probability(&self, cat: usize) -> f64 {
        assert!(
            cat < self.category_probabilities.len(),
            "category {cat} out of range 0..{}",
            self.category_probabilities.len()
        );
        self.category_probabilities[cat]
    }
}
