// SPDX-License-Identifier: MIT OR Apache-2.0

//! Every estimator must dominate the objective of every refinement of
//! the selection it was given. These properties enumerate refinements
//! exhaustively on small selections and check the bound against each.

#![forbid(unsafe_code)]

use esd_bounds::{
    BalancedBoundConfig, BalancedMeanShiftBound, BottomKMeanBound, BottomKMedianBound,
    CcsMeasures, CoverageScale, DeviationReduction, MedianSequenceBound, ShiftUtility,
    TopKMeanBound, TopKMedianBound,
};
use esd_core::{
    OptimisticEstimator, PopulationData, PopulationStatistics, SelectionData, SelectionStatistics,
};
use esd_minimize::SearchAlgorithm;
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use std::collections::BTreeSet;

const MIN_PROPTEST_CASES: u32 = 1000;
const TOLERANCE: f64 = 1e-9;

fn proptest_cases() -> u32 {
    std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .map(|parsed| parsed.max(MIN_PROPTEST_CASES))
        .unwrap_or(MIN_PROPTEST_CASES)
}

/// Selection with the given values in descending order, all in one
/// control category.
fn plain_selection(values: &[f64]) -> SelectionData {
    let mut sorted = values.to_vec();
    sorted.sort_by(|x, y| y.total_cmp(x));
    let n = sorted.len();
    SelectionData::from_members(sorted, vec![0; n], 1).expect("sorted values form a selection")
}

/// All non-empty subsets of the (descending) selection values, each
/// still in descending order.
fn refinements(values: &[f64]) -> Vec<Vec<f64>> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|x, y| y.total_cmp(x));
    let n = sorted.len();
    (1u32..1 << n)
        .map(|mask| {
            (0..n)
                .filter(|&i| mask & (1 << i) != 0)
                .map(|i| sorted[i])
                .collect()
        })
        .collect()
}

/// Lower-middle median of a descending slice.
fn median_desc(values: &[f64]) -> f64 {
    values[values.len() / 2]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: proptest_cases(),
        max_shrink_iters: 1024,
        failure_persistence: Some(Box::new(FileFailurePersistence::Direct("proptest-regressions/tests/soundness.txt"))),
        .. ProptestConfig::default()
    })]

    #[test]
    fn mean_bounds_dominate_every_refinement(
        values in prop::collection::vec(-10.0f64..15.0, 1..9),
        center in -5.0f64..10.0,
        scale in 0.5f64..20.0,
        alpha in 0.25f64..3.0,
    ) {
        let coverage = CoverageScale::new(2 * values.len(), alpha).unwrap();
        let up = ShiftUtility::positive(center, scale).unwrap();
        let down = ShiftUtility::negative(center, scale).unwrap();
        let top = TopKMeanBound::new(coverage, up);
        let bottom = BottomKMeanBound::new(coverage, down);
        let selection = plain_selection(&values);
        let top_est = top.estimate(&selection);
        let bottom_est = bottom.estimate(&selection);

        for subset in refinements(&values) {
            let mean = subset.iter().sum::<f64>() / subset.len() as f64;
            let top_obj = coverage.at(subset.len()) * up.at(mean);
            let bottom_obj = coverage.at(subset.len()) * down.at(mean);
            prop_assert!(
                top_est >= top_obj - TOLERANCE,
                "top-k mean bound {top_est} below refinement objective {top_obj}"
            );
            prop_assert!(
                bottom_est >= bottom_obj - TOLERANCE,
                "bottom-k mean bound {bottom_est} below refinement objective {bottom_obj}"
            );
        }
    }

    #[test]
    fn median_bounds_dominate_every_refinement(
        values in prop::collection::vec(-10.0f64..15.0, 1..9),
        center in -5.0f64..10.0,
        scale in 0.5f64..20.0,
        alpha in 0.25f64..3.0,
    ) {
        let coverage = CoverageScale::new(2 * values.len(), alpha).unwrap();
        let up = ShiftUtility::positive(center, scale).unwrap();
        let down = ShiftUtility::negative(center, scale).unwrap();
        let top = TopKMedianBound::new(coverage, up);
        let bottom = BottomKMedianBound::new(coverage, down);
        let selection = plain_selection(&values);
        let top_est = top.estimate(&selection);
        let bottom_est = bottom.estimate(&selection);

        for subset in refinements(&values) {
            let median = median_desc(&subset);
            let top_obj = coverage.at(subset.len()) * up.at(median);
            let bottom_obj = coverage.at(subset.len()) * down.at(median);
            prop_assert!(
                top_est >= top_obj - TOLERANCE,
                "top-k median bound {top_est} below refinement objective {top_obj}"
            );
            prop_assert!(
                bottom_est >= bottom_obj - TOLERANCE,
                "bottom-k median bound {bottom_est} below refinement objective {bottom_obj}"
            );
        }
    }

    #[test]
    fn median_sequence_bound_dominates_every_refinement(
        values in prop::collection::vec(-10.0f64..15.0, 1..9),
        center in -5.0f64..10.0,
        scale in 0.5f64..20.0,
        baseline in 0.5f64..10.0,
        dispersion_alpha in 0.5f64..2.0,
    ) {
        let coverage = CoverageScale::linear(2 * values.len()).unwrap();
        let utility = ShiftUtility::positive(center, scale).unwrap();
        let dispersion = DeviationReduction::new(baseline, dispersion_alpha).unwrap();
        let bound = MedianSequenceBound::new(coverage, utility, dispersion);
        let selection = plain_selection(&values);
        let est = bound.estimate(&selection);

        for subset in refinements(&values) {
            let median = median_desc(&subset);
            let smd: f64 = subset.iter().map(|v| (v - median).abs()).sum();
            let objective = coverage.at(subset.len())
                * utility.at(median)
                * dispersion.at(smd / subset.len() as f64);
            prop_assert!(
                est >= objective - TOLERANCE,
                "median-sequence bound {est} below refinement objective {objective}"
            );
        }
    }

    #[test]
    fn balanced_bound_equals_the_count_space_maximum(
        rows in prop::collection::vec((-10.0f64..15.0, 0usize..2), 1..12),
        class0_probability in 0.05f64..0.95,
        exponent_cov_tend in 0.25f64..3.0,
        exponent_repr in 0.25f64..3.0,
    ) {
        let target: Vec<f64> = rows.iter().map(|&(v, _)| v).collect();
        let control: Vec<usize> = rows.iter().map(|&(_, c)| c).collect();
        let population = PopulationData::from_columns(&target, &control, 2).unwrap();
        let selection = SelectionData::full(&population);

        // Exhaustive maximum over the class count lattice.
        let statistics = PopulationStatistics::from_population(&population).unwrap();
        let stats = SelectionStatistics::new(&selection);
        let measures =
            CcsMeasures::new(&stats, &statistics, Some(class0_probability)).unwrap();
        let exp_scale = exponent_cov_tend.max(exponent_repr);
        let mut expected = f64::NEG_INFINITY;
        for n0 in 0..=stats.category_counts()[0] {
            for n1 in 0..=stats.category_counts()[1] {
                let counts = [n0, n1];
                let cov_tend = measures.coverage(counts) * measures.mean_shift(counts);
                let value = cov_tend.powf(exponent_cov_tend / exp_scale)
                    * measures.tv_similarity(counts).powf(exponent_repr / exp_scale);
                expected = expected.max(value);
            }
        }
        let expected = expected.powf(exp_scale);

        for algorithm in [
            SearchAlgorithm::Linear,
            SearchAlgorithm::Ternary,
            SearchAlgorithm::BinaryReuse,
        ] {
            let bound = BalancedMeanShiftBound::new(
                &population,
                BalancedBoundConfig {
                    exponent_cov_tend,
                    exponent_repr,
                    class0_probability: Some(class0_probability),
                    algorithm,
                },
            )
            .unwrap();
            let est = bound.estimate(&selection);
            prop_assert!(
                (est - expected).abs() <= TOLERANCE,
                "{algorithm:?} bound {est} != count space maximum {expected}"
            );
        }
    }

    #[test]
    fn balanced_bound_equals_the_count_space_maximum_on_sub_selections(
        rows in prop::collection::vec((-10.0f64..15.0, 0usize..2, any::<bool>()), 1..12),
        class0_probability in 0.05f64..0.95,
        exponent_cov_tend in 0.25f64..3.0,
        exponent_repr in 0.25f64..3.0,
    ) {
        let target: Vec<f64> = rows.iter().map(|&(v, _, _)| v).collect();
        let control: Vec<usize> = rows.iter().map(|&(_, c, _)| c).collect();
        let population = PopulationData::from_columns(&target, &control, 2).unwrap();

        // Random proper subset of the population rows; a node is never
        // empty, so row 0 is always kept.
        let mut support: BTreeSet<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.2)
            .map(|(index, _)| index)
            .collect();
        support.insert(0);
        let selection = SelectionData::from_support(&population, &support);

        // Exhaustive maximum over the selection's class count lattice.
        let statistics = PopulationStatistics::from_population(&population).unwrap();
        let stats = SelectionStatistics::new(&selection);
        let measures =
            CcsMeasures::new(&stats, &statistics, Some(class0_probability)).unwrap();
        let exp_scale = exponent_cov_tend.max(exponent_repr);
        let mut expected = f64::NEG_INFINITY;
        for n0 in 0..=stats.category_counts()[0] {
            for n1 in 0..=stats.category_counts()[1] {
                let counts = [n0, n1];
                let cov_tend = measures.coverage(counts) * measures.mean_shift(counts);
                let value = cov_tend.powf(exponent_cov_tend / exp_scale)
                    * measures.tv_similarity(counts).powf(exponent_repr / exp_scale);
                expected = expected.max(value);
            }
        }
        let expected = expected.powf(exp_scale);

        for algorithm in [
            SearchAlgorithm::Linear,
            SearchAlgorithm::Ternary,
            SearchAlgorithm::BinaryReuse,
        ] {
            let bound = BalancedMeanShiftBound::new(
                &population,
                BalancedBoundConfig {
                    exponent_cov_tend,
                    exponent_repr,
                    class0_probability: Some(class0_probability),
                    algorithm,
                },
            )
            .unwrap();
            let est = bound.estimate(&selection);
            prop_assert!(
                (est - expected).abs() <= TOLERANCE,
                "{algorithm:?} bound {est} != count space maximum {expected} \
                 on a {} of {} row selection",
                selection.len(),
                population.len()
            );
        }
    }

    #[test]
    fn balanced_bound_dominates_every_refinement(
        rows in prop::collection::vec((-10.0f64..15.0, 0usize..2), 1..9),
        class0_probability in 0.05f64..0.95,
    ) {
        let target: Vec<f64> = rows.iter().map(|&(v, _)| v).collect();
        let control: Vec<usize> = rows.iter().map(|&(_, c)| c).collect();
        let population = PopulationData::from_columns(&target, &control, 2).unwrap();
        let statistics = PopulationStatistics::from_population(&population).unwrap();
        let bound = BalancedMeanShiftBound::new(
            &population,
            BalancedBoundConfig {
                class0_probability: Some(class0_probability),
                ..BalancedBoundConfig::default()
            },
        )
        .unwrap();
        let selection = SelectionData::full(&population);
        let est = bound.estimate(&selection);

        let shift_scale = (statistics.max() - statistics.mean()).max(1e-12);
        let min_probability = class0_probability.min(1.0 - class0_probability);
        let n = population.len();
        for mask in 1u32..1 << n {
            let kept: Vec<usize> = (0..n).filter(|&i| mask & (1 << i) != 0).collect();
            let k = kept.len() as f64;
            let mean = kept.iter().map(|&i| population.target()[i]).sum::<f64>() / k;
            let n0 = kept
                .iter()
                .filter(|&&i| population.control()[i] == 0)
                .count() as f64;
            let coverage = k / n as f64;
            let shift = ((mean - statistics.mean()) / shift_scale).max(0.0);
            let tvd = (n0 / k - class0_probability).abs();
            let similarity = (1.0 - tvd / (1.0 - min_probability)).clamp(0.0, 1.0);
            let objective = coverage * shift * similarity;
            prop_assert!(
                est >= objective - TOLERANCE,
                "balanced bound {est} below refinement objective {objective}"
            );
        }
    }
}
