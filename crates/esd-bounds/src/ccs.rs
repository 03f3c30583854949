// SPDX-License-Identifier: MIT OR Apache-2.0

//! Balanced coverage mean-shift bound over class count space.
//!
//! For a two-category control attribute, every refinement of a selection
//! maps to a point `(n0, n1)` in class count space (CCS): the number of
//! kept rows per category. The dominating refinement for a fixed point
//! keeps the largest target values of each category, so the bound is a
//! maximization of
//!
//! ```text
//! (coverage * mean_shift)^(alpha / s) * tv_similarity^(beta / s)
//! ```
//!
//! over the CCS lattice, with `s = max(alpha, beta)` and the final bound
//! raised back by `s`. The maximization never sweeps the full lattice:
//!
//! 1. A 1-D convex search along the top-rank path finds the best
//!    coverage-tendency point, ignoring representativeness.
//! 2. That point spans a sufficient search triangle (SST) against the
//!    equi-representativeness ray; one axis is scanned at integer steps
//!    with a nested convex search along the other.
//! 3. The lattice points adjacent to the ray are swept directly over
//!    its whole feasible length. This covers the maximally
//!    representative points the triangle scan misses, both across the
//!    ray from the triangle interior and beyond its ends.
//!
//! Both passes are linear in the selection size, and together they
//! visit every point the maximum can sit on, so the bound is tight: it
//! equals the objective of the best refinement in count space.

use esd_core::{
    EsdError, OptimisticEstimator, PopulationData, PopulationStatistics, SelectionData,
    SelectionStatistics,
};
use esd_minimize::{minimize, minimize_by, Indexed, SearchAlgorithm};

use crate::utility::DENOM_EPSILON;

/// Measures evaluated at CCS points of one selection.
///
/// A point `(n0, n1)` stands for the refinement keeping the `n0` largest
/// category-0 and `n1` largest category-1 values of the selection.
pub struct CcsMeasures<'a> {
    selection: &'a SelectionStatistics,
    population: &'a PopulationStatistics,
    control_probabilities: [f64; 2],
    min_control_probability: f64,
    shift_scale: f64,
}

impl<'a> CcsMeasures<'a> {
    /// `class0_probability` is the target share of category 0; `None`
    /// takes the population share. Both categories must be possible,
    /// so the probability has to lie strictly between 0 and 1.
    pub fn new(
        selection: &'a SelectionStatistics,
        population: &'a PopulationStatistics,
        class0_probability: Option<f64>,
    ) -> Result<Self, EsdError> {
        if selection.num_categories() != 2 || population.num_categories() != 2 {
            return Err(EsdError::category_mismatch(format!(
                "class count space requires exactly 2 control categories, got {} (selection) and {} (population)",
                selection.num_categories(),
                population.num_categories()
            )));
        }
        let p0 = class0_probability.unwrap_or_else(|| population.category_probability(0));
        if !(p0 > 0.0 && p0 < 1.0) {
            return Err(EsdError::invalid_input(format!(
                "control class 0 probability must lie strictly between 0 and 1, got {p0}"
            )));
        }
        Ok(Self {
            selection,
            population,
            control_probabilities: [p0, 1.0 - p0],
            min_control_probability: p0.min(1.0 - p0),
            shift_scale: (population.max() - population.mean()).max(DENOM_EPSILON),
        })
    }

    pub fn control_probabilities(&self) -> [f64; 2] {
        self.control_probabilities
    }

    pub fn selection(&self) -> &SelectionStatistics {
        self.selection
    }

    /// Refinement size over population size.
    pub fn coverage(&self, counts: [usize; 2]) -> f64 {
        (counts[0] + counts[1]) as f64 / self.population.num_rows() as f64
    }

    /// Mean of the dominating refinement at this point. The empty point
    /// takes the population mean, so its shift is zero rather than NaN.
    pub fn mean(&self, counts: [usize; 2]) -> f64 {
        let size = counts[0] + counts[1];
        if size == 0 {
            return self.population.mean();
        }
        let sum = self.selection.sum_of_top(0, counts[0]) + self.selection.sum_of_top(1, counts[1]);
        sum / size as f64
    }

    /// Positive mean shift, normalized by the population's headroom
    /// above its mean and clamped at zero.
    pub fn mean_shift(&self, counts: [usize; 2]) -> f64 {
        ((self.mean(counts) - self.population.mean()) / self.shift_scale).max(0.0)
    }

    /// Total variation distance between the refinement's class
    /// distribution and the target probabilities. The empty point is
    /// maximally distant.
    pub fn total_variation_distance(&self, counts: [usize; 2]) -> f64 {
        let size = counts[0] + counts[1];
        if size == 0 {
            return 1.0 - self.min_control_probability;
        }
        let tvd = (counts[0] as f64 / size as f64 - self.control_probabilities[0]).abs()
            + (counts[1] as f64 / size as f64 - self.control_probabilities[1]).abs();
        tvd / 2.0
    }

    /// Representativeness in `[0, 1]`: total variation distance rescaled
    /// by its maximum `1 - min(p0, p1)` and flipped.
    pub fn tv_similarity(&self, counts: [usize; 2]) -> f64 {
        let nu = 1.0 - self.min_control_probability;
        (1.0 - self.total_variation_distance(counts) / nu).clamp(0.0, 1.0)
    }

    /// Best point of the top-rank path by coverage times mean shift.
    /// The path value is concave in the rank, so a convex search over
    /// the negated sequence finds it.
    pub fn ct_path_optimum(&self, algorithm: SearchAlgorithm) -> CtOptimum {
        let num_sel = self.selection.num_sel() as i64;
        let result = minimize(0, num_sel + 1, algorithm, |rank| {
            let point = self.selection.path_point(rank as usize);
            let counts = [point[0], point[1]];
            -(self.coverage(counts) * self.mean_shift(counts))
        });
        match result {
            Some(min) => {
                let rank = min.index as usize;
                let point = self.selection.path_point(rank);
                CtOptimum {
                    rank,
                    counts: [point[0], point[1]],
                    value: -min.value,
                }
            }
            // The rank range [0, num_sel] is never empty.
            None => CtOptimum {
                rank: 0,
                counts: [0, 0],
                value: 0.0,
            },
        }
    }
}

/// Optimum of the coverage-tendency product along the top-rank path.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CtOptimum {
    /// Number of top-ranked rows kept.
    pub rank: usize,
    /// CCS point of that prefix.
    pub counts: [usize; 2],
    /// Coverage times mean shift at the optimum, before exponents.
    pub value: f64,
}

/// Configuration of [`BalancedMeanShiftBound`].
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BalancedBoundConfig {
    /// Exponent `alpha` of the joint coverage-tendency term.
    pub exponent_cov_tend: f64,
    /// Exponent `beta` of the representativeness term.
    pub exponent_repr: f64,
    /// Target share of control category 0; `None` uses the population
    /// share.
    pub class0_probability: Option<f64>,
    /// Convex search strategy for the path and triangle scans.
    pub algorithm: SearchAlgorithm,
}

impl Default for BalancedBoundConfig {
    fn default() -> Self {
        Self {
            exponent_cov_tend: 1.0,
            exponent_repr: 1.0,
            class0_probability: None,
            algorithm: SearchAlgorithm::Ternary,
        }
    }
}

impl BalancedBoundConfig {
    pub fn validate(&self) -> Result<(), EsdError> {
        for (name, exponent) in [
            ("coverage-tendency", self.exponent_cov_tend),
            ("representativeness", self.exponent_repr),
        ] {
            if !exponent.is_finite() || exponent < 0.0 {
                return Err(EsdError::invalid_input(format!(
                    "{name} exponent must be finite and non-negative, got {exponent}"
                )));
            }
        }
        if self.exponent_cov_tend.max(self.exponent_repr) <= 0.0 {
            return Err(EsdError::invalid_input(
                "at least one objective exponent must be positive",
            ));
        }
        if let Some(p0) = self.class0_probability
            && !(p0 > 0.0 && p0 < 1.0)
        {
            return Err(EsdError::invalid_input(format!(
                "control class 0 probability must lie strictly between 0 and 1, got {p0}"
            )));
        }
        Ok(())
    }
}

/// Detailed result of one bound evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BalancedEstimation {
    /// The bound, already raised back by the exponent scale.
    pub value: f64,
    /// CCS point attaining the bound; `None` for an empty selection.
    pub opt_counts: Option<[usize; 2]>,
    /// Optimum along the top-rank path; `None` for an empty selection.
    pub ct_opt: Option<CtOptimum>,
}

/// Tight optimistic estimator for balanced coverage positive mean-shift
/// objectives over a binary control attribute.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BalancedMeanShiftBound {
    statistics: PopulationStatistics,
    class0_probability: f64,
    algorithm: SearchAlgorithm,
    exp_scale: f64,
    exp_cov_tend: f64,
    exp_repr: f64,
}

impl BalancedMeanShiftBound {
    pub fn new(population: &PopulationData, config: BalancedBoundConfig) -> Result<Self, EsdError> {
        let statistics = PopulationStatistics::from_population(population)?;
        Self::from_statistics(statistics, config)
    }

    /// Builds the bound from precomputed population statistics, the
    /// shape an engine has at hand after its setup pass.
    pub fn from_statistics(
        statistics: PopulationStatistics,
        config: BalancedBoundConfig,
    ) -> Result<Self, EsdError> {
        config.validate()?;
        if statistics.num_categories() != 2 {
            return Err(EsdError::category_mismatch(format!(
                "balanced bound requires exactly 2 control categories, got {}",
                statistics.num_categories()
            )));
        }
        let class0_probability = config
            .class0_probability
            .unwrap_or_else(|| statistics.category_probability(0));
        if !(class0_probability > 0.0 && class0_probability < 1.0) {
            return Err(EsdError::invalid_input(format!(
                "control class 0 probability must lie strictly between 0 and 1, got {class0_probability}"
            )));
        }
        let exp_scale = config.exponent_cov_tend.max(config.exponent_repr);
        Ok(Self {
            statistics,
            class0_probability,
            algorithm: config.algorithm,
            exp_scale,
            exp_cov_tend: config.exponent_cov_tend / exp_scale,
            exp_repr: config.exponent_repr / exp_scale,
        })
    }

    pub fn statistics(&self) -> &PopulationStatistics {
        &self.statistics
    }

    pub fn class0_probability(&self) -> f64 {
        self.class0_probability
    }

    /// Objective with normalized exponents at one CCS point.
    fn objective(&self, measures: &CcsMeasures<'_>, counts: [usize; 2]) -> f64 {
        let cov_tend = measures.coverage(counts) * measures.mean_shift(counts);
        cov_tend.powf(self.exp_cov_tend) * measures.tv_similarity(counts).powf(self.exp_repr)
    }

    /// Evaluates the bound and reports the maximizing CCS point and the
    /// top-rank path optimum along with it.
    pub fn estimate_detailed(&self, selection: &SelectionData) -> BalancedEstimation {
        assert!(
            selection.num_categories() == 2,
            "balanced bound requires 2 control categories, got {}",
            selection.num_categories()
        );
        if selection.is_empty() {
            return BalancedEstimation {
                value: f64::NEG_INFINITY,
                opt_counts: None,
                ct_opt: None,
            };
        }
        let stats = SelectionStatistics::new(selection);
        let measures =
            match CcsMeasures::new(&stats, &self.statistics, Some(self.class0_probability)) {
                Ok(measures) => measures,
                Err(err) => panic!("selection incompatible with population: {err}"),
            };
        let ct = measures.ct_path_optimum(self.algorithm);

        // Slope of the equi-representativeness ray: category-1 count per
        // category-0 count.
        let ray_slope = (1.0 - self.class0_probability) / self.class0_probability;
        let cnt = [stats.category_counts()[0], stats.category_counts()[1]];

        // The ct optimum and its two projections towards the ray span
        // the sufficient search triangle. Projections are clamped to the
        // category counts.
        let vertex_a = [
            ct.counts[0],
            cnt[1].min((ct.counts[0] as f64 * ray_slope).round() as usize),
        ];
        let vertex_b = [
            cnt[0].min((ct.counts[1] as f64 / ray_slope).round() as usize),
            ct.counts[1],
        ];

        let (mut f_max, mut opt_counts) =
            self.scan_triangle(&measures, ray_slope, cnt, ct.counts, vertex_a, vertex_b);

        if let Some((value, counts)) = self.sweep_ray(&measures, ray_slope, cnt)
            && value > f_max
        {
            f_max = value;
            opt_counts = counts;
        }

        BalancedEstimation {
            value: f_max.powf(self.exp_scale),
            opt_counts: Some(opt_counts),
            ct_opt: Some(ct),
        }
    }

    /// Scans the sufficient search triangle: integer steps along the
    /// axis over which the objective is not concave, nested convex
    /// search along the other.
    fn scan_triangle(
        &self,
        measures: &CcsMeasures<'_>,
        ray_slope: f64,
        cnt: [usize; 2],
        ct_counts: [usize; 2],
        vertex_a: [usize; 2],
        vertex_b: [usize; 2],
    ) -> (f64, [usize; 2]) {
        let dim_scan = if (ct_counts[0] as f64) * ray_slope < ct_counts[1] as f64 {
            0
        } else {
            1
        };
        let dim_const = 1 - dim_scan;
        let cnt_cat_scan = cnt[dim_scan] as i64;
        let cnt_const_min = vertex_a[dim_const].min(vertex_b[dim_const]) as i64;
        let cnt_const_max = vertex_a[dim_const].max(vertex_b[dim_const]) as i64;
        let ray_slope_soc = if dim_scan == 1 {
            ray_slope
        } else {
            1.0 / ray_slope
        };
        let cnt_scan_begin = vertex_a[dim_scan].min(vertex_b[dim_scan]) as i64;

        let outer = minimize_by(
            cnt_const_min,
            cnt_const_max + 1,
            SearchAlgorithm::Linear,
            |cnt_const| {
                // Max keeps at least one candidate in corner cases where
                // the rounded ray intersection undershoots the triangle.
                let scan_max =
                    (cnt_scan_begin as f64).max((cnt_const as f64 * ray_slope_soc).round());
                let cnt_scan_end = (scan_max as i64).min(cnt_cat_scan);
                let inner = minimize(cnt_scan_begin, cnt_scan_end + 1, self.algorithm, |along| {
                    -self.objective(
                        measures,
                        make_counts(dim_scan, along as usize, cnt_const as usize),
                    )
                });
                match inner {
                    Some(min) => Indexed {
                        value: min.value,
                        inner: min.index,
                    },
                    // Unreachable: cnt_scan_end >= cnt_scan_begin.
                    None => Indexed {
                        value: f64::INFINITY,
                        inner: cnt_scan_begin,
                    },
                }
            },
        );
        match outer {
            Some(best) => (
                -best.value.value,
                make_counts(dim_scan, best.value.inner as usize, best.index as usize),
            ),
            // Unreachable: the const range always holds the ct optimum.
            None => (0.0, ct_counts),
        }
    }

    /// Sweeps the lattice points hugging the equi-representativeness
    /// ray over its whole feasible length, probing the floor and ceil
    /// neighbour of the ray at every step.
    ///
    /// Count distance to the ray is not monotone in total variation
    /// distance across sizes, so no probe can be skipped by a distance
    /// argument; every near-ray point is evaluated. The sweep walks the
    /// slowest-rising dimension, which makes consecutive steps move
    /// along the ray by at most one lattice cell and keeps the pass
    /// linear in the selection size.
    fn sweep_ray(
        &self,
        measures: &CcsMeasures<'_>,
        ray_slope: f64,
        cnt: [usize; 2],
    ) -> Option<(f64, [usize; 2])> {
        let dim_scan = if ray_slope > 1.0 { 0 } else { 1 };
        let dim_const = 1 - dim_scan;
        let ray_slope_soc = if dim_scan == 1 {
            ray_slope
        } else {
            1.0 / ray_slope
        };
        let mut best: Option<(f64, [usize; 2])> = None;
        for cnt_const in 1..=cnt[dim_const] {
            let on_ray = cnt_const as f64 * ray_slope_soc;
            for along in [on_ray.floor() as usize, on_ray.ceil() as usize] {
                let counts = make_counts(dim_scan, along, cnt_const);
                // Points beyond the category counts are infeasible.
                if counts[0] > cnt[0] || counts[1] > cnt[1] {
                    continue;
                }
                let value = self.objective(measures, counts);
                if best.is_none_or(|(best_value, _)| value > best_value) {
                    best = Some((value, counts));
                }
            }
        }
        best
    }
}

impl OptimisticEstimator for BalancedMeanShiftBound {
    fn name(&self) -> &'static str {
        "balanced-mean-shift"
    }

    fn estimate(&self, selection: &SelectionData) -> f64 {
        self.estimate_detailed(selection).value
    }
}

fn make_counts(dim_scan: usize, along: usize, constant: usize) -> [usize; 2] {
    let mut counts = [0usize; 2];
    counts[dim_scan] = along;
    counts[1 - dim_scan] = constant;
    counts
}
