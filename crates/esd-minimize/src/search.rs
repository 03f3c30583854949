// SPDX-License-Identifier: MIT OR Apache-2.0

//! Minimum search over integer index ranges.
//!
//! All algorithms search the half-open range `[a, b)` and return the
//! smallest index among the minimizers, or `None` when the range is
//! empty (or, for linear search, when every evaluation is NaN). The
//! convex algorithms require the evaluated sequence to be convex over
//! the range and panic on NaN; a NaN inside a supposedly convex
//! sequence means the caller's objective is broken and silently
//! skipping it would corrupt the search result.

use crate::value::SequenceValue;

/// Search strategy for [`minimize`] and [`minimize_by`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SearchAlgorithm {
    /// Evaluate every index. Works on arbitrary sequences.
    Linear,
    /// Classic ternary search, two evaluations per iteration. Requires a
    /// convex sequence.
    #[default]
    Ternary,
    /// Ternary search variant that reuses one endpoint evaluation per
    /// iteration, halving the larger remaining span. Requires a convex
    /// sequence.
    BinaryReuse,
}

/// Result of a scalar search: smallest minimizer and its value.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Minimum {
    pub index: i64,
    pub value: f64,
}

/// Result of a generic search over any [`SequenceValue`] type.
#[derive(Clone, Debug, PartialEq)]
pub struct MinimumBy<V> {
    pub index: i64,
    pub value: V,
}

/// Minimizes a scalar sequence over `[a, b)`.
pub fn minimize(
    a: i64,
    b: i64,
    algorithm: SearchAlgorithm,
    mut f: impl FnMut(i64) -> f64,
) -> Option<Minimum> {
    minimize_by(a, b, algorithm, |index| f(index)).map(|m| Minimum {
        index: m.index,
        value: m.value,
    })
}

/// Minimizes a sequence of arbitrary [`SequenceValue`]s over `[a, b)`.
/// Ties are resolved towards the smaller index.
pub fn minimize_by<V: SequenceValue>(
    a: i64,
    b: i64,
    algorithm: SearchAlgorithm,
    mut f: impl FnMut(i64) -> V,
) -> Option<MinimumBy<V>> {
    match algorithm {
        SearchAlgorithm::Linear => linear(a, b, &mut f),
        SearchAlgorithm::Ternary => ternary(a, b, &mut f),
        SearchAlgorithm::BinaryReuse => binary_reuse(a, b, &mut f),
    }
}

/// Like [`minimize`], additionally reporting how many times `f` was
/// evaluated. Used to compare algorithm cost in benchmarks and tests.
pub fn minimize_counted(
    a: i64,
    b: i64,
    algorithm: SearchAlgorithm,
    mut f: impl FnMut(i64) -> f64,
) -> (Option<Minimum>, usize) {
    let mut evaluations = 0usize;
    let result = minimize(a, b, algorithm, |index| {
        evaluations += 1;
        f(index)
    });
    (result, evaluations)
}

fn linear<V: SequenceValue>(
    a: i64,
    b: i64,
    f: &mut impl FnMut(i64) -> V,
) -> Option<MinimumBy<V>> {
    let mut best: Option<MinimumBy<V>> = None;
    for index in a..b {
        let value = f(index);
        if value.is_nan() {
            continue;
        }
        let improves = match &best {
            Some(cur) => value.less_than(&cur.value),
            None => true,
        };
        if improves {
            best = Some(MinimumBy { index, value });
        }
    }
    best
}

fn eval_convex<V: SequenceValue>(f: &mut impl FnMut(i64) -> V, index: i64) -> V {
    let value = f(index);
    assert!(
        !value.is_nan(),
        "convex sequence evaluated to NaN at index {index}"
    );
    value
}

fn ternary<V: SequenceValue>(
    mut a: i64,
    mut b: i64,
    f: &mut impl FnMut(i64) -> V,
) -> Option<MinimumBy<V>> {
    loop {
        let span = (b - a) / 3;
        if span == 0 {
            return linear(a, b, f);
        }
        let idx1 = a + span;
        let idx2 = b - span;
        let f1 = eval_convex(f, idx1);
        let f2 = eval_convex(f, idx2);
        if f2.less_than(&f1) {
            // No minimizer at or left of idx1.
            a = idx1 + 1;
        } else {
            // Some index left of idx2 is at most as large.
            b = idx2;
        }
    }
}

/// Ternary search with evaluation reuse: each iteration keeps the better
/// endpoint as the new midpoint and probes one fresh index in the larger
/// remaining span. When a span collapses, the residual indices are
/// swept linearly and compared against the kept midpoint, so plateaus
/// at the shrinking boundary cannot lose the optimum.
fn binary_reuse<V: SequenceValue>(
    mut a: i64,
    mut b: i64,
    f: &mut impl FnMut(i64) -> V,
) -> Option<MinimumBy<V>> {
    if b - a <= 3 {
        return linear(a, b, f);
    }
    let mut span_l = (b - a) / 3;
    let mut span_r = span_l;
    let mut idx_l = a + span_l;
    let mut idx_r = b - span_r;
    let mut val_l = eval_convex(f, idx_l);
    let mut val_r = eval_convex(f, idx_r);
    loop {
        let idx_m;
        let val_m;
        if val_r.less_than(&val_l) {
            // No minimizer at or left of idx_l.
            a = idx_l + 1;
            idx_m = idx_r;
            val_m = val_r.clone();
            span_l = idx_m - a;
            if span_l == 0 {
                // Midpoint sits on the left boundary; the rest of the
                // interval is unexplored.
                return Some(resolve_residual(idx_m, val_m, idx_m + 1, b, f));
            }
        } else {
            // Some index left of idx_r is at most as large; drop idx_r too.
            b = idx_r;
            idx_m = idx_l;
            val_m = val_l.clone();
            span_r = b - idx_l;
            if span_r == 0 {
                // Midpoint collided with the right boundary.
                return Some(resolve_residual(idx_m, val_m, a, idx_m, f));
            }
        }
        if span_l > span_r {
            span_l /= 2;
            idx_l = a + span_l;
            val_l = eval_convex(f, idx_l);
            idx_r = idx_m;
            val_r = val_m;
        } else {
            span_r = (span_r + 1) / 2;
            idx_r = b - span_r;
            val_r = eval_convex(f, idx_r);
            idx_l = idx_m;
            val_l = val_m;
        }
    }
}

/// Compares a kept midpoint against the remaining unexplored indices in
/// `[lo, hi)`. Ties go to the smaller index.
fn resolve_residual<V: SequenceValue>(
    idx_m: i64,
    val_m: V,
    lo: i64,
    hi: i64,
    f: &mut impl FnMut(i64) -> V,
) -> MinimumBy<V> {
    let mut best = MinimumBy {
        index: idx_m,
        value: val_m,
    };
    for index in lo..hi {
        let value = eval_convex(f, index);
        if value.less_than(&best.value) || (index < best.index && !best.value.less_than(&value)) {
            best = MinimumBy { index, value };
        }
    }
    best
}
