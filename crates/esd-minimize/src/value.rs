// SPDX-License-Identifier: MIT OR Apache-2.0

//! Values produced by one evaluation of a minimized sequence.

/// A value the search algorithms can order.
///
/// Implementations beyond `f64` let a search carry extra payload along
/// with the scalar it orders by, which is how nested 2-D searches reuse
/// the 1-D algorithms: the outer search minimizes [`Indexed`] values
/// whose payload is the inner optimum.
pub trait SequenceValue: Clone {
    /// Strict ordering used by the search. Must be `false` when either
    /// side is NaN, so that NaN never wins a comparison.
    fn less_than(&self, other: &Self) -> bool;

    /// Whether the evaluation produced NaN. The convex algorithms treat
    /// this as a caller bug and panic; linear search skips such entries.
    fn is_nan(&self) -> bool;
}

impl SequenceValue for f64 {
    fn less_than(&self, other: &Self) -> bool {
        self < other
    }

    fn is_nan(&self) -> bool {
        f64::is_nan(*self)
    }
}

/// A scalar tagged with the index of a nested search.
///
/// Ordering and NaN detection look at `value` only; `inner` rides along
/// untouched.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Indexed {
    pub value: f64,
    pub inner: i64,
}

impl SequenceValue for Indexed {
    fn less_than(&self, other: &Self) -> bool {
        self.value < other.value
    }

    fn is_nan(&self) -> bool {
        self.value.is_nan()
    }
}
