// SPDX-License-Identifier: MIT OR Apache-2.0

//! Building blocks of subgroup objective functions.
//!
//! Objectives in this crate are products of a coverage term and one or
//! more value-based utility terms. The pieces are kept as small structs
//! so that bound families can share them and tests can probe them in
//! isolation.

use esd_core::{EsdError, PopulationStatistics};

/// Smallest denominator used when normalizing. Scales with nothing in
/// the data, so callers with genuinely tiny value ranges should rescale
/// their target first.
pub const DENOM_EPSILON: f64 = 1e-12;

/// Power-scaled coverage term `(k / m)^alpha` for a subgroup of size `k`
/// in a population of size `m`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoverageScale {
    population_size: usize,
    alpha: f64,
}

impl CoverageScale {
    pub fn new(population_size: usize, alpha: f64) -> Result<Self, EsdError> {
        if population_size == 0 {
            return Err(EsdError::invalid_input(
                "coverage scale requires a non-empty population",
            ));
        }
        if !alpha.is_finite() || alpha < 0.0 {
            return Err(EsdError::invalid_input(format!(
                "coverage exponent must be finite and non-negative, got {alpha}"
            )));
        }
        Ok(Self {
            population_size,
            alpha,
        })
    }

    /// Linear coverage, `alpha = 1`.
    pub fn linear(population_size: usize) -> Result<Self, EsdError> {
        Self::new(population_size, 1.0)
    }

    pub fn population_size(&self) -> usize {
        self.population_size
    }

    pub fn at(&self, size: usize) -> f64 {
        (size as f64 / self.population_size as f64).powf(self.alpha)
    }
}

/// Direction of the shift an objective rewards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShiftDirection {
    /// Reward central values above the center.
    Positive,
    /// Reward central values below the center.
    Negative,
}

/// Normalized one-sided shift utility.
///
/// For the positive direction this is `max((x - center) / scale, 0)`;
/// the negative direction mirrors it. `center` is typically the
/// population mean or median, `scale` the distance from the center to
/// the relevant extreme, so the utility lives in `[0, 1]` on real data.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShiftUtility {
    center: f64,
    scale: f64,
    direction: ShiftDirection,
}

impl ShiftUtility {
    pub fn new(center: f64, scale: f64, direction: ShiftDirection) -> Result<Self, EsdError> {
        if !center.is_finite() {
            return Err(EsdError::invalid_input(format!(
                "shift center must be finite, got {center}"
            )));
        }
        if !scale.is_finite() || scale < 0.0 {
            return Err(EsdError::invalid_input(format!(
                "shift scale must be finite and non-negative, got {scale}"
            )));
        }
        Ok(Self {
            center,
            // Degenerate ranges (all values equal) collapse to a zero
            // utility instead of dividing by zero.
            scale: scale.max(DENOM_EPSILON),
            direction,
        })
    }

    pub fn positive(center: f64, scale: f64) -> Result<Self, EsdError> {
        Self::new(center, scale, ShiftDirection::Positive)
    }

    pub fn negative(center: f64, scale: f64) -> Result<Self, EsdError> {
        Self::new(center, scale, ShiftDirection::Negative)
    }

    /// Positive shift anchored at the population mean, normalized by the
    /// headroom up to the population maximum.
    pub fn above_population_mean(statistics: &PopulationStatistics) -> Result<Self, EsdError> {
        Self::positive(statistics.mean(), statistics.max() - statistics.mean())
    }

    /// Negative shift anchored at the population mean, normalized by the
    /// headroom down to the population minimum.
    pub fn below_population_mean(statistics: &PopulationStatistics) -> Result<Self, EsdError> {
        Self::negative(statistics.mean(), statistics.mean() - statistics.min())
    }

    pub fn direction(&self) -> ShiftDirection {
        self.direction
    }

    pub fn at(&self, x: f64) -> f64 {
        let shift = match self.direction {
            ShiftDirection::Positive => x - self.center,
            ShiftDirection::Negative => self.center - x,
        };
        (shift / self.scale).max(0.0)
    }
}

/// Power-scaled deviation reduction `max((baseline - x) / baseline, 0)^alpha`.
///
/// Rewards a drop of some dispersion measure `x` (an average absolute
/// median deviation, say) below its population baseline.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviationReduction {
    baseline: f64,
    alpha: f64,
}

impl DeviationReduction {
    pub fn new(baseline: f64, alpha: f64) -> Result<Self, EsdError> {
        if !baseline.is_finite() || baseline < 0.0 {
            return Err(EsdError::invalid_input(format!(
                "deviation baseline must be finite and non-negative, got {baseline}"
            )));
        }
        if !alpha.is_finite() || alpha < 0.0 {
            return Err(EsdError::invalid_input(format!(
                "deviation exponent must be finite and non-negative, got {alpha}"
            )));
        }
        Ok(Self {
            baseline: baseline.max(DENOM_EPSILON),
            alpha,
        })
    }

    pub fn at(&self, deviation: f64) -> f64 {
        ((self.baseline - deviation) / self.baseline)
            .max(0.0)
            .powf(self.alpha)
    }
}
