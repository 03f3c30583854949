// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error type shared by the subgroup bound crates.

use std::error::Error;
use std::fmt;

/// Errors reported by constructors and configuration validation.
///
/// Bound evaluation itself is infallible once the inputs have been
/// validated; everything that can go wrong is caught while building
/// [`PopulationData`](crate::PopulationData), selections, or estimator
/// configurations.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum EsdError {
    /// Caller-supplied data or configuration violates a documented contract.
    InvalidInput { message: String },
    /// Selection and population disagree on the control attribute layout.
    CategoryMismatch { message: String },
}

impl EsdError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn category_mismatch(message: impl Into<String>) -> Self {
        Self::CategoryMismatch {
            message: message.into(),
        }
    }
}

impl fmt::Display for EsdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput { message } => write!(f, "invalid input: {message}"),
            Self::CategoryMismatch { message } => write!(f, "category mismatch: {message}"),
        }
    }
}

impl Error for EsdError {}
