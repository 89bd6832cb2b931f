//! Simulator input coordinates.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// An immutable point in simulator input space.
///
/// Equality is exact element-wise equality of the coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Input {
    coords: Vec<f64>,
}

impl Input {
    /// Build an input, rejecting NaN and infinite coordinates.
    pub fn new(coords: impl Into<Vec<f64>>) -> Result<Self, ValidationError> {
        let coords = coords.into();
        if let Some((index, value)) = coords
            .iter()
            .copied()
            .enumerate()
            .find(|(_, value)| !value.is_finite())
        {
            return Err(ValidationError::NonFiniteCoordinate { index, value });
        }
        Ok(Self { coords })
    }

    /// Number of coordinates.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.coords.len()
    }

    /// Coordinates in order.
    #[must_use]
    pub fn coords(&self) -> &[f64] {
        &self.coords
    }

    /// Iterate over the coordinates.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.coords.iter().copied()
    }

    /// Fail unless this input has exactly `expected` coordinates.
    pub fn check_dim(&self, expected: usize) -> Result<(), ValidationError> {
        if self.dim() == expected {
            Ok(())
        } else {
            Err(ValidationError::DimensionMismatch {
                expected,
                actual: self.dim(),
            })
        }
    }
}

impl TryFrom<Vec<f64>> for Input {
    type Error = ValidationError;

    fn try_from(coords: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(coords)
    }
}

impl From<Input> for Vec<f64> {
    fn from(input: Input) -> Self {
        input.coords
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, value) in self.coords.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(&format_real(*value))?;
        }
        f.write_str(")")
    }
}

/// Render a real number in a locale-independent decimal form that parses
/// back to the same `f64`.
///
/// Integral values keep a trailing `.0` so the text is never mistaken for an
/// integer field.
#[must_use]
pub fn format_real(value: f64) -> String {
    format!("{value:?}")
}
