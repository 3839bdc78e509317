//! Value sequences with explicit validity masks.

use serde::{Deserialize, Serialize};
use validation_common::{Result, ValidationError};

/// A value sequence paired with a per-position validity mask.
///
/// All reductions operate only over positions marked valid; invalid
/// positions are excluded from every reduction, never treated as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskedSeries {
    values: Vec<f64>,
    valid: Vec<bool>,
}

impl MaskedSeries {
    /// Create a series from values and an explicit mask.
    ///
    /// # Panics
    /// Panics if the mask length disagrees with the value length.
    pub fn new(values: Vec<f64>, valid: Vec<bool>) -> Self {
        assert_eq!(values.len(), valid.len(), "mask length mismatch");
        Self { values, valid }
    }

    /// Create a series where only NaN positions are invalid.
    pub fn from_values(values: &[f64]) -> Self {
        let valid = values.iter().map(|v| !v.is_nan()).collect();
        Self {
            values: values.to_vec(),
            valid,
        }
    }

    /// Create a series where the fill sentinel and NaN positions are invalid.
    pub fn with_fill(values: &[f64], fill: f64) -> Self {
        let valid = values.iter().map(|&v| !v.is_nan() && v != fill).collect();
        Self {
            values: values.to_vec(),
            valid,
        }
    }

    /// Total sequence length, including invalid positions.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the sequence has no positions at all.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The raw values, including invalid positions.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// The validity mask.
    pub fn mask(&self) -> &[bool] {
        &self.valid
    }

    /// Number of valid positions.
    pub fn valid_count(&self) -> usize {
        self.valid.iter().filter(|&&v| v).count()
    }

    /// The valid values, compacted in order.
    pub fn valid_values(&self) -> Vec<f64> {
        self.values
            .iter()
            .zip(self.valid.iter())
            .filter(|(_, &valid)| valid)
            .map(|(&v, _)| v)
            .collect()
    }
}

/// Harmonize two series: the result masks are the logical AND of the inputs,
/// so an invalid entry in either sequence invalidates the same position in
/// both.
pub fn harmonize(a: &MaskedSeries, b: &MaskedSeries) -> Result<(MaskedSeries, MaskedSeries)> {
    if a.len() != b.len() {
        return Err(ValidationError::length_mismatch(a.len(), b.len()));
    }
    let mask: Vec<bool> = a
        .valid
        .iter()
        .zip(b.valid.iter())
        .map(|(&x, &y)| x && y)
        .collect();
    Ok((
        MaskedSeries::new(a.values.clone(), mask.clone()),
        MaskedSeries::new(b.values.clone(), mask),
    ))
}
