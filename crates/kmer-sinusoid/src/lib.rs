//! Sinusoidal absolute-position table generation.
//!
//! This crate owns only the closed-form table so the tensor-facing crates can
//! upload one precomputed matrix and stay focused on shape and device
//! concerns. Values are laid out row-major as `[max_len, d_model]` with sine
//! in even columns and cosine in odd columns:
//!
//! ```text
//! enc[pos][2i]   = sin(pos / base^(2i / d_model))
//! enc[pos][2i+1] = cos(pos / base^(2i / d_model))
//! ```
//!
//! When `d_model` is odd the trailing even column holds the sine of pair
//! `d_model / 2`; there is no matching cosine column.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default wavelength base from the original Transformer formulation.
pub const DEFAULT_BASE: f32 = 10_000.0;

/// Table generation failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TableError {
    #[error("model dimension must be greater than zero")]
    ZeroDimension,
    #[error("maximum sequence length must be greater than zero")]
    ZeroLength,
    #[error("wavelength base must be finite, got {base}")]
    NonFiniteBase { base: f32 },
    #[error("wavelength base must be greater than zero, got {base}")]
    NonPositiveBase { base: f32 },
    #[error("table of {max_len} x {d_model} values does not fit in memory")]
    TooLarge { max_len: usize, d_model: usize },
    #[error("unknown frequency scaling: {0} (expected `canonical` or `floor-divided`)")]
    UnknownScaling(String),
}

/// How the exponent `2i / d_model` is evaluated for frequency pair `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrequencyScaling {
    /// True division, `2i / d_model` as a real number.
    #[default]
    Canonical,
    /// Integer division, `floor(2i / d_model)`.
    ///
    /// Every pair index is below `d_model`, so the exponent is always zero
    /// and every column pair oscillates at frequency 1. Kept so tables match
    /// checkpoints trained against that formula.
    FloorDivided,
}

impl FrequencyScaling {
    /// Exponent applied to the base for frequency pair `pair`.
    #[must_use]
    pub fn exponent(self, pair: usize, d_model: usize) -> f32 {
        let index = 2 * pair;
        match self {
            Self::Canonical => index as f32 / d_model as f32,
            Self::FloorDivided => (index / d_model) as f32,
        }
    }
}

impl fmt::Display for FrequencyScaling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Canonical => write!(f, "canonical"),
            Self::FloorDivided => write!(f, "floor-divided"),
        }
    }
}

impl FromStr for FrequencyScaling {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "canonical" => Ok(Self::Canonical),
            "floor-divided" | "floor_divided" | "floor" => Ok(Self::FloorDivided),
            other => Err(TableError::UnknownScaling(other.to_string())),
        }
    }
}

/// Precomputed `[max_len, d_model]` positional table.
#[derive(Debug, Clone, PartialEq)]
pub struct SinusoidTable {
    pub max_len: usize,
    pub d_model: usize,
    /// Flattened row-major values.
    pub values: Vec<f32>,
}

impl SinusoidTable {
    /// The encoding vector for absolute position `pos`.
    ///
    /// # Panics
    ///
    /// Panics if `pos >= max_len`.
    #[must_use]
    pub fn row(&self, pos: usize) -> &[f32] {
        let start = pos * self.d_model;
        &self.values[start..start + self.d_model]
    }
}

fn check_base(base: f32) -> Result<(), TableError> {
    if !base.is_finite() {
        return Err(TableError::NonFiniteBase { base });
    }
    if base <= 0.0 {
        return Err(TableError::NonPositiveBase { base });
    }
    Ok(())
}

/// Per-pair angular frequencies `1 / base^exponent`, one per sine column.
pub fn inverse_frequencies(
    d_model: usize,
    base: f32,
    scaling: FrequencyScaling,
) -> Result<Vec<f32>, TableError> {
    if d_model == 0 {
        return Err(TableError::ZeroDimension);
    }
    check_base(base)?;

    Ok((0..d_model.div_ceil(2)).map(|i| 1.0 / base.powf(scaling.exponent(i, d_model))).collect())
}

/// Build the flattened `[max_len, d_model]` sinusoidal table.
pub fn build_table(
    max_len: usize,
    d_model: usize,
    base: f32,
    scaling: FrequencyScaling,
) -> Result<SinusoidTable, TableError> {
    if max_len == 0 {
        return Err(TableError::ZeroLength);
    }
    let inv_freq = inverse_frequencies(d_model, base, scaling)?;
    let len = max_len
        .checked_mul(d_model)
        .filter(|&len| len <= isize::MAX as usize / size_of::<f32>())
        .ok_or(TableError::TooLarge { max_len, d_model })?;

    let mut values = Vec::with_capacity(len);
    for pos in 0..max_len {
        let pos = pos as f32;
        for col in 0..d_model {
            let angle = pos * inv_freq[col / 2];
            values.push(if col % 2 == 0 { angle.sin() } else { angle.cos() });
        }
    }

    Ok(SinusoidTable { max_len, d_model, values })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(lhs: f32, rhs: f32, tol: f32) {
        assert!(
            (lhs - rhs).abs() <= tol,
            "expected {lhs} ~= {rhs} (tol={tol}), diff={}",
            (lhs - rhs).abs()
        );
    }

    #[test]
    fn build_table_has_expected_shape() {
        let table = build_table(3, 8, DEFAULT_BASE, FrequencyScaling::Canonical).expect("table");
        assert_eq!(table.values.len(), 24);
        assert_eq!(table.row(2).len(), 8);
    }

    #[test]
    fn position_zero_has_zero_phase() {
        let table = build_table(2, 8, DEFAULT_BASE, FrequencyScaling::Canonical).expect("table");
        assert_eq!(table.row(0), &[0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn build_table_matches_known_values() {
        let table = build_table(2, 4, DEFAULT_BASE, FrequencyScaling::Canonical).expect("table");
        let row1 = table.row(1);

        approx_eq(row1[0], 1.0_f32.sin(), 1e-6);
        approx_eq(row1[1], 1.0_f32.cos(), 1e-6);
        // pair 1: 1 / 10000^(2/4) = 0.01
        approx_eq(row1[2], 0.01_f32.sin(), 1e-6);
        approx_eq(row1[3], 0.01_f32.cos(), 1e-6);
    }

    #[test]
    fn odd_dimension_fills_trailing_sine() {
        let table = build_table(4, 5, DEFAULT_BASE, FrequencyScaling::Canonical).expect("table");
        let freqs = inverse_frequencies(5, DEFAULT_BASE, FrequencyScaling::Canonical).unwrap();
        assert_eq!(freqs.len(), 3);
        let freq = 1.0 / DEFAULT_BASE.powf(4.0 / 5.0);
        approx_eq(table.row(3)[4], (3.0 * freq).sin(), 1e-6);
        assert!(table.values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn floor_divided_scaling_has_unit_frequencies() {
        let freqs = inverse_frequencies(16, DEFAULT_BASE, FrequencyScaling::FloorDivided).unwrap();
        assert!(freqs.iter().all(|&f| f == 1.0));

        let table = build_table(3, 6, DEFAULT_BASE, FrequencyScaling::FloorDivided).unwrap();
        for col in (0..6).step_by(2) {
            approx_eq(table.row(2)[col], 2.0_f32.sin(), 1e-7);
            approx_eq(table.row(2)[col + 1], 2.0_f32.cos(), 1e-7);
        }
    }

    #[test]
    fn oversized_table_is_rejected_without_allocating() {
        let c = FrequencyScaling::Canonical;
        assert_eq!(
            build_table(usize::MAX / 2, 4, DEFAULT_BASE, c),
            Err(TableError::TooLarge { max_len: usize::MAX / 2, d_model: 4 })
        );
        assert!(matches!(
            build_table(usize::MAX / 4, 1, DEFAULT_BASE, c),
            Err(TableError::TooLarge { .. })
        ));
    }

    #[test]
    fn rejects_invalid_arguments() {
        let c = FrequencyScaling::Canonical;
        assert!(matches!(build_table(1, 0, DEFAULT_BASE, c), Err(TableError::ZeroDimension)));
        assert!(matches!(build_table(0, 4, DEFAULT_BASE, c), Err(TableError::ZeroLength)));
        assert!(matches!(
            build_table(1, 4, f32::INFINITY, c),
            Err(TableError::NonFiniteBase { .. })
        ));
        assert!(matches!(build_table(1, 4, 0.0, c), Err(TableError::NonPositiveBase { .. })));
    }

    #[test]
    fn scaling_parses_and_displays() {
        assert_eq!("canonical".parse::<FrequencyScaling>().unwrap(), FrequencyScaling::Canonical);
        assert_eq!(
            "Floor-Divided".parse::<FrequencyScaling>().unwrap(),
            FrequencyScaling::FloorDivided
        );
        assert_eq!(FrequencyScaling::FloorDivided.to_string(), "floor-divided");
        assert!(matches!(
            "linear".parse::<FrequencyScaling>(),
            Err(TableError::UnknownScaling(s)) if s == "linear"
        ));
    }
}
