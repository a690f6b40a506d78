//! Copying element-wise transforms.
//!
//! Each transform copies the input into numeric storage (see
//! [`Matrix::to_numeric`]) and rewrites every valid number. Invalid cells
//! and text carry over unchanged.

use crate::apply::apply_cells;
use crate::data::Matrix;
use crate::error::{MatrixError, Result};
use serde::{Deserialize, Serialize};

/// A value-to-value transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ElementwiseOp {
    /// Logarithm in `base`; `v <= 0` yields NaN or -inf.
    Log { base: f64 },
    /// Natural logarithm.
    Ln,
    /// Clamp into `[min, max]`.
    Threshold { min: f64, max: f64 },
    /// Raise values below `min` to `min`.
    Floor { min: f64 },
    /// Lower values above `max` to `max`.
    Ceiling { max: f64 },
    /// `v^exponent`.
    Power { exponent: f64 },
    /// `e^v`.
    Exp,
    /// `|v|`.
    Abs,
    /// Round to `decimals` decimal places.
    Round { decimals: i32 },
}

impl ElementwiseOp {
    /// Apply to one value.
    #[inline]
    pub fn apply(&self, value: f64) -> f64 {
        match *self {
            ElementwiseOp::Log { base } => value.log(base),
            ElementwiseOp::Ln => value.ln(),
            ElementwiseOp::Threshold { min, max } => value.max(min).min(max),
            ElementwiseOp::Floor { min } => value.max(min),
            ElementwiseOp::Ceiling { max } => value.min(max),
            ElementwiseOp::Power { exponent } => value.powf(exponent),
            ElementwiseOp::Exp => value.exp(),
            ElementwiseOp::Abs => value.abs(),
            ElementwiseOp::Round { decimals } => {
                let scale = 10f64.powi(decimals);
                (value * scale).round() / scale
            }
        }
    }

    /// Reject parameter combinations with no meaning.
    pub fn validate(&self) -> Result<()> {
        match *self {
            ElementwiseOp::Threshold { min, max } if min > max => Err(
                MatrixError::InvalidParameter(format!(
                    "Threshold minimum {} exceeds maximum {}",
                    min, max
                )),
            ),
            ElementwiseOp::Threshold { min, max } if min.is_nan() || max.is_nan() => Err(
                MatrixError::InvalidParameter("Threshold bounds must not be NaN".to_string()),
            ),
            ElementwiseOp::Log { base } if base <= 0.0 || base == 1.0 => Err(
                MatrixError::InvalidParameter(format!("Invalid logarithm base {}", base)),
            ),
            _ => Ok(()),
        }
    }
}

/// Copy `matrix` and apply `f` to every valid number of the copy.
pub fn map_values<M, F>(matrix: &M, mut f: F) -> Box<dyn Matrix>
where
    M: Matrix + ?Sized,
    F: FnMut(f64) -> f64,
{
    let mut out = matrix.to_numeric();
    apply_cells(out.as_mut(), |_, _, v| f(v));
    out
}

/// Copy `matrix` with `op` applied.
pub fn transform<M: Matrix + ?Sized>(matrix: &M, op: &ElementwiseOp) -> Result<Box<dyn Matrix>> {
    op.validate()?;
    Ok(map_values(matrix, |v| op.apply(v)))
}

/// Logarithm in an arbitrary base.
pub fn log<M: Matrix + ?Sized>(matrix: &M, base: f64) -> Result<Box<dyn Matrix>> {
    transform(matrix, &ElementwiseOp::Log { base })
}

/// Base-2 logarithm.
pub fn log2<M: Matrix + ?Sized>(matrix: &M) -> Box<dyn Matrix> {
    map_values(matrix, f64::log2)
}

/// Base-10 logarithm.
pub fn log10<M: Matrix + ?Sized>(matrix: &M) -> Box<dyn Matrix> {
    map_values(matrix, f64::log10)
}

/// Natural logarithm.
pub fn ln<M: Matrix + ?Sized>(matrix: &M) -> Box<dyn Matrix> {
    map_values(matrix, f64::ln)
}

/// Clamp every valid value into `[min, max]`.
pub fn threshold<M: Matrix + ?Sized>(matrix: &M, min: f64, max: f64) -> Result<Box<dyn Matrix>> {
    transform(matrix, &ElementwiseOp::Threshold { min, max })
}

/// Raise values below `min` to `min`.
pub fn floor<M: Matrix + ?Sized>(matrix: &M, min: f64) -> Box<dyn Matrix> {
    map_values(matrix, |v| ElementwiseOp::Floor { min }.apply(v))
}

/// Lower values above `max` to `max`.
pub fn ceiling<M: Matrix + ?Sized>(matrix: &M, max: f64) -> Box<dyn Matrix> {
    map_values(matrix, |v| ElementwiseOp::Ceiling { max }.apply(v))
}

/// `v^exponent`.
pub fn power<M: Matrix + ?Sized>(matrix: &M, exponent: f64) -> Box<dyn Matrix> {
    map_values(matrix, |v| v.powf(exponent))
}

/// `e^v`.
pub fn exp<M: Matrix + ?Sized>(matrix: &M) -> Box<dyn Matrix> {
    map_values(matrix, f64::exp)
}

/// Absolute value.
pub fn abs<M: Matrix + ?Sized>(matrix: &M) -> Box<dyn Matrix> {
    map_values(matrix, f64::abs)
}

/// Round to `decimals` decimal places.
pub fn round<M: Matrix + ?Sized>(matrix: &M, decimals: i32) -> Box<dyn Matrix> {
    let op = ElementwiseOp::Round { decimals };
    map_values(matrix, |v| op.apply(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Cell, DenseMatrix, IntegerMatrix, MixedMatrix, StorageKind, NULL_NUMBER};
    use approx::assert_relative_eq;

    #[test]
    fn test_log2_copies() {
        let m = DenseMatrix::from_row_slice(1, 3, &[1.0, 8.0, 0.5]).unwrap();
        let out = log2(&m);
        assert_eq!(out.row_values(0), vec![0.0, 3.0, -1.0]);
        // input unchanged
        assert_eq!(m.as_slice(), &[1.0, 8.0, 0.5]);
    }

    #[test]
    fn test_log_nonpositive_passes_through() {
        let m = DenseMatrix::from_row_slice(1, 2, &[0.0, -1.0]).unwrap();
        let out = log10(&m);
        assert_eq!(out.value(0, 0), f64::NEG_INFINITY);
        assert!(out.value(0, 1).is_nan());
    }

    #[test]
    fn test_log_base() {
        let m = DenseMatrix::from_row_slice(1, 2, &[9.0, 27.0]).unwrap();
        let out = log(&m, 3.0).unwrap();
        assert_relative_eq!(out.value(0, 0), 2.0, epsilon = 1e-12);
        assert_relative_eq!(out.value(0, 1), 3.0, epsilon = 1e-12);
        assert!(log(&m, 1.0).is_err());
    }

    #[test]
    fn test_threshold_clamps() {
        let m = DenseMatrix::from_row_slice(1, 4, &[-5.0, 0.5, 2.0, 100.0]).unwrap();
        let out = threshold(&m, 0.0, 10.0).unwrap();
        assert_eq!(out.row_values(0), vec![0.0, 0.5, 2.0, 10.0]);
        assert!(threshold(&m, 5.0, 1.0).is_err());
    }

    #[test]
    fn test_floor_and_ceiling() {
        let m = DenseMatrix::from_row_slice(1, 3, &[1.0, 20.0, 300.0]).unwrap();
        assert_eq!(floor(&m, 10.0).row_values(0), vec![10.0, 20.0, 300.0]);
        assert_eq!(ceiling(&m, 100.0).row_values(0), vec![1.0, 20.0, 100.0]);
    }

    #[test]
    fn test_invalid_cells_survive() {
        let m = DenseMatrix::from_row_slice(1, 2, &[NULL_NUMBER, 4.0]).unwrap();
        let out = ln(&m);
        assert_eq!(out.value(0, 0), NULL_NUMBER);
        assert_relative_eq!(out.value(0, 1), 4.0_f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_text_kept_in_mixed_output() {
        let m =
            MixedMatrix::from_rows(vec![vec![Cell::from("probe"), Cell::Number(100.0)]]).unwrap();
        let out = log10(&m);
        assert_eq!(out.kind(), StorageKind::Mixed);
        assert_eq!(out.text(0, 0), "probe");
        assert_relative_eq!(out.value(0, 1), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_integer_input_gives_dense() {
        let m = IntegerMatrix::from_row_major(1, 2, vec![4, 16]).unwrap();
        let out = transform(&m, &ElementwiseOp::Power { exponent: 0.5 }).unwrap();
        assert_eq!(out.kind(), StorageKind::Dense);
        assert_eq!(out.row_values(0), vec![2.0, 4.0]);
    }

    #[test]
    fn test_power_abs_exp() {
        let m = DenseMatrix::from_row_slice(1, 3, &[-2.0, 0.0, 3.0]).unwrap();
        assert_eq!(power(&m, 2.0).row_values(0), vec![4.0, 0.0, 9.0]);
        assert_eq!(abs(&m).row_values(0), vec![2.0, 0.0, 3.0]);
        assert_eq!(exp(&m).value(0, 1), 1.0);
        assert_eq!(round(&DenseMatrix::filled(1, 1, 2.345), 1).value(0, 0), 2.3);
    }

    #[test]
    fn test_round() {
        let op = ElementwiseOp::Round { decimals: 2 };
        assert_relative_eq!(op.apply(1.23456), 1.23, epsilon = 1e-12);
    }
}
