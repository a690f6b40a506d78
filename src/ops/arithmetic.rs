//! In-place scalar arithmetic.

use crate::apply::apply_numeric;
use crate::data::Matrix;
use serde::{Deserialize, Serialize};

/// A scalar arithmetic operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ScalarOp {
    /// Apply to one value. Division by zero follows IEEE semantics.
    #[inline]
    pub fn apply(self, value: f64, operand: f64) -> f64 {
        match self {
            ScalarOp::Add => value + operand,
            ScalarOp::Subtract => value - operand,
            ScalarOp::Multiply => value * operand,
            ScalarOp::Divide => value / operand,
        }
    }
}

/// Apply a scalar operation to every NUMBER cell in place.
///
/// Integer storage keeps its type, so results are rounded there. Fires the
/// change notification once.
pub fn apply_scalar<M: Matrix + ?Sized>(matrix: &mut M, op: ScalarOp, operand: f64) {
    match op {
        ScalarOp::Add => add(matrix, operand),
        ScalarOp::Subtract => subtract(matrix, operand),
        ScalarOp::Multiply => multiply(matrix, operand),
        ScalarOp::Divide => divide(matrix, operand),
    }
}

/// Copy into numeric storage and apply a scalar operation to the copy.
pub fn scalar_copy<M: Matrix + ?Sized>(matrix: &M, op: ScalarOp, operand: f64) -> Box<dyn Matrix> {
    let mut out = matrix.to_numeric();
    apply_scalar(out.as_mut(), op, operand);
    out
}

/// `v -> v + value` for every NUMBER cell.
pub fn add<M: Matrix + ?Sized>(matrix: &mut M, value: f64) {
    apply_numeric(matrix, |v| ScalarOp::Add.apply(v, value));
}

/// `v -> v - value`, defined as `add(-value)`.
pub fn subtract<M: Matrix + ?Sized>(matrix: &mut M, value: f64) {
    add(matrix, -value);
}

/// `v -> v * value` for every NUMBER cell.
pub fn multiply<M: Matrix + ?Sized>(matrix: &mut M, value: f64) {
    apply_numeric(matrix, |v| ScalarOp::Multiply.apply(v, value));
}

/// `v -> v / value` for every NUMBER cell.
pub fn divide<M: Matrix + ?Sized>(matrix: &mut M, value: f64) {
    apply_numeric(matrix, |v| ScalarOp::Divide.apply(v, value));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{
        is_valid_number, Cell, DenseMatrix, IntegerMatrix, MixedMatrix, StorageKind, NULL_NUMBER,
    };
    use crate::stats::matrix_min;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn create_test_matrix() -> DenseMatrix {
        DenseMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]).unwrap()
    }

    #[test]
    fn test_add_then_multiply() {
        let mut m = create_test_matrix();
        add(&mut m, 1.0);
        assert_eq!(m.as_slice(), &[2.0, 3.0, 4.0, 5.0]);
        multiply(&mut m, 2.0);
        assert_eq!(m.as_slice(), &[4.0, 6.0, 8.0, 10.0]);
    }

    #[test]
    fn test_subtract_is_negative_add() {
        let mut a = create_test_matrix();
        let mut b = create_test_matrix();
        subtract(&mut a, 1.5);
        add(&mut b, -1.5);
        assert_eq!(a.as_slice(), b.as_slice());
    }

    #[test]
    fn test_divide_by_zero_is_ieee() {
        let mut m = DenseMatrix::from_row_slice(1, 2, &[1.0, 0.0]).unwrap();
        divide(&mut m, 0.0);
        assert_eq!(m.value(0, 0), f64::INFINITY);
        assert!(m.value(0, 1).is_nan());
    }

    #[test]
    fn test_missing_cells_stay_missing() {
        let mut m = DenseMatrix::from_row_slice(1, 3, &[1.0, NULL_NUMBER, 3.0]).unwrap();
        multiply(&mut m, 0.5);
        divide(&mut m, 2.0);
        add(&mut m, 1e308);
        assert_eq!(m.value(0, 1), NULL_NUMBER);
        assert!(!is_valid_number(m.value(0, 1)));

        let mut m = DenseMatrix::from_row_slice(1, 3, &[1.0, NULL_NUMBER, 3.0]).unwrap();
        add(&mut m, 1.0);
        assert_eq!(matrix_min(&m), 2.0);
    }

    #[test]
    fn test_fires_once_per_call() {
        let mut m = DenseMatrix::new(50, 40);
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        m.notifier_mut().subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        add(&mut m, 1.0);
        subtract(&mut m, 1.0);
        multiply(&mut m, 3.0);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_text_cells_untouched() {
        let mut m =
            MixedMatrix::from_rows(vec![vec![Cell::from("A"), Cell::Number(10.0)]]).unwrap();
        add(&mut m, 5.0);
        assert_eq!(m.text(0, 0), "A");
        assert_eq!(m.value(0, 1), 15.0);
    }

    #[test]
    fn test_integer_stays_integer() {
        let mut m = IntegerMatrix::from_row_major(1, 2, vec![3, 4]).unwrap();
        divide(&mut m, 2.0);
        assert_eq!(m.kind(), StorageKind::Integer);
        assert_eq!(m.as_slice(), &[2, 2]);

        let source = IntegerMatrix::from_row_major(1, 2, vec![3, 4]).unwrap();
        let copy = scalar_copy(&source, ScalarOp::Divide, 2.0);
        assert_eq!(copy.kind(), StorageKind::Dense);
        assert_eq!(copy.row_values(0), vec![1.5, 2.0]);
    }
}
