//! Whole-matrix, per-row and per-column reductions.

use super::descriptive::Statistic;
use crate::apply::{for_each_row, reduce_cols, reduce_rows};
use crate::data::{is_valid_number, AnnotatedMatrix, AnnotationValue, Matrix};
use crate::error::Result;

/// Smallest valid value in the matrix.
///
/// Starts from `f64::MAX`, so a matrix without valid values returns it.
pub fn matrix_min<M: Matrix + ?Sized>(matrix: &M) -> f64 {
    let mut min = f64::MAX;
    for_each_row(matrix, |buf, _| {
        for &v in buf {
            if is_valid_number(v) && v < min {
                min = v;
            }
        }
    });
    min
}

/// Largest valid value in the matrix.
///
/// Starts from `f64::MIN`, so a matrix without valid values returns it.
pub fn matrix_max<M: Matrix + ?Sized>(matrix: &M) -> f64 {
    let mut max = f64::MIN;
    for_each_row(matrix, |buf, _| {
        for &v in buf {
            if is_valid_number(v) && v > max {
                max = v;
            }
        }
    });
    max
}

/// All valid values in row-major order.
pub fn matrix_valid_values<M: Matrix + ?Sized>(matrix: &M) -> Vec<f64> {
    let mut values = Vec::new();
    for_each_row(matrix, |buf, _| {
        values.extend(buf.iter().copied().filter(|v| is_valid_number(*v)));
    });
    values
}

/// A statistic over every valid cell of the matrix.
pub fn matrix_statistic<M: Matrix + ?Sized>(matrix: &M, stat: Statistic) -> f64 {
    match stat {
        Statistic::Min => matrix_min(matrix),
        Statistic::Max => matrix_max(matrix),
        _ => stat.compute(&matrix_valid_values(matrix)),
    }
}

/// A statistic per row.
pub fn row_statistics<M: Matrix + ?Sized>(matrix: &M, stat: Statistic) -> Vec<f64> {
    reduce_rows(matrix, |_, buf| stat.compute(buf))
}

/// A statistic per column.
pub fn col_statistics<M: Matrix + ?Sized>(matrix: &M, stat: Statistic) -> Vec<f64> {
    reduce_cols(matrix, |_, buf| stat.compute(buf))
}

/// A statistic per row, restricted to the columns in `cols`.
///
/// # Panics
/// Panics if a column index is out of range.
pub fn row_statistics_in<M: Matrix + ?Sized>(
    matrix: &M,
    cols: &[usize],
    stat: Statistic,
) -> Vec<f64> {
    let mut picked = Vec::with_capacity(cols.len());
    reduce_rows(matrix, |_, buf| {
        picked.clear();
        picked.extend(cols.iter().map(|&c| buf[c]));
        stat.compute(&picked)
    })
}

/// Store a per-row statistic as a numeric row annotation named `name`,
/// replacing any existing annotation of that name.
pub fn annotate_row_statistic(
    matrix: &mut AnnotatedMatrix,
    name: &str,
    stat: Statistic,
) -> Result<()> {
    let values: Vec<AnnotationValue> = row_statistics(matrix.matrix(), stat)
        .into_iter()
        .map(AnnotationValue::Number)
        .collect();
    matrix.row_annotations_mut().insert(name, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Cell, DenseMatrix, IndexedMatrix, MixedMatrix, NULL_NUMBER};
    use approx::assert_relative_eq;

    fn create_test_matrix() -> DenseMatrix {
        DenseMatrix::from_row_slice(2, 3, &[1.0, 5.0, 3.0, 4.0, 2.0, f64::NAN]).unwrap()
    }

    #[test]
    fn test_min_max_skip_invalid() {
        let m = create_test_matrix();
        assert_eq!(matrix_min(&m), 1.0);
        assert_eq!(matrix_max(&m), 5.0);
    }

    #[test]
    fn test_all_invalid_returns_sentinels() {
        let m = DenseMatrix::from_row_slice(1, 2, &[f64::NAN, NULL_NUMBER]).unwrap();
        assert_eq!(matrix_min(&m), f64::MAX);
        assert_eq!(matrix_max(&m), f64::MIN);
    }

    #[test]
    fn test_row_and_col_statistics() {
        let m = create_test_matrix();
        assert_eq!(row_statistics(&m, Statistic::Sum), vec![9.0, 6.0]);
        assert_eq!(row_statistics(&m, Statistic::Mean), vec![3.0, 3.0]);
        assert_eq!(col_statistics(&m, Statistic::Max), vec![4.0, 5.0, 3.0]);
        assert_eq!(col_statistics(&m, Statistic::CountValid), vec![2.0, 2.0, 1.0]);
    }

    #[test]
    fn test_row_and_col_mode() {
        let m = DenseMatrix::from_row_slice(
            3,
            3,
            &[2.0, 7.0, 2.0, 9.0, 4.0, 4.0, 2.0, 7.0, NULL_NUMBER],
        )
        .unwrap();
        assert_eq!(row_statistics(&m, Statistic::Mode), vec![2.0, 4.0, 2.0]);
        assert_eq!(col_statistics(&m, Statistic::Mode), vec![2.0, 7.0, 2.0]);
    }

    #[test]
    fn test_matrix_statistic() {
        let m = create_test_matrix();
        assert_relative_eq!(matrix_statistic(&m, Statistic::Mean), 3.0);
        assert_relative_eq!(matrix_statistic(&m, Statistic::Median), 3.0);
    }

    #[test]
    fn test_same_result_on_indexed_and_mixed() {
        let indexed =
            IndexedMatrix::from_col_major(2, 3, vec![1.0, 4.0, 5.0, 2.0, 3.0, f64::NAN]).unwrap();
        let mixed = MixedMatrix::from_rows(vec![
            vec![Cell::Number(1.0), Cell::Number(5.0), Cell::Number(3.0)],
            vec![Cell::Number(4.0), Cell::Number(2.0), Cell::from("n/a")],
        ])
        .unwrap();
        let dense = create_test_matrix();
        for stat in [Statistic::Mean, Statistic::PopulationSd, Statistic::Median] {
            assert_eq!(row_statistics(&indexed, stat), row_statistics(&dense, stat));
            assert_eq!(col_statistics(&mixed, stat), col_statistics(&dense, stat));
        }
    }

    #[test]
    fn test_row_statistics_in_group() {
        let m = create_test_matrix();
        assert_eq!(row_statistics_in(&m, &[0, 2], Statistic::Mean), vec![2.0, 4.0]);
    }

    #[test]
    fn test_annotate_row_statistic() {
        let mut am = AnnotatedMatrix::new(Box::new(create_test_matrix()));
        annotate_row_statistic(&mut am, "max", Statistic::Max).unwrap();
        assert_eq!(
            am.row_annotation("max", 0),
            Some(&AnnotationValue::Number(5.0))
        );
    }
}
