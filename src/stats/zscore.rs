//! Standardization: matrix, row, column and group-wise z-scores.
//!
//! Every variant uses the population standard deviation (denominator n)
//! over valid cells. A zero (or undefined) standard deviation scores every
//! value as [`ZERO_SD_SCORE`].

use super::descriptive::{count_valid, mean_and_population_sd};
use super::reduce::matrix_valid_values;
use crate::apply::{apply_cells, for_each_col, for_each_row};
use crate::data::{AnnotatedMatrix, GroupResolver, Matrix, MatrixGroup};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Score assigned when the standard deviation is zero or undefined.
pub const ZERO_SD_SCORE: f64 = 0.0;

/// `(value - mean) / sd`, or [`ZERO_SD_SCORE`] when `sd` is zero or not
/// finite.
#[inline]
pub fn zscore_or_zero(value: f64, mean: f64, sd: f64) -> f64 {
    if sd == 0.0 || !sd.is_finite() || !mean.is_finite() {
        ZERO_SD_SCORE
    } else {
        (value - mean) / sd
    }
}

/// Which cells share one mean and standard deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// One baseline for the whole matrix.
    #[default]
    Matrix,
    /// One baseline per row.
    Rows,
    /// One baseline per column.
    Columns,
}

/// Z-score against the whole matrix.
///
/// Returns a numeric copy; text cells survive when the copy can hold them.
pub fn zscore<M: Matrix + ?Sized>(matrix: &M) -> Box<dyn Matrix> {
    let (mean, sd) = mean_and_population_sd(&matrix_valid_values(matrix));
    debug!(mean, sd, "matrix z-score baseline");
    let mut out = matrix.to_numeric();
    apply_cells(out.as_mut(), |_, _, v| zscore_or_zero(v, mean, sd));
    out
}

/// Z-score each row against its own mean and standard deviation.
pub fn row_zscore<M: Matrix + ?Sized>(matrix: &M) -> Box<dyn Matrix> {
    let mut baselines = Vec::with_capacity(matrix.n_rows());
    for_each_row(matrix, |buf, _| baselines.push(mean_and_population_sd(buf)));
    let mut out = matrix.to_numeric();
    apply_cells(out.as_mut(), |row, _, v| {
        let (mean, sd) = baselines[row];
        zscore_or_zero(v, mean, sd)
    });
    out
}

/// Z-score each column against its own mean and standard deviation.
pub fn col_zscore<M: Matrix + ?Sized>(matrix: &M) -> Box<dyn Matrix> {
    let mut baselines = Vec::with_capacity(matrix.n_cols());
    for_each_col(matrix, |buf, _| baselines.push(mean_and_population_sd(buf)));
    let mut out = matrix.to_numeric();
    apply_cells(out.as_mut(), |_, col, v| {
        let (mean, sd) = baselines[col];
        zscore_or_zero(v, mean, sd)
    });
    out
}

/// Z-score along `axis`.
pub fn zscore_axis<M: Matrix + ?Sized>(matrix: &M, axis: Axis) -> Box<dyn Matrix> {
    match axis {
        Axis::Matrix => zscore(matrix),
        Axis::Rows => row_zscore(matrix),
        Axis::Columns => col_zscore(matrix),
    }
}

/// Per-row z-score against a baseline pooled from column groups.
///
/// For each row the mean and population sd are computed within every
/// group; the baseline is the unweighted average of those means and sds
/// over groups holding at least one valid value. A row where every group is
/// empty scores 0.
///
/// # Panics
/// Panics if a group contains an out-of-range column index.
pub fn group_zscore<M: Matrix + ?Sized>(matrix: &M, groups: &[Vec<usize>]) -> Box<dyn Matrix> {
    let mut baselines = Vec::with_capacity(matrix.n_rows());
    let mut picked = Vec::new();
    for_each_row(matrix, |buf, _| {
        let mut mean_sum = 0.0;
        let mut sd_sum = 0.0;
        let mut used = 0usize;
        for group in groups {
            picked.clear();
            picked.extend(group.iter().map(|&c| buf[c]));
            if count_valid(&picked) == 0 {
                continue;
            }
            let (mean, sd) = mean_and_population_sd(&picked);
            mean_sum += mean;
            sd_sum += sd;
            used += 1;
        }
        if used == 0 {
            baselines.push((f64::NAN, f64::NAN));
        } else {
            baselines.push((mean_sum / used as f64, sd_sum / used as f64));
        }
    });

    let mut out = matrix.to_numeric();
    apply_cells(out.as_mut(), |row, _, v| {
        let (mean, sd) = baselines[row];
        zscore_or_zero(v, mean, sd)
    });
    out
}

/// [`group_zscore`] with groups resolved against the column annotations.
pub fn group_zscore_annotated(
    matrix: &AnnotatedMatrix,
    groups: &[MatrixGroup],
) -> Result<AnnotatedMatrix> {
    let resolved = matrix.resolve_groups(groups)?;
    for (group, indices) in groups.iter().zip(&resolved) {
        debug!(group = %group.name, n_cols = indices.len(), "resolved z-score group");
    }
    matrix.with_matrix(group_zscore(matrix.matrix(), &resolved))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Cell, DenseMatrix, MixedMatrix, StorageKind, TextMatrix, NULL_NUMBER};
    use crate::stats::descriptive::{mean, population_sd};
    use approx::assert_relative_eq;

    #[test]
    fn test_zscore_mean_zero_sd_one() {
        let m = DenseMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 9.0]).unwrap();
        let z = zscore(&m);
        let values = matrix_valid_values(z.as_ref());
        assert_relative_eq!(mean(&values), 0.0, epsilon = 1e-12);
        assert_relative_eq!(population_sd(&values), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zscore_constant_is_zero() {
        let m = DenseMatrix::filled(3, 3, 7.5);
        let z = zscore(&m);
        for row in 0..3 {
            assert_eq!(z.row_values(row), vec![0.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn test_zscore_keeps_text_in_mixed() {
        let m = MixedMatrix::from_rows(vec![vec![
            Cell::from("gene"),
            Cell::Number(1.0),
            Cell::Number(3.0),
        ]])
        .unwrap();
        let z = zscore(&m);
        assert_eq!(z.text(0, 0), "gene");
        assert_eq!(z.row_values(0)[1..], [-1.0, 1.0]);
    }

    #[test]
    fn test_zscore_text_matrix_parses_numbers() {
        let m = TextMatrix::from_rows(&[vec!["2", "4", "n/a"]]).unwrap();
        let z = zscore(&m);
        assert_eq!(z.kind(), StorageKind::Mixed);
        assert_eq!(z.value(0, 0), -1.0);
        assert_eq!(z.value(0, 1), 1.0);
        assert_eq!(z.text(0, 2), "n/a");
    }

    #[test]
    fn test_row_zscore_zero_sd_row() {
        let m = DenseMatrix::from_row_slice(2, 2, &[5.0, 5.0, 1.0, 3.0]).unwrap();
        let z = row_zscore(&m);
        assert_eq!(z.row_values(0), vec![0.0, 0.0]);
        assert_eq!(z.row_values(1), vec![-1.0, 1.0]);
    }

    #[test]
    fn test_col_zscore() {
        let m = DenseMatrix::from_row_slice(2, 2, &[1.0, 10.0, 3.0, 10.0]).unwrap();
        let z = zscore_axis(&m, Axis::Columns);
        assert_eq!(z.col_values(0), vec![-1.0, 1.0]);
        assert_eq!(z.col_values(1), vec![0.0, 0.0]);
    }

    #[test]
    fn test_invalid_cells_stay_invalid() {
        let m = DenseMatrix::from_row_slice(1, 3, &[1.0, NULL_NUMBER, 3.0]).unwrap();
        let z = row_zscore(&m);
        assert_eq!(z.value(0, 1), NULL_NUMBER);
    }

    #[test]
    fn test_group_zscore_unweighted_baseline() {
        let m = DenseMatrix::from_row_slice(1, 4, &[1.0, 3.0, 10.0, 10.0]).unwrap();
        // group means 2 and 10, sds 1 and 0 -> baseline (6, 0.5)
        let z = group_zscore(&m, &[vec![0, 1], vec![2, 3]]);
        assert_eq!(z.row_values(0), vec![-10.0, -6.0, 8.0, 8.0]);
    }

    #[test]
    fn test_group_zscore_empty_group_ignored() {
        let m = DenseMatrix::from_row_slice(
            2,
            4,
            &[1.0, 2.0, 4.0, f64::NAN, 2.0, 6.0, 5.0, f64::NAN],
        )
        .unwrap();
        let with_empty = group_zscore(&m, &[vec![0, 1], vec![], vec![3], vec![2]]);
        let without = group_zscore(&m, &[vec![0, 1], vec![2]]);
        for row in 0..2 {
            let a = with_empty.row_values(row);
            let b = without.row_values(row);
            for (x, y) in a.iter().zip(&b) {
                assert!(x == y || (x.is_nan() && y.is_nan()));
            }
        }
    }

    #[test]
    fn test_group_zscore_all_groups_empty() {
        let m = DenseMatrix::from_row_slice(1, 2, &[1.0, 2.0]).unwrap();
        let z = group_zscore(&m, &[vec![]]);
        assert_eq!(z.row_values(0), vec![0.0, 0.0]);
    }

    #[test]
    fn test_group_zscore_annotated() {
        let m = DenseMatrix::from_row_slice(1, 4, &[1.0, 3.0, 10.0, 10.0]).unwrap();
        let mut am = AnnotatedMatrix::new(Box::new(m));
        am.col_annotations_mut()
            .insert("condition", vec!["ctl", "ctl", "trt", "trt"])
            .unwrap();
        let groups = [
            MatrixGroup::matching("control", "condition", "ctl"),
            MatrixGroup::matching("treated", "condition", "trt"),
        ];
        let z = group_zscore_annotated(&am, &groups).unwrap();
        assert_eq!(z.matrix().row_values(0), vec![-10.0, -6.0, 8.0, 8.0]);
        assert!(z.col_annotations().contains("condition"));
    }
}
