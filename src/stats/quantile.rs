//! Quantile normalization across columns.
//!
//! Each column is sorted (stably, remembering source rows), a reference
//! distribution is built as the mean across columns at every rank, and each
//! value is replaced by the reference interpolated at its tied rank.
//!
//! Columns may hold different numbers of valid values. Rank positions of a
//! column with `n` valid values are scaled onto the reference of length
//! `N` (the longest column), so rank `r` reads the reference at
//! `(r - 1) * (N - 1) / (n - 1)`. Invalid cells stay invalid.

use super::descriptive::{interpolate, tied_ranks};
use crate::apply::{apply_cells, for_each_col};
use crate::data::{is_valid_number, AnnotatedMatrix, Matrix};
use crate::error::Result;
use std::cmp::Ordering;
use tracing::{debug, instrument};

/// One column's valid values sorted ascending, with their source rows.
struct SortedColumn {
    values: Vec<f64>,
    rows: Vec<usize>,
}

impl SortedColumn {
    fn from_buffer(buf: &[f64]) -> Self {
        let mut pairs: Vec<(f64, usize)> = buf
            .iter()
            .enumerate()
            .filter(|(_, v)| is_valid_number(**v))
            .map(|(row, &v)| (v, row))
            .collect();
        // stable: equal values keep ascending row order
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        let (values, rows) = pairs.into_iter().unzip();
        Self { values, rows }
    }

    fn len(&self) -> usize {
        self.values.len()
    }
}

/// Position on a reference of length `reference_len` for 0-based
/// position `pos` in a column of `len` values.
fn scaled_position(pos: f64, len: usize, reference_len: usize) -> f64 {
    if reference_len <= 1 {
        return 0.0;
    }
    if len <= 1 {
        // a lone value sits in the middle of the reference
        return (reference_len - 1) as f64 / 2.0;
    }
    pos * (reference_len - 1) as f64 / (len - 1) as f64
}

/// Mean across columns at each rank of the longest column.
fn reference_distribution(columns: &[SortedColumn]) -> Vec<f64> {
    let reference_len = columns.iter().map(SortedColumn::len).max().unwrap_or(0);
    let mut reference = vec![0.0; reference_len];
    for (k, slot) in reference.iter_mut().enumerate() {
        let mut total = 0.0;
        let mut used = 0usize;
        for column in columns.iter().filter(|c| c.len() > 0) {
            let pos = if column.len() == reference_len {
                k as f64
            } else if column.len() == 1 {
                0.0
            } else {
                k as f64 * (column.len() - 1) as f64 / (reference_len - 1) as f64
            };
            total += interpolate(&column.values, pos);
            used += 1;
        }
        *slot = total / used as f64;
    }
    reference
}

/// Quantile-normalize the columns of `matrix` into a numeric copy.
#[instrument(skip_all, fields(n_rows = matrix.n_rows(), n_cols = matrix.n_cols()))]
pub fn quantile_normalize<M: Matrix + ?Sized>(matrix: &M) -> Box<dyn Matrix> {
    let mut columns = Vec::with_capacity(matrix.n_cols());
    for_each_col(matrix, |buf, _| columns.push(SortedColumn::from_buffer(buf)));

    let reference = reference_distribution(&columns);
    debug!(reference_len = reference.len(), "built reference distribution");

    // normalized value per (row, col); NaN marks cells that were invalid
    let n_rows = matrix.n_rows();
    let mut normalized = vec![vec![f64::NAN; n_rows]; columns.len()];
    for (col, column) in columns.iter().enumerate() {
        let ranks = tied_ranks(&column.values);
        for (rank, &row) in ranks.iter().zip(&column.rows) {
            let pos = scaled_position(rank - 1.0, column.len(), reference.len());
            normalized[col][row] = interpolate(&reference, pos);
        }
    }

    let mut out = matrix.to_numeric();
    apply_cells(out.as_mut(), |row, col, v| {
        let value = normalized[col][row];
        if value.is_nan() {
            v
        } else {
            value
        }
    });
    out
}

/// [`quantile_normalize`] keeping the annotation tables.
pub fn quantile_normalize_annotated(matrix: &AnnotatedMatrix) -> Result<AnnotatedMatrix> {
    matrix.with_matrix(quantile_normalize(matrix.matrix()))
}
