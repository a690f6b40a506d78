//! Bulk-apply engine.
//!
//! Three operator shapes run over a whole matrix:
//!
//! - **cell functions** `f(row, col, value) -> value`, see [`apply_cells`]
//! - **dimension functions** `f(buffer, index)` over one row or column, see
//!   [`apply_rows`] / [`apply_cols`] and the read-only [`for_each_row`] /
//!   [`for_each_col`]
//! - **reduce functions** `f(index, buffer) -> scalar`, see [`reduce_rows`]
//!   / [`reduce_cols`]
//!
//! Each entry point asks the matrix for its [`Layout`] and takes the
//! fastest path available: contiguous buffers are walked with offset
//! arithmetic, index-coded buffers through their index function, mixed
//! cells directly, and anything else through the coordinate contract.
//! Results are identical on every path. Iteration is always in ascending
//! row/column order.

use crate::data::{is_valid_number, Cell, CellType, Layout, LayoutMut, Matrix, NULL_NUMBER};
use serde::{Deserialize, Serialize};

/// Whether a dimension function's buffer writes reach the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BufferMode {
    /// The buffer aliases storage where the layout allows it; on other
    /// layouts it is copied and written back after the call. Either way
    /// mutations change the matrix.
    InPlace,
    /// The buffer is always a private copy; mutations are discarded.
    #[default]
    Copy,
}

/// Apply `f(row, col, value)` to every cell holding a valid number.
///
/// Invalid cells (NaN, infinite, [`NULL_NUMBER`], text, empty) are left
/// untouched. Fires the change notification once.
pub fn apply_cells<M, F>(matrix: &mut M, mut f: F)
where
    M: Matrix + ?Sized,
    F: FnMut(usize, usize, f64) -> f64,
{
    let (n_rows, n_cols) = matrix.shape();
    let handled = match matrix.layout_mut() {
        LayoutMut::Contiguous(data) => {
            for (i, v) in data.iter_mut().enumerate() {
                if is_valid_number(*v) {
                    *v = f(i / n_cols, i % n_cols, *v);
                }
            }
            true
        }
        LayoutMut::Indexed { data, index } => {
            for row in 0..n_rows {
                for col in 0..n_cols {
                    let slot = &mut data[index.offset(row, col)];
                    if is_valid_number(*slot) {
                        *slot = f(row, col, *slot);
                    }
                }
            }
            true
        }
        LayoutMut::Cells(cells) => {
            for (i, cell) in cells.iter_mut().enumerate() {
                if let Cell::Number(v) = cell {
                    if is_valid_number(*v) {
                        let updated = f(i / n_cols, i % n_cols, *v);
                        *cell = Cell::from(updated);
                    }
                }
            }
            true
        }
        LayoutMut::Generic => false,
    };
    if !handled {
        for row in 0..n_rows {
            for col in 0..n_cols {
                let value = matrix.value(row, col);
                if is_valid_number(value) {
                    matrix.put_value(row, col, f(row, col, value));
                }
            }
        }
    }
    matrix.fire_changed();
}

/// Apply `f(value)` to every NUMBER cell.
///
/// Unlike [`apply_cells`] no validity check is made: NaN and infinite
/// values go through `f` with IEEE semantics. Only [`NULL_NUMBER`] slots
/// are skipped, so missing cells stay missing. Fires the change
/// notification once.
pub fn apply_numeric<M, F>(matrix: &mut M, mut f: F)
where
    M: Matrix + ?Sized,
    F: FnMut(f64) -> f64,
{
    let (n_rows, n_cols) = matrix.shape();
    let handled = match matrix.layout_mut() {
        LayoutMut::Contiguous(data) => {
            for v in data.iter_mut().filter(|v| **v != NULL_NUMBER) {
                *v = f(*v);
            }
            true
        }
        LayoutMut::Indexed { data, index } => {
            for row in 0..n_rows {
                for col in 0..n_cols {
                    let slot = &mut data[index.offset(row, col)];
                    if *slot != NULL_NUMBER {
                        *slot = f(*slot);
                    }
                }
            }
            true
        }
        LayoutMut::Cells(cells) => {
            for cell in cells.iter_mut() {
                if let Cell::Number(v) = cell {
                    if *v != NULL_NUMBER {
                        *v = f(*v);
                    }
                }
            }
            true
        }
        LayoutMut::Generic => false,
    };
    if !handled {
        for row in 0..n_rows {
            for col in 0..n_cols {
                if matrix.cell_type(row, col) == CellType::Number {
                    let value = matrix.value(row, col);
                    if value != NULL_NUMBER {
                        matrix.put_value(row, col, f(value));
                    }
                }
            }
        }
    }
    matrix.fire_changed();
}

/// Run `f(row_buffer, row)` over every row.
///
/// With [`BufferMode::InPlace`] buffer writes change the matrix and the
/// change notification fires once; with [`BufferMode::Copy`] they are
/// discarded and nothing fires.
pub fn apply_rows<M, F>(matrix: &mut M, mode: BufferMode, mut f: F)
where
    M: Matrix + ?Sized,
    F: FnMut(&mut [f64], usize),
{
    let (n_rows, n_cols) = matrix.shape();
    if mode == BufferMode::InPlace {
        let aliased = match matrix.layout_mut() {
            LayoutMut::Contiguous(data) => {
                for row in 0..n_rows {
                    f(&mut data[row * n_cols..(row + 1) * n_cols], row);
                }
                true
            }
            LayoutMut::Indexed { data, index } if index.row_range(0, n_cols).is_some() => {
                for row in 0..n_rows {
                    if let Some(range) = index.row_range(row, n_cols) {
                        f(&mut data[range], row);
                    }
                }
                true
            }
            _ => false,
        };
        if aliased {
            matrix.fire_changed();
            return;
        }
    }

    let mut buf = vec![NULL_NUMBER; n_cols];
    let mut original = vec![NULL_NUMBER; n_cols];
    for row in 0..n_rows {
        matrix.fill_row(row, &mut buf);
        if mode == BufferMode::InPlace {
            original.copy_from_slice(&buf);
        }
        f(&mut buf, row);
        if mode == BufferMode::InPlace {
            write_back(&buf, &original, |col, v| matrix.put_value(row, col, v));
        }
    }
    if mode == BufferMode::InPlace {
        matrix.fire_changed();
    }
}

/// Run `f(col_buffer, col)` over every column. Same buffer semantics as
/// [`apply_rows`]; only column-major index-coded storage aliases columns.
pub fn apply_cols<M, F>(matrix: &mut M, mode: BufferMode, mut f: F)
where
    M: Matrix + ?Sized,
    F: FnMut(&mut [f64], usize),
{
    let (n_rows, n_cols) = matrix.shape();
    if mode == BufferMode::InPlace {
        let aliased = match matrix.layout_mut() {
            LayoutMut::Indexed { data, index } if index.col_range(0, n_rows).is_some() => {
                for col in 0..n_cols {
                    if let Some(range) = index.col_range(col, n_rows) {
                        f(&mut data[range], col);
                    }
                }
                true
            }
            _ => false,
        };
        if aliased {
            matrix.fire_changed();
            return;
        }
    }

    let mut buf = vec![NULL_NUMBER; n_rows];
    let mut original = vec![NULL_NUMBER; n_rows];
    for col in 0..n_cols {
        matrix.fill_col(col, &mut buf);
        if mode == BufferMode::InPlace {
            original.copy_from_slice(&buf);
        }
        f(&mut buf, col);
        if mode == BufferMode::InPlace {
            write_back(&buf, &original, |row, v| matrix.put_value(row, col, v));
        }
    }
    if mode == BufferMode::InPlace {
        matrix.fire_changed();
    }
}

/// Visit every row read-only. Contiguous rows are passed without copying.
pub fn for_each_row<M, F>(matrix: &M, mut f: F)
where
    M: Matrix + ?Sized,
    F: FnMut(&[f64], usize),
{
    let (n_rows, n_cols) = matrix.shape();
    match matrix.layout() {
        Layout::Contiguous(data) => {
            for row in 0..n_rows {
                f(&data[row * n_cols..(row + 1) * n_cols], row);
            }
        }
        Layout::Indexed { data, index } if index.row_range(0, n_cols).is_some() => {
            for row in 0..n_rows {
                if let Some(range) = index.row_range(row, n_cols) {
                    f(&data[range], row);
                }
            }
        }
        _ => {
            let mut buf = vec![NULL_NUMBER; n_cols];
            for row in 0..n_rows {
                matrix.fill_row(row, &mut buf);
                f(&buf, row);
            }
        }
    }
}

/// Visit every column read-only.
pub fn for_each_col<M, F>(matrix: &M, mut f: F)
where
    M: Matrix + ?Sized,
    F: FnMut(&[f64], usize),
{
    let (n_rows, n_cols) = matrix.shape();
    match matrix.layout() {
        Layout::Indexed { data, index } if index.col_range(0, n_rows).is_some() => {
            for col in 0..n_cols {
                if let Some(range) = index.col_range(col, n_rows) {
                    f(&data[range], col);
                }
            }
        }
        _ => {
            let mut buf = vec![NULL_NUMBER; n_rows];
            for col in 0..n_cols {
                matrix.fill_col(col, &mut buf);
                f(&buf, col);
            }
        }
    }
}

/// One summary value per row.
pub fn reduce_rows<M, F>(matrix: &M, mut f: F) -> Vec<f64>
where
    M: Matrix + ?Sized,
    F: FnMut(usize, &[f64]) -> f64,
{
    let mut out = Vec::with_capacity(matrix.n_rows());
    for_each_row(matrix, |buf, row| out.push(f(row, buf)));
    out
}

/// One summary value per column.
pub fn reduce_cols<M, F>(matrix: &M, mut f: F) -> Vec<f64>
where
    M: Matrix + ?Sized,
    F: FnMut(usize, &[f64]) -> f64,
{
    let mut out = Vec::with_capacity(matrix.n_cols());
    for_each_col(matrix, |buf, col| out.push(f(col, buf)));
    out
}

/// Write changed entries back; bit comparison keeps NaN payloads and
/// untouched text cells intact.
fn write_back<W: FnMut(usize, f64)>(buf: &[f64], original: &[f64], mut write: W) {
    for (i, (&new, &old)) in buf.iter().zip(original).enumerate() {
        if new.to_bits() != old.to_bits() {
            write(i, new);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{
        cells_equal, CellIndex, DenseMatrix, IndexedMatrix, IntegerMatrix, MixedMatrix,
        TextMatrix,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// The same 2x3 values in every storage variant.
    fn variants() -> Vec<Box<dyn Matrix>> {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let dense = DenseMatrix::from_row_slice(2, 3, &values).unwrap();
        let indexed =
            IndexedMatrix::from_col_major(2, 3, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]).unwrap();
        let mut mixed = MixedMatrix::new(2, 3);
        let mut integer = IntegerMatrix::new(2, 3);
        let mut text = TextMatrix::new(2, 3);
        for (i, &v) in values.iter().enumerate() {
            mixed.set_value(i / 3, i % 3, v);
            integer.set_value(i / 3, i % 3, v);
            text.set_value(i / 3, i % 3, v);
        }
        vec![
            Box::new(dense),
            Box::new(indexed),
            Box::new(mixed),
            Box::new(integer),
            Box::new(text),
        ]
    }

    fn count_notifications(matrix: &mut dyn Matrix) -> Arc<AtomicUsize> {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        matrix.notifier_mut().subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        hits
    }

    #[test]
    fn test_apply_cells_identical_across_variants() {
        for mut m in variants() {
            apply_cells(m.as_mut(), |row, col, v| v * 10.0 + (row * 3 + col) as f64);
            assert_eq!(m.row_values(0), vec![10.0, 21.0, 32.0], "{}", m.kind());
            assert_eq!(m.row_values(1), vec![43.0, 54.0, 65.0], "{}", m.kind());
        }
    }

    #[test]
    fn test_apply_cells_skips_invalid() {
        let mut m = DenseMatrix::from_row_slice(1, 3, &[1.0, f64::NAN, NULL_NUMBER]).unwrap();
        apply_cells(&mut m, |_, _, v| v + 1.0);
        assert_eq!(m.value(0, 0), 2.0);
        assert!(m.value(0, 1).is_nan());
        assert_eq!(m.value(0, 2), NULL_NUMBER);

        let mut mixed = MixedMatrix::new(1, 2);
        mixed.set_text(0, 0, "gene");
        mixed.set_value(0, 1, 3.0);
        apply_cells(&mut mixed, |_, _, v| v * 2.0);
        assert_eq!(mixed.text(0, 0), "gene");
        assert_eq!(mixed.value(0, 1), 6.0);
    }

    #[test]
    fn test_apply_numeric_keeps_null_slots() {
        let mut dense = DenseMatrix::from_row_slice(1, 3, &[1.0, NULL_NUMBER, f64::NAN]).unwrap();
        let mut indexed =
            IndexedMatrix::from_col_major(1, 3, vec![1.0, NULL_NUMBER, f64::NAN]).unwrap();
        for m in [&mut dense as &mut dyn Matrix, &mut indexed as &mut dyn Matrix] {
            apply_numeric(&mut *m, |v| v * 0.5);
            assert_eq!(m.value(0, 0), 0.5, "{}", m.kind());
            assert_eq!(m.value(0, 1), NULL_NUMBER, "{}", m.kind());
            assert!(m.value(0, 2).is_nan(), "{}", m.kind());
        }
    }

    #[test]
    fn test_apply_cells_fires_once() {
        for mut m in variants() {
            let hits = count_notifications(m.as_mut());
            apply_cells(m.as_mut(), |_, _, v| v + 1.0);
            assert_eq!(hits.load(Ordering::SeqCst), 1, "{}", m.kind());
        }
    }

    #[test]
    fn test_apply_rows_in_place_mutates_every_variant() {
        for mut m in variants() {
            apply_rows(m.as_mut(), BufferMode::InPlace, |buf, row| {
                for v in buf.iter_mut() {
                    *v += row as f64 * 100.0;
                }
            });
            assert_eq!(m.row_values(1), vec![104.0, 105.0, 106.0], "{}", m.kind());
            assert_eq!(m.row_values(0), vec![1.0, 2.0, 3.0], "{}", m.kind());
        }
    }

    #[test]
    fn test_apply_cols_in_place_mutates_every_variant() {
        for mut m in variants() {
            apply_cols(m.as_mut(), BufferMode::InPlace, |buf, col| {
                buf[0] = -(col as f64);
            });
            assert_eq!(m.row_values(0), vec![0.0, -1.0, -2.0], "{}", m.kind());
            assert_eq!(m.row_values(1), vec![4.0, 5.0, 6.0], "{}", m.kind());
        }
    }

    #[test]
    fn test_copy_mode_is_inert() {
        for mut m in variants() {
            let before = m.clone_box();
            let hits = count_notifications(m.as_mut());
            apply_rows(m.as_mut(), BufferMode::Copy, |buf, _| buf.fill(0.0));
            apply_cols(m.as_mut(), BufferMode::Copy, |buf, _| buf.fill(0.0));
            assert!(cells_equal(m.as_ref(), before.as_ref()), "{}", m.kind());
            assert_eq!(hits.load(Ordering::SeqCst), 0);
        }
    }

    #[test]
    fn test_in_place_write_back_keeps_text() {
        let mut mixed = MixedMatrix::new(1, 2);
        mixed.set_text(0, 0, "id");
        mixed.set_value(0, 1, 1.0);
        apply_rows(&mut mixed, BufferMode::InPlace, |buf, _| buf[1] = 9.0);
        assert_eq!(mixed.text(0, 0), "id");
        assert_eq!(mixed.value(0, 1), 9.0);
    }

    #[test]
    fn test_reduce_rows_and_cols() {
        for m in variants() {
            let sums = reduce_rows(m.as_ref(), |_, buf| buf.iter().sum());
            assert_eq!(sums, vec![6.0, 15.0], "{}", m.kind());
            let maxes =
                reduce_cols(m.as_ref(), |_, buf| buf.iter().cloned().fold(f64::MIN, f64::max));
            assert_eq!(maxes, vec![4.0, 5.0, 6.0], "{}", m.kind());
        }
    }

    #[test]
    fn test_for_each_row_aliases_dense() {
        let m = DenseMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let base = m.as_slice().as_ptr();
        for_each_row(&m, |buf, row| {
            assert_eq!(buf.as_ptr(), base.wrapping_add(row * 2));
        });
    }

    #[test]
    fn test_indexed_row_major_aliases_rows() {
        let mut m =
            IndexedMatrix::from_parts(2, 2, vec![1.0, 2.0, 3.0, 4.0], CellIndex::row_major(2))
                .unwrap();
        apply_rows(&mut m, BufferMode::InPlace, |buf, _| buf.reverse());
        assert_eq!(m.buffer(), &[2.0, 1.0, 4.0, 3.0]);
    }
}
