//! The storage-independent matrix contract.
//!
//! Every storage variant implements [`Matrix`]: coordinate-based get/set of
//! numbers and text, a per-cell [`CellType`], and bulk row/column extraction.
//! Variants that can offer faster access advertise it through
//! [`Matrix::layout`], which the bulk-apply engine queries instead of
//! inspecting concrete types.

use super::dense::DenseMatrix;
use super::indexed::CellIndex;
use super::mixed::Cell;
use super::notify::ChangeNotifier;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel marking "no numeric value" in buffers where NaN is unsuitable.
pub const NULL_NUMBER: f64 = f64::MIN;

/// Check whether a value is a usable number: finite, not NaN, not [`NULL_NUMBER`].
#[inline]
pub fn is_valid_number(value: f64) -> bool {
    value.is_finite() && value != NULL_NUMBER
}

/// Content tag of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellType {
    Number,
    Text,
    Empty,
}

/// Concrete storage variant, for diagnostics and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageKind {
    Dense,
    Mixed,
    Indexed,
    Integer,
    Text,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageKind::Dense => "dense",
            StorageKind::Mixed => "mixed",
            StorageKind::Indexed => "indexed",
            StorageKind::Integer => "integer",
            StorageKind::Text => "text",
        };
        f.write_str(name)
    }
}

/// Read-only fast-path capability of a storage variant.
#[derive(Debug)]
pub enum Layout<'a> {
    /// Row-major `f64` buffer of length `rows * cols`.
    Contiguous(&'a [f64]),
    /// `f64` buffer addressed through an index function.
    Indexed { data: &'a [f64], index: &'a CellIndex },
    /// Row-major heterogeneous cells.
    Cells(&'a [Cell]),
    /// Only the coordinate contract is available.
    Generic,
}

/// Mutable counterpart of [`Layout`].
#[derive(Debug)]
pub enum LayoutMut<'a> {
    Contiguous(&'a mut [f64]),
    Indexed {
        data: &'a mut [f64],
        index: &'a CellIndex,
    },
    Cells(&'a mut [Cell]),
    Generic,
}

/// A fixed-shape 2-D container of numeric, text or empty cells.
///
/// Element accessors take `(row, col)` and panic when either is out of
/// range, like slice indexing. Every public mutating call fires the change
/// notification once: [`set_value`](Self::set_value) per cell, bulk
/// operations when they finish. [`put_value`](Self::put_value) and
/// [`put_text`](Self::put_text) are the raw writes underneath and never fire.
pub trait Matrix: fmt::Debug + Send + Sync {
    /// Number of rows.
    fn n_rows(&self) -> usize;

    /// Number of columns.
    fn n_cols(&self) -> usize;

    /// `(rows, cols)`.
    fn shape(&self) -> (usize, usize) {
        (self.n_rows(), self.n_cols())
    }

    /// Storage variant.
    fn kind(&self) -> StorageKind;

    /// Cell as a number; [`NULL_NUMBER`] when the cell holds none.
    fn value(&self, row: usize, col: usize) -> f64;

    /// Cell rendered as text; empty cells render as `""`.
    fn text(&self, row: usize, col: usize) -> String;

    /// Content tag of a cell.
    fn cell_type(&self, row: usize, col: usize) -> CellType;

    /// Store a number without notifying. Variants that cannot hold it
    /// coerce it.
    fn put_value(&mut self, row: usize, col: usize, value: f64);

    /// Store text without notifying. Numeric-only variants parse it or store
    /// [`NULL_NUMBER`].
    fn put_text(&mut self, row: usize, col: usize, text: &str);

    /// Store a number and fire the change notification.
    fn set_value(&mut self, row: usize, col: usize, value: f64) {
        self.put_value(row, col, value);
        self.fire_changed();
    }

    /// Store text and fire the change notification.
    fn set_text(&mut self, row: usize, col: usize, text: &str) {
        self.put_text(row, col, text);
        self.fire_changed();
    }

    /// Fast-path capability for reads.
    fn layout(&self) -> Layout<'_> {
        Layout::Generic
    }

    /// Fast-path capability for writes.
    fn layout_mut(&mut self) -> LayoutMut<'_> {
        LayoutMut::Generic
    }

    /// True when every cell is guaranteed to be NUMBER.
    fn is_all_numeric(&self) -> bool {
        false
    }

    /// True when TEXT cells can be stored alongside numbers.
    fn supports_text(&self) -> bool {
        false
    }

    /// Change notifier of this matrix instance.
    fn notifier(&self) -> &ChangeNotifier;

    /// Mutable access for subscribing listeners.
    fn notifier_mut(&mut self) -> &mut ChangeNotifier;

    /// Fire the "matrix changed" signal.
    fn fire_changed(&self) {
        self.notifier().notify();
    }

    /// Copy one row into `buf` (length must equal `n_cols`).
    fn fill_row(&self, row: usize, buf: &mut [f64]) {
        let n_cols = self.n_cols();
        assert_eq!(buf.len(), n_cols, "row buffer length must equal column count");
        match self.layout() {
            Layout::Contiguous(data) => {
                buf.copy_from_slice(&data[row * n_cols..(row + 1) * n_cols]);
            }
            Layout::Indexed { data, index } => {
                for (col, slot) in buf.iter_mut().enumerate() {
                    *slot = data[index.offset(row, col)];
                }
            }
            Layout::Cells(cells) => {
                let cells = &cells[row * n_cols..(row + 1) * n_cols];
                for (slot, cell) in buf.iter_mut().zip(cells) {
                    *slot = cell.as_number();
                }
            }
            Layout::Generic => {
                for (col, slot) in buf.iter_mut().enumerate() {
                    *slot = self.value(row, col);
                }
            }
        }
    }

    /// Copy one column into `buf` (length must equal `n_rows`).
    fn fill_col(&self, col: usize, buf: &mut [f64]) {
        let n_rows = self.n_rows();
        let n_cols = self.n_cols();
        assert_eq!(buf.len(), n_rows, "column buffer length must equal row count");
        assert!(col < n_cols, "column {} out of bounds ({})", col, n_cols);
        match self.layout() {
            Layout::Contiguous(data) => {
                for (row, slot) in buf.iter_mut().enumerate() {
                    *slot = data[row * n_cols + col];
                }
            }
            Layout::Indexed { data, index } => {
                for (row, slot) in buf.iter_mut().enumerate() {
                    *slot = data[index.offset(row, col)];
                }
            }
            Layout::Cells(cells) => {
                for (row, slot) in buf.iter_mut().enumerate() {
                    *slot = cells[row * n_cols + col].as_number();
                }
            }
            Layout::Generic => {
                for (row, slot) in buf.iter_mut().enumerate() {
                    *slot = self.value(row, col);
                }
            }
        }
    }

    /// Row as an owned numeric vector.
    fn row_values(&self, row: usize) -> Vec<f64> {
        let mut buf = vec![NULL_NUMBER; self.n_cols()];
        self.fill_row(row, &mut buf);
        buf
    }

    /// Column as an owned numeric vector.
    fn col_values(&self, col: usize) -> Vec<f64> {
        let mut buf = vec![NULL_NUMBER; self.n_rows()];
        self.fill_col(col, &mut buf);
        buf
    }

    /// New matrix of the same variant with every cell empty (or zero).
    fn blank(&self, n_rows: usize, n_cols: usize) -> Box<dyn Matrix>;

    /// New matrix able to hold `f64` results for this variant's cells.
    fn numeric_like(&self, n_rows: usize, n_cols: usize) -> Box<dyn Matrix> {
        Box::new(DenseMatrix::new(n_rows, n_cols))
    }

    /// Copy into a [`numeric_like`](Self::numeric_like) matrix.
    fn to_numeric(&self) -> Box<dyn Matrix> {
        let mut out = self.numeric_like(self.n_rows(), self.n_cols());
        copy_all_cells(self, out.as_mut());
        out
    }

    /// Layout-specific transposition, if this variant has one.
    fn transposed(&self) -> Option<Box<dyn Matrix>> {
        None
    }

    /// Deep copy behind a trait object.
    fn clone_box(&self) -> Box<dyn Matrix>;
}

impl Clone for Box<dyn Matrix> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Copy one cell between matrices, preserving its content type where the
/// destination can hold it.
pub fn copy_cell<S: Matrix + ?Sized>(
    src: &S,
    row: usize,
    col: usize,
    dst: &mut dyn Matrix,
    dst_row: usize,
    dst_col: usize,
) {
    match src.cell_type(row, col) {
        CellType::Number => dst.put_value(dst_row, dst_col, src.value(row, col)),
        CellType::Text => dst.put_text(dst_row, dst_col, &src.text(row, col)),
        CellType::Empty => dst.put_value(dst_row, dst_col, NULL_NUMBER),
    }
}

/// Copy every cell of `src` into `dst` at the same coordinates.
///
/// # Panics
/// Panics if `dst` is smaller than `src`.
pub fn copy_all_cells<S: Matrix + ?Sized>(src: &S, dst: &mut dyn Matrix) {
    for row in 0..src.n_rows() {
        for col in 0..src.n_cols() {
            copy_cell(src, row, col, dst, row, col);
        }
    }
}

/// Compare two matrices cell by cell: same shape, same cell types, equal
/// numbers (NaN equals NaN) and equal text.
pub fn cells_equal(a: &dyn Matrix, b: &dyn Matrix) -> bool {
    if a.shape() != b.shape() {
        return false;
    }
    for row in 0..a.n_rows() {
        for col in 0..a.n_cols() {
            let kind = a.cell_type(row, col);
            if kind != b.cell_type(row, col) {
                return false;
            }
            let same = match kind {
                CellType::Number => {
                    let (x, y) = (a.value(row, col), b.value(row, col));
                    x == y || (x.is_nan() && y.is_nan())
                }
                CellType::Text => a.text(row, col) == b.text(row, col),
                CellType::Empty => true,
            };
            if !same {
                return false;
            }
        }
    }
    true
}

/// Render a number for text output; [`NULL_NUMBER`] renders empty.
pub(crate) fn format_number(value: f64) -> String {
    if value == NULL_NUMBER {
        String::new()
    } else {
        value.to_string()
    }
}

/// Parse text as a number; anything unparseable becomes [`NULL_NUMBER`].
pub(crate) fn parse_number(text: &str) -> f64 {
    text.trim().parse::<f64>().unwrap_or(NULL_NUMBER)
}
