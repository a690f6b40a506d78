//! Index-coded numeric storage.
//!
//! The buffer is addressed through a [`CellIndex`], an affine
//! `(row, col) -> offset` function. This covers row-major and column-major
//! buffers as well as strided windows into a larger buffer.

use super::matrix::{
    format_number, parse_number, CellType, Layout, LayoutMut, Matrix, StorageKind,
};
use super::notify::ChangeNotifier;
use crate::error::{MatrixError, Result};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Affine index function: `offset + row * row_stride + col * col_stride`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellIndex {
    pub start: usize,
    pub row_stride: usize,
    pub col_stride: usize,
}

impl CellIndex {
    /// Row-major layout for `n_cols` columns.
    pub fn row_major(n_cols: usize) -> Self {
        Self {
            start: 0,
            row_stride: n_cols,
            col_stride: 1,
        }
    }

    /// Column-major layout for `n_rows` rows.
    pub fn col_major(n_rows: usize) -> Self {
        Self {
            start: 0,
            row_stride: 1,
            col_stride: n_rows,
        }
    }

    /// Arbitrary strided layout.
    pub fn strided(start: usize, row_stride: usize, col_stride: usize) -> Self {
        Self {
            start,
            row_stride,
            col_stride,
        }
    }

    /// Buffer offset of a cell.
    #[inline]
    pub fn offset(&self, row: usize, col: usize) -> usize {
        self.start + row * self.row_stride + col * self.col_stride
    }

    /// Buffer range of a row when its cells are adjacent.
    pub fn row_range(&self, row: usize, n_cols: usize) -> Option<Range<usize>> {
        if self.col_stride == 1 || n_cols <= 1 {
            let begin = self.offset(row, 0);
            Some(begin..begin + n_cols)
        } else {
            None
        }
    }

    /// Buffer range of a column when its cells are adjacent.
    pub fn col_range(&self, col: usize, n_rows: usize) -> Option<Range<usize>> {
        if self.row_stride == 1 || n_rows <= 1 {
            let begin = self.offset(0, col);
            Some(begin..begin + n_rows)
        } else {
            None
        }
    }

    /// Index function of the transposed view over the same buffer.
    pub fn swapped(&self) -> Self {
        Self {
            start: self.start,
            row_stride: self.col_stride,
            col_stride: self.row_stride,
        }
    }
}

/// Numeric matrix whose offsets come from a [`CellIndex`].
#[derive(Debug, Clone)]
pub struct IndexedMatrix {
    n_rows: usize,
    n_cols: usize,
    data: Vec<f64>,
    index: CellIndex,
    notifier: ChangeNotifier,
}

impl IndexedMatrix {
    /// Zero-filled row-major matrix.
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            data: vec![0.0; n_rows * n_cols],
            index: CellIndex::row_major(n_cols),
            notifier: ChangeNotifier::new(),
        }
    }

    /// Wrap a buffer with an index function.
    ///
    /// Fails when the highest addressed offset falls outside the buffer.
    pub fn from_parts(
        n_rows: usize,
        n_cols: usize,
        data: Vec<f64>,
        index: CellIndex,
    ) -> Result<Self> {
        if n_rows > 0 && n_cols > 0 {
            let last = index.offset(n_rows - 1, n_cols - 1);
            if last >= data.len() {
                return Err(MatrixError::DimensionMismatch {
                    expected: last + 1,
                    actual: data.len(),
                });
            }
        }
        Ok(Self {
            n_rows,
            n_cols,
            data,
            index,
            notifier: ChangeNotifier::new(),
        })
    }

    /// Wrap a column-major buffer.
    pub fn from_col_major(n_rows: usize, n_cols: usize, data: Vec<f64>) -> Result<Self> {
        Self::from_parts(n_rows, n_cols, data, CellIndex::col_major(n_rows))
    }

    /// Reinterpret the same buffer as the transposed matrix without copying.
    pub fn into_transposed_view(self) -> Self {
        Self {
            n_rows: self.n_cols,
            n_cols: self.n_rows,
            data: self.data,
            index: self.index.swapped(),
            notifier: ChangeNotifier::new(),
        }
    }

    /// The index function.
    pub fn index(&self) -> &CellIndex {
        &self.index
    }

    /// The raw buffer.
    pub fn buffer(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    fn offset(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.n_rows && col < self.n_cols,
            "cell ({}, {}) out of bounds for {}x{} matrix",
            row,
            col,
            self.n_rows,
            self.n_cols
        );
        self.index.offset(row, col)
    }
}

impl Matrix for IndexedMatrix {
    fn n_rows(&self) -> usize {
        self.n_rows
    }

    fn n_cols(&self) -> usize {
        self.n_cols
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Indexed
    }

    fn value(&self, row: usize, col: usize) -> f64 {
        self.data[self.offset(row, col)]
    }

    fn text(&self, row: usize, col: usize) -> String {
        format_number(self.value(row, col))
    }

    fn cell_type(&self, row: usize, col: usize) -> CellType {
        self.offset(row, col);
        CellType::Number
    }

    fn put_value(&mut self, row: usize, col: usize, value: f64) {
        let offset = self.offset(row, col);
        self.data[offset] = value;
    }

    fn put_text(&mut self, row: usize, col: usize, text: &str) {
        self.put_value(row, col, parse_number(text));
    }

    fn layout(&self) -> Layout<'_> {
        Layout::Indexed {
            data: &self.data,
            index: &self.index,
        }
    }

    fn layout_mut(&mut self) -> LayoutMut<'_> {
        LayoutMut::Indexed {
            data: &mut self.data,
            index: &self.index,
        }
    }

    fn is_all_numeric(&self) -> bool {
        true
    }

    fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    fn notifier_mut(&mut self) -> &mut ChangeNotifier {
        &mut self.notifier
    }

    fn blank(&self, n_rows: usize, n_cols: usize) -> Box<dyn Matrix> {
        Box::new(IndexedMatrix::new(n_rows, n_cols))
    }

    fn numeric_like(&self, n_rows: usize, n_cols: usize) -> Box<dyn Matrix> {
        Box::new(IndexedMatrix::new(n_rows, n_cols))
    }

    /// Rebuilds a compact row-major buffer through the index function.
    fn transposed(&self) -> Option<Box<dyn Matrix>> {
        let mut data = Vec::with_capacity(self.n_rows * self.n_cols);
        for col in 0..self.n_cols {
            for row in 0..self.n_rows {
                data.push(self.data[self.index.offset(row, col)]);
            }
        }
        Some(Box::new(IndexedMatrix {
            n_rows: self.n_cols,
            n_cols: self.n_rows,
            data,
            index: CellIndex::row_major(self.n_rows),
            notifier: ChangeNotifier::new(),
        }))
    }

    fn clone_box(&self) -> Box<dyn Matrix> {
        Box::new(self.clone())
    }
}
