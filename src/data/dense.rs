//! Dense row-major `f64` storage.

use super::matrix::{
    format_number, parse_number, CellType, Layout, LayoutMut, Matrix, StorageKind,
};
use super::notify::ChangeNotifier;
use crate::error::{MatrixError, Result};
use crate::transpose::transpose_flat;
use nalgebra::DMatrix;

/// A dense numeric matrix backed by one flat row-major buffer.
///
/// Every cell is implicitly NUMBER. Rows are contiguous, so row-wise bulk
/// operations work directly on slices of the buffer.
#[derive(Debug, Clone)]
pub struct DenseMatrix {
    n_rows: usize,
    n_cols: usize,
    data: Vec<f64>,
    notifier: ChangeNotifier,
}

impl DenseMatrix {
    /// Create a zero-filled matrix.
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self::filled(n_rows, n_cols, 0.0)
    }

    /// Create a matrix with every cell set to `value`.
    pub fn filled(n_rows: usize, n_cols: usize, value: f64) -> Self {
        Self {
            n_rows,
            n_cols,
            data: vec![value; n_rows * n_cols],
            notifier: ChangeNotifier::new(),
        }
    }

    /// Build from a row-major buffer.
    pub fn from_row_major(n_rows: usize, n_cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != n_rows * n_cols {
            return Err(MatrixError::DimensionMismatch {
                expected: n_rows * n_cols,
                actual: data.len(),
            });
        }
        Ok(Self {
            n_rows,
            n_cols,
            data,
            notifier: ChangeNotifier::new(),
        })
    }

    /// Build from a row-major slice.
    pub fn from_row_slice(n_rows: usize, n_cols: usize, data: &[f64]) -> Result<Self> {
        Self::from_row_major(n_rows, n_cols, data.to_vec())
    }

    /// Build from nested rows; all rows must have the same length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for row in rows {
            if row.len() != n_cols {
                return Err(MatrixError::DimensionMismatch {
                    expected: n_cols,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Self::from_row_major(n_rows, n_cols, data)
    }

    /// Copy from a (column-major) nalgebra matrix.
    pub fn from_dmatrix(matrix: &DMatrix<f64>) -> Self {
        let (n_rows, n_cols) = matrix.shape();
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for row in 0..n_rows {
            for col in 0..n_cols {
                data.push(matrix[(row, col)]);
            }
        }
        Self {
            n_rows,
            n_cols,
            data,
            notifier: ChangeNotifier::new(),
        }
    }

    /// Copy into a nalgebra matrix.
    pub fn to_dmatrix(&self) -> DMatrix<f64> {
        DMatrix::from_row_slice(self.n_rows, self.n_cols, &self.data)
    }

    /// The row-major buffer.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// One row as a slice into the buffer.
    #[inline]
    pub fn row_slice(&self, row: usize) -> &[f64] {
        &self.data[row * self.n_cols..(row + 1) * self.n_cols]
    }

    /// Consume into the row-major buffer.
    pub fn into_vec(self) -> Vec<f64> {
        self.data
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
        row * self.n_cols + col
    }
}

impl Matrix for DenseMatrix {
    fn n_rows(&self) -> usize {
        self.n_rows
    }

    fn n_cols(&self) -> usize {
        self.n_cols
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Dense
    }

    #[inline]
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

    #[inline]
    fn put_value(&mut self, row: usize, col: usize, value: f64) {
        let offset = self.offset(row, col);
        self.data[offset] = value;
    }

    fn put_text(&mut self, row: usize, col: usize, text: &str) {
        self.put_value(row, col, parse_number(text));
    }

    fn layout(&self) -> Layout<'_> {
        Layout::Contiguous(&self.data)
    }

    fn layout_mut(&mut self) -> LayoutMut<'_> {
        LayoutMut::Contiguous(&mut self.data)
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
        Box::new(DenseMatrix::new(n_rows, n_cols))
    }

    fn to_numeric(&self) -> Box<dyn Matrix> {
        Box::new(self.clone())
    }

    fn transposed(&self) -> Option<Box<dyn Matrix>> {
        let data = transpose_flat(&self.data, self.n_rows, self.n_cols);
        Some(Box::new(DenseMatrix {
            n_rows: self.n_cols,
            n_cols: self.n_rows,
            data,
            notifier: ChangeNotifier::new(),
        }))
    }

    fn clone_box(&self) -> Box<dyn Matrix> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::matrix::NULL_NUMBER;

    fn create_test_matrix() -> DenseMatrix {
        DenseMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap()
    }

    #[test]
    fn test_dimensions() {
        let mat = create_test_matrix();
        assert_eq!(mat.shape(), (2, 3));
        assert_eq!(mat.kind(), StorageKind::Dense);
    }

    #[test]
    fn test_get_set() {
        let mut mat = create_test_matrix();
        assert_eq!(mat.value(1, 2), 6.0);
        mat.set_value(1, 2, 9.5);
        assert_eq!(mat.value(1, 2), 9.5);
        assert_eq!(mat.text(1, 2), "9.5");
        assert_eq!(mat.cell_type(0, 0), CellType::Number);
    }

    #[test]
    fn test_set_text_coerces() {
        let mut mat = create_test_matrix();
        mat.set_text(0, 0, "7");
        assert_eq!(mat.value(0, 0), 7.0);
        mat.set_text(0, 1, "gene");
        assert_eq!(mat.value(0, 1), NULL_NUMBER);
        assert_eq!(mat.text(0, 1), "");
    }

    #[test]
    fn test_rows_and_cols() {
        let mat = create_test_matrix();
        assert_eq!(mat.row_slice(1), &[4.0, 5.0, 6.0]);
        assert_eq!(mat.row_values(0), vec![1.0, 2.0, 3.0]);
        assert_eq!(mat.col_values(1), vec![2.0, 5.0]);
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let result = DenseMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_dmatrix_interop() {
        let mat = create_test_matrix();
        let dm = mat.to_dmatrix();
        assert_eq!(dm[(1, 0)], 4.0);
        let back = DenseMatrix::from_dmatrix(&dm);
        assert_eq!(back.as_slice(), mat.as_slice());
    }

    #[test]
    #[should_panic]
    fn test_out_of_bounds_panics() {
        let mat = create_test_matrix();
        mat.value(2, 0);
    }
}
