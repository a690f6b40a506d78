//! Integer storage.

use super::matrix::{is_valid_number, CellType, Matrix, StorageKind, NULL_NUMBER};
use super::notify::ChangeNotifier;
use crate::error::{MatrixError, Result};
use crate::transpose::transpose_flat;

/// Sentinel marking an empty integer cell. Reads back as [`NULL_NUMBER`].
pub const NULL_INTEGER: i64 = i64::MIN;

/// A row-major `i64` matrix, e.g. raw read counts.
///
/// Numbers written into it are rounded; invalid numbers become
/// [`NULL_INTEGER`]. Numeric transforms produce a dense `f64` copy.
#[derive(Debug, Clone)]
pub struct IntegerMatrix {
    n_rows: usize,
    n_cols: usize,
    data: Vec<i64>,
    notifier: ChangeNotifier,
}

impl IntegerMatrix {
    /// Zero-filled matrix.
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            data: vec![0; n_rows * n_cols],
            notifier: ChangeNotifier::new(),
        }
    }

    /// Build from a row-major buffer.
    pub fn from_row_major(n_rows: usize, n_cols: usize, data: Vec<i64>) -> Result<Self> {
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

    /// Raw integer at a cell.
    pub fn get(&self, row: usize, col: usize) -> i64 {
        self.data[self.offset(row, col)]
    }

    /// The row-major buffer.
    pub fn as_slice(&self) -> &[i64] {
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
        row * self.n_cols + col
    }
}

impl Matrix for IntegerMatrix {
    fn n_rows(&self) -> usize {
        self.n_rows
    }

    fn n_cols(&self) -> usize {
        self.n_cols
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Integer
    }

    fn value(&self, row: usize, col: usize) -> f64 {
        match self.get(row, col) {
            NULL_INTEGER => NULL_NUMBER,
            v => v as f64,
        }
    }

    fn text(&self, row: usize, col: usize) -> String {
        match self.get(row, col) {
            NULL_INTEGER => String::new(),
            v => v.to_string(),
        }
    }

    fn cell_type(&self, row: usize, col: usize) -> CellType {
        match self.get(row, col) {
            NULL_INTEGER => CellType::Empty,
            _ => CellType::Number,
        }
    }

    fn put_value(&mut self, row: usize, col: usize, value: f64) {
        let offset = self.offset(row, col);
        self.data[offset] = to_integer(value);
    }

    fn put_text(&mut self, row: usize, col: usize, text: &str) {
        let trimmed = text.trim();
        match trimmed.parse::<i64>() {
            Ok(v) => {
                let offset = self.offset(row, col);
                self.data[offset] = v;
            }
            Err(_) => {
                let value = trimmed.parse::<f64>().unwrap_or(NULL_NUMBER);
                self.put_value(row, col, value);
            }
        }
    }

    fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    fn notifier_mut(&mut self) -> &mut ChangeNotifier {
        &mut self.notifier
    }

    fn blank(&self, n_rows: usize, n_cols: usize) -> Box<dyn Matrix> {
        Box::new(IntegerMatrix::new(n_rows, n_cols))
    }

    fn transposed(&self) -> Option<Box<dyn Matrix>> {
        let data = transpose_flat(&self.data, self.n_rows, self.n_cols);
        Some(Box::new(IntegerMatrix {
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

/// Round to the nearest integer. Invalid values and values outside the
/// range above [`NULL_INTEGER`] store [`NULL_INTEGER`].
fn to_integer(value: f64) -> i64 {
    let rounded = value.round();
    // i64::MIN as f64 and i64::MAX as f64 are -2^63 and 2^63
    if is_valid_number(value) && rounded > i64::MIN as f64 && rounded < i64::MAX as f64 {
        rounded as i64
    } else {
        NULL_INTEGER
    }
}
