//! Text-only storage.

use super::matrix::{format_number, is_valid_number, parse_number, CellType, Matrix, StorageKind};
use super::mixed::MixedMatrix;
use super::notify::ChangeNotifier;
use crate::error::{MatrixError, Result};

/// A row-major matrix of strings.
///
/// Non-empty cells are TEXT; numeric reads parse the text. Numeric
/// transforms produce a [`MixedMatrix`] so unparseable text survives.
#[derive(Debug, Clone)]
pub struct TextMatrix {
    n_rows: usize,
    n_cols: usize,
    data: Vec<String>,
    notifier: ChangeNotifier,
}

impl TextMatrix {
    /// Matrix of empty strings.
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            data: vec![String::new(); n_rows * n_cols],
            notifier: ChangeNotifier::new(),
        }
    }

    /// Build from nested rows.
    pub fn from_rows<S: AsRef<str>>(rows: &[Vec<S>]) -> Result<Self> {
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
            data.extend(row.iter().map(|s| s.as_ref().to_string()));
        }
        Ok(Self {
            n_rows,
            n_cols,
            data,
            notifier: ChangeNotifier::new(),
        })
    }

    /// Borrow one cell's text.
    pub fn get(&self, row: usize, col: usize) -> &str {
        &self.data[self.offset(row, col)]
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

impl Matrix for TextMatrix {
    fn n_rows(&self) -> usize {
        self.n_rows
    }

    fn n_cols(&self) -> usize {
        self.n_cols
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Text
    }

    fn value(&self, row: usize, col: usize) -> f64 {
        parse_number(self.get(row, col))
    }

    fn text(&self, row: usize, col: usize) -> String {
        self.get(row, col).to_string()
    }

    fn cell_type(&self, row: usize, col: usize) -> CellType {
        if self.get(row, col).is_empty() {
            CellType::Empty
        } else {
            CellType::Text
        }
    }

    fn put_value(&mut self, row: usize, col: usize, value: f64) {
        let offset = self.offset(row, col);
        self.data[offset] = if is_valid_number(value) {
            format_number(value)
        } else {
            String::new()
        };
    }

    fn put_text(&mut self, row: usize, col: usize, text: &str) {
        let offset = self.offset(row, col);
        self.data[offset] = text.to_string();
    }

    fn supports_text(&self) -> bool {
        true
    }

    fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    fn notifier_mut(&mut self) -> &mut ChangeNotifier {
        &mut self.notifier
    }

    fn blank(&self, n_rows: usize, n_cols: usize) -> Box<dyn Matrix> {
        Box::new(TextMatrix::new(n_rows, n_cols))
    }

    fn numeric_like(&self, n_rows: usize, n_cols: usize) -> Box<dyn Matrix> {
        Box::new(MixedMatrix::new(n_rows, n_cols))
    }

    /// Parseable cells become numbers, the rest stays text.
    fn to_numeric(&self) -> Box<dyn Matrix> {
        let mut out = MixedMatrix::new(self.n_rows, self.n_cols);
        for row in 0..self.n_rows {
            for col in 0..self.n_cols {
                let value = self.value(row, col);
                if is_valid_number(value) {
                    out.put_value(row, col, value);
                } else {
                    out.put_text(row, col, self.get(row, col));
                }
            }
        }
        Box::new(out)
    }

    fn clone_box(&self) -> Box<dyn Matrix> {
        Box::new(self.clone())
    }
}
