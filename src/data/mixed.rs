//! Heterogeneous number/text storage.

use super::matrix::{format_number, CellType, Layout, LayoutMut, Matrix, StorageKind, NULL_NUMBER};
use super::notify::ChangeNotifier;
use crate::error::{MatrixError, Result};
use serde::{Deserialize, Serialize};

/// One cell of a [`MixedMatrix`]. The variant is the cell's type tag.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Cell {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

impl Cell {
    /// Numeric content; text and empty cells yield [`NULL_NUMBER`].
    #[inline]
    pub fn as_number(&self) -> f64 {
        match self {
            Cell::Number(v) => *v,
            _ => NULL_NUMBER,
        }
    }

    /// Type tag.
    pub fn cell_type(&self) -> CellType {
        match self {
            Cell::Number(_) => CellType::Number,
            Cell::Text(_) => CellType::Text,
            Cell::Empty => CellType::Empty,
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        if value == NULL_NUMBER {
            Cell::Empty
        } else {
            Cell::Number(value)
        }
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        if text.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(text.to_string())
        }
    }
}

/// A matrix whose cells may independently hold numbers or text.
///
/// Text cells are never parsed: they read as [`NULL_NUMBER`] and are skipped
/// by numeric operations.
#[derive(Debug, Clone)]
pub struct MixedMatrix {
    n_rows: usize,
    n_cols: usize,
    cells: Vec<Cell>,
    notifier: ChangeNotifier,
}

impl MixedMatrix {
    /// Create a matrix of empty cells.
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            cells: vec![Cell::Empty; n_rows * n_cols],
            notifier: ChangeNotifier::new(),
        }
    }

    /// Build from nested rows of cells.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut cells = Vec::with_capacity(n_rows * n_cols);
        for row in rows {
            if row.len() != n_cols {
                return Err(MatrixError::DimensionMismatch {
                    expected: n_cols,
                    actual: row.len(),
                });
            }
            cells.extend(row);
        }
        Ok(Self {
            n_rows,
            n_cols,
            cells,
            notifier: ChangeNotifier::new(),
        })
    }

    /// Borrow one cell.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        &self.cells[self.offset(row, col)]
    }

    /// Replace one cell and fire the change notification.
    pub fn set_cell(&mut self, row: usize, col: usize, cell: Cell) {
        self.put_cell(row, col, cell);
        self.fire_changed();
    }

    fn put_cell(&mut self, row: usize, col: usize, cell: Cell) {
        let offset = self.offset(row, col);
        self.cells[offset] = cell;
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

impl Matrix for MixedMatrix {
    fn n_rows(&self) -> usize {
        self.n_rows
    }

    fn n_cols(&self) -> usize {
        self.n_cols
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Mixed
    }

    fn value(&self, row: usize, col: usize) -> f64 {
        self.cell(row, col).as_number()
    }

    fn text(&self, row: usize, col: usize) -> String {
        match self.cell(row, col) {
            Cell::Number(v) => format_number(*v),
            Cell::Text(s) => s.clone(),
            Cell::Empty => String::new(),
        }
    }

    fn cell_type(&self, row: usize, col: usize) -> CellType {
        self.cell(row, col).cell_type()
    }

    fn put_value(&mut self, row: usize, col: usize, value: f64) {
        self.put_cell(row, col, Cell::from(value));
    }

    fn put_text(&mut self, row: usize, col: usize, text: &str) {
        self.put_cell(row, col, Cell::from(text));
    }

    fn layout(&self) -> Layout<'_> {
        Layout::Cells(&self.cells)
    }

    fn layout_mut(&mut self) -> LayoutMut<'_> {
        LayoutMut::Cells(&mut self.cells)
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
        Box::new(MixedMatrix::new(n_rows, n_cols))
    }

    fn numeric_like(&self, n_rows: usize, n_cols: usize) -> Box<dyn Matrix> {
        Box::new(MixedMatrix::new(n_rows, n_cols))
    }

    fn to_numeric(&self) -> Box<dyn Matrix> {
        Box::new(self.clone())
    }

    fn clone_box(&self) -> Box<dyn Matrix> {
        Box::new(self.clone())
    }
}
