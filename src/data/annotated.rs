//! A matrix with row and column annotation tables.

use super::annotation::{AnnotationValue, Annotations};
use super::group::{GroupResolver, MatrixGroup};
use super::matrix::{copy_cell, Matrix};
use crate::error::{MatrixError, Result};
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Inner {
    Owned(Box<dyn Matrix>),
    Shared(Arc<dyn Matrix>),
}

/// A [`Matrix`] together with row and column [`Annotations`].
///
/// The annotation tables are always owned. The inner matrix is either
/// owned exclusively or shared with other views; mutable access to a
/// shared matrix first takes a private copy.
#[derive(Debug, Clone)]
pub struct AnnotatedMatrix {
    inner: Inner,
    row_annotations: Annotations,
    col_annotations: Annotations,
}

impl AnnotatedMatrix {
    /// Wrap a matrix with empty annotation tables.
    pub fn new(matrix: Box<dyn Matrix>) -> Self {
        let (n_rows, n_cols) = matrix.shape();
        Self {
            inner: Inner::Owned(matrix),
            row_annotations: Annotations::new(n_rows),
            col_annotations: Annotations::new(n_cols),
        }
    }

    /// Wrap a matrix with existing annotation tables.
    pub fn with_annotations(
        matrix: Box<dyn Matrix>,
        row_annotations: Annotations,
        col_annotations: Annotations,
    ) -> Result<Self> {
        check_len(matrix.n_rows(), &row_annotations)?;
        check_len(matrix.n_cols(), &col_annotations)?;
        Ok(Self {
            inner: Inner::Owned(matrix),
            row_annotations,
            col_annotations,
        })
    }

    /// View over a shared matrix.
    pub fn view(matrix: Arc<dyn Matrix>) -> Self {
        let (n_rows, n_cols) = matrix.shape();
        Self {
            inner: Inner::Shared(matrix),
            row_annotations: Annotations::new(n_rows),
            col_annotations: Annotations::new(n_cols),
        }
    }

    /// Convert the inner matrix to shared storage and return a view over
    /// it carrying copies of the annotation tables.
    pub fn share(&mut self) -> Self {
        let shared = self.shared_matrix();
        Self {
            inner: Inner::Shared(shared),
            row_annotations: self.row_annotations.clone(),
            col_annotations: self.col_annotations.clone(),
        }
    }

    /// Copy with a private deep copy of the inner matrix.
    pub fn deep_copy(&self) -> Self {
        Self {
            inner: Inner::Owned(self.matrix().clone_box()),
            row_annotations: self.row_annotations.clone(),
            col_annotations: self.col_annotations.clone(),
        }
    }

    /// Same annotations around a different matrix of the same shape.
    pub fn with_matrix(&self, matrix: Box<dyn Matrix>) -> Result<Self> {
        Self::with_annotations(
            matrix,
            self.row_annotations.clone(),
            self.col_annotations.clone(),
        )
    }

    /// New matrix holding the rows at `indices` (in that order) and the
    /// matching row annotation slices. Storage variant is preserved.
    pub fn copy_of_rows(&self, indices: &[usize]) -> Result<Self> {
        let source = self.matrix();
        let (n_rows, n_cols) = source.shape();
        if let Some(&bad) = indices.iter().find(|&&i| i >= n_rows) {
            return Err(MatrixError::row_out_of_bounds(bad, n_rows));
        }
        let mut out = source.blank(indices.len(), n_cols);
        for (new_row, &old_row) in indices.iter().enumerate() {
            for col in 0..n_cols {
                copy_cell(source, old_row, col, out.as_mut(), new_row, col);
            }
        }
        Self::with_annotations(
            out,
            self.row_annotations.select(indices)?,
            self.col_annotations.clone(),
        )
    }

    /// New matrix holding the columns at `indices` (in that order).
    pub fn copy_of_cols(&self, indices: &[usize]) -> Result<Self> {
        let source = self.matrix();
        let (n_rows, n_cols) = source.shape();
        if let Some(&bad) = indices.iter().find(|&&i| i >= n_cols) {
            return Err(MatrixError::col_out_of_bounds(bad, n_cols));
        }
        let mut out = source.blank(n_rows, indices.len());
        for row in 0..n_rows {
            for (new_col, &old_col) in indices.iter().enumerate() {
                copy_cell(source, row, old_col, out.as_mut(), row, new_col);
            }
        }
        Self::with_annotations(
            out,
            self.row_annotations.clone(),
            self.col_annotations.select(indices)?,
        )
    }

    /// The inner matrix.
    pub fn matrix(&self) -> &dyn Matrix {
        match &self.inner {
            Inner::Owned(m) => m.as_ref(),
            Inner::Shared(m) => m.as_ref(),
        }
    }

    /// Mutable inner matrix; a shared matrix is copied first.
    pub fn matrix_mut(&mut self) -> &mut dyn Matrix {
        let private = match &self.inner {
            Inner::Shared(shared) => Some(shared.clone_box()),
            Inner::Owned(_) => None,
        };
        if let Some(copy) = private {
            self.inner = Inner::Owned(copy);
        }
        match &mut self.inner {
            Inner::Owned(m) => m.as_mut(),
            Inner::Shared(_) => unreachable!("shared matrix converted above"),
        }
    }

    /// Take the inner matrix out, copying it if shared.
    pub fn into_matrix(self) -> Box<dyn Matrix> {
        match self.inner {
            Inner::Owned(m) => m,
            Inner::Shared(m) => m.clone_box(),
        }
    }

    /// True when the inner matrix is shared with other views.
    pub fn is_view(&self) -> bool {
        matches!(self.inner, Inner::Shared(_))
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.matrix().n_rows()
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.matrix().n_cols()
    }

    /// Row annotation table.
    pub fn row_annotations(&self) -> &Annotations {
        &self.row_annotations
    }

    /// Column annotation table.
    pub fn col_annotations(&self) -> &Annotations {
        &self.col_annotations
    }

    /// Mutable row annotation table. Its length is fixed.
    pub fn row_annotations_mut(&mut self) -> &mut Annotations {
        &mut self.row_annotations
    }

    /// Mutable column annotation table. Its length is fixed.
    pub fn col_annotations_mut(&mut self) -> &mut Annotations {
        &mut self.col_annotations
    }

    /// One row annotation value.
    pub fn row_annotation(&self, name: &str, row: usize) -> Option<&AnnotationValue> {
        self.row_annotations.value(name, row)
    }

    /// One column annotation value.
    pub fn col_annotation(&self, name: &str, col: usize) -> Option<&AnnotationValue> {
        self.col_annotations.value(name, col)
    }

    /// Consume into parts.
    pub fn into_parts(self) -> (Box<dyn Matrix>, Annotations, Annotations) {
        let matrix = match self.inner {
            Inner::Owned(m) => m,
            Inner::Shared(m) => m.clone_box(),
        };
        (matrix, self.row_annotations, self.col_annotations)
    }

    fn shared_matrix(&mut self) -> Arc<dyn Matrix> {
        if let Inner::Shared(shared) = &self.inner {
            return Arc::clone(shared);
        }
        let owned = std::mem::replace(&mut self.inner, Inner::Shared(placeholder()));
        let shared: Arc<dyn Matrix> = match owned {
            Inner::Owned(m) => Arc::from(m),
            Inner::Shared(m) => m,
        };
        self.inner = Inner::Shared(Arc::clone(&shared));
        shared
    }
}

impl GroupResolver for AnnotatedMatrix {
    fn resolve_group(&self, group: &MatrixGroup) -> Result<Vec<usize>> {
        self.col_annotations.resolve_group(group)
    }
}

fn check_len(expected: usize, annotations: &Annotations) -> Result<()> {
    if annotations.len() != expected {
        return Err(MatrixError::DimensionMismatch {
            expected,
            actual: annotations.len(),
        });
    }
    Ok(())
}

fn placeholder() -> Arc<dyn Matrix> {
    Arc::new(super::dense::DenseMatrix::new(0, 0))
}
