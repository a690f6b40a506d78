//! Composable Matrix Transforms Library
//!
//! This library provides a storage-independent matrix abstraction and the
//! statistical transforms commonly run over expression-style data sets.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **data**: Storage variants (dense, mixed, index-coded, integer, text),
//!   annotation tables, annotated matrices and column groups
//! - **apply**: Bulk-apply engine dispatching on storage layout
//! - **ops**: In-place arithmetic and copying element-wise transforms
//! - **stats**: Reductions, z-scores, quantile normalization, t-tests
//! - **collapse**: Collapsing rows that share a key
//! - **transpose**: Layout-aware transposition
//! - **pipeline**: Pipeline composition and execution
//!
//! # Example
//!
//! ```
//! use composable_matrix::prelude::*;
//!
//! let matrix = DenseMatrix::from_rows(&[vec![1.0, 2.0], vec![4.0, 8.0]]).unwrap();
//! let mut data = AnnotatedMatrix::new(Box::new(matrix));
//! data.row_annotations_mut().insert("gene", vec!["A", "A"]).unwrap();
//!
//! let result = Pipeline::new()
//!     .add(1.0)
//!     .log(2.0)
//!     .collapse(
//!         CollapseKey::Annotation("gene".to_string()),
//!         CollapseRule::MaxMean,
//!     )
//!     .run(&data)
//!     .unwrap();
//! assert_eq!(result.n_rows(), 1);
//! ```

pub mod apply;
pub mod collapse;
pub mod data;
pub mod error;
pub mod ops;
pub mod pipeline;
pub mod stats;
pub mod transpose;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::apply::{
        apply_cells, apply_cols, apply_numeric, apply_rows, for_each_col, for_each_row,
        reduce_cols, reduce_rows, BufferMode,
    };
    pub use crate::collapse::{
        collapse_by_max_value_in_column, collapse_rows, collapse_rows_with_config,
        sanitize_p_value, CollapseConfig, CollapseKey, CollapseReport, CollapseRule,
        CollapsedGroup, DEGENERATE_P_VALUE,
    };
    pub use crate::data::{
        AnnotatedMatrix, AnnotationValue, Annotations, Cell, CellIndex, CellType, DenseMatrix,
        GroupResolver, GroupSelector, IndexedMatrix, IntegerMatrix, Matrix, MatrixGroup,
        MixedMatrix, StorageKind, TextMatrix, NULL_NUMBER,
    };
    pub use crate::error::{MatrixError, Result};
    pub use crate::ops::{
        add, divide, log, log10, log2, multiply, subtract, threshold, ElementwiseOp,
    };
    pub use crate::pipeline::{Pipeline, PipelineConfig, PipelineStep};
    pub use crate::stats::{
        col_statistics, group_zscore, matrix_max, matrix_min, quantile_normalize,
        row_statistics, row_zscore, welch_t_test, zscore, zscore_axis, Axis, Statistic,
        ZERO_SD_SCORE,
    };
    pub use crate::transpose::{transpose, transpose_annotated};
}
