//! Matrix storage variants, annotation tables and column groups.

mod annotated;
mod annotation;
mod dense;
mod group;
mod indexed;
mod integer;
mod matrix;
mod mixed;
mod notify;
mod text;

pub use annotated::AnnotatedMatrix;
pub use annotation::{AnnotationValue, Annotations};
pub use dense::DenseMatrix;
pub use group::{GroupResolver, GroupSelector, MatrixGroup};
pub use indexed::{CellIndex, IndexedMatrix};
pub use integer::{IntegerMatrix, NULL_INTEGER};
pub use matrix::{
    cells_equal, copy_all_cells, copy_cell, is_valid_number, CellType, Layout, LayoutMut, Matrix,
    StorageKind, NULL_NUMBER,
};
pub use mixed::{Cell, MixedMatrix};
pub use notify::{ChangeNotifier, ListenerId};
pub use text::TextMatrix;
