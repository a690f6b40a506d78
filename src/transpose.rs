//! Transposition that keeps the storage variant.

use crate::data::{copy_cell, AnnotatedMatrix, Matrix};
use crate::error::Result;

/// Transpose a row-major buffer of `n_rows x n_cols` into row-major
/// `n_cols x n_rows`.
///
/// Walks the source once; the column counter wraps at `n_cols` to detect
/// row boundaries.
pub fn transpose_flat<T: Copy + Default>(data: &[T], n_rows: usize, n_cols: usize) -> Vec<T> {
    let mut out = vec![T::default(); data.len()];
    let mut row = 0;
    for (i, &value) in data.iter().enumerate() {
        let col = i % n_cols;
        if col == 0 && i > 0 {
            row += 1;
        }
        out[col * n_rows + row] = value;
    }
    out
}

/// New matrix with rows and columns swapped, of the same storage variant.
///
/// Variants with a layout-specific transposition use it; the rest are
/// copied cell by cell, keeping each cell's content type.
pub fn transpose<M: Matrix + ?Sized>(matrix: &M) -> Box<dyn Matrix> {
    if let Some(fast) = matrix.transposed() {
        return fast;
    }
    let (n_rows, n_cols) = matrix.shape();
    let mut out = matrix.blank(n_cols, n_rows);
    for row in 0..n_rows {
        for col in 0..n_cols {
            copy_cell(matrix, row, col, out.as_mut(), col, row);
        }
    }
    out
}

/// Transpose an annotated matrix; row and column annotation tables swap.
pub fn transpose_annotated(matrix: &AnnotatedMatrix) -> Result<AnnotatedMatrix> {
    AnnotatedMatrix::with_annotations(
        transpose(matrix.matrix()),
        matrix.col_annotations().clone(),
        matrix.row_annotations().clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{
        cells_equal, Cell, CellIndex, DenseMatrix, IndexedMatrix, IntegerMatrix, MixedMatrix,
        TextMatrix, NULL_INTEGER,
    };

    fn variants() -> Vec<Box<dyn Matrix>> {
        let dense = DenseMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let strided = vec![0.0, 1.0, 4.0, 2.0, 5.0, 3.0, 6.0];
        let indexed =
            IndexedMatrix::from_parts(2, 3, strided, CellIndex::strided(1, 1, 2)).unwrap();
        let integer =
            IntegerMatrix::from_row_major(2, 3, vec![1, NULL_INTEGER, 3, 4, 5, 6]).unwrap();
        let mixed = MixedMatrix::from_rows(vec![
            vec![Cell::from("a"), Cell::Number(2.0), Cell::Empty],
            vec![Cell::Number(4.0), Cell::from("b"), Cell::Number(6.0)],
        ])
        .unwrap();
        let text = TextMatrix::from_rows(&[vec!["x", "1", ""], vec!["y", "2.5", "z"]]).unwrap();
        vec![
            Box::new(dense),
            Box::new(indexed),
            Box::new(integer),
            Box::new(mixed),
            Box::new(text),
        ]
    }

    #[test]
    fn test_transpose_flat() {
        let data = [1, 2, 3, 4, 5, 6];
        assert_eq!(transpose_flat(&data, 2, 3), vec![1, 4, 2, 5, 3, 6]);
        assert_eq!(transpose_flat(&data, 1, 6), data.to_vec());
    }

    #[test]
    fn test_transpose_swaps_cells() {
        for m in variants() {
            let t = transpose(m.as_ref());
            assert_eq!(t.shape(), (3, 2), "{}", m.kind());
            assert_eq!(t.kind(), m.kind());
            for row in 0..2 {
                for col in 0..3 {
                    assert_eq!(t.cell_type(col, row), m.cell_type(row, col), "{}", m.kind());
                    assert_eq!(t.text(col, row), m.text(row, col), "{}", m.kind());
                }
            }
        }
    }

    #[test]
    fn test_transpose_twice_is_identity() {
        for m in variants() {
            let back = transpose(transpose(m.as_ref()).as_ref());
            assert!(cells_equal(m.as_ref(), back.as_ref()), "{}", m.kind());
        }
    }

    #[test]
    fn test_transpose_annotated_swaps_tables() {
        let m = DenseMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let mut am = AnnotatedMatrix::new(Box::new(m));
        am.row_annotations_mut().insert("gene", vec!["g1", "g2"]).unwrap();
        am.col_annotations_mut()
            .insert("sample", vec!["s1", "s2", "s3"])
            .unwrap();

        let t = transpose_annotated(&am).unwrap();
        assert_eq!(t.row_annotations().texts("sample").unwrap(), vec!["s1", "s2", "s3"]);
        assert_eq!(t.col_annotations().texts("gene").unwrap(), vec!["g1", "g2"]);
        assert_eq!(t.matrix().value(2, 1), 6.0);

        let back = transpose_annotated(&t).unwrap();
        assert!(cells_equal(back.matrix(), am.matrix()));
        assert_eq!(back.row_annotations(), am.row_annotations());
        assert_eq!(back.col_annotations(), am.col_annotations());
    }
}
