//! Dense row-major storage for binary feature matrices.

/// Row-major dense matrix of binary feature values.
///
/// Stores all elements contiguously in row-major order, which matches the
/// per-sample scans of the splitter and remover: a node visit touches every
/// candidate feature of a row at once.
///
/// Values are expected to be 0 or 1. The constructors accept any `u8`
/// content so matrices can be assembled incrementally; [`Tree::build`]
/// rejects non-binary data with a validation error rather than a panic.
///
/// [`Tree::build`]: crate::Tree::build
///
/// # Example
///
/// ```
/// use deforest::BinaryMatrix;
///
/// // 2 rows, 3 features
/// let matrix = BinaryMatrix::from_vec(vec![0, 1, 0, 1, 1, 0], 2, 3);
/// assert_eq!(matrix.n_rows(), 2);
/// assert_eq!(matrix.row(1), &[1, 1, 0]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMatrix {
    data: Box<[u8]>,
    n_rows: usize,
    n_features: usize,
}

impl BinaryMatrix {
    /// Create a matrix from a flat row-major vector, taking ownership.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != n_rows * n_features`.
    pub fn from_vec(data: Vec<u8>, n_rows: usize, n_features: usize) -> Self {
        assert_eq!(
            data.len(),
            n_rows * n_features,
            "data length {} does not match dimensions {}x{}",
            data.len(),
            n_rows,
            n_features
        );
        Self {
            data: data.into_boxed_slice(),
            n_rows,
            n_features,
        }
    }

    /// Create a matrix from per-row slices.
    ///
    /// # Panics
    ///
    /// Panics if the rows have differing lengths.
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Self {
        let n_rows = rows.len();
        let n_features = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(n_rows * n_features);
        for row in rows {
            let row = row.as_ref();
            assert_eq!(
                row.len(),
                n_features,
                "row length {} does not match feature count {}",
                row.len(),
                n_features
            );
            data.extend_from_slice(row);
        }
        Self::from_vec(data, n_rows, n_features)
    }

    /// Number of rows.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of features.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// One row as a slice of feature values.
    #[inline]
    pub fn row(&self, row: usize) -> &[u8] {
        let start = row * self.n_features;
        &self.data[start..start + self.n_features]
    }

    /// A single element.
    #[inline]
    pub fn get(&self, row: usize, feature: usize) -> u8 {
        debug_assert!(feature < self.n_features);
        self.data[row * self.n_features + feature]
    }

    /// Iterate over rows in order.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        (0..self.n_rows).map(move |i| self.row(i))
    }

    /// Whether every element is 0 or 1.
    pub fn is_binary(&self) -> bool {
        self.data.iter().all(|&v| v <= 1)
    }
}
