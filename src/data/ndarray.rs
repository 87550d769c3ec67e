//! ndarray interop for feature matrices.

use ndarray::ArrayView2;

use super::matrix::BinaryMatrix;

impl BinaryMatrix {
    /// Copy a `[n_rows, n_features]` view into an owned matrix.
    ///
    /// Iteration follows the view's logical order, so any memory layout is
    /// accepted.
    ///
    /// # Example
    ///
    /// ```
    /// use deforest::BinaryMatrix;
    /// use ndarray::array;
    ///
    /// let view = array![[0u8, 1], [1, 0]];
    /// let matrix = BinaryMatrix::from_array(view.view());
    /// assert_eq!(matrix.row(1), &[1, 0]);
    /// ```
    pub fn from_array(view: ArrayView2<'_, u8>) -> Self {
        let (n_rows, n_features) = view.dim();
        let data: Vec<u8> = view.iter().copied().collect();
        Self::from_vec(data, n_rows, n_features)
    }
}
