//! Ownership and lifecycle of the training data.

use fixedbitset::FixedBitSet;

use crate::data::matrix::BinaryMatrix;
use crate::error::TreeError;

/// Owns the training matrix and labels, and tracks which sample ids are
/// still live.
///
/// Removal is logical: rows are never physically deleted, so a sample id
/// keeps referring to the same row across removal batches, and the stored
/// feature values of a removed sample remain readable while its statistics
/// are subtracted out of the tree. Removed ids simply stop counting as
/// valid and never participate in statistics again.
#[derive(Debug, Clone, PartialEq)]
pub struct DataManager {
    x: BinaryMatrix,
    y: Box<[u8]>,
    valid: FixedBitSet,
    n_valid: usize,
}

impl DataManager {
    /// Take ownership of the training data, with every id initially valid.
    ///
    /// # Panics
    ///
    /// Panics if `y.len() != x.n_rows()`.
    pub fn new(x: BinaryMatrix, y: Vec<u8>) -> Self {
        assert_eq!(
            x.n_rows(),
            y.len(),
            "label count {} does not match row count {}",
            y.len(),
            x.n_rows()
        );
        let n = x.n_rows();
        let mut valid = FixedBitSet::with_capacity(n);
        valid.insert_range(..);
        Self {
            x,
            y: y.into_boxed_slice(),
            valid,
            n_valid: n,
        }
    }

    /// Total number of rows, live or removed.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.x.n_rows()
    }

    /// Number of features.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.x.n_features()
    }

    /// Number of live sample ids.
    #[inline]
    pub fn n_valid(&self) -> usize {
        self.n_valid
    }

    /// Whether `id` refers to a live sample.
    #[inline]
    pub fn is_valid(&self, id: u32) -> bool {
        (id as usize) < self.x.n_rows() && self.valid.contains(id as usize)
    }

    /// Feature row for `id`.
    #[inline]
    pub fn row(&self, id: u32) -> &[u8] {
        self.x.row(id as usize)
    }

    /// A single feature value.
    #[inline]
    pub fn feature(&self, id: u32, feature: u32) -> u8 {
        self.x.get(id as usize, feature as usize)
    }

    /// Label for `id`.
    #[inline]
    pub fn label(&self, id: u32) -> u8 {
        self.y[id as usize]
    }

    /// The underlying feature matrix.
    pub fn matrix(&self) -> &BinaryMatrix {
        &self.x
    }

    /// All labels, indexed by sample id.
    pub fn labels(&self) -> &[u8] {
        &self.y
    }

    /// Iterate over live sample ids in ascending order.
    pub fn valid_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.valid.ones().map(|i| i as u32)
    }

    /// Logically delete a batch of sample ids.
    ///
    /// Atomic: the whole batch is validated before anything is marked, so a
    /// failed call leaves the validity set untouched.
    ///
    /// # Errors
    ///
    /// [`TreeError::UnknownId`] when an id is out of range;
    /// [`TreeError::AlreadyRemoved`] when an id is already invalid or
    /// appears more than once in `ids`.
    pub fn mark_removed(&mut self, ids: &[u32]) -> Result<(), TreeError> {
        for &id in ids {
            if (id as usize) >= self.x.n_rows() {
                return Err(TreeError::UnknownId(id));
            }
            if !self.valid.contains(id as usize) {
                return Err(TreeError::AlreadyRemoved(id));
            }
        }
        let mut sorted = ids.to_vec();
        sorted.sort_unstable();
        if let Some(pair) = sorted.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(TreeError::AlreadyRemoved(pair[0]));
        }
        for &id in ids {
            self.valid.set(id as usize, false);
        }
        self.n_valid -= ids.len();
        Ok(())
    }
}
