//! Error types surfaced across the crate boundary.

use thiserror::Error;

/// Errors returned by tree construction and removal.
///
/// Validation errors are reported before any state mutation: a call that
/// fails with [`UnknownId`](TreeError::UnknownId),
/// [`AlreadyRemoved`](TreeError::AlreadyRemoved) or
/// [`InvalidParams`](TreeError::InvalidParams) leaves the tree and its data
/// manager exactly as they were. [`Poisoned`](TreeError::Poisoned) is the
/// exception: it reports that an *earlier* mutation died partway through and
/// the tree can no longer be trusted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// A sample id lies outside the training matrix.
    #[error("unknown sample id {0}")]
    UnknownId(u32),

    /// A sample id was already removed by an earlier batch, or appears twice
    /// within the current batch.
    #[error("sample id {0} is already removed")]
    AlreadyRemoved(u32),

    /// A hyperparameter or training input failed validation.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// A previous mutation failed partway through; the tree refuses further
    /// operations.
    #[error("tree is poisoned by an earlier failed mutation")]
    Poisoned,
}
