//! Tree hyperparameters.
//!
//! [`TreeParams`] groups every knob the builder and the remover share. The
//! same parameter set governs the initial construction and all subtree
//! retrains triggered by deletion, so it lives on the tree for its whole
//! lifetime.

use crate::error::TreeError;

/// Hyperparameters for building a [`Tree`](crate::Tree).
///
/// # Example
///
/// ```
/// use deforest::TreeParams;
///
/// let params = TreeParams::default()
///     .with_max_depth(6)
///     .with_lambda(0.01)
///     .with_seed(42);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeParams {
    /// Maximum tree depth. The root sits at depth 0, so `max_depth = 0`
    /// yields a single leaf.
    pub max_depth: u32,

    /// Minimum number of samples a node needs before a split is attempted.
    /// Must be at least 2.
    pub min_samples_split: u32,

    /// Minimum number of samples required on each side of a split.
    /// Must be at least 1.
    pub min_samples_leaf: u32,

    /// Noise temperature of the Gibbs distribution over candidate splits.
    ///
    /// Smaller values approach greedy argmin selection; larger values
    /// approach a uniform choice. Must be positive and finite.
    pub lambda: f64,

    /// Seed for the tree's random stream.
    pub seed: u64,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 2,
            min_samples_leaf: 1,
            lambda: 0.1,
            seed: 0,
        }
    }
}

impl TreeParams {
    /// Set the maximum depth.
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the minimum number of samples required to attempt a split.
    pub fn with_min_samples_split(mut self, min_samples_split: u32) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Set the minimum number of samples per split side.
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: u32) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Set the selection noise temperature.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidParams`] when `min_samples_split < 2`,
    /// `min_samples_leaf < 1`, or `lambda` is not a positive finite number.
    pub fn validate(&self) -> Result<(), TreeError> {
        if self.min_samples_split < 2 {
            return Err(TreeError::InvalidParams(format!(
                "min_samples_split must be at least 2, got {}",
                self.min_samples_split
            )));
        }
        if self.min_samples_leaf < 1 {
            return Err(TreeError::InvalidParams(format!(
                "min_samples_leaf must be at least 1, got {}",
                self.min_samples_leaf
            )));
        }
        if !self.lambda.is_finite() || self.lambda <= 0.0 {
            return Err(TreeError::InvalidParams(format!(
                "lambda must be positive and finite, got {}",
                self.lambda
            )));
        }
        Ok(())
    }
}
