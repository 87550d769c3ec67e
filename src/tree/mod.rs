//! Randomized Gini decision trees with support for training-data deletion.
//!
//! # Overview
//!
//! A [`Tree`] is built once over a binary feature matrix and binary labels,
//! then serves predictions and accepts deletion batches. Every internal
//! node persists the sufficient statistics of *all* the split candidates it
//! considered plus the uniform draw that picked the winner from a Gibbs
//! distribution over their Gini scores. Deleting samples therefore reduces
//! to walking the affected paths, subtracting the deleted rows from the
//! stored statistics, and replaying each node's draw against the updated
//! distribution: only a node whose replay now picks a different feature is
//! rebuilt, and only that subtree.
//!
//! Mutation is single-owner (`&mut self`); prediction is `&self` and may
//! fan out across threads.

mod build;
mod node;
mod remove;
mod split;
mod validate;

pub use node::{Internal, Leaf, Node, SplitStats, EMPTY_LEAF_PROBABILITY};
pub use remove::RemovalReport;
pub use split::{gibbs_weights, gini, replay_draw, split_score};
pub use validate::ValidationError;

use std::fmt::Write as _;

use log::debug;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;

use crate::data::{BinaryMatrix, DataManager};
use crate::error::TreeError;
use crate::params::TreeParams;

use build::TreeBuilder;
use remove::Remover;

/// A binary-classification decision tree over binary features that supports
/// efficient deletion of training examples.
///
/// # Example
///
/// ```
/// use deforest::{BinaryMatrix, Tree, TreeParams};
///
/// let x = BinaryMatrix::from_vec(vec![0, 0, 0, 1, 1, 0, 1, 1], 4, 2);
/// let y = vec![0, 0, 1, 1];
/// let params = TreeParams::default().with_lambda(1e-6).with_seed(7);
///
/// let mut tree = Tree::build(x, y, params).unwrap();
/// assert_eq!(tree.predict_row(&[1, 0]), 1.0);
///
/// let report = tree.remove(&[3]).unwrap();
/// assert_eq!(report.n_leaf_updates, 1);
/// assert_eq!(report.n_retrains, 0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    params: TreeParams,
    data: DataManager,
    root: Node,
    rng: Xoshiro256PlusPlus,
    metrics: RemovalReport,
    poisoned: bool,
}

impl Tree {
    /// Build a tree from a binary feature matrix and labels.
    ///
    /// Given identical inputs, parameters and seed, the resulting tree is
    /// identical.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidParams`] when the parameters fail
    /// [`TreeParams::validate`], the training set or feature set is empty,
    /// the label count does not match the row count, or any feature value
    /// or label is not 0/1.
    pub fn build(x: BinaryMatrix, y: Vec<u8>, params: TreeParams) -> Result<Self, TreeError> {
        params.validate()?;
        if x.n_rows() == 0 {
            return Err(TreeError::InvalidParams("training set is empty".into()));
        }
        if x.n_features() == 0 {
            return Err(TreeError::InvalidParams("feature set is empty".into()));
        }
        if y.len() != x.n_rows() {
            return Err(TreeError::InvalidParams(format!(
                "label count {} does not match sample count {}",
                y.len(),
                x.n_rows()
            )));
        }
        if !x.is_binary() {
            return Err(TreeError::InvalidParams(
                "feature values must be 0 or 1".into(),
            ));
        }
        if y.iter().any(|&label| label > 1) {
            return Err(TreeError::InvalidParams("labels must be 0 or 1".into()));
        }

        let data = DataManager::new(x, y);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(params.seed);
        let ids: Vec<u32> = (0..data.n_rows() as u32).collect();
        let candidates: Vec<u32> = (0..data.n_features() as u32).collect();
        let root = TreeBuilder::new(&data, &params).build(ids, &candidates, 0, &mut rng);
        debug!(
            "built tree over {} samples: {} nodes, {} leaves, depth {}",
            data.n_rows(),
            root.n_nodes(),
            root.n_leaves(),
            root.max_depth()
        );

        Ok(Self {
            params,
            data,
            root,
            rng,
            metrics: RemovalReport::default(),
            poisoned: false,
        })
    }

    /// Predicted probability of the positive class for one row.
    ///
    /// # Panics
    ///
    /// Panics if `row.len()` does not match the training feature count, or
    /// if the tree is poisoned.
    pub fn predict_row(&self, row: &[u8]) -> f64 {
        assert!(!self.poisoned, "tree is poisoned");
        assert_eq!(
            row.len(),
            self.data.n_features(),
            "row length {} does not match feature count {}",
            row.len(),
            self.data.n_features()
        );
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf(leaf) => return leaf.probability(),
                Node::Internal(internal) => {
                    node = if row[internal.feature as usize] == 0 {
                        &internal.left
                    } else {
                        &internal.right
                    };
                }
            }
        }
    }

    /// Predicted probabilities for every row of `x`.
    ///
    /// # Panics
    ///
    /// Panics if `x.n_features()` does not match the training feature
    /// count, or if the tree is poisoned.
    pub fn predict(&self, x: &BinaryMatrix) -> Vec<f64> {
        x.rows().map(|row| self.predict_row(row)).collect()
    }

    /// [`predict`](Self::predict) with rows fanned out across threads.
    pub fn par_predict(&self, x: &BinaryMatrix) -> Vec<f64> {
        (0..x.n_rows())
            .into_par_iter()
            .map(|i| self.predict_row(x.row(i)))
            .collect()
    }

    /// Delete a batch of training samples and repair the tree.
    ///
    /// Returns the telemetry for this call; the same numbers accumulate on
    /// the tree until [`clear_removal_metrics`](Self::clear_removal_metrics).
    /// An empty batch is a no-op.
    ///
    /// # Errors
    ///
    /// [`TreeError::UnknownId`] / [`TreeError::AlreadyRemoved`] when the
    /// batch fails validation — the tree and its data are left unchanged —
    /// and [`TreeError::Poisoned`] when an earlier call died partway
    /// through. If this call itself panics (for example on allocation
    /// failure during a retrain), the tree stays poisoned and refuses all
    /// further work.
    pub fn remove(&mut self, ids: &[u32]) -> Result<RemovalReport, TreeError> {
        if self.poisoned {
            return Err(TreeError::Poisoned);
        }
        if ids.is_empty() {
            return Ok(RemovalReport::default());
        }
        self.data.mark_removed(ids)?;

        let mut batch = ids.to_vec();
        batch.sort_unstable();
        let mut report = RemovalReport::default();

        // Poisoned for the duration of the structural mutation; a panic
        // that unwinds out of the remover leaves the flag set.
        self.poisoned = true;
        Remover::new(&self.data, &self.params).remove(
            &mut self.root,
            &batch,
            &mut self.rng,
            &mut report,
        );
        self.poisoned = false;

        self.metrics.merge(&report);
        Ok(report)
    }

    /// Accumulated removal telemetry since the last clear.
    pub fn removal_metrics(&self) -> &RemovalReport {
        &self.metrics
    }

    /// Reset the accumulated removal telemetry.
    pub fn clear_removal_metrics(&mut self) {
        self.metrics.clear();
    }

    /// Check every structural invariant of the tree.
    ///
    /// # Errors
    ///
    /// The first violation found, if any.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate::validate_tree(&self.root, &self.data, &self.params)
    }

    /// The tree's parameters.
    pub fn params(&self) -> &TreeParams {
        &self.params
    }

    /// The root node.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// The training data and validity set.
    pub fn data(&self) -> &DataManager {
        &self.data
    }

    /// Number of live training samples.
    pub fn n_samples(&self) -> usize {
        self.data.n_valid()
    }

    /// Number of nodes.
    pub fn n_nodes(&self) -> usize {
        self.root.n_nodes()
    }

    /// Number of leaves.
    pub fn n_leaves(&self) -> usize {
        self.root.n_leaves()
    }

    /// Depth of the deepest node.
    pub fn depth(&self) -> u32 {
        self.root.max_depth()
    }

    /// Render an indented dump of the tree for debugging.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        dump_node(&self.root, &mut out);
        out
    }
}

fn dump_node(node: &Node, out: &mut String) {
    let indent = "  ".repeat(node.depth() as usize);
    match node {
        Node::Leaf(leaf) => {
            let _ = writeln!(
                out,
                "{indent}leaf p={:.3} n={} ids={:?}",
                leaf.probability(),
                leaf.sample_count(),
                leaf.samples()
            );
        }
        Node::Internal(internal) => {
            let _ = writeln!(
                out,
                "{indent}x{}? n={} pos={}",
                internal.feature(),
                internal.sample_count(),
                internal.positive_count()
            );
            dump_node(&internal.left, out);
            dump_node(&internal.right, out);
        }
    }
}
