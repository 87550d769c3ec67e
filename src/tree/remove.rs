//! Batch deletion: descend the tree, update the stored statistics, recheck
//! each split, and retrain the minimal invalidated subtrees.
//!
//! The descent is pre-order, left child before right. At every node the
//! counters and per-candidate statistics are updated first, then the node
//! decides its fate: a leaf just refreshes its prediction; an internal node
//! either collapses to a leaf (too few samples, pure, or no eligible
//! candidate left), keeps its split (replaying the persisted draw against
//! the recomputed Gibbs weights picks the same feature), or is retrained
//! from its remaining samples. Descendants of a retrained subtree are never
//! visited again within the same call, so retraining happens at the
//! shallowest invalidated node of each path.

use log::debug;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::data::DataManager;
use crate::params::TreeParams;

use super::build::TreeBuilder;
use super::node::{Leaf, Node};
use super::split::{gibbs_weights, replay_draw, split_score};

// =============================================================================
// RemovalReport
// =============================================================================

/// Telemetry for removal calls.
///
/// [`Tree::remove`](crate::Tree::remove) returns the report for that call
/// and accumulates the same numbers on the tree until
/// [`Tree::clear_removal_metrics`](crate::Tree::clear_removal_metrics).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RemovalReport {
    /// Number of subtree retrains.
    pub n_retrains: u32,
    /// Depth at which each retrain was rooted, in visit order.
    pub retrain_depths: Vec<u32>,
    /// Leaf nodes whose prediction was updated in place.
    pub n_leaf_updates: u32,
    /// Total number of samples fed into retraining.
    pub n_samples_retrained: u64,
}

impl RemovalReport {
    /// Whether no retrain or leaf update was recorded.
    pub fn is_empty(&self) -> bool {
        self.n_retrains == 0 && self.n_leaf_updates == 0
    }

    /// Reset all counters.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn merge(&mut self, other: &RemovalReport) {
        self.n_retrains += other.n_retrains;
        self.retrain_depths.extend_from_slice(&other.retrain_depths);
        self.n_leaf_updates += other.n_leaf_updates;
        self.n_samples_retrained += other.n_samples_retrained;
    }
}

// =============================================================================
// Remover
// =============================================================================

/// What a visited internal node does after its statistics are updated.
enum Action {
    Done,
    Collapse,
    Retrain { candidates: Box<[u32]> },
    Descend { feature: u32 },
}

/// Applies a removal batch to a subtree.
pub(crate) struct Remover<'a> {
    data: &'a DataManager,
    params: &'a TreeParams,
}

impl<'a> Remover<'a> {
    pub fn new(data: &'a DataManager, params: &'a TreeParams) -> Self {
        Self { data, params }
    }

    /// Remove `batch` from the subtree at `node`.
    ///
    /// `batch` must be ascending, non-empty, routed through this node, and
    /// already marked invalid in the data manager.
    pub fn remove(
        &self,
        node: &mut Node,
        batch: &[u32],
        rng: &mut Xoshiro256PlusPlus,
        report: &mut RemovalReport,
    ) {
        debug_assert!(!batch.is_empty());
        let removed_pos = batch
            .iter()
            .filter(|&&id| self.data.label(id) == 1)
            .count() as u32;

        let action = match node {
            Node::Leaf(leaf) => {
                leaf.sample_count -= batch.len() as u32;
                leaf.positive_count -= removed_pos;
                leaf.samples.retain(|id| batch.binary_search(id).is_err());
                report.n_leaf_updates += 1;
                Action::Done
            }
            Node::Internal(internal) => {
                internal.sample_count -= batch.len() as u32;
                internal.positive_count -= removed_pos;
                for &id in batch {
                    let row = self.data.row(id);
                    let positive = self.data.label(id) == 1;
                    for (k, &feature) in internal.candidates.iter().enumerate() {
                        internal.stats[k].remove(row[feature as usize] == 0, positive);
                    }
                }

                let count = internal.sample_count;
                let positive = internal.positive_count;
                if count < self.params.min_samples_split
                    || positive == 0
                    || positive == count
                {
                    Action::Collapse
                } else {
                    let eligible: Vec<bool> = internal
                        .stats
                        .iter()
                        .map(|s| s.eligible(self.params.min_samples_leaf))
                        .collect();
                    let scores: Vec<f64> = internal
                        .stats
                        .iter()
                        .map(|s| split_score(s, count))
                        .collect();
                    match gibbs_weights(&scores, &eligible, self.params.lambda) {
                        None => Action::Collapse,
                        Some(weights) => {
                            let chosen =
                                internal.candidates[replay_draw(&weights, internal.draw)];
                            if chosen == internal.feature {
                                Action::Descend {
                                    feature: internal.feature,
                                }
                            } else {
                                Action::Retrain {
                                    candidates: internal.candidates.clone(),
                                }
                            }
                        }
                    }
                }
            }
        };

        match action {
            Action::Done => {}
            Action::Collapse => {
                debug!(
                    "removal collapsed node at depth {} to a leaf",
                    node.depth()
                );
                self.collapse_to_leaf(node);
            }
            Action::Retrain { candidates } => {
                self.retrain(node, &candidates, rng, report);
            }
            Action::Descend { feature } => {
                let (left_batch, right_batch): (Vec<u32>, Vec<u32>) = batch
                    .iter()
                    .copied()
                    .partition(|&id| self.data.feature(id, feature) == 0);
                if let Node::Internal(internal) = node {
                    if !left_batch.is_empty() {
                        self.remove(&mut internal.left, &left_batch, rng, report);
                    }
                    if !right_batch.is_empty() {
                        self.remove(&mut internal.right, &right_batch, rng, report);
                    }
                }
            }
        }
    }

    /// Live sample ids under `node`, ascending.
    fn live_samples(&self, node: &Node) -> Vec<u32> {
        let mut ids = Vec::new();
        node.collect_samples(&mut ids);
        ids.retain(|&id| self.data.is_valid(id));
        ids.sort_unstable();
        ids
    }

    /// Replace `node` with a leaf over its remaining samples.
    fn collapse_to_leaf(&self, node: &mut Node) {
        let depth = node.depth();
        let ids = self.live_samples(node);
        let positive = ids
            .iter()
            .filter(|&&id| self.data.label(id) == 1)
            .count() as u32;
        *node = Node::Leaf(Leaf::new(depth, positive, ids));
    }

    /// Rebuild the subtree at `node` from its remaining samples.
    fn retrain(
        &self,
        node: &mut Node,
        candidates: &[u32],
        rng: &mut Xoshiro256PlusPlus,
        report: &mut RemovalReport,
    ) {
        let depth = node.depth();
        let ids = self.live_samples(node);
        debug!(
            "retraining subtree at depth {} over {} samples",
            depth,
            ids.len()
        );
        report.n_retrains += 1;
        report.retrain_depths.push(depth);
        report.n_samples_retrained += ids.len() as u64;

        // Drop the old subtree before building the replacement; peak
        // residency stays bounded by one subtree.
        *node = Node::Leaf(Leaf::new(depth, 0, Vec::new()));
        *node = TreeBuilder::new(self.data, self.params).build(ids, candidates, depth, rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_merge_and_clear() {
        let mut total = RemovalReport::default();
        assert!(total.is_empty());

        let call = RemovalReport {
            n_retrains: 1,
            retrain_depths: vec![2],
            n_leaf_updates: 3,
            n_samples_retrained: 40,
        };
        total.merge(&call);
        total.merge(&call);
        assert_eq!(total.n_retrains, 2);
        assert_eq!(total.retrain_depths, vec![2, 2]);
        assert_eq!(total.n_leaf_updates, 6);
        assert_eq!(total.n_samples_retrained, 80);

        total.clear();
        assert_eq!(total, RemovalReport::default());
    }
}
