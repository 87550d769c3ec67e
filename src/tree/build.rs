//! Recursive tree construction.

use rand_xoshiro::Xoshiro256PlusPlus;

use crate::data::DataManager;
use crate::params::TreeParams;

use super::node::{Internal, Leaf, Node};
use super::split::{SplitRecord, Splitter};

/// Builds subtrees from sample-id sets.
///
/// Used for initial construction and for retraining subtrees invalidated
/// by deletion; both paths must produce identical structures for identical
/// inputs and RNG state.
pub(crate) struct TreeBuilder<'a> {
    data: &'a DataManager,
    params: &'a TreeParams,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(data: &'a DataManager, params: &'a TreeParams) -> Self {
        Self { data, params }
    }

    /// Build the subtree for `ids` with candidate features `candidates`,
    /// rooted at `depth`.
    ///
    /// `ids` must be ascending. Partitions preserve the order, so every
    /// leaf ends up with an ascending id list.
    pub fn build(
        &self,
        ids: Vec<u32>,
        candidates: &[u32],
        depth: u32,
        rng: &mut Xoshiro256PlusPlus,
    ) -> Node {
        let count = ids.len() as u32;
        let positive = ids
            .iter()
            .filter(|&&id| self.data.label(id) == 1)
            .count() as u32;

        let stop = count < self.params.min_samples_split
            || depth == self.params.max_depth
            || positive == 0
            || positive == count
            || candidates.is_empty();
        if stop {
            return Node::Leaf(Leaf::new(depth, positive, ids));
        }

        let splitter = Splitter::new(self.data, self.params);
        let Some(record) = splitter.split(&ids, candidates, rng) else {
            return Node::Leaf(Leaf::new(depth, positive, ids));
        };
        let SplitRecord {
            feature,
            draw,
            left_ids,
            right_ids,
            stats,
        } = record;

        let child_candidates: Vec<u32> = candidates
            .iter()
            .copied()
            .filter(|&f| f != feature)
            .collect();
        let left = self.build(left_ids, &child_candidates, depth + 1, rng);
        let right = self.build(right_ids, &child_candidates, depth + 1, rng);

        Node::Internal(Internal {
            depth,
            feature,
            candidates: candidates.to_vec().into_boxed_slice(),
            stats,
            sample_count: count,
            positive_count: positive,
            draw,
            left: Box::new(left),
            right: Box::new(right),
        })
    }
}
