//! Structural invariant checks for built and mutated trees.
//!
//! Every invariant the builder establishes must survive every removal
//! batch; [`Tree::validate`](crate::Tree::validate) walks the whole tree
//! and reports the first violation. Intended for tests and debugging, not
//! for the hot path.

use crate::data::DataManager;
use crate::params::TreeParams;

use super::node::{Internal, Node};

/// Violations reported by [`Tree::validate`](crate::Tree::validate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A node sits deeper than `max_depth`.
    TooDeep { depth: u32, max_depth: u32 },
    /// A child's depth is not its parent's depth plus one.
    BadChildDepth { depth: u32, child_depth: u32 },
    /// A leaf references a sample id that is no longer valid.
    DeadSampleId { depth: u32, id: u32 },
    /// Stored counts disagree with the samples actually present.
    BadCounts { depth: u32 },
    /// The chosen feature is not among the node's candidates.
    ForeignFeature { depth: u32, feature: u32 },
    /// The chosen feature no longer leaves `min_samples_leaf` samples on
    /// both sides under the stored statistics.
    IneligibleFeature { depth: u32, feature: u32 },
    /// Statistics for a candidate do not sum to the node totals.
    StatSumMismatch { depth: u32, feature: u32 },
    /// A child's candidate set is not the parent's minus the chosen
    /// feature.
    BadCandidateSet { depth: u32 },
    /// Children do not partition the node's samples by the chosen
    /// feature's value.
    BadPartition { depth: u32, feature: u32 },
}

pub(crate) fn validate_tree(
    root: &Node,
    data: &DataManager,
    params: &TreeParams,
) -> Result<(), ValidationError> {
    validate_node(root, data, params)
}

fn validate_node(
    node: &Node,
    data: &DataManager,
    params: &TreeParams,
) -> Result<(), ValidationError> {
    let depth = node.depth();
    if depth > params.max_depth {
        return Err(ValidationError::TooDeep {
            depth,
            max_depth: params.max_depth,
        });
    }

    match node {
        Node::Leaf(leaf) => {
            for &id in leaf.samples() {
                if !data.is_valid(id) {
                    return Err(ValidationError::DeadSampleId { depth, id });
                }
            }
            let positives = leaf
                .samples()
                .iter()
                .filter(|&&id| data.label(id) == 1)
                .count() as u32;
            if leaf.sample_count() != leaf.samples().len() as u32
                || leaf.positive_count() != positives
            {
                return Err(ValidationError::BadCounts { depth });
            }
            Ok(())
        }
        Node::Internal(internal) => {
            validate_internal(internal, data, params)?;
            validate_node(&internal.left, data, params)?;
            validate_node(&internal.right, data, params)
        }
    }
}

fn validate_internal(
    internal: &Internal,
    data: &DataManager,
    params: &TreeParams,
) -> Result<(), ValidationError> {
    let depth = internal.depth();

    let Some(chosen) = internal
        .candidates
        .iter()
        .position(|&f| f == internal.feature)
    else {
        return Err(ValidationError::ForeignFeature {
            depth,
            feature: internal.feature,
        });
    };

    for (stat, &feature) in internal.stats.iter().zip(internal.candidates.iter()) {
        if stat.left_count + stat.right_count != internal.sample_count
            || stat.left_pos + stat.right_pos != internal.positive_count
        {
            return Err(ValidationError::StatSumMismatch { depth, feature });
        }
    }

    if !internal.stats[chosen].eligible(params.min_samples_leaf) {
        return Err(ValidationError::IneligibleFeature {
            depth,
            feature: internal.feature,
        });
    }

    for child in [internal.left.as_ref(), internal.right.as_ref()] {
        if child.depth() != depth + 1 {
            return Err(ValidationError::BadChildDepth {
                depth,
                child_depth: child.depth(),
            });
        }
        if let Node::Internal(child) = child {
            let expected: Vec<u32> = internal
                .candidates
                .iter()
                .copied()
                .filter(|&f| f != internal.feature)
                .collect();
            if child.candidates.as_ref() != expected.as_slice() {
                return Err(ValidationError::BadCandidateSet { depth });
            }
        }
    }

    // Children must partition the node's samples exactly by the chosen
    // feature's value: 0 left, 1 right.
    let mut left_ids = Vec::new();
    internal.left.collect_samples(&mut left_ids);
    let mut right_ids = Vec::new();
    internal.right.collect_samples(&mut right_ids);

    if left_ids.len() as u32 != internal.left.sample_count()
        || right_ids.len() as u32 != internal.right.sample_count()
        || internal.left.sample_count() + internal.right.sample_count()
            != internal.sample_count
        || internal.left.positive_count() + internal.right.positive_count()
            != internal.positive_count
    {
        return Err(ValidationError::BadCounts { depth });
    }

    for &id in &left_ids {
        if data.feature(id, internal.feature) != 0 {
            return Err(ValidationError::BadPartition {
                depth,
                feature: internal.feature,
            });
        }
    }
    for &id in &right_ids {
        if data.feature(id, internal.feature) != 1 {
            return Err(ValidationError::BadPartition {
                depth,
                feature: internal.feature,
            });
        }
    }

    Ok(())
}
