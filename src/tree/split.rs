//! Split-feature selection: Gini scoring and the noisy Gibbs draw.
//!
//! A node picks its split feature from a Gibbs distribution over the
//! weighted Gini scores of its candidates, `π(f) ∝ exp(−G(f)/λ)`. The
//! uniform draw behind the choice is persisted on the node; replaying the
//! same draw against recomputed weights is how the remover decides whether
//! a split survives a deletion. The replay is exact, never statistical.

use rand::Rng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::data::DataManager;
use crate::params::TreeParams;

use super::node::SplitStats;

// =============================================================================
// Scoring
// =============================================================================

/// Gini impurity of a node with `count` samples of which `pos` are
/// positive.
///
/// ```text
/// g(c, p) = 1 − (p/c)² − ((c−p)/c)²
/// ```
///
/// An empty node scores 0.
///
/// # Example
///
/// ```
/// use deforest::tree::gini;
///
/// assert_eq!(gini(4, 2), 0.5);
/// assert_eq!(gini(4, 0), 0.0);
/// assert_eq!(gini(0, 0), 0.0);
/// ```
#[inline]
pub fn gini(count: u32, pos: u32) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let q = f64::from(pos) / f64::from(count);
    1.0 - q * q - (1.0 - q) * (1.0 - q)
}

/// Weighted Gini score of a candidate split over `total` samples. Lower is
/// better.
#[inline]
pub fn split_score(stats: &SplitStats, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let t = f64::from(total);
    (f64::from(stats.left_count) / t) * gini(stats.left_count, stats.left_pos)
        + (f64::from(stats.right_count) / t) * gini(stats.right_count, stats.right_pos)
}

// =============================================================================
// Gibbs selection
// =============================================================================

/// Normalized Gibbs weights `π(f) ∝ exp(−score/λ)` over the eligible
/// candidates.
///
/// The maximum exponent over eligible candidates is subtracted before
/// exponentiation so tiny `lambda` values stay finite. Ineligible
/// candidates get weight 0. Returns `None` when no candidate is eligible.
pub fn gibbs_weights(scores: &[f64], eligible: &[bool], lambda: f64) -> Option<Vec<f64>> {
    debug_assert_eq!(scores.len(), eligible.len());
    let mut max_exp = f64::NEG_INFINITY;
    for (score, &ok) in scores.iter().zip(eligible) {
        if ok {
            max_exp = max_exp.max(-score / lambda);
        }
    }
    if max_exp == f64::NEG_INFINITY {
        return None;
    }

    let mut weights = vec![0.0; scores.len()];
    let mut total = 0.0;
    for (i, (score, &ok)) in scores.iter().zip(eligible).enumerate() {
        if ok {
            let w = (-score / lambda - max_exp).exp();
            weights[i] = w;
            total += w;
        }
    }
    for w in &mut weights {
        *w /= total;
    }
    Some(weights)
}

/// Map a uniform draw `u ∈ [0, 1)` through the cumulative distribution of
/// `weights`, in index order.
///
/// The chosen index is the first whose cumulative weight exceeds `u`.
/// Rounding that pushes `u` past the final cumulative sum falls back to the
/// last index with positive weight.
pub fn replay_draw(weights: &[f64], u: f64) -> usize {
    let mut cum = 0.0;
    let mut last = 0;
    for (i, &w) in weights.iter().enumerate() {
        if w <= 0.0 {
            continue;
        }
        cum += w;
        last = i;
        if u < cum {
            return i;
        }
    }
    last
}

// =============================================================================
// Splitter
// =============================================================================

/// Outcome of a successful split: the chosen feature, the partition it
/// induces, and the statistics block persisted on the node.
#[derive(Debug)]
pub(crate) struct SplitRecord {
    pub feature: u32,
    pub draw: f64,
    pub left_ids: Vec<u32>,
    pub right_ids: Vec<u32>,
    pub stats: Box<[SplitStats]>,
}

/// Chooses split features for nodes over a fixed dataset.
pub(crate) struct Splitter<'a> {
    data: &'a DataManager,
    params: &'a TreeParams,
}

impl<'a> Splitter<'a> {
    pub fn new(data: &'a DataManager, params: &'a TreeParams) -> Self {
        Self { data, params }
    }

    /// Accumulate per-candidate statistics in one pass over the rows.
    pub fn compute_stats(&self, ids: &[u32], candidates: &[u32]) -> Box<[SplitStats]> {
        let mut stats = vec![SplitStats::default(); candidates.len()];
        for &id in ids {
            let row = self.data.row(id);
            let positive = self.data.label(id) == 1;
            for (stat, &feature) in stats.iter_mut().zip(candidates) {
                stat.add(row[feature as usize] == 0, positive);
            }
        }
        stats.into_boxed_slice()
    }

    /// Pick a split feature for `ids`, or `None` when no candidate leaves
    /// at least `min_samples_leaf` samples on both sides.
    ///
    /// The partition preserves the order of `ids`, so ascending input stays
    /// ascending on both sides.
    pub fn split(
        &self,
        ids: &[u32],
        candidates: &[u32],
        rng: &mut Xoshiro256PlusPlus,
    ) -> Option<SplitRecord> {
        let stats = self.compute_stats(ids, candidates);
        let total = ids.len() as u32;
        let min_samples_leaf = self.params.min_samples_leaf;

        let eligible: Vec<bool> = stats.iter().map(|s| s.eligible(min_samples_leaf)).collect();
        let scores: Vec<f64> = stats.iter().map(|s| split_score(s, total)).collect();
        let weights = gibbs_weights(&scores, &eligible, self.params.lambda)?;

        let draw: f64 = rng.gen();
        let chosen = replay_draw(&weights, draw);
        let feature = candidates[chosen];

        let mut left_ids = Vec::with_capacity(stats[chosen].left_count as usize);
        let mut right_ids = Vec::with_capacity(stats[chosen].right_count as usize);
        for &id in ids {
            if self.data.feature(id, feature) == 0 {
                left_ids.push(id);
            } else {
                right_ids.push(id);
            }
        }

        Some(SplitRecord {
            feature,
            draw,
            left_ids,
            right_ids,
            stats,
        })
    }
}
