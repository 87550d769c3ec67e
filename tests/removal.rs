//! Deletion integration tests: leaf updates, structural collapses, retrain
//! triggering, telemetry, and equivalence with rebuilding from scratch.

use approx::assert_abs_diff_eq;
use deforest::testing::{flip_dataset, separable_dataset, DEFAULT_TOLERANCE};
use deforest::tree::{gibbs_weights, replay_draw, split_score, SplitStats};
use deforest::{BinaryMatrix, Tree, TreeError, TreeParams};

fn near_argmin() -> TreeParams {
    TreeParams::default().with_lambda(1e-6).with_seed(7)
}

// =============================================================================
// Leaf updates and structural collapses
// =============================================================================

#[test]
fn removing_one_sample_updates_the_leaf_in_place() {
    let (x, y) = separable_dataset();
    let mut tree = Tree::build(x, y, near_argmin()).unwrap();

    let report = tree.remove(&[3]).unwrap();
    assert_eq!(report.n_leaf_updates, 1);
    assert_eq!(report.n_retrains, 0);
    assert!(report.retrain_depths.is_empty());

    // Shape intact: same split, the right leaf just lost one sample.
    let root = tree.root().as_internal().expect("split should survive");
    assert_eq!(root.feature(), 0);
    let right = root.right().as_leaf().unwrap();
    assert_eq!(right.samples(), &[2]);
    assert_eq!(right.probability(), 1.0);

    tree.validate().unwrap();
    assert_eq!(tree.n_samples(), 3);
}

#[test]
fn emptying_a_branch_collapses_the_node_to_a_leaf() {
    let (x, y) = separable_dataset();
    let mut tree = Tree::build(x, y, near_argmin()).unwrap();

    // Both positives go; the remaining samples are pure negative, so the
    // root converts to a leaf. Conversion is not retraining.
    let report = tree.remove(&[2, 3]).unwrap();
    assert_eq!(report.n_retrains, 0);
    assert!(report.retrain_depths.is_empty());

    let leaf = tree.root().as_leaf().expect("root should collapse");
    assert_eq!(leaf.probability(), 0.0);
    assert_eq!(leaf.samples(), &[0, 1]);
    assert_eq!(tree.predict_row(&[1, 1]), 0.0);
    tree.validate().unwrap();
}

#[test]
fn mixed_leftovers_with_no_eligible_feature_collapse_too() {
    // Single feature; removing the whole right side leaves mixed labels
    // but no feature that can still split.
    let x = BinaryMatrix::from_vec(vec![0, 0, 1, 1], 4, 1);
    let y = vec![1, 0, 1, 0];
    let mut tree = Tree::build(x, y, near_argmin()).unwrap();
    assert!(!tree.root().is_leaf());

    let report = tree.remove(&[2, 3]).unwrap();
    assert_eq!(report.n_retrains, 0);
    let leaf = tree.root().as_leaf().expect("root should collapse");
    assert_eq!(leaf.probability(), 0.5);
    assert_eq!(leaf.samples(), &[0, 1]);
    tree.validate().unwrap();
}

#[test]
fn removing_everything_leaves_one_empty_leaf() {
    let (x, y) = separable_dataset();
    let mut tree = Tree::build(x, y, near_argmin()).unwrap();

    tree.remove(&[0, 1, 2, 3]).unwrap();
    assert_eq!(tree.n_samples(), 0);
    assert_eq!(tree.n_nodes(), 1);
    let leaf = tree.root().as_leaf().unwrap();
    assert_eq!(leaf.sample_count(), 0);
    // Implementation-defined constant for an emptied tree.
    assert_eq!(tree.predict_row(&[0, 1]), 0.5);
    tree.validate().unwrap();
}

#[test]
fn exactly_min_samples_leaf_keeps_the_split_valid() {
    let x = BinaryMatrix::from_vec(vec![0, 0, 0, 1, 1, 1], 6, 1);
    let y = vec![0, 0, 0, 1, 1, 1];
    let params = near_argmin().with_min_samples_leaf(2);
    let mut tree = Tree::build(x, y, params).unwrap();

    // The right side drops to exactly min_samples_leaf: still eligible.
    let report = tree.remove(&[5]).unwrap();
    assert_eq!(report.n_retrains, 0);
    assert_eq!(report.n_leaf_updates, 1);

    let root = tree.root().as_internal().expect("split should survive");
    let right = root.right().as_leaf().unwrap();
    assert_eq!(right.samples(), &[3, 4]);
    assert_eq!(right.probability(), 1.0);
    tree.validate().unwrap();
}

#[test]
fn removing_the_only_positive_drops_the_leaf_probability_to_zero() {
    let x = BinaryMatrix::from_vec(vec![0, 0, 1, 1], 4, 1);
    let y = vec![1, 0, 1, 0];
    let mut tree = Tree::build(x, y, near_argmin()).unwrap();

    let right_before = tree.root().as_internal().unwrap().right().as_leaf().unwrap();
    assert_eq!(right_before.probability(), 0.5);

    let report = tree.remove(&[2]).unwrap();
    assert_eq!(report.n_leaf_updates, 1);
    let right = tree.root().as_internal().unwrap().right().as_leaf().unwrap();
    assert_eq!(right.samples(), &[3]);
    assert_eq!(right.probability(), 0.0);
}

// =============================================================================
// Retraining
// =============================================================================

#[test]
fn flipping_the_best_feature_retrains_the_root() {
    let (x, y) = flip_dataset();
    let mut tree = Tree::build(x, y, near_argmin()).unwrap();
    assert_eq!(tree.root().as_internal().unwrap().feature(), 0);

    let report = tree.remove(&[4, 5, 6]).unwrap();
    assert_eq!(report.n_retrains, 1);
    assert_eq!(report.retrain_depths, vec![0]);
    assert_eq!(report.n_samples_retrained, 5);
    assert_eq!(report.n_leaf_updates, 0);

    // The rebuilt root picks the feature that now scores best.
    let root = tree.root().as_internal().expect("retrain should resplit");
    assert_eq!(root.feature(), 1);
    tree.validate().unwrap();
}

#[test]
fn retrained_tree_predicts_like_a_fresh_build_on_the_remaining_data() {
    let (x, y) = flip_dataset();
    let mut tree = Tree::build(x.clone(), y.clone(), near_argmin()).unwrap();
    tree.remove(&[4, 5, 6]).unwrap();

    // Rebuild from scratch on the surviving rows.
    let keep = [0usize, 1, 2, 3, 7];
    let rows: Vec<&[u8]> = keep.iter().map(|&i| x.row(i)).collect();
    let fresh_x = BinaryMatrix::from_rows(&rows);
    let fresh_y: Vec<u8> = keep.iter().map(|&i| y[i]).collect();
    let fresh = Tree::build(fresh_x, fresh_y, near_argmin()).unwrap();

    for &i in &keep {
        assert_abs_diff_eq!(
            tree.predict_row(x.row(i)),
            fresh.predict_row(x.row(i)),
            epsilon = DEFAULT_TOLERANCE
        );
    }
}

#[test]
fn preserved_split_predicts_like_a_fresh_build_on_the_remaining_data() {
    let (x, y) = separable_dataset();
    let mut tree = Tree::build(x.clone(), y.clone(), near_argmin()).unwrap();
    tree.remove(&[3]).unwrap();

    let keep = [0usize, 1, 2];
    let rows: Vec<&[u8]> = keep.iter().map(|&i| x.row(i)).collect();
    let fresh = Tree::build(
        BinaryMatrix::from_rows(&rows),
        keep.iter().map(|&i| y[i]).collect(),
        near_argmin(),
    )
    .unwrap();

    for &i in &keep {
        assert_eq!(tree.predict_row(x.row(i)), fresh.predict_row(x.row(i)));
    }
}

#[test]
fn noisy_split_retrains_exactly_when_the_replayed_draw_flips() {
    // Under heavy noise either feature may be chosen at build time. After
    // the removal, the root must retrain iff replaying its persisted draw
    // against the updated statistics picks the other feature.
    let (x, y) = flip_dataset();
    let batch = [4u32, 5, 6];
    let keep = [0u32, 1, 2, 3, 7];

    for seed in 0..16 {
        let params = TreeParams::default().with_lambda(10.0).with_seed(seed);
        let mut tree = Tree::build(x.clone(), y.clone(), params.clone()).unwrap();
        let root = tree.root().as_internal().unwrap();
        let feature_before = root.feature();
        let draw = root.draw();
        let candidates = root.candidates().to_vec();

        // Recompute the post-removal statistics independently.
        let stats: Vec<SplitStats> = candidates
            .iter()
            .map(|&f| {
                let mut s = SplitStats::default();
                for &id in &keep {
                    let left = x.get(id as usize, f as usize) == 0;
                    let positive = y[id as usize] == 1;
                    if left {
                        s.left_count += 1;
                        s.left_pos += u32::from(positive);
                    } else {
                        s.right_count += 1;
                        s.right_pos += u32::from(positive);
                    }
                }
                s
            })
            .collect();
        let eligible: Vec<bool> = stats.iter().map(|s| s.eligible(1)).collect();
        let scores: Vec<f64> = stats
            .iter()
            .map(|s| split_score(s, keep.len() as u32))
            .collect();
        let weights = gibbs_weights(&scores, &eligible, params.lambda).unwrap();
        let expected = candidates[replay_draw(&weights, draw)];

        let report = tree.remove(&batch).unwrap();
        assert_eq!(
            report.retrain_depths.contains(&0),
            expected != feature_before,
            "seed {seed}: root retrain must mirror the replayed draw"
        );
        tree.validate().unwrap();
    }
}

// =============================================================================
// Errors, idempotence, determinism
// =============================================================================

#[test]
fn removing_an_unknown_id_fails_and_leaves_the_tree_unchanged() {
    let (x, y) = separable_dataset();
    let mut tree = Tree::build(x, y, near_argmin()).unwrap();
    let snapshot = tree.clone();

    let err = tree.remove(&[0, 99]).unwrap_err();
    assert_eq!(err, TreeError::UnknownId(99));
    assert_eq!(tree, snapshot);
}

#[test]
fn removing_the_same_id_twice_fails_the_second_time() {
    let (x, y) = separable_dataset();
    let mut tree = Tree::build(x, y, near_argmin()).unwrap();

    tree.remove(&[1]).unwrap();
    let snapshot = tree.clone();

    let err = tree.remove(&[1]).unwrap_err();
    assert_eq!(err, TreeError::AlreadyRemoved(1));
    assert_eq!(tree, snapshot);
}

#[test]
fn empty_removal_is_a_no_op() {
    let (x, y) = separable_dataset();
    let mut tree = Tree::build(x, y, near_argmin()).unwrap();
    let snapshot = tree.clone();

    let report = tree.remove(&[]).unwrap();
    assert!(report.is_empty());
    assert_eq!(tree, snapshot);
    assert!(tree.removal_metrics().is_empty());
}

#[test]
fn identical_removal_sequences_produce_identical_trees() {
    let (x, y) = flip_dataset();
    let params = TreeParams::default().with_lambda(10.0).with_seed(3);

    let mut a = Tree::build(x.clone(), y.clone(), params.clone()).unwrap();
    let mut b = Tree::build(x, y, params).unwrap();
    assert_eq!(a, b);

    for batch in [&[4u32, 5][..], &[6u32][..], &[0u32, 7][..]] {
        a.remove(batch).unwrap();
        b.remove(batch).unwrap();
        assert_eq!(a, b);
        a.validate().unwrap();
    }
}

// =============================================================================
// Telemetry
// =============================================================================

#[test]
fn metrics_accumulate_across_calls_and_clear_on_demand() {
    let (x, y) = flip_dataset();
    let mut tree = Tree::build(x, y, near_argmin()).unwrap();

    let first = tree.remove(&[4, 5, 6]).unwrap();
    let second = tree.remove(&[0]).unwrap();

    let metrics = tree.removal_metrics();
    assert_eq!(metrics.n_retrains, first.n_retrains + second.n_retrains);
    assert_eq!(
        metrics.n_leaf_updates,
        first.n_leaf_updates + second.n_leaf_updates
    );
    assert_eq!(
        metrics.n_samples_retrained,
        first.n_samples_retrained + second.n_samples_retrained
    );

    tree.clear_removal_metrics();
    assert!(tree.removal_metrics().is_empty());
    assert_eq!(tree.removal_metrics().retrain_depths, Vec::<u32>::new());
}
