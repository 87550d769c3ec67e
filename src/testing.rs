//! Testing utilities shared by unit tests and integration tests.
//!
//! ```ignore
//! use deforest::assert_approx_eq;
//! use deforest::testing::separable_dataset;
//! ```

use crate::data::BinaryMatrix;

/// Default tolerance for floating point comparisons on probabilities.
pub const DEFAULT_TOLERANCE: f64 = 1e-12;

/// Assert that two floats are approximately equal.
///
/// # Examples
///
/// ```
/// # use deforest::assert_approx_eq;
/// assert_approx_eq!(0.5f64, 0.5000001, 1e-3);
/// ```
///
/// # Panics
///
/// Panics if the absolute difference exceeds the tolerance.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $tolerance:expr) => {{
        let left_val = $left;
        let right_val = $right;
        let tol = $tolerance;
        let diff = (left_val - right_val).abs();
        if diff > tol {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`\n right: `{:?}`\n  diff: `{:?}` > tolerance `{:?}`",
                left_val, right_val, diff, tol
            );
        }
    }};
}

/// The four-row two-feature dataset where feature 0 separates the classes
/// perfectly and feature 1 carries no signal.
pub fn separable_dataset() -> (BinaryMatrix, Vec<u8>) {
    let x = BinaryMatrix::from_vec(
        vec![
            0, 0, //
            0, 1, //
            1, 0, //
            1, 1, //
        ],
        4,
        2,
    );
    (x, vec![0, 0, 1, 1])
}

/// An eight-row two-feature dataset with distinct per-feature Gini scores,
/// arranged so that removing rows 4, 5 and 6 flips which feature scores
/// best.
///
/// Before removal feature 0 wins (score 0.1875 vs 0.4375); on the
/// remaining rows feature 1 wins (0.2667 vs 0.3). No ties either way, so a
/// near-argmin tree must retrain its root on that batch.
pub fn flip_dataset() -> (BinaryMatrix, Vec<u8>) {
    let x = BinaryMatrix::from_vec(
        vec![
            0, 0, //
            0, 0, //
            0, 1, //
            0, 1, //
            1, 0, //
            1, 0, //
            1, 1, //
            1, 1, //
        ],
        8,
        2,
    );
    (x, vec![0, 0, 0, 1, 1, 1, 1, 1])
}
