//! deforest: decision trees that can forget.
//!
//! Randomized Gini decision trees for binary classification over binary
//! features, structured so that training examples can be deleted after the
//! fact without retraining the whole model. Each internal node keeps the
//! sufficient statistics of every split candidate it considered and the
//! uniform draw that selected the winner from a Gibbs distribution over
//! their Gini scores (temperature λ). A deletion updates those statistics
//! along the affected paths and replays each draw exactly; only nodes whose
//! replayed choice changes are rebuilt, and only from their own remaining
//! samples.
//!
//! # Example
//!
//! ```
//! use deforest::{BinaryMatrix, Tree, TreeParams};
//!
//! let x = BinaryMatrix::from_vec(vec![0, 0, 0, 1, 1, 0, 1, 1], 4, 2);
//! let y = vec![0, 0, 1, 1];
//! let params = TreeParams::default().with_lambda(1e-6).with_seed(7);
//!
//! let mut tree = Tree::build(x, y, params).unwrap();
//! assert_eq!(tree.predict_row(&[0, 1]), 0.0);
//!
//! let report = tree.remove(&[3]).unwrap();
//! assert_eq!(report.n_retrains, 0);
//! assert_eq!(tree.n_samples(), 3);
//! ```
//!
//! Forest ensembling, dataset loading and tree persistence are outer-loop
//! concerns and live outside this crate.

pub mod data;
pub mod error;
pub mod params;
pub mod testing;
pub mod tree;

pub use data::{BinaryMatrix, DataManager};
pub use error::TreeError;
pub use params::TreeParams;
pub use tree::{Internal, Leaf, Node, RemovalReport, SplitStats, Tree, ValidationError};
