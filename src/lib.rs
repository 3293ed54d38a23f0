#![warn(missing_docs)]

//!
//! A crate that provides decision-tree classifiers
//! for weighted tabular data.
//!
//! Three induction strategies are available, differing only in their
//! split-quality criterion and branching shape:
//!
//! - `Criterion::InfoGain`
//!     Plain information gain (ID3). Categorical features split
//!     one branch per observed value; a feature is consumed once
//!     along a path.
//!
//! - `Criterion::GainRatio`
//!     Information gain normalized by the entropy of the branch-size
//!     distribution (C4.5), which de-biases high-cardinality
//!     categorical features.
//!
//! - `Criterion::Gini`
//!     Gini impurity (CART). Every split is binary; categorical
//!     features split on the best bipartition of their value set.
//!
//! Every fitted tree also carries its minimal cost-complexity
//! pruning sequence: the nested family of pruned trees indexed by
//! effective alpha, from the unpruned fit down to a single leaf.

pub mod error;
pub mod sample;
pub mod tree;
pub mod prelude;


pub use error::Error;

pub use sample::{DataSet, FeatureInfo, FeatureKind, Instance};

pub use tree::{
    Criterion,
    DecisionTreeBuilder,
    DecisionTreeClassifier,
    Node,
    Split,
};
