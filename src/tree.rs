//! Defines the decision-tree induction and pruning engine.

/// Defines the split criteria and the impurity measures.
pub mod criterion;
/// Defines the inner representation of a fitted tree.
pub mod node;
/// Defines the builder for `DecisionTreeClassifier`.
pub mod builder;
/// Defines the classifier produced by `DecisionTreeBuilder`.
pub mod classifier;

mod split_record;
mod pruning;


pub use builder::DecisionTreeBuilder;
pub use classifier::DecisionTreeClassifier;
pub use criterion::Criterion;
pub use node::{Children, Node, Split};
