//! Defines the error type returned by the estimators in this crate.

use thiserror::Error;


/// Errors surfaced by dataset loading, configuration, and estimation.
#[derive(Debug, Error)]
pub enum Error {
    /// `predict`, `pruned_sub_trees`, or `print` was called
    /// before `fit`.
    #[error("this decision tree is not fitted yet")]
    NotFitted,


    /// A stopping-criterion parameter is out of range.
    /// Rejected eagerly, before any dataset is touched.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// Why the supplied value was rejected.
        reason: String,
    },


    /// The dataset holds no instances.
    #[error("the dataset is empty")]
    EmptyDataSet,


    /// The dataset holds an instance without a class value.
    #[error("instance {0} has no class value")]
    UnlabeledInstance(usize),


    /// A line of an input file could not be parsed.
    #[error("failed to parse line {line}: {reason}")]
    Parse {
        /// 1-origin line number.
        line: usize,
        /// Why parsing failed.
        reason: String,
    },


    /// An I/O failure while reading or writing a file.
    #[error(transparent)]
    Io(#[from] std::io::Error),


    /// A (de)serialization failure.
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}
