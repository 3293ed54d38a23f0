//! Defines the outcome of the per-node split search.


/// How a chosen split partitions the dataset.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Partition {
    /// Binary split on a numeric feature;
    /// `value <= threshold` goes left.
    Threshold(f64),


    /// One branch per observed value of a categorical feature,
    /// in ascending value order.
    Multiway(Vec<f64>),


    /// Binary bipartition of a categorical feature's value set.
    Subset {
        /// Values routed to the left child.
        left: Vec<f64>,
        /// Values routed to the right child.
        right: Vec<f64>,
    },
}


/// The best split found for one dataset:
/// the chosen feature, the impurity before splitting, the weighted
/// impurity improvement, and the partition payload.
///
/// `improvement` is expressed as a fraction of the *root* dataset's
/// total weight, so `min_impurity_decrease` thresholds compare
/// equally across nodes at different depths.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SplitRecord {
    /// Position of the chosen feature in the current dataset.
    pub(crate) feature: usize,
    /// Impurity of the node before splitting.
    pub(crate) impurity: f64,
    /// Weighted impurity improvement of the split.
    pub(crate) improvement: f64,
    /// The partition payload.
    pub(crate) partition: Partition,
}
