//! Defines the decision-tree builder and the shared growing recursion.
use crate::error::Error;
use crate::sample::{DataSet, Instance};
use super::classifier::DecisionTreeClassifier;
use super::criterion::Criterion;
use super::node::{Node, Split};
use super::split_record::{Partition, SplitRecord};


/// The maximal depth set as default: effectively unbounded, so nodes
/// are expanded until the other stopping criteria fire.
pub const DEFAULT_MAX_DEPTH: usize = usize::MAX;
/// The minimal number of samples required to split an internal node,
/// set as default.
pub const DEFAULT_MIN_SAMPLES_SPLIT: usize = 2;
/// The minimal number of samples required at a leaf, set as default.
pub const DEFAULT_MIN_SAMPLES_LEAF: usize = 1;


/// A struct that builds [`DecisionTreeClassifier`].
/// `DecisionTreeBuilder` keeps the stopping criteria and validates
/// them eagerly, before any dataset is touched.
///
/// # Example
///
/// ```no_run
/// use minitrees::prelude::*;
///
/// let sample = DataSet::from_csv("/path/to/data/file.csv", true)
///     .unwrap()
///     .set_target("class");
///
/// let mut tree = DecisionTreeBuilder::new()
///     .criterion(Criterion::GainRatio)
///     .max_depth(4)
///     .build()
///     .unwrap();
///
/// tree.fit(&sample).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct DecisionTreeBuilder {
    criterion: Criterion,
    max_depth: usize,
    min_samples_split: usize,
    min_samples_leaf: usize,
    min_impurity_decrease: f64,
    ccp_alpha: f64,
}


impl DecisionTreeBuilder {
    /// Construct a new instance of [`DecisionTreeBuilder`].
    /// By default, the parameters are set as follows;
    /// ```text
    /// criterion: Criterion::Gini,
    /// max_depth: DEFAULT_MAX_DEPTH,
    /// min_samples_split: DEFAULT_MIN_SAMPLES_SPLIT == 2,
    /// min_samples_leaf: DEFAULT_MIN_SAMPLES_LEAF == 1,
    /// min_impurity_decrease: 0.0,
    /// ccp_alpha: 0.0,
    /// ```
    pub fn new() -> Self {
        Self {
            criterion: Criterion::Gini,
            max_depth: DEFAULT_MAX_DEPTH,
            min_samples_split: DEFAULT_MIN_SAMPLES_SPLIT,
            min_samples_leaf: DEFAULT_MIN_SAMPLES_LEAF,
            min_impurity_decrease: 0.0,
            ccp_alpha: 0.0,
        }
    }


    /// Set the split criterion.
    /// Default value is `Criterion::Gini`.
    #[inline]
    pub fn criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }


    /// Specify the maximal depth of the tree.
    /// The root has depth `1`.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }


    /// Specify the minimal number of samples
    /// required to split an internal node.
    pub fn min_samples_split(mut self, n_samples: usize) -> Self {
        self.min_samples_split = n_samples;
        self
    }


    /// Specify the minimal number of samples required at a leaf.
    /// A child subset smaller than this becomes a leaf immediately.
    pub fn min_samples_leaf(mut self, n_samples: usize) -> Self {
        self.min_samples_leaf = n_samples;
        self
    }


    /// Specify the minimal weighted impurity decrease a split must
    /// induce, as a fraction of the root dataset's total weight.
    pub fn min_impurity_decrease(mut self, decrease: f64) -> Self {
        self.min_impurity_decrease = decrease;
        self
    }


    /// Specify the complexity parameter for minimal cost-complexity
    /// pruning. The largest pruned tree whose every retained split has
    /// effective alpha at most this value is kept after fitting.
    pub fn ccp_alpha(mut self, alpha: f64) -> Self {
        self.ccp_alpha = alpha;
        self
    }


    /// Build a [`DecisionTreeClassifier`]. This method consumes
    /// `self` and rejects out-of-range stopping criteria.
    pub fn build(mut self) -> Result<DecisionTreeClassifier, Error> {
        if self.max_depth < 1 {
            return Err(Error::InvalidParameter {
                name: "max_depth",
                reason: "must be at least 1".into(),
            });
        }
        if self.min_samples_split < 2 {
            return Err(Error::InvalidParameter {
                name: "min_samples_split",
                reason: "must be at least 2".into(),
            });
        }
        if self.min_samples_leaf < 1 {
            return Err(Error::InvalidParameter {
                name: "min_samples_leaf",
                reason: "must be at least 1".into(),
            });
        }
        if !(self.min_impurity_decrease >= 0.0)
            || !self.min_impurity_decrease.is_finite()
        {
            return Err(Error::InvalidParameter {
                name: "min_impurity_decrease",
                reason: "must be finite and non-negative".into(),
            });
        }
        if !(self.ccp_alpha >= 0.0) || !self.ccp_alpha.is_finite() {
            return Err(Error::InvalidParameter {
                name: "ccp_alpha",
                reason: "must be finite and non-negative".into(),
            });
        }

        // A split must be able to feed two minimal leaves.
        let floor = self.min_samples_leaf.saturating_mul(2);
        if self.min_samples_split < floor {
            self.min_samples_split = floor;
        }

        Ok(DecisionTreeClassifier::from_components(
            self.criterion,
            self.max_depth,
            self.min_samples_split,
            self.min_samples_leaf,
            self.min_impurity_decrease,
            self.ccp_alpha,
        ))
    }
}


impl Default for DecisionTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}


/// The recursive grower shared by the three criteria, which only
/// inject the split-quality measure and the branching shape.
pub(crate) struct Grower {
    pub(crate) criterion: Criterion,
    pub(crate) max_depth: usize,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) min_impurity_decrease: f64,
    /// Total weight of the root dataset; split improvements are
    /// fractions of it.
    pub(crate) weighted_n_samples: f64,
}


impl Grower {
    /// Grow the subtree for `dataset` at `depth`
    /// (the root call passes depth `1`).
    pub(crate) fn grow(&self, dataset: &DataSet, depth: usize) -> Node {
        if depth >= self.max_depth {
            let impurity = self.criterion.node_impurity(dataset);
            return self.leaf(dataset, depth, impurity);
        }
        if dataset.class_set().len() == 1 {
            // Pure node: always a leaf, impurity pinned to zero.
            return self.leaf(dataset, depth, 0.0);
        }
        if dataset.dimensionality() == 0
            || dataset.size() < self.min_samples_split
        {
            let impurity = self.criterion.node_impurity(dataset);
            return self.leaf(dataset, depth, impurity);
        }

        let record = match self.criterion
            .best_split(dataset, self.weighted_n_samples)
        {
            Some(record)
                if record.improvement >= self.min_impurity_decrease =>
            {
                record
            },
            // Insufficient improvement: keep the impurity the
            // selector already computed.
            Some(record) => {
                return self.leaf(dataset, depth, record.impurity);
            },
            None => {
                let impurity = self.criterion.node_impurity(dataset);
                return self.leaf(dataset, depth, impurity);
            },
        };


        let subsets = self.partition(dataset, &record);

        // A split that leaves a side empty has no meaning.
        if subsets.iter().any(|subset| subset.is_empty()) {
            return self.leaf(dataset, depth, record.impurity);
        }

        let children = subsets.into_iter()
            .map(|subset| {
                if subset.size() < self.min_samples_leaf {
                    // Too small to recurse into: force a leaf.
                    let impurity = self.criterion.node_impurity(&subset);
                    self.leaf(&subset, depth + 1, impurity)
                } else {
                    self.grow(&subset, depth + 1)
                }
            })
            .collect::<Vec<_>>();


        self.decision(dataset, depth, record, children)
    }


    /// Split `dataset` into the child subsets of `record`.
    /// ID3/C4.5 children drop the consumed feature; the descriptors
    /// keep their stable indices either way.
    fn partition(&self, dataset: &DataSet, record: &SplitRecord)
        -> Vec<DataSet>
    {
        let pos = record.feature;
        let consume = self.criterion.consumes_feature();

        match &record.partition {
            Partition::Threshold(threshold) => {
                let mut left = self.child_dataset(dataset, pos, consume);
                let mut right = self.child_dataset(dataset, pos, consume);
                for inst in dataset {
                    let side = if inst.attribute(pos) <= *threshold {
                        &mut left
                    } else {
                        &mut right
                    };
                    side.push(self.child_instance(inst, pos, consume));
                }
                vec![left, right]
            },
            Partition::Multiway(edges) => {
                let mut subsets = edges.iter()
                    .map(|_| self.child_dataset(dataset, pos, consume))
                    .collect::<Vec<_>>();
                for inst in dataset {
                    let value = inst.attribute(pos);
                    let k = edges.iter()
                        .position(|edge| *edge == value)
                        .expect("a fit-time value always matches an edge");
                    subsets[k].push(self.child_instance(inst, pos, consume));
                }
                subsets
            },
            Partition::Subset { left: left_values, .. } => {
                let mut left = self.child_dataset(dataset, pos, consume);
                let mut right = self.child_dataset(dataset, pos, consume);
                for inst in dataset {
                    let side = if left_values.contains(&inst.attribute(pos)) {
                        &mut left
                    } else {
                        &mut right
                    };
                    side.push(self.child_instance(inst, pos, consume));
                }
                vec![left, right]
            },
        }
    }


    fn child_dataset(&self, parent: &DataSet, pos: usize, consume: bool)
        -> DataSet
    {
        let attributes = if consume {
            parent.attributes()
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != pos)
                .map(|(_, info)| info.clone())
                .collect()
        } else {
            parent.attributes().to_vec()
        };

        DataSet::new(attributes, parent.class_info().clone())
    }


    fn child_instance(&self, inst: &Instance, pos: usize, consume: bool)
        -> Instance
    {
        if consume {
            inst.delete_attribute(pos)
        } else {
            inst.clone()
        }
    }


    /// Emit a leaf carrying the dataset's statistics.
    fn leaf(&self, dataset: &DataSet, depth: usize, impurity: f64) -> Node {
        Node {
            feature: dataset.class_info().clone(),
            class: dataset.majority_class(),
            depth,
            impurity,
            n_samples: dataset.size(),
            weighted_n_samples: dataset.total_weight(),
            split: Split::Leaf,
        }
    }


    /// Assemble a decision node over the already-grown children.
    /// The statistics are the parent dataset's; its majority class is
    /// the routing fallback for values without a matching branch.
    fn decision(
        &self,
        dataset: &DataSet,
        depth: usize,
        record: SplitRecord,
        mut children: Vec<Node>,
    ) -> Node
    {
        let split = match record.partition {
            Partition::Threshold(threshold) => {
                let right = children.pop().unwrap();
                let left = children.pop().unwrap();
                Split::Threshold {
                    threshold,
                    left: Box::new(left),
                    right: Box::new(right),
                }
            },
            Partition::Multiway(edges) => {
                Split::Multiway { edges, children }
            },
            Partition::Subset { left: left_values, right: right_values } => {
                let right = children.pop().unwrap();
                let left = children.pop().unwrap();
                Split::Subset {
                    left_values,
                    right_values,
                    left: Box::new(left),
                    right: Box::new(right),
                }
            },
        };

        Node {
            feature: dataset.attribute_info(record.feature).clone(),
            class: dataset.majority_class(),
            depth,
            impurity: record.impurity,
            n_samples: dataset.size(),
            weighted_n_samples: dataset.total_weight(),
            split,
        }
    }
}
