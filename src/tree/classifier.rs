//! Defines the decision-tree classifier.
use log::debug;
use serde::{Serialize, Deserialize};

use std::fs;
use std::fs::File;
use std::io::prelude::*;
use std::path::Path;

use crate::error::Error;
use crate::sample::{DataSet, Instance};
use super::builder::Grower;
use super::criterion::Criterion;
use super::node::Node;
use super::pruning::CcpPruner;


/// Decision tree classifier over weighted tabular data.
///
/// Construct it with
/// [`DecisionTreeBuilder`](crate::tree::DecisionTreeBuilder).
/// Fitting grows the full tree under the configured stopping
/// criteria, computes the whole cost-complexity pruning sequence,
/// and keeps the subtree selected by `ccp_alpha` for prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTreeClassifier {
    criterion: Criterion,
    max_depth: usize,
    min_samples_split: usize,
    min_samples_leaf: usize,
    min_impurity_decrease: f64,
    ccp_alpha: f64,

    weighted_n_samples: f64,
    root: Option<Node>,
    sub_trees: Vec<(f64, Node)>,
}


impl DecisionTreeClassifier {
    /// Called only via `DecisionTreeBuilder::build`,
    /// which has validated the parameters.
    #[inline]
    pub(crate) fn from_components(
        criterion: Criterion,
        max_depth: usize,
        min_samples_split: usize,
        min_samples_leaf: usize,
        min_impurity_decrease: f64,
        ccp_alpha: f64,
    ) -> Self
    {
        Self {
            criterion,
            max_depth,
            min_samples_split,
            min_samples_leaf,
            min_impurity_decrease,
            ccp_alpha,

            weighted_n_samples: 0.0,
            root: None,
            sub_trees: Vec::new(),
        }
    }


    /// The configured split criterion.
    pub fn criterion(&self) -> Criterion {
        self.criterion
    }


    /// Fit this classifier on `dataset`.
    ///
    /// Every instance must carry a class value. Refitting replaces
    /// the previous tree and pruning sequence.
    pub fn fit(&mut self, dataset: &DataSet) -> Result<(), Error> {
        if dataset.is_empty() {
            return Err(Error::EmptyDataSet);
        }
        if let Some(k) = dataset.iter().position(|inst| !inst.is_labeled()) {
            return Err(Error::UnlabeledInstance(k));
        }

        self.weighted_n_samples = dataset.total_weight();
        let grower = Grower {
            criterion: self.criterion,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            min_impurity_decrease: self.min_impurity_decrease,
            weighted_n_samples: self.weighted_n_samples,
        };
        let root = grower.grow(dataset, 1);
        debug!(
            "grew a tree with {criterion}: {n} leaves",
            criterion = self.criterion,
            n = root.leaves(),
        );

        let pruner = CcpPruner::new(root, self.weighted_n_samples);
        self.sub_trees = pruner.prune_all();
        self.root = Some(pruner.prune_with_alpha(self.ccp_alpha));
        debug!(
            "pruning produced {n} sub-trees; kept the tree \
             at ccp_alpha {alpha}",
            n = self.sub_trees.len(),
            alpha = self.ccp_alpha,
        );

        Ok(())
    }


    /// Predict the class value for `instance` by walking the fitted
    /// tree. A discrete value without a matching branch (a category
    /// unseen at fit time) falls back to the majority class of the
    /// deepest node reached.
    ///
    /// # Panics
    /// When the instance has fewer attributes than the fitted tree
    /// routes on.
    pub fn predict(&self, instance: &Instance) -> Result<f64, Error> {
        let mut node = self.root.as_ref().ok_or(Error::NotFitted)?;
        loop {
            if node.is_leaf() {
                return Ok(node.class());
            }
            let value = instance.attribute(node.feature().index() as usize);
            match node.match_child(value) {
                Some(child) => node = child,
                None => return Ok(node.class()),
            }
        }
    }


    /// Predict the class value for every instance of `dataset`.
    pub fn predict_all(&self, dataset: &DataSet)
        -> Result<Vec<f64>, Error>
    {
        dataset.iter()
            .map(|inst| self.predict(inst))
            .collect()
    }


    /// The whole pruning sequence: `(effective alpha, tree root)`
    /// pairs with non-decreasing alphas, from the unpruned fit down
    /// to a single leaf.
    pub fn pruned_sub_trees(&self) -> Result<&[(f64, Node)], Error> {
        if self.root.is_none() {
            return Err(Error::NotFitted);
        }
        Ok(&self.sub_trees[..])
    }


    /// The root of the fitted (and alpha-selected) tree.
    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }


    /// Print the fitted tree breadth-first, one line per level.
    pub fn print(&self) -> Result<(), Error> {
        let root = self.root.as_ref().ok_or(Error::NotFitted)?;
        root.print();
        Ok(())
    }


    /// Write the fitted tree to a graphviz dot file.
    pub fn to_dot_file<P>(&self, path: P) -> Result<(), Error>
        where P: AsRef<Path>,
    {
        let root = self.root.as_ref().ok_or(Error::NotFitted)?;
        let mut f = File::create(path)?;
        f.write_all(b"graph DecisionTree {\n")?;

        let info = root.to_dot_info(0).0;
        for row in info {
            f.write_all(row.as_bytes())?;
        }

        f.write_all(b"}\n")?;

        Ok(())
    }


    /// Serialize this classifier, fitted or not, to a JSON file.
    pub fn save<P>(&self, path: P) -> Result<(), Error>
        where P: AsRef<Path>,
    {
        let js = serde_json::to_string(self)?;
        fs::write(path, js)?;
        Ok(())
    }


    /// Read a classifier back from a JSON file written by
    /// [`DecisionTreeClassifier::save`].
    pub fn load<P>(path: P) -> Result<Self, Error>
        where P: AsRef<Path>,
    {
        let js = fs::read_to_string(path)?;
        let clf = serde_json::from_str(&js)?;
        Ok(clf)
    }
}
