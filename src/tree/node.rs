//! Defines the inner representation of a fitted decision tree.
use colored::Colorize;
use serde::{Serialize, Deserialize};

use std::fmt;

use crate::sample::FeatureInfo;


/// The payload of a node: how (and whether) it splits.
///
/// Continuous decision nodes have exactly two children. Discrete
/// decision nodes have one child per observed value (ID3/C4.5) or a
/// left/right bipartition of the value set (CART). Traversal and
/// pruning operate uniformly over the variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Split {
    /// No test, no children.
    Leaf,


    /// Binary test on a numeric feature:
    /// `value <= threshold` routes left.
    Threshold {
        /// The split point.
        threshold: f64,
        /// Child for `value <= threshold`.
        left: Box<Node>,
        /// Child for `value > threshold`.
        right: Box<Node>,
    },


    /// Equality-matched test on a categorical feature,
    /// one child per value observed at fit time.
    Multiway {
        /// The edge values, aligned with `children`.
        edges: Vec<f64>,
        /// One child per edge value.
        children: Vec<Node>,
    },


    /// Membership test against a bipartition
    /// of a categorical feature's value set.
    Subset {
        /// Values routed to `left`.
        left_values: Vec<f64>,
        /// Values routed to `right`.
        right_values: Vec<f64>,
        /// Child for values in `left_values`.
        left: Box<Node>,
        /// Child for values in `right_values`.
        right: Box<Node>,
    },
}


/// One node of a fitted decision tree.
///
/// Every node, leaf or not, carries the statistics of the dataset it
/// was grown from: the weighted majority class (the prediction of a
/// leaf and the routing fallback of a decision node), the impurity,
/// the raw and weighted sample counts, and the depth (the root has
/// depth 1). The split feature's descriptor is kept for routing and
/// display; leaves keep the class descriptor instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub(crate) feature: FeatureInfo,
    pub(crate) class: f64,
    pub(crate) depth: usize,
    pub(crate) impurity: f64,
    pub(crate) n_samples: usize,
    pub(crate) weighted_n_samples: f64,
    pub(crate) split: Split,
}


impl Node {
    /// The descriptor of the feature this node tests
    /// (the class descriptor for a leaf).
    pub fn feature(&self) -> &FeatureInfo {
        &self.feature
    }


    /// The weighted majority class of the node's dataset.
    pub fn class(&self) -> f64 {
        self.class
    }


    /// The depth of this node; the root has depth 1.
    pub fn depth(&self) -> usize {
        self.depth
    }


    /// The impurity of the node's class distribution.
    pub fn impurity(&self) -> f64 {
        self.impurity
    }


    /// The number of samples at this node.
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }


    /// The weighted number of samples at this node.
    pub fn weighted_n_samples(&self) -> f64 {
        self.weighted_n_samples
    }


    /// The split payload.
    pub fn split(&self) -> &Split {
        &self.split
    }


    /// Whether this node is a leaf.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self.split, Split::Leaf)
    }


    /// Collapse this node to a leaf, discarding its children.
    /// The node statistics stay as they are.
    #[inline]
    pub(crate) fn to_leaf(&mut self) {
        self.split = Split::Leaf;
    }


    /// Route a feature value to the matching child.
    ///
    /// Returns `None` for leaves and for discrete values without a
    /// matching branch (a category unseen at fit time); the caller
    /// falls back to this node's own majority class.
    pub fn match_child(&self, value: f64) -> Option<&Node> {
        match &self.split {
            Split::Leaf => None,
            Split::Threshold { threshold, left, right } => {
                if value <= *threshold {
                    Some(left.as_ref())
                } else {
                    Some(right.as_ref())
                }
            },
            Split::Multiway { edges, children } => {
                edges.iter()
                    .position(|edge| *edge == value)
                    .map(|i| &children[i])
            },
            Split::Subset { left_values, right_values, left, right } => {
                if left_values.contains(&value) {
                    Some(left.as_ref())
                } else if right_values.contains(&value) {
                    Some(right.as_ref())
                } else {
                    None
                }
            },
        }
    }


    /// Iterate over the direct children of this node.
    pub fn children(&self) -> Children<'_> {
        let inner = match &self.split {
            Split::Leaf => ChildrenInner::None,
            Split::Threshold { left, right, .. }
            | Split::Subset { left, right, .. } => {
                ChildrenInner::Binary {
                    left: left.as_ref(),
                    right: right.as_ref(),
                    state: 0,
                }
            },
            Split::Multiway { children, .. } => {
                ChildrenInner::Slice(children.iter())
            },
        };

        Children { inner }
    }


    /// Mutable references to the direct children.
    pub(crate) fn children_mut(&mut self) -> Vec<&mut Node> {
        match &mut self.split {
            Split::Leaf => Vec::new(),
            Split::Threshold { left, right, .. }
            | Split::Subset { left, right, .. } => {
                vec![left.as_mut(), right.as_mut()]
            },
            Split::Multiway { children, .. } => {
                children.iter_mut().collect()
            },
        }
    }


    /// The number of leaves in the subtree rooted here.
    pub fn leaves(&self) -> usize {
        if self.is_leaf() {
            return 1;
        }
        self.children()
            .map(|child| child.leaves())
            .sum::<usize>()
    }


    /// Dump the tree breadth-first, one line per level.
    pub fn level_dump(&self) -> String {
        let mut lines = Vec::new();
        let mut level = vec![self];
        while !level.is_empty() {
            let line = level.iter()
                .map(|node| node.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            lines.push(line);

            level = level.into_iter()
                .flat_map(|node| node.children())
                .collect();
        }
        lines.join("\n")
    }


    /// Print the tree breadth-first to stdout,
    /// leaves in green and decision nodes in cyan.
    pub fn print(&self) {
        let mut level = vec![self];
        while !level.is_empty() {
            let line = level.iter()
                .map(|node| {
                    let s = node.to_string();
                    if node.is_leaf() {
                        s.green().to_string()
                    } else {
                        s.cyan().to_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(" ");
            println!("{line}");

            level = level.into_iter()
                .flat_map(|node| node.children())
                .collect();
        }
    }


    /// Graphviz fragment for the subtree rooted here.
    pub(crate) fn to_dot_info(&self, id: usize) -> (Vec<String>, usize) {
        match &self.split {
            Split::Leaf => {
                let info = format!(
                    "\tnode_{id} [ \
                     label = \"{p}\", \
                     shape = box, \
                     ];\n",
                    p = self.class,
                );

                (vec![info], id + 1)
            },
            split => {
                let label = match split {
                    Split::Threshold { threshold, .. } => format!(
                        "{feat} <= {threshold:.2} ?",
                        feat = self.feature.name(),
                    ),
                    Split::Subset { left_values, .. } => format!(
                        "{feat} in {left_values:?} ?",
                        feat = self.feature.name(),
                    ),
                    _ => format!("{feat} = ?", feat = self.feature.name()),
                };
                let b_info = format!(
                    "\tnode_{id} [ label = \"{label}\" ];\n"
                );

                let mut info = vec![b_info];
                let mut next_id = id + 1;
                for (k, child) in self.children().enumerate() {
                    let edge = format!(
                        "\tnode_{id} -- node_{next_id} \
                         [ label = \"{k}\" ];\n"
                    );
                    let (mut c_info, ret_id) = child.to_dot_info(next_id);
                    info.push(edge);
                    info.append(&mut c_info);
                    next_id = ret_id;
                }

                (info, next_id)
            },
        }
    }
}


impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.split {
            Split::Leaf => {
                write!(f, "{{ class: {} }}", self.class)
            },
            Split::Threshold { threshold, .. } => {
                write!(
                    f,
                    "{{ feature: {}, edges: [ [<={threshold}] [>{threshold}] ] }}",
                    self.feature.name(),
                )
            },
            Split::Multiway { edges, .. } => {
                write!(
                    f,
                    "{{ feature: {}, edges: {edges:?} }}",
                    self.feature.name(),
                )
            },
            Split::Subset { left_values, right_values, .. } => {
                write!(
                    f,
                    "{{ feature: {}, edges: [ {left_values:?} {right_values:?} ] }}",
                    self.feature.name(),
                )
            },
        }
    }
}


/// Iterator over a node's direct children.
pub struct Children<'a> {
    inner: ChildrenInner<'a>,
}


enum ChildrenInner<'a> {
    None,
    Binary { left: &'a Node, right: &'a Node, state: u8 },
    Slice(std::slice::Iter<'a, Node>),
}


impl<'a> Iterator for Children<'a> {
    type Item = &'a Node;


    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            ChildrenInner::None => None,
            ChildrenInner::Binary { left, right, state } => {
                match state {
                    0 => { *state = 1; Some(*left) },
                    1 => { *state = 2; Some(*right) },
                    _ => None,
                }
            },
            ChildrenInner::Slice(iter) => iter.next(),
        }
    }
}
