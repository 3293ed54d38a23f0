//! Defines the minimal cost-complexity pruning algorithm.
use log::debug;

use super::node::Node;


/// The weakest link of one pruning iteration: the internal node whose
/// subtree is cheapest to collapse.
struct Link {
    /// The effective alpha at which collapsing becomes cost-neutral.
    alpha: f64,
    /// Weighted sample count of the node, the tie-breaker.
    weight: f64,
    /// Preorder id of the node within the scanned tree.
    id: usize,
}


/// Minimal cost-complexity pruning over a fitted tree.
///
/// Every pruned tree is a fresh deep copy; the tree handed to the
/// pruner is never mutated, so the unpruned fit and all intermediate
/// trees stay independently inspectable.
pub(crate) struct CcpPruner {
    root: Node,
    weighted_n_samples: f64,
}


impl CcpPruner {
    /// Construct a pruner over `root`. `weighted_n_samples` is the
    /// total weight of the dataset the tree was fitted on; all
    /// node/subtree costs are normalized by it.
    pub(crate) fn new(root: Node, weighted_n_samples: f64) -> Self {
        Self { root, weighted_n_samples, }
    }


    /// The tree handed to this pruner.
    pub(crate) fn root(&self) -> &Node {
        &self.root
    }


    /// Collapse weakest links one by one until only the root is left,
    /// recording each intermediate tree keyed by its effective alpha.
    ///
    /// The produced alphas are non-decreasing; alpha `0.0` maps to the
    /// unpruned tree unless the fit contains cost-neutral splits, in
    /// which case the later tree at the same alpha replaces it, as a
    /// map keyed by alpha would.
    pub(crate) fn prune_all(&self) -> Vec<(f64, Node)> {
        let mut sub_trees = vec![(0.0, self.root.clone())];
        let mut last = self.root.clone();
        while !last.is_leaf() {
            let (alpha, pruned) = self.prune_once(&last);
            debug!(
                "collapsed the weakest link at alpha {alpha}; \
                 {n} leaves left",
                n = pruned.leaves(),
            );
            match sub_trees.last_mut() {
                Some(entry) if entry.0 == alpha => {
                    entry.1 = pruned.clone();
                },
                _ => {
                    sub_trees.push((alpha, pruned.clone()));
                },
            }
            last = pruned;
        }

        sub_trees
    }


    /// Replay the collapse loop, stopping as soon as the next weakest
    /// link exceeds `ccp_alpha`. Returns the largest tree whose every
    /// retained split has effective alpha at most `ccp_alpha`.
    pub(crate) fn prune_with_alpha(&self, ccp_alpha: f64) -> Node {
        let mut last = self.root.clone();
        while !last.is_leaf() {
            let (alpha, pruned) = self.prune_once(&last);
            if alpha > ccp_alpha {
                break;
            }
            last = pruned;
        }

        last
    }


    /// Collapse the weakest link of `tree` in a fresh copy and return
    /// it together with its effective alpha.
    fn prune_once(&self, tree: &Node) -> (f64, Node) {
        let mut pruned = tree.clone();
        match self.weakest_link(tree) {
            Some(link) => {
                collapse_at(&mut pruned, link.id);
                (link.alpha, pruned)
            },
            // Degenerate chain without a two-leaf internal node:
            // collapsing the root ends the sequence without saving
            // any leaf.
            None => {
                pruned.to_leaf();
                (0.0, pruned)
            },
        }
    }


    /// One post-order pass computing every internal node's effective
    /// alpha and keeping the global minimum. A tie prefers the node
    /// with the smaller weighted sample count, i.e. the
    /// less-supported subtree.
    fn weakest_link(&self, root: &Node) -> Option<Link> {
        let mut best = None;
        let mut id = 0;
        self.walk(root, &mut id, &mut best);
        best
    }


    /// Returns `(leaves, subtree_cost)` of the subtree at `node`,
    /// updating `best` along the way. Only internal nodes with at
    /// least two leaves below them get an effective alpha.
    fn walk(
        &self,
        node: &Node,
        id: &mut usize,
        best: &mut Option<Link>,
    ) -> (usize, f64)
    {
        let my_id = *id;
        *id += 1;

        let node_cost = node.weighted_n_samples() * node.impurity()
            / self.weighted_n_samples;
        if node.is_leaf() {
            return (1, node_cost);
        }

        let mut leaves = 0;
        let mut subtree_cost = 0.0;
        for child in node.children() {
            let (child_leaves, child_cost) = self.walk(child, id, best);
            leaves += child_leaves;
            subtree_cost += child_cost;
        }

        if leaves >= 2 {
            let alpha = (node_cost - subtree_cost) / (leaves as f64 - 1.0);
            let weight = node.weighted_n_samples();
            let better = match best {
                None => true,
                Some(b) => {
                    alpha < b.alpha
                        || (alpha == b.alpha && weight <= b.weight)
                },
            };
            if better {
                *best = Some(Link { alpha, weight, id: my_id, });
            }
        }

        (leaves, subtree_cost)
    }
}


/// Collapse the node with preorder id `target` to a leaf.
fn collapse_at(root: &mut Node, target: usize) {
    let mut id = 0;
    collapse_walk(root, &mut id, target);
}


fn collapse_walk(node: &mut Node, id: &mut usize, target: usize) -> bool {
    let my_id = *id;
    *id += 1;

    if my_id == target {
        node.to_leaf();
        return true;
    }
    for child in node.children_mut() {
        if collapse_walk(child, id, target) {
            return true;
        }
    }
    false
}
