use minitrees::prelude::*;

use rand::prelude::*;
use rand::rngs::StdRng;


const TOLERANCE: f64 = 1e-9;


fn plane_dataset(points: &[(f64, f64, f64)]) -> DataSet {
    let attributes = vec![
        FeatureInfo::new("x", FeatureKind::Numeric, 0),
        FeatureInfo::new("y", FeatureKind::Numeric, 1),
    ];
    let mut dataset = DataSet::new(attributes, FeatureInfo::class("class"));
    for &(x, y, label) in points {
        dataset.push(Instance::labeled(vec![x, y], label));
    }
    dataset
}


fn toy_plane() -> DataSet {
    plane_dataset(&[
        (10.0, 5.0, 1.0),
        (14.0, 8.0, 1.0),
        (15.0, 3.0, 1.0),
        (5.0, 1.0, 0.0),
        (3.0, 9.0, 0.0),
        (8.0, 13.0, 0.0),
        (12.0, 11.0, 0.0),
    ])
}


fn assert_weights_conserved(node: &Node) {
    if node.is_leaf() {
        return;
    }
    let children_weight = node.children()
        .map(Node::weighted_n_samples)
        .sum::<f64>();
    assert!(
        (node.weighted_n_samples() - children_weight).abs() < TOLERANCE,
        "node weight {} != children weight {children_weight}",
        node.weighted_n_samples(),
    );
    for child in node.children() {
        assert_weights_conserved(child);
    }
}


#[test]
fn alphas_are_non_decreasing_and_end_in_a_single_leaf() {
    let sample = toy_plane();
    for criterion in [
        Criterion::InfoGain,
        Criterion::GainRatio,
        Criterion::Gini,
    ] {
        let mut tree = DecisionTreeBuilder::new()
            .criterion(criterion)
            .build()
            .unwrap();
        tree.fit(&sample).unwrap();

        let sub_trees = tree.pruned_sub_trees().unwrap();
        assert!(sub_trees.len() >= 2);
        assert_eq!(sub_trees[0].0, 0.0);
        for pair in sub_trees.windows(2) {
            assert!(pair[0].0 <= pair[1].0);
        }
        assert!(sub_trees.last().unwrap().1.is_leaf());
    }
}


#[test]
fn alpha_zero_returns_the_unpruned_fit() {
    // Clean data: a single split separates, so no link is
    // cost-neutral and pruning at alpha zero keeps everything.
    let sample = plane_dataset(&[
        (1.0, 0.0, 0.0),
        (2.0, 1.0, 0.0),
        (3.0, 0.0, 0.0),
        (7.0, 1.0, 1.0),
        (8.0, 0.0, 1.0),
        (9.0, 1.0, 1.0),
    ]);
    let mut tree = DecisionTreeBuilder::new()
        .criterion(Criterion::Gini)
        .build()
        .unwrap();
    tree.fit(&sample).unwrap();

    let sub_trees = tree.pruned_sub_trees().unwrap();
    assert_eq!(sub_trees[0].0, 0.0);
    assert_eq!(tree.root().unwrap(), &sub_trees[0].1);
    assert!(sub_trees[0].0 < sub_trees[1].0);
}


#[test]
fn weights_are_conserved_down_every_tree() {
    let attributes = vec![
        FeatureInfo::new("x", FeatureKind::Numeric, 0),
        FeatureInfo::new("y", FeatureKind::Numeric, 1),
    ];
    let mut sample = DataSet::new(attributes, FeatureInfo::class("class"));
    let points = [
        (10.0, 5.0, 1.0, 0.5),
        (14.0, 8.0, 1.0, 1.5),
        (15.0, 3.0, 1.0, 2.0),
        (5.0, 1.0, 0.0, 0.25),
        (3.0, 9.0, 0.0, 1.0),
        (8.0, 13.0, 0.0, 3.0),
        (12.0, 11.0, 0.0, 0.75),
    ];
    for (x, y, label, weight) in points {
        sample.push(
            Instance::labeled(vec![x, y], label).with_weight(weight)
        );
    }

    let mut tree = DecisionTreeBuilder::new()
        .criterion(Criterion::Gini)
        .build()
        .unwrap();
    tree.fit(&sample).unwrap();

    for (_, root) in tree.pruned_sub_trees().unwrap() {
        assert_weights_conserved(root);
    }
}


#[test]
fn a_redundant_split_collapses_at_a_finite_alpha() {
    // Both feature values carry the same half/half class mix, so the
    // split duplicates the parent's distribution and is cost-neutral.
    let attributes =
        vec![FeatureInfo::new("v", FeatureKind::Categorical, 0)];
    let mut sample = DataSet::new(attributes, FeatureInfo::class("class"));
    sample.push(Instance::labeled(vec![0.0], 0.0));
    sample.push(Instance::labeled(vec![0.0], 1.0));
    sample.push(Instance::labeled(vec![1.0], 0.0));
    sample.push(Instance::labeled(vec![1.0], 1.0));

    let mut tree = DecisionTreeBuilder::new()
        .criterion(Criterion::Gini)
        .build()
        .unwrap();
    tree.fit(&sample).unwrap();

    // The zero-gain split exists in the grown tree and is the first
    // weakest link, so the alpha-zero entry of the sequence already
    // holds the collapsed tree and the kept root is a single leaf.
    let sub_trees = tree.pruned_sub_trees().unwrap();
    assert_eq!(sub_trees.len(), 1);
    assert_eq!(sub_trees[0].0, 0.0);
    assert!(sub_trees[0].1.is_leaf());

    let root = tree.root().unwrap();
    assert!(root.is_leaf());
    // Collapsing changed nothing in overall weighted impurity.
    assert!((root.impurity() - 0.5).abs() < TOLERANCE);
    assert_eq!(root.weighted_n_samples(), 4.0);
}


#[test]
fn ccp_alpha_selects_a_tree_from_the_sequence() {
    let sample = toy_plane();
    let mut full = DecisionTreeBuilder::new()
        .criterion(Criterion::Gini)
        .build()
        .unwrap();
    full.fit(&sample).unwrap();
    let sub_trees = full.pruned_sub_trees().unwrap().to_vec();

    // Refit with an alpha beyond every link: only the root survives.
    let last_alpha = sub_trees.last().unwrap().0;
    let mut stump = DecisionTreeBuilder::new()
        .criterion(Criterion::Gini)
        .ccp_alpha(last_alpha)
        .build()
        .unwrap();
    stump.fit(&sample).unwrap();
    assert!(stump.root().unwrap().is_leaf());

    // An alpha just below the strongest link keeps its tree.
    if sub_trees.len() >= 2 {
        let mid_alpha = sub_trees[sub_trees.len() - 2].0;
        let mut mid = DecisionTreeBuilder::new()
            .criterion(Criterion::Gini)
            .ccp_alpha(mid_alpha)
            .build()
            .unwrap();
        mid.fit(&sample).unwrap();
        assert_eq!(
            mid.root().unwrap(),
            &sub_trees[sub_trees.len() - 2].1,
        );
    }
}


#[test]
fn pruning_invariants_hold_on_random_data() {
    let mut rng = StdRng::seed_from_u64(20260807);

    for _ in 0..5 {
        let points = (0..40)
            .map(|_| {
                let x = rng.gen_range(0.0..10.0);
                let y = rng.gen_range(0.0..10.0);
                // A noisy quadrant rule.
                let noisy = if (x > 5.0) ^ (y > 5.0) {
                    rng.gen_bool(0.9)
                } else {
                    rng.gen_bool(0.1)
                };
                let label = if noisy { 1.0 } else { 0.0 };
                (x, y, label)
            })
            .collect::<Vec<_>>();
        let sample = plane_dataset(&points);

        let mut tree = DecisionTreeBuilder::new()
            .criterion(Criterion::Gini)
            .max_depth(6)
            .build()
            .unwrap();
        tree.fit(&sample).unwrap();

        let sub_trees = tree.pruned_sub_trees().unwrap();
        for pair in sub_trees.windows(2) {
            assert!(pair[0].0 <= pair[1].0);
        }
        assert!(sub_trees.last().unwrap().1.is_leaf());
        for (_, root) in sub_trees {
            assert_weights_conserved(root);
        }
    }
}
