//! Defines the split criteria and the impurity measures.
use rayon::prelude::*;

use log::warn;
use serde::{Serialize, Deserialize};

use std::fmt;

use crate::sample::{DataSet, LabelToWeight};
use super::split_record::{Partition, SplitRecord};


/// Categorical features with more distinct values than this are
/// skipped by the CART bipartition search, which enumerates
/// `2^(v-1) - 1` candidates.
const MAX_SUBSET_VALUES: usize = 24;


/// Splitting criteria for growing decision trees.
/// The criterion decides both the split-quality measure and the
/// branching shape of categorical splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Criterion {
    /// Plain information gain (ID3).
    /// Categorical features split one branch per observed value.
    InfoGain,
    /// Gain ratio (C4.5): information gain normalized by the entropy
    /// of the branch-size distribution, which de-biases
    /// high-cardinality categorical features.
    GainRatio,
    /// Gini impurity (CART). Every split is binary; categorical
    /// features split on the best bipartition of their value set.
    Gini,
}


impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InfoGain => "Information gain",
            Self::GainRatio => "Gain ratio",
            Self::Gini => "Gini index",
        };

        write!(f, "{name}")
    }
}


impl Criterion {
    /// Whether child datasets drop the feature their parent split on.
    /// ID3 and C4.5 never reuse a feature along a path; CART does.
    #[inline]
    pub(crate) fn consumes_feature(&self) -> bool {
        matches!(self, Self::InfoGain | Self::GainRatio)
    }


    /// The impurity of a weighted class distribution
    /// under this criterion.
    #[inline]
    pub(crate) fn impurity(&self, dist: &LabelToWeight) -> f64 {
        match self {
            Self::InfoGain | Self::GainRatio => entropic_impurity(dist),
            Self::Gini => gini_impurity(dist),
        }
    }


    /// The impurity of the dataset's class distribution.
    #[inline]
    pub(crate) fn node_impurity(&self, dataset: &DataSet) -> f64 {
        self.impurity(&dataset.class_distribution())
    }


    /// Search all features of `dataset` for the best split.
    /// `weighted_n_samples` is the total weight of the *root* dataset;
    /// the reported improvement is a fraction of it.
    ///
    /// Returns `None` when no feature yields a usable split.
    pub(crate) fn best_split(
        &self,
        dataset: &DataSet,
        weighted_n_samples: f64,
    ) -> Option<SplitRecord>
    {
        match self {
            Self::InfoGain => split_by_info_gain(dataset, weighted_n_samples),
            Self::GainRatio => split_by_gain_ratio(dataset, weighted_n_samples),
            Self::Gini => split_by_gini(dataset, weighted_n_samples),
        }
    }
}


/// ID3 feature selection.
/// Categorical features split one branch per value; numeric features
/// split at the best midpoint threshold. The best candidate is updated
/// under `<=`, so later-found equal candidates replace earlier ones,
/// over thresholds and over features alike.
fn split_by_info_gain(dataset: &DataSet, weighted_n_samples: f64)
    -> Option<SplitRecord>
{
    let node_impurity = entropic_impurity(&dataset.class_distribution());
    let total_weight = dataset.total_weight();
    let dim = dataset.dimensionality();

    let candidates = (0..dim).into_par_iter()
        .map(|pos| {
            let cond = dataset.conditional_distribution(pos);
            if dataset.attribute_info(pos).is_numeric() {
                let scan = scan_thresholds(&cond, entropic_impurity, true);
                (scan.score, Partition::Threshold(scan.threshold))
            } else {
                let (score, _) = multiway_score(&cond, entropic_impurity);
                let edges = cond.iter().map(|(v, _)| *v).collect();
                (score, Partition::Multiway(edges))
            }
        })
        .collect::<Vec<_>>();


    let mut best = None;
    let mut best_score = node_impurity;
    for (pos, (score, partition)) in candidates.into_iter().enumerate() {
        if score <= best_score {
            best_score = score;
            best = Some((pos, partition));
        }
    }


    let (feature, partition) = best?;
    let improvement =
        total_weight * (node_impurity - best_score) / weighted_n_samples;
    Some(SplitRecord {
        feature,
        impurity: node_impurity,
        improvement,
        partition,
    })
}


struct GainCandidate {
    gain: f64,
    split_info: f64,
    partition: Partition,
}


/// C4.5 feature selection, in two phases: all info gains are computed
/// first; only features with above-average gain are ranked, by gain
/// ratio, under a strict `>` (the first maximum wins). Features that
/// cannot split at all have zero split-information and are ineligible.
fn split_by_gain_ratio(dataset: &DataSet, weighted_n_samples: f64)
    -> Option<SplitRecord>
{
    let node_impurity = entropic_impurity(&dataset.class_distribution());
    let total_weight = dataset.total_weight();
    let dim = dataset.dimensionality();

    let candidates = (0..dim).into_par_iter()
        .map(|pos| {
            let cond = dataset.conditional_distribution(pos);
            if dataset.attribute_info(pos).is_numeric() {
                // The original C4.5 scan keeps the first of equally
                // good thresholds, unlike ID3/CART.
                let scan = scan_thresholds(&cond, entropic_impurity, false);
                GainCandidate {
                    gain: node_impurity - scan.score,
                    split_info: branch_entropy(
                        &[scan.left_weight, scan.right_weight]
                    ),
                    partition: Partition::Threshold(scan.threshold),
                }
            } else {
                let (score, branch_weights) =
                    multiway_score(&cond, entropic_impurity);
                let edges = cond.iter().map(|(v, _)| *v).collect();
                GainCandidate {
                    gain: node_impurity - score,
                    split_info: branch_entropy(&branch_weights),
                    partition: Partition::Multiway(edges),
                }
            }
        })
        .collect::<Vec<_>>();


    let average_gain = candidates.iter()
        .map(|cand| cand.gain)
        .sum::<f64>() / dim as f64;

    let mut best = None;
    let mut best_ratio = -1.0;
    for (pos, cand) in candidates.iter().enumerate() {
        if cand.gain >= average_gain && cand.split_info > 0.0 {
            let ratio = cand.gain / cand.split_info;
            if ratio > best_ratio {
                best_ratio = ratio;
                best = Some(pos);
            }
        }
    }

    // Floating error at the boundary can leave every feature below
    // the recomputed average; fall back to the best plain info gain.
    let feature = match best {
        Some(pos) => pos,
        None => {
            let mut fallback = None;
            let mut best_gain = 0.0;
            for (pos, cand) in candidates.iter().enumerate() {
                if cand.gain > best_gain {
                    best_gain = cand.gain;
                    fallback = Some(pos);
                }
            }
            fallback?
        },
    };


    let improvement =
        total_weight * candidates[feature].gain / weighted_n_samples;
    Some(SplitRecord {
        feature,
        impurity: node_impurity,
        improvement,
        partition: candidates[feature].partition.clone(),
    })
}


struct GiniCandidate {
    score: f64,
    partition: Partition,
}


/// CART feature selection: minimize the weighted Gini impurity of the
/// two sides. Numeric features scan midpoint thresholds; categorical
/// features scan every non-trivial bipartition of their value set.
/// The best candidate is updated under `<=` throughout.
fn split_by_gini(dataset: &DataSet, weighted_n_samples: f64)
    -> Option<SplitRecord>
{
    let node_impurity = gini_impurity(&dataset.class_distribution());
    let total_weight = dataset.total_weight();
    let dim = dataset.dimensionality();

    let candidates = (0..dim).into_par_iter()
        .map(|pos| {
            let cond = dataset.conditional_distribution(pos);
            if dataset.attribute_info(pos).is_numeric() {
                let scan = scan_thresholds(&cond, gini_impurity, true);
                Some(GiniCandidate {
                    score: scan.score,
                    partition: Partition::Threshold(scan.threshold),
                })
            } else {
                scan_bipartitions(&cond).map(|scan| GiniCandidate {
                    score: scan.score,
                    partition: Partition::Subset {
                        left: scan.left,
                        right: scan.right,
                    },
                })
            }
        })
        .collect::<Vec<_>>();


    let mut best: Option<(usize, GiniCandidate)> = None;
    for (pos, cand) in candidates.into_iter().enumerate() {
        let Some(cand) = cand else { continue; };
        let better = match &best {
            None => true,
            Some((_, b)) => cand.score <= b.score,
        };
        if better {
            best = Some((pos, cand));
        }
    }


    let (feature, cand) = best?;
    let improvement =
        total_weight * (node_impurity - cand.score) / weighted_n_samples;
    if improvement < 0.0 {
        return None;
    }
    Some(SplitRecord {
        feature,
        impurity: node_impurity,
        improvement,
        partition: cand.partition,
    })
}


/// The best threshold found while scanning one numeric feature.
struct ThresholdScan {
    threshold: f64,
    score: f64,
    left_weight: f64,
    right_weight: f64,
}


/// Scan the N-1 midpoint candidates of a numeric feature in one pass,
/// maintaining running left/right class-weight accumulators.
/// `later_wins` decides whether an equally good later threshold
/// replaces the current best.
///
/// A feature with a single distinct value yields its singleton
/// candidate with the unsplit impurity, i.e. zero improvement.
fn scan_thresholds(
    cond: &[(f64, LabelToWeight)],
    impurity_of: fn(&LabelToWeight) -> f64,
    later_wins: bool,
) -> ThresholdScan
{
    let mut right = merge_distributions(cond);
    let mut right_weight = right.values().sum::<f64>();
    let total_weight = right_weight;

    if cond.len() < 2 {
        return ThresholdScan {
            threshold: cond[0].0,
            score: impurity_of(&right),
            left_weight: total_weight,
            right_weight: 0.0,
        };
    }

    let mut left = LabelToWeight::new();
    let mut left_weight = 0.0;

    let mut best: Option<ThresholdScan> = None;
    for window in cond.windows(2) {
        let (a1, dist) = &window[0];
        let a2 = window[1].0;

        // Move this value's weights from the right side to the left.
        for (&y, &w) in dist.iter() {
            *left.entry(y).or_insert(0.0) += w;
            left_weight += w;
            if let Some(entry) = right.get_mut(&y) {
                *entry -= w;
                if *entry <= 0.0 {
                    right.remove(&y);
                }
            }
            right_weight -= w;
        }

        let threshold = a1 / 2.0 + a2 / 2.0;
        let score = (left_weight * impurity_of(&left)
            + right_weight * impurity_of(&right)) / total_weight;

        let better = match &best {
            None => true,
            Some(b) => score < b.score || (later_wins && score == b.score),
        };
        if better {
            best = Some(ThresholdScan {
                threshold, score, left_weight, right_weight,
            });
        }
    }

    best.unwrap()
}


/// The weighted-average child impurity of a one-branch-per-value
/// split, together with the branch weights.
fn multiway_score(
    cond: &[(f64, LabelToWeight)],
    impurity_of: fn(&LabelToWeight) -> f64,
) -> (f64, Vec<f64>)
{
    let mut score = 0.0;
    let mut total_weight = 0.0;
    let mut branch_weights = Vec::with_capacity(cond.len());
    for (_, dist) in cond {
        let w = dist.values().sum::<f64>();
        score += w * impurity_of(dist);
        total_weight += w;
        branch_weights.push(w);
    }

    (score / total_weight, branch_weights)
}


/// The best bipartition found while scanning one categorical feature.
struct SubsetScan {
    score: f64,
    left: Vec<f64>,
    right: Vec<f64>,
}


/// Scan the `2^(v-1) - 1` bipartitions of a categorical value set.
/// Candidate left-sets never contain the last value, which covers
/// each unordered bipartition exactly once.
fn scan_bipartitions(cond: &[(f64, LabelToWeight)]) -> Option<SubsetScan> {
    let n_value = cond.len();
    if n_value == 1 {
        // Single observed value: the singleton candidate cannot split.
        let dist = merge_distributions(cond);
        return Some(SubsetScan {
            score: gini_impurity(&dist),
            left: vec![cond[0].0],
            right: Vec::new(),
        });
    }
    if n_value > MAX_SUBSET_VALUES {
        warn!(
            "skipping a categorical feature with {n_value} distinct \
             values; its bipartition search is exponential"
        );
        return None;
    }

    let class_dist = merge_distributions(cond);
    let total_weight = class_dist.values().sum::<f64>();

    let mut best: Option<(usize, f64)> = None;
    for mask in 1..(1_usize << (n_value - 1)) {
        let mut left = LabelToWeight::new();
        let mut left_weight = 0.0;
        for (i, (_, dist)) in cond.iter().enumerate() {
            if mask & (1 << i) != 0 {
                for (&y, &w) in dist.iter() {
                    *left.entry(y).or_insert(0.0) += w;
                    left_weight += w;
                }
            }
        }

        let mut right = class_dist.clone();
        for (y, w) in left.iter() {
            if let Some(entry) = right.get_mut(y) {
                *entry -= w;
                if *entry <= 0.0 {
                    right.remove(y);
                }
            }
        }
        let right_weight = total_weight - left_weight;

        let score = (left_weight * gini_impurity(&left)
            + right_weight * gini_impurity(&right)) / total_weight;

        let better = match &best {
            None => true,
            Some((_, b)) => score <= *b,
        };
        if better {
            best = Some((mask, score));
        }
    }


    let (mask, score) = best?;
    let mut left = Vec::new();
    let mut right = Vec::new();
    for (i, (value, _)) in cond.iter().enumerate() {
        if mask & (1 << i) != 0 {
            left.push(*value);
        } else {
            right.push(*value);
        }
    }

    Some(SubsetScan { score, left, right, })
}


/// Merge per-value class distributions into one.
fn merge_distributions(cond: &[(f64, LabelToWeight)]) -> LabelToWeight {
    let mut merged = LabelToWeight::new();
    for (_, dist) in cond {
        for (&y, &w) in dist.iter() {
            *merged.entry(y).or_insert(0.0) += w;
        }
    }
    merged
}


/// The entropy of a branch-size distribution,
/// i.e. the C4.5 split-information.
fn branch_entropy(weights: &[f64]) -> f64 {
    let total = weights.iter().sum::<f64>();
    if total <= 0.0 {
        return 0.0;
    }

    weights.iter()
        .map(|&w| {
            let p = w / total;
            if p <= 0.0 { 0.0 } else { -p * p.log2() }
        })
        .sum::<f64>()
}


/// Returns the entropic impurity of the given distribution:
/// `-Σ p log2(p)`, zero-weight classes skipped.
#[inline(always)]
pub(crate) fn entropic_impurity(map: &LabelToWeight) -> f64 {
    let total = map.values().sum::<f64>();
    if total <= 0.0 || map.is_empty() { return 0.0; }

    map.values()
        .map(|&w| {
            let p = w / total;
            if p <= 0.0 { 0.0 } else { -p * p.log2() }
        })
        .sum::<f64>()
}


/// Returns the Gini impurity of the given distribution:
/// `1 - Σ p²`.
#[inline(always)]
pub(crate) fn gini_impurity(map: &LabelToWeight) -> f64 {
    let total = map.values().sum::<f64>();
    if total <= 0.0 || map.is_empty() { return 0.0; }

    let correct = map.values()
        .map(|&w| (w / total).powi(2))
        .sum::<f64>();

    (1.0 - correct).max(0.0)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{FeatureInfo, FeatureKind, Instance};


    fn dist(pairs: &[(i64, f64)]) -> LabelToWeight {
        pairs.iter().copied().collect()
    }


    #[test]
    fn impurity_is_zero_iff_single_class() {
        let pure = dist(&[(0, 4.0)]);
        assert_eq!(entropic_impurity(&pure), 0.0);
        assert_eq!(gini_impurity(&pure), 0.0);

        let mixed = dist(&[(0, 2.0), (1, 2.0)]);
        assert!(entropic_impurity(&mixed) > 0.0);
        assert!(gini_impurity(&mixed) > 0.0);
    }


    #[test]
    fn impurity_tolerates_zero_weight_classes() {
        let with_ghost = dist(&[(0, 4.0), (1, 0.0)]);
        assert_eq!(entropic_impurity(&with_ghost), 0.0);
        assert_eq!(gini_impurity(&with_ghost), 0.0);
    }


    #[test]
    fn uniform_binary_entropy_is_one() {
        let uniform = dist(&[(0, 3.0), (1, 3.0)]);
        assert!((entropic_impurity(&uniform) - 1.0).abs() < 1e-9);
        assert!((gini_impurity(&uniform) - 0.5).abs() < 1e-9);
    }


    fn numeric_dataset(rows: &[(f64, f64)]) -> DataSet {
        let attributes =
            vec![FeatureInfo::new("x", FeatureKind::Numeric, 0)];
        let mut dataset =
            DataSet::new(attributes, FeatureInfo::class("y"));
        for &(x, y) in rows {
            dataset.push(Instance::labeled(vec![x], y));
        }
        dataset
    }


    #[test]
    fn threshold_is_the_midpoint_of_the_closest_cross_class_values() {
        let dataset = numeric_dataset(&[
            (1.0, 0.0), (2.0, 0.0), (3.0, 0.0),
            (7.0, 1.0), (8.0, 1.0), (9.0, 1.0),
        ]);
        let total = dataset.total_weight();

        let record = Criterion::Gini.best_split(&dataset, total).unwrap();
        assert_eq!(record.feature, 0);
        assert_eq!(record.partition, Partition::Threshold(5.0));
        // Both sides are pure, so the whole impurity is removed.
        assert!((record.improvement - record.impurity).abs() < 1e-9);
    }


    #[test]
    fn single_valued_feature_has_zero_improvement() {
        let dataset = numeric_dataset(&[(4.0, 0.0), (4.0, 1.0)]);
        let total = dataset.total_weight();

        let record =
            Criterion::InfoGain.best_split(&dataset, total).unwrap();
        assert_eq!(record.improvement, 0.0);
        assert_eq!(record.partition, Partition::Threshold(4.0));
        assert!((record.impurity - 1.0).abs() < 1e-9);
    }


    #[test]
    fn bipartition_splits_off_the_odd_value() {
        // Values 0 and 2 share a class; 1 belongs to the other one.
        let attributes =
            vec![FeatureInfo::new("v", FeatureKind::Categorical, 0)];
        let mut dataset =
            DataSet::new(attributes, FeatureInfo::class("y"));
        dataset.push(Instance::labeled(vec![0.0], 0.0));
        dataset.push(Instance::labeled(vec![1.0], 1.0));
        dataset.push(Instance::labeled(vec![2.0], 0.0));
        let total = dataset.total_weight();

        let record = Criterion::Gini.best_split(&dataset, total).unwrap();
        match record.partition {
            Partition::Subset { left, right } => {
                assert_eq!(left, vec![1.0]);
                assert_eq!(right, vec![0.0, 2.0]);
            },
            ref p => panic!("expected a subset partition, got {p:?}"),
        }
        assert!((record.improvement - record.impurity).abs() < 1e-9);
    }


    #[test]
    fn gain_ratio_prefers_low_cardinality_features() {
        // Feature 0 is a unique id (maximal info gain, huge split
        // info); feature 1 is binary and perfectly predictive.
        let attributes = vec![
            FeatureInfo::new("id", FeatureKind::Categorical, 0),
            FeatureInfo::new("flag", FeatureKind::Categorical, 1),
        ];
        let mut dataset =
            DataSet::new(attributes, FeatureInfo::class("y"));
        for i in 0..4 {
            let y = f64::from(i % 2);
            dataset.push(Instance::labeled(vec![f64::from(i), y], y));
        }
        let total = dataset.total_weight();

        let record =
            Criterion::GainRatio.best_split(&dataset, total).unwrap();
        assert_eq!(record.feature, 1);
    }
}
