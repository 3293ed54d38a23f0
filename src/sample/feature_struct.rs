//! Defines the feature descriptor.
use serde::{Serialize, Deserialize};

use std::fmt;


/// Index assigned to the class descriptor.
/// The class is not a real column, so it gets a sentinel index.
pub const CLASS_INDEX: i32 = -1;


/// The two kinds of feature this crate distinguishes.
/// Categorical values are pre-encoded to doubles by the loaders,
/// so both kinds are stored as `f64` on the instance side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    /// Discrete values, matched by equality.
    Categorical,
    /// Continuous values, matched against thresholds.
    Numeric,
}


/// Describes a single feature: its name, kind,
/// stable column index, and weight.
///
/// The index refers to the position in the *original* attribute vector
/// and survives the column deletions performed while growing
/// ID3/C4.5 trees, so a fitted node can always route a full-length
/// query instance.
/// The class label shares this shape with `index == CLASS_INDEX`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureInfo {
    name: String,
    kind: FeatureKind,
    index: i32,
    weight: f64,
}


impl FeatureInfo {
    /// Construct a descriptor with the default weight `1.0`.
    #[inline]
    pub fn new<S: ToString>(name: S, kind: FeatureKind, index: usize) -> Self {
        Self {
            name: name.to_string(),
            kind,
            index: index as i32,
            weight: 1.0,
        }
    }


    /// Construct a descriptor with the given weight.
    #[inline]
    pub fn with_weight<S: ToString>(
        name: S,
        kind: FeatureKind,
        index: usize,
        weight: f64,
    ) -> Self
    {
        let mut info = Self::new(name, kind, index);
        info.weight = weight;
        info
    }


    /// Construct the descriptor of a class label.
    /// Its index is the [`CLASS_INDEX`] sentinel.
    #[inline]
    pub fn class<S: ToString>(name: S) -> Self {
        Self {
            name: name.to_string(),
            kind: FeatureKind::Categorical,
            index: CLASS_INDEX,
            weight: 1.0,
        }
    }


    /// The feature name.
    pub fn name(&self) -> &str {
        &self.name
    }


    /// The feature kind.
    pub fn kind(&self) -> FeatureKind {
        self.kind
    }


    /// The stable column index
    /// ([`CLASS_INDEX`] for the class descriptor).
    pub fn index(&self) -> i32 {
        self.index
    }


    /// The feature weight.
    pub fn weight(&self) -> f64 {
        self.weight
    }


    /// Whether this feature takes continuous values.
    #[inline]
    pub fn is_numeric(&self) -> bool {
        self.kind == FeatureKind::Numeric
    }


    /// Whether this descriptor is the class sentinel.
    #[inline]
    pub fn is_class(&self) -> bool {
        self.index == CLASS_INDEX
    }
}


impl fmt::Display for FeatureInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}


impl FeatureInfo {
    /// Reassign the stable index.
    /// Only the loaders renumber descriptors; growing a tree never does.
    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index as i32;
    }
}
