//! Exports the frequently used structs of this crate.
//! ```no_run
//! use minitrees::prelude::*;
//! ```

pub use crate::error::Error;

pub use crate::sample::{
    DataSet,
    FeatureInfo,
    FeatureKind,
    Instance,
    LabelToWeight,
};

pub use crate::tree::{
    Criterion,
    DecisionTreeBuilder,
    DecisionTreeClassifier,
    Node,
    Split,
};
