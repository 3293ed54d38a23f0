//! Defines the dataset abstraction consumed by the tree builders.

/// Defines the feature descriptor.
pub mod feature_struct;
/// Defines a single weighted instance.
pub mod instance_struct;
/// Defines the weighted dataset view.
pub mod dataset_struct;


pub use feature_struct::{CLASS_INDEX, FeatureInfo, FeatureKind};
pub use instance_struct::Instance;
pub use dataset_struct::{DataSet, LabelToWeight};
