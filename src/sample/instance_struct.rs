//! Defines a single weighted instance.
use serde::{Serialize, Deserialize};


/// A fixed-length vector of attribute values with an optional class
/// value and a weight.
///
/// Categorical attribute values are pre-encoded to doubles by the
/// dataset loaders. The class value is `f64::NAN` while the instance
/// is unlabeled. The dimensionality of an instance never changes;
/// [`Instance::delete_attribute`] produces a *new* instance with one
/// fewer dimension instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    values: Vec<f64>,
    label: f64,
    weight: f64,
}


impl Instance {
    /// Construct an unlabeled instance of weight `1.0`.
    #[inline]
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, label: f64::NAN, weight: 1.0, }
    }


    /// Construct a labeled instance of weight `1.0`.
    #[inline]
    pub fn labeled(values: Vec<f64>, label: f64) -> Self {
        Self { values, label, weight: 1.0, }
    }


    /// Replace the weight of this instance. Consumes `self`.
    #[inline]
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }


    /// The value of the attribute at `index`.
    #[inline]
    pub fn attribute(&self, index: usize) -> f64 {
        self.values[index]
    }


    /// All attribute values.
    pub fn values(&self) -> &[f64] {
        &self.values[..]
    }


    /// The class value, `f64::NAN` if unlabeled.
    pub fn label(&self) -> f64 {
        self.label
    }


    /// Assign a class value.
    pub fn set_label(&mut self, label: f64) {
        self.label = label;
    }


    /// Whether the class value is set.
    #[inline]
    pub fn is_labeled(&self) -> bool {
        !self.label.is_nan()
    }


    /// The instance weight.
    pub fn weight(&self) -> f64 {
        self.weight
    }


    /// Assign a new weight.
    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }


    /// The number of attributes.
    #[inline]
    pub fn dimensionality(&self) -> usize {
        self.values.len()
    }


    /// Returns a new instance without the attribute at `index`.
    /// Label and weight carry over.
    #[inline]
    pub fn delete_attribute(&self, index: usize) -> Self {
        let mut values = Vec::with_capacity(self.values.len() - 1);
        values.extend_from_slice(&self.values[..index]);
        values.extend_from_slice(&self.values[index + 1..]);

        Self { values, label: self.label, weight: self.weight, }
    }
}
