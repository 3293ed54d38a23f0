//! Defines the weighted dataset view consumed by the tree builders.
use polars::prelude::*;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::slice;

use crate::error::Error;
use super::feature_struct::*;
use super::instance_struct::Instance;


/// A weighted class distribution.
/// Class values are pre-encoded to doubles by the loaders, so the
/// integer cast is lossless; the ordered keys make majority-class
/// tie-breaking deterministic (the smallest label wins).
pub type LabelToWeight = BTreeMap<i64, f64>;


/// Struct `DataSet` holds a batch of weighted, labeled instances
/// together with their feature descriptors.
///
/// The tree builders only read a dataset; the child datasets produced
/// while growing a tree are fresh `DataSet` values built with
/// [`DataSet::new`] and [`DataSet::push`].
#[derive(Debug, Clone)]
pub struct DataSet {
    attributes: Vec<FeatureInfo>,
    class_info: FeatureInfo,
    instances: Vec<Instance>,
}


impl DataSet {
    /// Construct an empty dataset over the given attributes.
    pub fn new(attributes: Vec<FeatureInfo>, class_info: FeatureInfo) -> Self {
        Self { attributes, class_info, instances: Vec::new(), }
    }


    /// Append an instance.
    /// The instance dimensionality must match the dataset's.
    pub fn push(&mut self, instance: Instance) {
        assert_eq!(
            instance.dimensionality(), self.attributes.len(),
            "instance dimensionality does not match the dataset",
        );
        self.instances.push(instance);
    }


    /// The number of instances.
    pub fn size(&self) -> usize {
        self.instances.len()
    }


    /// Whether the dataset holds no instances.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }


    /// The number of attributes.
    /// Shrinks along an ID3/C4.5 path as features are consumed.
    pub fn dimensionality(&self) -> usize {
        self.attributes.len()
    }


    /// The descriptor of the attribute at position `pos`
    /// in *this* dataset.
    pub fn attribute_info(&self, pos: usize) -> &FeatureInfo {
        &self.attributes[pos]
    }


    /// All attribute descriptors, in column order.
    pub fn attributes(&self) -> &[FeatureInfo] {
        &self.attributes[..]
    }


    /// The class descriptor.
    pub fn class_info(&self) -> &FeatureInfo {
        &self.class_info
    }


    /// The instance at `idx`.
    pub fn instance(&self, idx: usize) -> &Instance {
        &self.instances[idx]
    }


    /// Iterate over the instances.
    pub fn iter(&self) -> slice::Iter<'_, Instance> {
        self.instances.iter()
    }


    /// The sum of instance weights.
    pub fn total_weight(&self) -> f64 {
        self.instances.iter()
            .map(|inst| inst.weight())
            .sum::<f64>()
    }


    /// The weighted class distribution of the whole dataset.
    pub fn class_distribution(&self) -> LabelToWeight {
        let mut dist = LabelToWeight::new();
        for inst in &self.instances {
            let y = inst.label() as i64;
            *dist.entry(y).or_insert(0.0) += inst.weight();
        }
        dist
    }


    /// The weighted class distribution conditioned on the attribute at
    /// `pos`: one `(value, class → weight)` entry per distinct observed
    /// value, sorted by value.
    pub fn conditional_distribution(&self, pos: usize)
        -> Vec<(f64, LabelToWeight)>
    {
        let mut rows = self.instances.iter()
            .map(|inst| (inst.attribute(pos), inst.label() as i64, inst.weight()))
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());


        let mut cond: Vec<(f64, LabelToWeight)> = Vec::new();
        for (value, y, w) in rows {
            match cond.last_mut() {
                Some((v, dist)) if *v == value => {
                    *dist.entry(y).or_insert(0.0) += w;
                },
                _ => {
                    let mut dist = LabelToWeight::new();
                    dist.insert(y, w);
                    cond.push((value, dist));
                },
            }
        }
        cond
    }


    /// The sorted distinct values of the attribute at `pos`.
    pub fn distinct_values(&self, pos: usize) -> Vec<f64> {
        let mut values = self.instances.iter()
            .map(|inst| inst.attribute(pos))
            .collect::<Vec<_>>();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        values.dedup();
        values
    }


    /// The distinct class values.
    pub fn class_set(&self) -> BTreeSet<i64> {
        self.instances.iter()
            .map(|inst| inst.label() as i64)
            .collect()
    }


    /// The class with the largest weighted count.
    /// Ties are broken toward the smaller label;
    /// an empty dataset yields `f64::NAN`.
    pub fn majority_class(&self) -> f64 {
        let mut max_weight = -1.0;
        let mut class = f64::NAN;
        for (y, w) in self.class_distribution() {
            if w > max_weight {
                max_weight = w;
                class = y as f64;
            }
        }
        class
    }


    /// Overwrite each instance weight.
    /// The slice length must equal the dataset size.
    pub fn set_sample_weights(&mut self, weights: &[f64]) {
        assert_eq!(
            weights.len(), self.instances.len(),
            "one weight per instance is required",
        );
        for (inst, &w) in self.instances.iter_mut().zip(weights) {
            inst.set_weight(w);
        }
    }


    /// Scale each instance weight by the weight of its class,
    /// so that `instance weight = class weight × sample weight`.
    /// Classes missing from the map keep weight `1.0`.
    pub fn set_class_weights(&mut self, class_weight: &BTreeMap<i64, f64>) {
        for inst in self.instances.iter_mut() {
            let y = inst.label() as i64;
            let cw = class_weight.get(&y).copied().unwrap_or(1.0);
            inst.set_weight(inst.weight() * cw);
        }
    }


    /// Read a CSV file into a `DataSet`.
    ///
    /// Columns whose every cell parses as `f64` become numeric
    /// features; the rest become categorical features whose values are
    /// encoded to doubles in order of first appearance. Without a
    /// header, columns are named `Feat. [i]`.
    ///
    /// The result has no class column until
    /// [`DataSet::set_target`] is called.
    pub fn from_csv<P>(file: P, has_header: bool) -> Result<Self, Error>
        where P: AsRef<Path>,
    {
        let file = File::open(file)?;
        let mut lines = BufReader::new(file).lines().enumerate();

        let mut names = Vec::new();
        if has_header {
            if let Some((_, line)) = lines.next() {
                names = line?.split(',')
                    .map(|name| name.trim().to_string())
                    .collect::<Vec<_>>();
            }
        }

        let mut cells: Vec<Vec<String>> = Vec::new();
        for (k, line) in lines {
            let row = line?.split(',')
                .map(|cell| cell.trim().to_string())
                .collect::<Vec<_>>();

            if names.is_empty() {
                names = (1..=row.len())
                    .map(|i| format!("Feat. [{i}]"))
                    .collect();
            }
            if row.len() != names.len() {
                return Err(Error::Parse {
                    line: k + 1,
                    reason: format!(
                        "expected {} columns, got {}", names.len(), row.len(),
                    ),
                });
            }
            cells.push(row);
        }


        let n_feature = names.len();
        let mut columns = Vec::with_capacity(n_feature);
        let mut attributes = Vec::with_capacity(n_feature);
        for (i, name) in names.into_iter().enumerate() {
            let numeric = cells.iter()
                .all(|row| row[i].parse::<f64>().is_ok());

            let column = if numeric {
                cells.iter()
                    .map(|row| row[i].parse::<f64>().unwrap())
                    .collect::<Vec<_>>()
            } else {
                let mut encoding = HashMap::new();
                cells.iter()
                    .map(|row| {
                        let n_code = encoding.len();
                        *encoding.entry(row[i].clone())
                            .or_insert(n_code as f64)
                    })
                    .collect::<Vec<_>>()
            };

            let kind = if numeric {
                FeatureKind::Numeric
            } else {
                FeatureKind::Categorical
            };
            attributes.push(FeatureInfo::new(name, kind, i));
            columns.push(column);
        }


        let instances = (0..cells.len())
            .map(|r| {
                let values = columns.iter()
                    .map(|column| column[r])
                    .collect::<Vec<_>>();
                Instance::new(values)
            })
            .collect::<Vec<_>>();

        let mut dataset = Self::new(attributes, FeatureInfo::class("class"));
        dataset.instances = instances;
        Ok(dataset)
    }


    /// Move the feature named `target` out of the attribute list and
    /// use its values as the class column. The remaining attributes
    /// are re-indexed `0..dimensionality`, which from now on is the
    /// stable index space used by fitted trees.
    ///
    /// # Panics
    /// When no feature carries the given name.
    pub fn set_target<S: AsRef<str>>(mut self, target: S) -> Self {
        let target = target.as_ref();
        let pos = self.attributes.iter()
            .position(|info| info.name() == target)
            .expect("The target class does not exist");

        let class_info = FeatureInfo::class(self.attributes[pos].name());

        self.attributes.remove(pos);
        for (i, info) in self.attributes.iter_mut().enumerate() {
            info.set_index(i);
        }

        self.instances = self.instances.iter()
            .map(|inst| {
                let mut shrunk = inst.delete_attribute(pos);
                shrunk.set_label(inst.attribute(pos));
                shrunk
            })
            .collect();
        self.class_info = class_info;
        self
    }


    /// Convert a `polars::DataFrame` and a target `Series` into a
    /// `DataSet`. Float/integer columns become numeric features;
    /// string columns become categorical features encoded in order of
    /// first appearance.
    ///
    /// # Panics
    /// When a column (or the target) has an unsupported dtype.
    pub fn from_dataframe(data: DataFrame, target: Series)
        -> Result<Self, Error>
    {
        let (n_sample, _) = data.shape();

        let mut attributes = Vec::new();
        let mut columns = Vec::new();
        for (i, series) in data.get_columns().iter().enumerate() {
            let (kind, column) = decode_series(series);
            attributes.push(FeatureInfo::new(series.name(), kind, i));
            columns.push(column);
        }

        let (_, labels) = decode_series(&target);
        let class_info = FeatureInfo::class(target.name());


        let instances = (0..n_sample)
            .map(|r| {
                let values = columns.iter()
                    .map(|column| column[r])
                    .collect::<Vec<_>>();
                Instance::labeled(values, labels[r])
            })
            .collect::<Vec<_>>();

        let mut dataset = Self::new(attributes, class_info);
        dataset.instances = instances;
        Ok(dataset)
    }
}


/// Decode one polars series into a feature kind and an encoded column.
fn decode_series(series: &Series) -> (FeatureKind, Vec<f64>) {
    match series.dtype() {
        DataType::Float64 => {
            let column = series.f64()
                .unwrap()
                .into_iter()
                .map(|v| v.unwrap_or(f64::NAN))
                .collect::<Vec<_>>();
            (FeatureKind::Numeric, column)
        },
        DataType::Int64 => {
            let column = series.i64()
                .unwrap()
                .into_iter()
                .map(|v| v.map(|x| x as f64).unwrap_or(f64::NAN))
                .collect::<Vec<_>>();
            (FeatureKind::Numeric, column)
        },
        DataType::Utf8 => {
            let mut encoding = HashMap::new();
            let column = series.utf8()
                .unwrap()
                .into_iter()
                .map(|v| {
                    let v = v.unwrap_or("");
                    let n_code = encoding.len();
                    *encoding.entry(v.to_string())
                        .or_insert(n_code as f64)
                })
                .collect::<Vec<_>>();
            (FeatureKind::Categorical, column)
        },
        dtype => panic!("unsupported column dtype {dtype:?}"),
    }
}


impl<'a> IntoIterator for &'a DataSet {
    type Item = &'a Instance;
    type IntoIter = slice::Iter<'a, Instance>;


    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
