//! Sparse tensors.
//!
//! A [`Tensor`] is a set of cells keyed by one label per named dimension.
//! Dimensions are kept sorted by name so that two tensors built from the same
//! cells compare equal regardless of the order in which the cells or
//! dimensions were listed. Tensors are created from a [`TensorSpec`], the
//! engine-neutral description produced by the compiler for tensor literals.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::Value;

/// Cell address in a [`TensorSpec`]: dimension name → label.
pub type Address = BTreeMap<String, String>;

/// Pairwise combiner used for reductions, e.g. `|a, b| a + b`.
pub type Combine = fn(f64, f64) -> f64;

/// Errors raised while building or reducing tensors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TensorError {
    /// A cell address binds a dimension its `TensorSpec` does not declare.
    #[error("cell address binds undeclared dimension '{dimension}'")]
    UndeclaredDimension {
        /// The offending dimension name.
        dimension: String,
    },

    /// A reduction named a dimension the tensor does not have.
    #[error("tensor has no dimension '{dimension}' (dimensions: {available:?})")]
    UnknownDimension {
        /// The requested dimension.
        dimension: String,
        /// The dimensions the tensor actually has.
        available: Vec<String>,
    },
}

/// Engine-neutral description of a sparse tensor.
///
/// Cells whose address omits a declared dimension are stored under the empty
/// label for that dimension. When the same address is added twice the later
/// value replaces the earlier one, except in a spec with no dimensions, where
/// every cell lands on the single empty address and the values are summed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TensorSpec {
    dimensions: BTreeSet<String>,
    cells: Vec<(Address, f64)>,
}

impl TensorSpec {
    /// Create an empty spec over the given dimensions.
    pub fn new<I, S>(dimensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dimensions: dimensions.into_iter().map(Into::into).collect(),
            cells: Vec::new(),
        }
    }

    /// Append a cell.
    pub fn add(&mut self, address: Address, value: f64) -> &mut Self {
        self.cells.push((address, value));
        self
    }

    /// Builder-style variant of [`TensorSpec::add`].
    pub fn with_cell<I, K, L>(mut self, address: I, value: f64) -> Self
    where
        I: IntoIterator<Item = (K, L)>,
        K: Into<String>,
        L: Into<String>,
    {
        let address = address
            .into_iter()
            .map(|(k, l)| (k.into(), l.into()))
            .collect();
        self.cells.push((address, value));
        self
    }

    /// Declared dimension names in sorted order.
    pub fn dimensions(&self) -> impl Iterator<Item = &str> {
        self.dimensions.iter().map(String::as_str)
    }

    /// Cells in insertion order.
    pub fn cells(&self) -> &[(Address, f64)] {
        &self.cells
    }
}

/// Materialised sparse tensor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tensor {
    /// Sorted, unique dimension names.
    dimensions: Vec<String>,
    /// Labels aligned with `dimensions` → cell value.
    cells: BTreeMap<Vec<String>, f64>,
}

impl Tensor {
    /// Build a tensor from a spec.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::UndeclaredDimension`] if a cell address binds
    /// a dimension that the `TensorSpec` does not declare.
    pub fn from_spec(spec: &TensorSpec) -> Result<Self, TensorError> {
        let dimensions: Vec<String> = spec.dimensions.iter().cloned().collect();
        let mut cells = BTreeMap::new();
        for (address, value) in &spec.cells {
            if let Some(unknown) = address.keys().find(|d| !spec.dimensions.contains(*d)) {
                return Err(TensorError::UndeclaredDimension {
                    dimension: unknown.clone(),
                });
            }
            let labels = dimensions
                .iter()
                .map(|d| address.get(d).cloned().unwrap_or_default())
                .collect();
            if dimensions.is_empty() {
                *cells.entry(labels).or_insert(0.0) += *value;
            } else {
                cells.insert(labels, *value);
            }
        }
        Ok(Self { dimensions, cells })
    }

    /// Dimension names in sorted order.
    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    /// Iterate `(labels, value)` pairs; labels align with [`Tensor::dimensions`].
    pub fn cells(&self) -> impl Iterator<Item = (&[String], f64)> {
        self.cells.iter().map(|(k, v)| (k.as_slice(), *v))
    }

    /// Look up a cell by its full address.
    pub fn get(&self, address: &[(&str, &str)]) -> Option<f64> {
        if address.len() != self.dimensions.len() {
            return None;
        }
        let mut labels = Vec::with_capacity(self.dimensions.len());
        for dimension in &self.dimensions {
            let (_, label) = address.iter().find(|(d, _)| d == dimension)?;
            labels.push((*label).to_string());
        }
        self.cells.get(&labels).copied()
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True if the tensor has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Sum of all cells; the scalar view of a tensor.
    pub fn sum(&self) -> f64 {
        self.cells.values().sum()
    }

    /// Apply `f` to every cell.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Tensor {
        Tensor {
            dimensions: self.dimensions.clone(),
            cells: self.cells.iter().map(|(k, v)| (k.clone(), f(*v))).collect(),
        }
    }

    /// Sparse join.
    ///
    /// The result has the union of both dimension sets. Every pair of cells
    /// that agrees on the shared dimensions contributes one cell holding
    /// `f(lhs, rhs)`. With identical dimension sets this is cell-wise
    /// application over the matching addresses.
    pub fn join(&self, other: &Tensor, f: impl Fn(f64, f64) -> f64) -> Tensor {
        let dimensions: Vec<String> = self
            .dimensions
            .iter()
            .chain(other.dimensions.iter())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let lhs_pos = positions(&dimensions, &self.dimensions);
        let rhs_pos = positions(&dimensions, &other.dimensions);

        let mut cells = BTreeMap::new();
        for (lhs_labels, lhs_value) in &self.cells {
            'rhs: for (rhs_labels, rhs_value) in &other.cells {
                let mut labels = vec![String::new(); dimensions.len()];
                let mut bound = vec![false; dimensions.len()];
                for (label, &pos) in lhs_labels.iter().zip(&lhs_pos) {
                    labels[pos] = label.clone();
                    bound[pos] = true;
                }
                for (label, &pos) in rhs_labels.iter().zip(&rhs_pos) {
                    if bound[pos] && labels[pos] != *label {
                        continue 'rhs;
                    }
                    labels[pos] = label.clone();
                }
                cells.insert(labels, f(*lhs_value, *rhs_value));
            }
        }
        Tensor { dimensions, cells }
    }

    /// Reduce over the named dimensions with `combine`.
    ///
    /// An empty dimension list reduces over every dimension. Reducing away all
    /// dimensions yields [`Value::Double`]; otherwise the result is a tensor
    /// over the remaining dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::UnknownDimension`] if a requested dimension is
    /// not present.
    pub fn reduce(&self, combine: Combine, dimensions: &[&str]) -> Result<Value, TensorError> {
        for dimension in dimensions {
            if !self.dimensions.iter().any(|d| d == dimension) {
                return Err(TensorError::UnknownDimension {
                    dimension: (*dimension).to_string(),
                    available: self.dimensions.clone(),
                });
            }
        }
        let keep: Vec<usize> = self
            .dimensions
            .iter()
            .enumerate()
            .filter(|(_, d)| !dimensions.is_empty() && !dimensions.contains(&d.as_str()))
            .map(|(i, _)| i)
            .collect();

        if keep.is_empty() {
            let total = self.cells.values().copied().reduce(combine).unwrap_or(0.0);
            return Ok(Value::Double(total));
        }

        let mut cells: BTreeMap<Vec<String>, f64> = BTreeMap::new();
        for (labels, value) in &self.cells {
            let key: Vec<String> = keep.iter().map(|&i| labels[i].clone()).collect();
            cells
                .entry(key)
                .and_modify(|acc| *acc = combine(*acc, *value))
                .or_insert(*value);
        }
        let dimensions = keep.iter().map(|&i| self.dimensions[i].clone()).collect();
        Ok(Value::tensor(Tensor { dimensions, cells }))
    }
}

/// Index of each `subset` dimension within `all` (both sorted).
fn positions(all: &[String], subset: &[String]) -> Vec<usize> {
    subset
        .iter()
        .map(|d| all.iter().position(|a| a == d).unwrap_or_default())
        .collect()
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tensor({})", self.dimensions.join(","))?;
        write!(f, " {{")?;
        for (i, (labels, value)) in self.cells.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{{")?;
            for (j, (dimension, label)) in self.dimensions.iter().zip(labels).enumerate() {
                if j > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{dimension}:{label}")?;
            }
            write!(f, "}}:{value}")?;
        }
        write!(f, "}}")
    }
}
