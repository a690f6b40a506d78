//! Row and column annotation tables.

use crate::error::{MatrixError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A single annotation value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum AnnotationValue {
    Text(String),
    Number(f64),
    #[default]
    Missing,
}

impl AnnotationValue {
    /// Check if this is a missing value.
    pub fn is_missing(&self) -> bool {
        matches!(self, AnnotationValue::Missing)
    }

    /// Numeric reading; text is parsed, missing yields `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AnnotationValue::Number(v) => Some(*v),
            AnnotationValue::Text(s) => s.trim().parse().ok(),
            AnnotationValue::Missing => None,
        }
    }

    /// Text rendering; missing renders as `""`.
    pub fn as_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AnnotationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationValue::Text(s) => f.write_str(s),
            AnnotationValue::Number(v) => write!(f, "{}", v),
            AnnotationValue::Missing => Ok(()),
        }
    }
}

impl From<&str> for AnnotationValue {
    fn from(s: &str) -> Self {
        AnnotationValue::Text(s.to_string())
    }
}

impl From<String> for AnnotationValue {
    fn from(s: String) -> Self {
        AnnotationValue::Text(s)
    }
}

impl From<f64> for AnnotationValue {
    fn from(v: f64) -> Self {
        AnnotationValue::Number(v)
    }
}

/// Named annotation sequences aligned with one matrix axis.
///
/// Every sequence has exactly `len` entries; names are unique and keep
/// their insertion order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Annotations {
    len: usize,
    names: Vec<String>,
    values: HashMap<String, Vec<AnnotationValue>>,
}

impl Annotations {
    /// Empty table for an axis of length `len`.
    pub fn new(len: usize) -> Self {
        Self {
            len,
            names: Vec::new(),
            values: HashMap::new(),
        }
    }

    /// Axis length every sequence must match.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the axis has length zero.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Annotation names in insertion order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Check whether an annotation exists.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Insert or replace an annotation.
    pub fn insert<V>(&mut self, name: &str, values: Vec<V>) -> Result<()>
    where
        V: Into<AnnotationValue>,
    {
        if values.len() != self.len {
            return Err(MatrixError::DimensionMismatch {
                expected: self.len,
                actual: values.len(),
            });
        }
        let values: Vec<AnnotationValue> = values.into_iter().map(Into::into).collect();
        if self.values.insert(name.to_string(), values).is_none() {
            self.names.push(name.to_string());
        }
        Ok(())
    }

    /// Add a new annotation, failing if the name is taken.
    pub fn add<V>(&mut self, name: &str, values: Vec<V>) -> Result<()>
    where
        V: Into<AnnotationValue>,
    {
        if self.contains(name) {
            return Err(MatrixError::DuplicateAnnotation(name.to_string()));
        }
        self.insert(name, values)
    }

    /// Remove an annotation, returning its values.
    pub fn remove(&mut self, name: &str) -> Option<Vec<AnnotationValue>> {
        let removed = self.values.remove(name)?;
        self.names.retain(|n| n != name);
        Some(removed)
    }

    /// All values of an annotation.
    pub fn get(&self, name: &str) -> Option<&[AnnotationValue]> {
        self.values.get(name).map(|v| v.as_slice())
    }

    /// All values of an annotation, or a `MissingAnnotation` error.
    pub fn require(&self, name: &str) -> Result<&[AnnotationValue]> {
        self.get(name)
            .ok_or_else(|| MatrixError::MissingAnnotation(name.to_string()))
    }

    /// One value by name and index.
    pub fn value(&self, name: &str, index: usize) -> Option<&AnnotationValue> {
        self.values.get(name).and_then(|v| v.get(index))
    }

    /// Replace one value by name and index.
    pub fn set(&mut self, name: &str, index: usize, value: AnnotationValue) -> Result<()> {
        let len = self.len;
        let values = self
            .values
            .get_mut(name)
            .ok_or_else(|| MatrixError::MissingAnnotation(name.to_string()))?;
        let slot = values.get_mut(index).ok_or(MatrixError::IndexOutOfBounds {
            axis: "annotation",
            index,
            len,
        })?;
        *slot = value;
        Ok(())
    }

    /// Text rendering of every value of an annotation.
    pub fn texts(&self, name: &str) -> Result<Vec<String>> {
        Ok(self.require(name)?.iter().map(|v| v.as_text()).collect())
    }

    /// New table holding the entries at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.len) {
            return Err(MatrixError::IndexOutOfBounds {
                axis: "annotation",
                index: bad,
                len: self.len,
            });
        }
        let values = self
            .values
            .iter()
            .map(|(name, vals)| {
                let picked = indices.iter().map(|&i| vals[i].clone()).collect();
                (name.clone(), picked)
            })
            .collect();
        Ok(Self {
            len: indices.len(),
            names: self.names.clone(),
            values,
        })
    }
}
