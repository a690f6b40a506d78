//! Named column groups for between-group statistics.

use super::annotation::Annotations;
use crate::error::{MatrixError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// How a group picks its columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupSelector {
    /// Explicit column indices.
    Indices { indices: Vec<usize> },
    /// Columns whose `annotation` value is one of `names`. Every name must
    /// match at least one column.
    Names {
        annotation: String,
        names: Vec<String>,
    },
    /// Columns whose `annotation` value matches a regular expression.
    Pattern { annotation: String, pattern: String },
    /// Columns whose `annotation` value equals `value` (e.g. a phenotype label).
    AnnotationEquals { annotation: String, value: String },
}

/// A named subset of columns, resolved lazily against column annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixGroup {
    pub name: String,
    pub selector: GroupSelector,
}

impl MatrixGroup {
    /// Group of explicit column indices.
    pub fn indices(name: &str, indices: Vec<usize>) -> Self {
        Self {
            name: name.to_string(),
            selector: GroupSelector::Indices { indices },
        }
    }

    /// Group of columns listed by their value in `annotation`.
    pub fn names(name: &str, annotation: &str, names: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            selector: GroupSelector::Names {
                annotation: annotation.to_string(),
                names: names.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    /// Group of columns whose `annotation` matches `pattern`.
    pub fn pattern(name: &str, annotation: &str, pattern: &str) -> Self {
        Self {
            name: name.to_string(),
            selector: GroupSelector::Pattern {
                annotation: annotation.to_string(),
                pattern: pattern.to_string(),
            },
        }
    }

    /// Group of columns whose `annotation` equals `value`.
    pub fn matching(name: &str, annotation: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            selector: GroupSelector::AnnotationEquals {
                annotation: annotation.to_string(),
                value: value.to_string(),
            },
        }
    }
}

/// Resolves a [`MatrixGroup`] to concrete column indices.
pub trait GroupResolver {
    /// Ascending, de-duplicated column indices of the group.
    fn resolve_group(&self, group: &MatrixGroup) -> Result<Vec<usize>>;

    /// Resolve several groups, preserving their order.
    fn resolve_groups(&self, groups: &[MatrixGroup]) -> Result<Vec<Vec<usize>>> {
        groups.iter().map(|g| self.resolve_group(g)).collect()
    }
}

impl GroupResolver for Annotations {
    fn resolve_group(&self, group: &MatrixGroup) -> Result<Vec<usize>> {
        let mut indices = match &group.selector {
            GroupSelector::Indices { indices } => {
                if let Some(&bad) = indices.iter().find(|&&i| i >= self.len()) {
                    return Err(MatrixError::col_out_of_bounds(bad, self.len()));
                }
                indices.clone()
            }
            GroupSelector::Names { annotation, names } => {
                let labels = self.texts(annotation)?;
                let mut found = Vec::new();
                for name in names {
                    let before = found.len();
                    found.extend(
                        labels
                            .iter()
                            .enumerate()
                            .filter(|(_, label)| *label == name)
                            .map(|(i, _)| i),
                    );
                    if found.len() == before {
                        return Err(MatrixError::UnknownGroup {
                            group: group.name.clone(),
                            member: name.clone(),
                        });
                    }
                }
                found
            }
            GroupSelector::Pattern {
                annotation,
                pattern,
            } => {
                let re = Regex::new(pattern)?;
                self.texts(annotation)?
                    .iter()
                    .enumerate()
                    .filter(|(_, label)| re.is_match(label))
                    .map(|(i, _)| i)
                    .collect()
            }
            GroupSelector::AnnotationEquals { annotation, value } => self
                .texts(annotation)?
                .iter()
                .enumerate()
                .filter(|(_, label)| *label == value)
                .map(|(i, _)| i)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        Ok(indices)
    }
}
