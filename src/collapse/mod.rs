//! Row-collapse: reduce rows sharing a key to one representative.
//!
//! Rows are partitioned by a key taken from a row annotation or from a
//! matrix column. Every row gets a score from a [`CollapseRule`]; the best
//! scoring row of each key group survives. Comparison is strict, so the
//! earliest row wins ties, and a NaN score never beats a valid one.
//!
//! The output holds one row per distinct key, in order of first
//! occurrence. Row annotations other than the key become the delimited
//! join of every member's value in original row order; the key annotation
//! is copied verbatim. Column annotations are unchanged.

use crate::data::{
    is_valid_number, AnnotatedMatrix, AnnotationValue, GroupResolver, Matrix, MatrixGroup,
};
use crate::error::{MatrixError, Result};
use crate::stats::{row_statistics, row_t_tests, Statistic};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, instrument, trace};

/// Delimiter used for merged annotation values.
pub const MERGE_DELIMITER: &str = ";";

/// P-value assumed for a row whose t-test is undefined.
pub const DEGENERATE_P_VALUE: f64 = 1.0;

/// Replace NaN or infinite p-values with [`DEGENERATE_P_VALUE`].
#[inline]
pub fn sanitize_p_value(p: f64) -> f64 {
    if p.is_finite() {
        p
    } else {
        DEGENERATE_P_VALUE
    }
}

/// Where the grouping key of a row comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollapseKey {
    /// A row annotation, rendered as text.
    Annotation(String),
    /// A matrix column, rendered as text.
    Column(usize),
}

/// How rows within a key group are scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum CollapseRule {
    /// Largest population standard deviation.
    MaxStdDev,
    /// Largest mean.
    MaxMean,
    /// Smallest mean.
    MinMean,
    /// Largest median.
    MaxMedian,
    /// Smallest Welch t-test p-value between two column groups.
    MinTTestPValue {
        group_a: MatrixGroup,
        group_b: MatrixGroup,
    },
    /// Largest value of a numeric row annotation.
    MaxAnnotation { annotation: String },
    /// Largest value in one matrix column.
    MaxValueInColumn { column: usize },
}

impl CollapseRule {
    fn prefers_lower(&self) -> bool {
        matches!(
            self,
            CollapseRule::MinMean | CollapseRule::MinTTestPValue { .. }
        )
    }

    /// True when `candidate` strictly beats `best`.
    fn beats(&self, candidate: f64, best: f64) -> bool {
        if candidate.is_nan() {
            return false;
        }
        if best.is_nan() {
            return true;
        }
        if self.prefers_lower() {
            candidate < best
        } else {
            candidate > best
        }
    }

    /// Score of every row of `matrix`.
    fn scores(&self, matrix: &AnnotatedMatrix) -> Result<Vec<f64>> {
        let inner = matrix.matrix();
        let scores = match self {
            CollapseRule::MaxStdDev => row_statistics(inner, Statistic::PopulationSd),
            CollapseRule::MaxMean | CollapseRule::MinMean => row_statistics(inner, Statistic::Mean),
            CollapseRule::MaxMedian => row_statistics(inner, Statistic::Median),
            CollapseRule::MinTTestPValue { group_a, group_b } => {
                let cols_a = matrix.resolve_group(group_a)?;
                let cols_b = matrix.resolve_group(group_b)?;
                row_t_tests(inner, &cols_a, &cols_b)
                    .iter()
                    .map(|t| sanitize_p_value(t.p_value))
                    .collect()
            }
            CollapseRule::MaxAnnotation { annotation } => matrix
                .row_annotations()
                .require(annotation)?
                .iter()
                .map(|v| v.as_number().unwrap_or(f64::NAN))
                .collect(),
            CollapseRule::MaxValueInColumn { column } => {
                check_column(inner, *column)?;
                inner
                    .col_values(*column)
                    .into_iter()
                    .map(|v| if is_valid_number(v) { v } else { f64::NAN })
                    .collect()
            }
        };
        Ok(scores)
    }
}

/// Collapse settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollapseConfig {
    /// Separator for merged annotation values.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

fn default_delimiter() -> String {
    MERGE_DELIMITER.to_string()
}

impl Default for CollapseConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
        }
    }
}

/// Outcome for one key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollapsedGroup {
    /// Key text shared by the members.
    pub key: String,
    /// Input row index of the surviving row.
    pub survivor: usize,
    /// Input row indices of every member, ascending.
    pub members: Vec<usize>,
    /// Score of the survivor; NaN when no member had a valid score.
    pub score: f64,
}

/// Provenance of a collapse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollapseReport {
    pub rule: CollapseRule,
    pub n_input_rows: usize,
    /// One entry per output row, in output order.
    pub groups: Vec<CollapsedGroup>,
}

impl CollapseReport {
    /// Number of output rows.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Surviving input rows in output order.
    pub fn survivors(&self) -> Vec<usize> {
        self.groups.iter().map(|g| g.survivor).collect()
    }
}

/// Collapse rows with the default [`CollapseConfig`].
pub fn collapse_rows(
    matrix: &AnnotatedMatrix,
    key: &CollapseKey,
    rule: &CollapseRule,
) -> Result<(AnnotatedMatrix, CollapseReport)> {
    collapse_rows_with_config(matrix, key, rule, &CollapseConfig::default())
}

/// Keep, per key, the row with the largest value in `column`.
pub fn collapse_by_max_value_in_column(
    matrix: &AnnotatedMatrix,
    key: &CollapseKey,
    column: usize,
) -> Result<(AnnotatedMatrix, CollapseReport)> {
    collapse_rows(matrix, key, &CollapseRule::MaxValueInColumn { column })
}

/// Collapse rows sharing a key to the best scoring row of each key.
#[instrument(skip_all, fields(n_rows = matrix.n_rows(), key = ?key, rule = ?rule))]
pub fn collapse_rows_with_config(
    matrix: &AnnotatedMatrix,
    key: &CollapseKey,
    rule: &CollapseRule,
    config: &CollapseConfig,
) -> Result<(AnnotatedMatrix, CollapseReport)> {
    let keys = row_keys(matrix, key)?;
    let scores = rule.scores(matrix)?;
    let partitions = partition(&keys);

    let mut groups = Vec::with_capacity(partitions.len());
    for (key_text, members) in partitions {
        let mut survivor = members[0];
        let mut best = scores[survivor];
        for &row in &members[1..] {
            if rule.beats(scores[row], best) {
                survivor = row;
                best = scores[row];
            }
        }
        trace!(key = %key_text, survivor, n_members = members.len(), "picked survivor");
        groups.push(CollapsedGroup {
            key: key_text,
            survivor,
            members,
            score: best,
        });
    }

    let survivors: Vec<usize> = groups.iter().map(|g| g.survivor).collect();
    let mut collapsed = matrix.copy_of_rows(&survivors)?;
    merge_annotations(matrix, &mut collapsed, key, &groups, &config.delimiter)?;

    debug!(
        n_input = matrix.n_rows(),
        n_output = groups.len(),
        "collapsed rows"
    );
    let report = CollapseReport {
        rule: rule.clone(),
        n_input_rows: matrix.n_rows(),
        groups,
    };
    Ok((collapsed, report))
}

/// Key text of every row; missing keys read as `""`.
fn row_keys(matrix: &AnnotatedMatrix, key: &CollapseKey) -> Result<Vec<String>> {
    match key {
        CollapseKey::Annotation(name) => matrix.row_annotations().texts(name),
        CollapseKey::Column(col) => {
            let inner = matrix.matrix();
            check_column(inner, *col)?;
            Ok((0..inner.n_rows()).map(|row| inner.text(row, *col)).collect())
        }
    }
}

/// Group row indices by key, keys in order of first occurrence.
fn partition(keys: &[String]) -> Vec<(String, Vec<usize>)> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    for (row, key) in keys.iter().enumerate() {
        match slots.get(key.as_str()) {
            Some(&slot) => groups[slot].1.push(row),
            None => {
                slots.insert(key.as_str(), groups.len());
                groups.push((key.clone(), vec![row]));
            }
        }
    }
    groups
}

/// Join the row annotations of each group's members onto its output row.
fn merge_annotations(
    source: &AnnotatedMatrix,
    collapsed: &mut AnnotatedMatrix,
    key: &CollapseKey,
    groups: &[CollapsedGroup],
    delimiter: &str,
) -> Result<()> {
    let key_annotation = match key {
        CollapseKey::Annotation(name) => Some(name.as_str()),
        CollapseKey::Column(_) => None,
    };
    let rows = source.row_annotations();
    for name in rows.names() {
        if Some(name.as_str()) == key_annotation {
            continue;
        }
        let values = rows.require(name)?;
        let merged: Vec<AnnotationValue> = groups
            .iter()
            .map(|g| {
                if g.members.len() == 1 {
                    values[g.members[0]].clone()
                } else {
                    let joined: Vec<String> =
                        g.members.iter().map(|&m| values[m].as_text()).collect();
                    AnnotationValue::Text(joined.join(delimiter))
                }
            })
            .collect();
        collapsed.row_annotations_mut().insert(name, merged)?;
    }
    Ok(())
}

fn check_column(matrix: &dyn Matrix, column: usize) -> Result<()> {
    if column >= matrix.n_cols() {
        return Err(MatrixError::col_out_of_bounds(column, matrix.n_cols()));
    }
    Ok(())
}
