//! Welch's two-sample t-test per row between two column groups.

use super::descriptive::{count_valid, mean_and_population_sd, sample_variance};
use crate::apply::for_each_row;
use crate::data::{AnnotatedMatrix, AnnotationValue, GroupResolver, Matrix, MatrixGroup};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Two-group statistics for one row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TTestResult {
    /// Mean of group A.
    pub mean_a: f64,
    /// Mean of group B.
    pub mean_b: f64,
    /// Population standard deviation of group A.
    pub sd_a: f64,
    /// Population standard deviation of group B.
    pub sd_b: f64,
    /// `mean_a - mean_b`.
    pub difference: f64,
    /// Welch t-statistic.
    pub statistic: f64,
    /// Welch–Satterthwaite degrees of freedom.
    pub df: f64,
    /// Two-sided p-value.
    pub p_value: f64,
}

/// Per-row results of a two-group comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TTestResults {
    pub group_a: String,
    pub group_b: String,
    pub results: Vec<TTestResult>,
}

impl TTestResults {
    /// Number of tested rows.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// P-values for all rows.
    pub fn p_values(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.p_value).collect()
    }

    /// T-statistics for all rows.
    pub fn statistics(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.statistic).collect()
    }

    /// Mean differences for all rows.
    pub fn differences(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.difference).collect()
    }
}

/// Welch's t-test between the valid values of `a` and `b`.
///
/// Statistic, df and p-value are NaN when either side has fewer than two
/// valid values or the pooled standard error is zero.
pub fn welch_t_test(a: &[f64], b: &[f64]) -> TTestResult {
    let (mean_a, sd_a) = mean_and_population_sd(a);
    let (mean_b, sd_b) = mean_and_population_sd(b);
    let n_a = count_valid(a) as f64;
    let n_b = count_valid(b) as f64;

    let mut result = TTestResult {
        mean_a,
        mean_b,
        sd_a,
        sd_b,
        difference: mean_a - mean_b,
        statistic: f64::NAN,
        df: f64::NAN,
        p_value: f64::NAN,
    };
    if n_a < 2.0 || n_b < 2.0 {
        return result;
    }

    let va = sample_variance(a) / n_a;
    let vb = sample_variance(b) / n_b;
    let se = (va + vb).sqrt();
    if !(se > 0.0) || !se.is_finite() {
        return result;
    }

    let statistic = result.difference / se;
    let df = (va + vb).powi(2) / (va * va / (n_a - 1.0) + vb * vb / (n_b - 1.0));
    result.statistic = statistic;
    result.df = df;
    result.p_value = match StudentsT::new(0.0, 1.0, df) {
        Ok(t_dist) => 2.0 * (1.0 - t_dist.cdf(statistic.abs())),
        Err(_) => f64::NAN,
    };
    result
}

/// Welch's t-test on every row between columns `cols_a` and `cols_b`.
///
/// # Panics
/// Panics if a column index is out of range.
pub fn row_t_tests<M: Matrix + ?Sized>(
    matrix: &M,
    cols_a: &[usize],
    cols_b: &[usize],
) -> Vec<TTestResult> {
    let mut results = Vec::with_capacity(matrix.n_rows());
    let mut a = Vec::with_capacity(cols_a.len());
    let mut b = Vec::with_capacity(cols_b.len());
    for_each_row(matrix, |buf, _| {
        a.clear();
        b.clear();
        a.extend(cols_a.iter().map(|&c| buf[c]));
        b.extend(cols_b.iter().map(|&c| buf[c]));
        results.push(welch_t_test(&a, &b));
    });
    results
}

/// Row t-tests between two column groups of an annotated matrix.
pub fn group_t_tests(
    matrix: &AnnotatedMatrix,
    group_a: &MatrixGroup,
    group_b: &MatrixGroup,
) -> Result<TTestResults> {
    let cols_a = matrix.resolve_group(group_a)?;
    let cols_b = matrix.resolve_group(group_b)?;
    Ok(TTestResults {
        group_a: group_a.name.clone(),
        group_b: group_b.name.clone(),
        results: row_t_tests(matrix.matrix(), &cols_a, &cols_b),
    })
}

/// Run [`group_t_tests`] and store `{prefix}_t`, `{prefix}_p_value` and
/// `{prefix}_difference` as numeric row annotations.
pub fn annotate_t_tests(
    matrix: &mut AnnotatedMatrix,
    group_a: &MatrixGroup,
    group_b: &MatrixGroup,
    prefix: &str,
) -> Result<TTestResults> {
    let tests = group_t_tests(matrix, group_a, group_b)?;
    let column = |f: fn(&TTestResult) -> f64| -> Vec<AnnotationValue> {
        tests.results.iter().map(|r| AnnotationValue::Number(f(r))).collect()
    };
    let rows = matrix.row_annotations_mut();
    rows.insert(&format!("{}_t", prefix), column(|r| r.statistic))?;
    rows.insert(&format!("{}_p_value", prefix), column(|r| r.p_value))?;
    rows.insert(&format!("{}_difference", prefix), column(|r| r.difference))?;
    Ok(tests)
}
