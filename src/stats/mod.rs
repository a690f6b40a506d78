//! Statistics and statistical transforms.
//!
//! - [`descriptive`]: slice statistics that skip invalid values
//! - [`reduce`]: whole-matrix, row and column reductions
//! - [`zscore`]: matrix, row, column and group-wise standardization
//! - [`quantile`]: quantile normalization
//! - [`ttest`]: per-row Welch t-tests between column groups

pub mod descriptive;
pub mod quantile;
pub mod reduce;
pub mod ttest;
pub mod zscore;

pub use descriptive::{
    count_valid, iqr, mean, mean_and_population_sd, median, mode, population_sd,
    population_variance, quantile, quartile_coefficient_of_dispersion, sample_sd,
    sample_variance, sum, tied_ranks, Statistic,
};
pub use quantile::{quantile_normalize, quantile_normalize_annotated};
pub use reduce::{
    annotate_row_statistic, col_statistics, matrix_max, matrix_min, matrix_statistic,
    row_statistics, row_statistics_in,
};
pub use ttest::{
    annotate_t_tests, group_t_tests, row_t_tests, welch_t_test, TTestResult, TTestResults,
};
pub use zscore::{
    col_zscore, group_zscore, group_zscore_annotated, row_zscore, zscore, zscore_axis,
    zscore_or_zero, Axis, ZERO_SD_SCORE,
};
