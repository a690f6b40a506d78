//! Descriptive statistics over slices.
//!
//! Every function ignores invalid entries (NaN, infinite, [`NULL_NUMBER`]).
//! Empty input yields NaN for location/spread statistics and 0 for sums
//! and counts.
//!
//! [`NULL_NUMBER`]: crate::data::NULL_NUMBER

use crate::data::is_valid_number;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Valid values of a slice, in order.
pub fn valid_values(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| is_valid_number(*v)).collect()
}

/// Valid values sorted ascending.
pub fn sorted_valid(values: &[f64]) -> Vec<f64> {
    let mut sorted = valid_values(values);
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

/// Number of valid values.
pub fn count_valid(values: &[f64]) -> usize {
    values.iter().filter(|v| is_valid_number(**v)).count()
}

/// Sum of valid values.
pub fn sum(values: &[f64]) -> f64 {
    values.iter().copied().filter(|v| is_valid_number(*v)).sum()
}

/// Arithmetic mean of valid values.
pub fn mean(values: &[f64]) -> f64 {
    let n = count_valid(values);
    if n == 0 {
        return f64::NAN;
    }
    sum(values) / n as f64
}

/// Mean and population standard deviation (denominator n).
pub fn mean_and_population_sd(values: &[f64]) -> (f64, f64) {
    let n = count_valid(values);
    if n == 0 {
        return (f64::NAN, f64::NAN);
    }
    let m = sum(values) / n as f64;
    let ss: f64 = values
        .iter()
        .copied()
        .filter(|v| is_valid_number(*v))
        .map(|v| (v - m).powi(2))
        .sum();
    (m, (ss / n as f64).sqrt())
}

/// Variance with denominator n.
pub fn population_variance(values: &[f64]) -> f64 {
    let (_, sd) = mean_and_population_sd(values);
    sd * sd
}

/// Standard deviation with denominator n.
pub fn population_sd(values: &[f64]) -> f64 {
    mean_and_population_sd(values).1
}

/// Variance with denominator n - 1; NaN for fewer than two values.
pub fn sample_variance(values: &[f64]) -> f64 {
    let n = count_valid(values);
    if n < 2 {
        return f64::NAN;
    }
    population_variance(values) * n as f64 / (n - 1) as f64
}

/// Standard deviation with denominator n - 1.
pub fn sample_sd(values: &[f64]) -> f64 {
    sample_variance(values).sqrt()
}

/// Median of valid values.
pub fn median(values: &[f64]) -> f64 {
    quantile_sorted(&sorted_valid(values), 0.5)
}

/// Quantile `q` in `[0, 1]` by linear interpolation between order
/// statistics (position `q * (n - 1)`).
pub fn quantile(values: &[f64], q: f64) -> f64 {
    quantile_sorted(&sorted_valid(values), q)
}

/// [`quantile`] on values already sorted and filtered.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    interpolate(sorted, pos)
}

/// Linear interpolation of `data` at a fractional index.
pub fn interpolate(data: &[f64], pos: f64) -> f64 {
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if hi >= data.len() {
        return data[data.len() - 1];
    }
    let frac = pos - lo as f64;
    data[lo] + (data[hi] - data[lo]) * frac
}

/// Most frequent valid value; the smallest wins among equally frequent
/// values. NaN when there is no valid value.
pub fn mode(values: &[f64]) -> f64 {
    let sorted = sorted_valid(values);
    let mut best = f64::NAN;
    let mut best_count = 0;
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i + 1;
        while j < sorted.len() && sorted[j] == sorted[i] {
            j += 1;
        }
        if j - i > best_count {
            best = sorted[i];
            best_count = j - i;
        }
        i = j;
    }
    best
}

/// Interquartile range Q3 - Q1.
pub fn iqr(values: &[f64]) -> f64 {
    let sorted = sorted_valid(values);
    quantile_sorted(&sorted, 0.75) - quantile_sorted(&sorted, 0.25)
}

/// Quartile coefficient of dispersion (Q3 - Q1) / (Q3 + Q1); NaN when the
/// quartiles sum to zero.
pub fn quartile_coefficient_of_dispersion(values: &[f64]) -> f64 {
    let sorted = sorted_valid(values);
    let q1 = quantile_sorted(&sorted, 0.25);
    let q3 = quantile_sorted(&sorted, 0.75);
    let denom = q3 + q1;
    if denom == 0.0 {
        return f64::NAN;
    }
    (q3 - q1) / denom
}

/// Smallest valid value; `f64::MAX` when there is none.
pub fn min_valid(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .filter(|v| is_valid_number(*v))
        .fold(f64::MAX, f64::min)
}

/// Largest valid value; `f64::MIN` when there is none.
pub fn max_valid(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .filter(|v| is_valid_number(*v))
        .fold(f64::MIN, f64::max)
}

/// Average (tied) ranks, 1-based, of `values` in input order.
///
/// Equal values receive the mean of the ranks they jointly occupy.
pub fn tied_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && values[order[j]] == values[order[i]] {
            j += 1;
        }
        // positions i..j share the average of ranks i+1..=j
        let avg = (i + 1 + j) as f64 / 2.0;
        for &idx in &order[i..j] {
            ranks[idx] = avg;
        }
        i = j;
    }
    ranks
}

/// A per-vector summary statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    Sum,
    Mean,
    Median,
    Mode,
    PopulationSd,
    SampleSd,
    Variance,
    Iqr,
    Qcd,
    Min,
    Max,
    CountValid,
}

impl Statistic {
    /// Compute over the valid values of a slice.
    pub fn compute(self, values: &[f64]) -> f64 {
        match self {
            Statistic::Sum => sum(values),
            Statistic::Mean => mean(values),
            Statistic::Median => median(values),
            Statistic::Mode => mode(values),
            Statistic::PopulationSd => population_sd(values),
            Statistic::SampleSd => sample_sd(values),
            Statistic::Variance => population_variance(values),
            Statistic::Iqr => iqr(values),
            Statistic::Qcd => quartile_coefficient_of_dispersion(values),
            Statistic::Min => min_valid(values),
            Statistic::Max => max_valid(values),
            Statistic::CountValid => count_valid(values) as f64,
        }
    }

    /// Short lowercase name, used for default annotation names.
    pub fn name(self) -> &'static str {
        match self {
            Statistic::Sum => "sum",
            Statistic::Mean => "mean",
            Statistic::Median => "median",
            Statistic::Mode => "mode",
            Statistic::PopulationSd => "sd",
            Statistic::SampleSd => "sample_sd",
            Statistic::Variance => "variance",
            Statistic::Iqr => "iqr",
            Statistic::Qcd => "qcd",
            Statistic::Min => "min",
            Statistic::Max => "max",
            Statistic::CountValid => "n_valid",
        }
    }
}
