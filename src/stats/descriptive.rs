//! Descriptive statistics over `&[f64]`.
//!
//! Functions return `None` for empty input, too few values, or any
//! non-finite value. Quantiles use linear interpolation between order
//! statistics (Hyndman & Fan type 7), the default in pandas and NumPy.

use crate::domain::model::round_to;
use serde::Serialize;
use std::collections::BTreeMap;

fn all_finite(data: &[f64]) -> bool {
    data.iter().all(|x| x.is_finite())
}

/// Kahan compensated sum.
pub fn kahan_sum(data: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut compensation = 0.0;
    for &x in data {
        let y = x - compensation;
        let t = sum + y;
        compensation = (t - sum) - y;
        sum = t;
    }
    sum
}

pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() || !all_finite(data) {
        return None;
    }
    Some(kahan_sum(data) / data.len() as f64)
}

fn sum_squared_deviations(data: &[f64]) -> Option<f64> {
    let m = mean(data)?;
    let squares: Vec<f64> = data.iter().map(|x| (x - m) * (x - m)).collect();
    Some(kahan_sum(&squares))
}

/// Σ(x − x̄)² / n
pub fn population_variance(data: &[f64]) -> Option<f64> {
    Some(sum_squared_deviations(data)? / data.len() as f64)
}

/// Σ(x − x̄)² / (n − 1)
pub fn sample_variance(data: &[f64]) -> Option<f64> {
    if data.len() < 2 {
        return None;
    }
    Some(sum_squared_deviations(data)? / (data.len() - 1) as f64)
}

pub fn population_std_dev(data: &[f64]) -> Option<f64> {
    population_variance(data).map(f64::sqrt)
}

pub fn sample_std_dev(data: &[f64]) -> Option<f64> {
    sample_variance(data).map(f64::sqrt)
}

pub fn min(data: &[f64]) -> Option<f64> {
    if data.is_empty() || !all_finite(data) {
        return None;
    }
    data.iter().copied().reduce(f64::min)
}

pub fn max(data: &[f64]) -> Option<f64> {
    if data.is_empty() || !all_finite(data) {
        return None;
    }
    data.iter().copied().reduce(f64::max)
}

pub fn range(data: &[f64]) -> Option<f64> {
    Some(max(data)? - min(data)?)
}

pub fn sorted(data: &[f64]) -> Vec<f64> {
    let mut v = data.to_vec();
    v.sort_by(f64::total_cmp);
    v
}

/// Quantile of already sorted data.
pub fn quantile_sorted(sorted_data: &[f64], p: f64) -> Option<f64> {
    if sorted_data.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }
    let h = (sorted_data.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    let frac = h - lo as f64;
    Some(sorted_data[lo] + frac * (sorted_data[hi] - sorted_data[lo]))
}

pub fn quantile(data: &[f64], p: f64) -> Option<f64> {
    if !all_finite(data) {
        return None;
    }
    quantile_sorted(&sorted(data), p)
}

pub fn median(data: &[f64]) -> Option<f64> {
    quantile(data, 0.5)
}

pub fn iqr(data: &[f64]) -> Option<f64> {
    let s = sorted(data);
    if !all_finite(&s) {
        return None;
    }
    Some(quantile_sorted(&s, 0.75)? - quantile_sorted(&s, 0.25)?)
}

/// Raw median absolute deviation (no 1.4826 normal-consistency factor).
pub fn mad(data: &[f64]) -> Option<f64> {
    let m = median(data)?;
    let deviations: Vec<f64> = data.iter().map(|x| (x - m).abs()).collect();
    median(&deviations)
}

/// Sample std / mean; `NaN` when the mean is zero.
pub fn coefficient_of_variation(data: &[f64]) -> Option<f64> {
    let m = mean(data)?;
    let sd = sample_std_dev(data)?;
    Some(if m == 0.0 { f64::NAN } else { sd / m })
}

/// Most frequent values after rounding to cents, ascending. Empty when
/// every value occurs once.
pub fn modes(data: &[f64]) -> Vec<f64> {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for &x in data.iter().filter(|x| x.is_finite()) {
        *counts.entry((x * 100.0).round() as i64).or_default() += 1;
    }

    let top = counts.values().copied().max().unwrap_or(0);
    if top < 2 {
        return Vec::new();
    }
    counts
        .into_iter()
        .filter(|(_, c)| *c == top)
        .map(|(k, _)| k as f64 / 100.0)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CentralTendency {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub modes: Vec<f64>,
}

/// Count, mean and median (rounded to 2 decimals) and the modes.
pub fn central_tendency(data: &[f64]) -> Option<CentralTendency> {
    Some(CentralTendency {
        count: data.len(),
        mean: round_to(mean(data)?, 2),
        median: round_to(median(data)?, 2),
        modes: modes(data),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviationRow {
    pub index: usize,
    pub value: f64,
    pub deviation: f64,
    pub squared_deviation: f64,
}

/// The worked variance table: each value's deviation from the mean and its
/// square, with population variance (divide by n).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviationTable {
    pub rows: Vec<DeviationRow>,
    pub mean: f64,
    pub sum_of_squares: f64,
    pub variance: f64,
    pub std_dev: f64,
}

pub fn deviation_table(data: &[f64]) -> Option<DeviationTable> {
    let m = mean(data)?;
    let rows: Vec<DeviationRow> = data
        .iter()
        .enumerate()
        .map(|(i, &x)| DeviationRow {
            index: i + 1,
            value: x,
            deviation: x - m,
            squared_deviation: (x - m) * (x - m),
        })
        .collect();

    let sum_of_squares: f64 = rows.iter().map(|r| r.squared_deviation).sum();
    let variance = sum_of_squares / data.len() as f64;
    Some(DeviationTable {
        rows,
        mean: m,
        sum_of_squares,
        variance,
        std_dev: variance.sqrt(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEW_YORK: [f64; 7] = [20.0, 21.0, 19.0, 20.0, 21.0, 19.0, 20.0];

    #[test]
    fn test_population_variance_divides_by_n() {
        let var = population_variance(&NEW_YORK).unwrap();
        assert!((var - 4.0 / 7.0).abs() < 1e-12);
        assert!((population_std_dev(&NEW_YORK).unwrap() - 0.755_928_946).abs() < 1e-8);
        assert!((sample_variance(&NEW_YORK).unwrap() - 4.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_quantile_interpolates_like_pandas() {
        let data = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&data, 0.25), Some(1.75));
        assert_eq!(quantile(&data, 0.75), Some(3.25));
        assert_eq!(median(&data), Some(2.5));
        assert_eq!(iqr(&data), Some(1.5));
        assert_eq!(quantile(&data, 1.5), None);
    }

    #[test]
    fn test_mad_and_cv() {
        let data = [1.0, 1.0, 2.0, 2.0, 4.0, 6.0, 9.0];
        assert_eq!(mad(&data), Some(1.0));
        let cv = coefficient_of_variation(&[0.0, 0.0]).unwrap();
        assert!(cv.is_nan());
    }

    #[test]
    fn test_modes() {
        assert_eq!(modes(&[1.0, 2.0, 2.0, 3.0, 3.0]), vec![2.0, 3.0]);
        assert!(modes(&[1.0, 2.0, 3.0]).is_empty());
        assert_eq!(modes(&[1.001, 1.0, 5.0]), vec![1.0]);
    }

    #[test]
    fn test_empty_and_non_finite() {
        assert_eq!(mean(&[]), None);
        assert_eq!(sample_variance(&[3.0]), None);
        assert_eq!(mean(&[1.0, f64::NAN]), None);
        assert_eq!(range(&[4.0, -1.0, 2.0]), Some(5.0));
    }

    #[test]
    fn test_deviation_table() {
        let table = deviation_table(&NEW_YORK).unwrap();
        assert_eq!(table.rows.len(), 7);
        assert_eq!(table.mean, 20.0);
        assert_eq!(table.sum_of_squares, 4.0);
        assert_eq!(table.rows[1].deviation, 1.0);
        assert!((table.variance - 0.571_428).abs() < 1e-6);
    }

    #[test]
    fn test_central_tendency() {
        let ct = central_tendency(&[10.0, 20.0, 20.0, 40.333]).unwrap();
        assert_eq!(ct.count, 4);
        assert_eq!(ct.mean, 22.58);
        assert_eq!(ct.median, 20.0);
        assert_eq!(ct.modes, vec![20.0]);
    }
}
