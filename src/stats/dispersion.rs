//! Measures of dispersion and IQR outlier fencing.

use crate::domain::model::{round_to, Table};
use crate::stats::descriptive::{self, quantile_sorted, sorted};
use crate::utils::error::{Result, StatsError};
use serde::Serialize;

/// Columns whose cells are formatted as currency.
pub const CURRENCY_COLUMNS: [&str; 2] = ["income", "loan_amount"];

/// Tukey fences: `[q1 − 1.5·IQR, q3 + 1.5·IQR]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Fences {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl Fences {
    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }
}

pub fn iqr_fences(values: &[f64]) -> Option<Fences> {
    if values.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let s = sorted(values);
    let q1 = quantile_sorted(&s, 0.25)?;
    let q3 = quantile_sorted(&s, 0.75)?;
    let iqr = q3 - q1;
    Some(Fences {
        q1,
        q3,
        iqr,
        lower: q1 - 1.5 * iqr,
        upper: q3 + 1.5 * iqr,
    })
}

/// Indices of the values strictly outside the fences.
pub fn outlier_indices(values: &[f64], fences: &Fences) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| fences.is_outlier(**v))
        .map(|(i, _)| i)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispersionSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub range: f64,
    pub mean: f64,
    pub median: f64,
    pub variance_sample: f64,
    pub std_dev_sample: f64,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub mad: f64,
    pub coefficient_of_variation: f64,
    pub lower_fence: f64,
    pub upper_fence: f64,
    pub num_outliers: usize,
}

impl DispersionSummary {
    /// Rounds every statistic to `decimals`, and the CV to `cv_decimals`.
    pub fn rounded(&self, decimals: u32, cv_decimals: u32) -> Self {
        let r = |v: f64| round_to(v, decimals);
        Self {
            count: self.count,
            min: r(self.min),
            max: r(self.max),
            range: r(self.range),
            mean: r(self.mean),
            median: r(self.median),
            variance_sample: r(self.variance_sample),
            std_dev_sample: r(self.std_dev_sample),
            q1: r(self.q1),
            q3: r(self.q3),
            iqr: r(self.iqr),
            mad: r(self.mad),
            coefficient_of_variation: round_to(self.coefficient_of_variation, cv_decimals),
            lower_fence: r(self.lower_fence),
            upper_fence: r(self.upper_fence),
            num_outliers: self.num_outliers,
        }
    }

    /// `(name, value)` pairs in report order.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("count", self.count.to_string()),
            ("min", self.min.to_string()),
            ("max", self.max.to_string()),
            ("range", self.range.to_string()),
            ("mean", self.mean.to_string()),
            ("median", self.median.to_string()),
            ("variance_sample", self.variance_sample.to_string()),
            ("std_dev_sample", self.std_dev_sample.to_string()),
            ("q1", self.q1.to_string()),
            ("q3", self.q3.to_string()),
            ("iqr", self.iqr.to_string()),
            ("mad", self.mad.to_string()),
            (
                "coefficient_of_variation",
                self.coefficient_of_variation.to_string(),
            ),
            ("lower_fence", self.lower_fence.to_string()),
            ("upper_fence", self.upper_fence.to_string()),
            ("num_outliers", self.num_outliers.to_string()),
        ]
    }
}

/// Full dispersion profile of the non-missing values.
///
/// A single value yields a zero-spread summary except for the sample
/// variance and std, which are `NaN`.
pub fn measure_of_dispersion(values: &[Option<f64>]) -> Result<DispersionSummary> {
    let clean: Vec<f64> = values.iter().flatten().copied().collect();
    if clean.is_empty() {
        return Err(StatsError::empty_data("no valid numeric values to analyze"));
    }

    let s = sorted(&clean);
    let fences = iqr_fences(&s).ok_or_else(|| StatsError::empty_data("non-finite values"))?;
    let mean = descriptive::mean(&s).unwrap_or(f64::NAN);
    let std = descriptive::sample_std_dev(&s).unwrap_or(f64::NAN);

    Ok(DispersionSummary {
        count: s.len(),
        min: s[0],
        max: s[s.len() - 1],
        range: s[s.len() - 1] - s[0],
        mean,
        median: quantile_sorted(&s, 0.5).unwrap_or(f64::NAN),
        variance_sample: descriptive::sample_variance(&s).unwrap_or(f64::NAN),
        std_dev_sample: std,
        q1: fences.q1,
        q3: fences.q3,
        iqr: fences.iqr,
        mad: descriptive::mad(&s).unwrap_or(f64::NAN),
        coefficient_of_variation: if mean != 0.0 { std / mean } else { f64::NAN },
        lower_fence: fences.lower,
        upper_fence: fences.upper,
        num_outliers: outlier_indices(&s, &fences).len(),
    })
}

/// Numeric view of a column, treating known currency columns specially.
pub fn numeric_view(table: &Table, column: &str) -> Result<Vec<Option<f64>>> {
    if CURRENCY_COLUMNS.contains(&column.to_lowercase().as_str()) {
        table.currency_column(column)
    } else {
        table.numeric_column(column)
    }
}

/// Dispersion summary per column with at least two numeric values, sorted
/// by column name.
pub fn spread_summary(table: &Table) -> Result<Vec<(String, DispersionSummary)>> {
    let mut results = Vec::new();
    for header in &table.headers {
        let values = numeric_view(table, header)?;
        if values.iter().flatten().count() < 2 {
            continue;
        }
        let summary = measure_of_dispersion(&values)?;
        results.push((header.clone(), summary.rounded(4, 6)));
    }

    if results.is_empty() {
        return Err(StatsError::InsufficientDataError {
            context: "spread summary".to_string(),
            needed: 2,
            found: 0,
        });
    }

    results.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(results)
}

/// The spread summary as a table, one row per column.
pub fn spread_summary_table(summaries: &[(String, DispersionSummary)]) -> Table {
    let mut headers = vec!["column".to_string()];
    if let Some((_, first)) = summaries.first() {
        headers.extend(first.fields().into_iter().map(|(k, _)| k.to_string()));
    }

    let mut table = Table {
        headers,
        rows: Vec::new(),
    };
    for (column, summary) in summaries {
        let mut row = vec![column.clone()];
        row.extend(summary.fields().into_iter().map(|(_, v)| v));
        table.rows.push(row);
    }
    table
}
