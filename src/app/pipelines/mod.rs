//! One [`Analysis`](crate::domain::ports::Analysis) per statistics exercise.
//! Each pairs with [`AnalysisPipeline`](crate::core::AnalysisPipeline) for
//! the shared load phase.

pub mod dashboard;
pub mod descriptive;
pub mod distributions;
pub mod norms;
pub mod prepare;
pub mod relationships;
pub mod salary;
pub mod sampling;

pub use dashboard::SalesDashboardAnalysis;
pub use descriptive::{
    CentralTendencyAnalysis, DeviationAnalysis, DeviationInput, DispersionAnalysis,
    SpreadSummaryAnalysis,
};
pub use distributions::{DistributionAnalysis, NormalAnalysis, NormalInput};
pub use norms::VectorNormsAnalysis;
pub use prepare::{GenerateAnalysis, PreprocessAnalysis};
pub use relationships::{
    CorrelationAnalysis, CorrelationMode, CovarianceAnalysis, CovarianceMode, VarianceAnalysis,
};
pub use salary::{IncomeOutlierAnalysis, SpreadByExperienceAnalysis, SpreadMode};
pub use sampling::{SamplingAnalysis, SamplingErrorsAnalysis, Technique};

use crate::domain::model::{format_thousands, parse_numeric, Table};
use crate::stats::dispersion::numeric_view;
use crate::utils::error::Result;

pub const INCOME_COLUMNS: [&str; 2] = ["income_num", "income"];
pub const LOAN_AMOUNT_COLUMNS: [&str; 2] = ["loan_amount_num", "loan_amount"];

/// `ProductsPurchased` -> `products_purchased`, for output file names.
pub(crate) fn file_stem(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if ch.is_ascii_uppercase() && prev_lower {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        } else {
            if !out.ends_with('_') && !out.is_empty() {
                out.push('_');
            }
            prev_lower = false;
        }
    }
    out.trim_end_matches('_').to_string()
}

pub(crate) fn money(value: f64) -> String {
    format_thousands(value, 2)
}

/// First present candidate column and its numeric view.
pub(crate) fn pick_numeric(table: &Table, candidates: &[&str]) -> Result<(String, Vec<Option<f64>>)> {
    let column = table.pick_column(candidates)?;
    Ok((column.to_string(), numeric_view(table, column)?))
}

/// Headers whose non-blank cells all parse as numbers (at least two of them).
pub(crate) fn numeric_headers(table: &Table) -> Vec<String> {
    table
        .headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| {
            let cells: Vec<&str> = table
                .rows
                .iter()
                .map(|r| r[*idx].trim())
                .filter(|c| !c.is_empty())
                .collect();
            cells.len() >= 2 && cells.iter().all(|c| parse_numeric(c).is_some())
        })
        .map(|(_, h)| h.clone())
        .collect()
}

/// Counts `values` into the bins given by `edges`; the last bin is closed.
pub(crate) fn counts_on_edges(values: &[f64], edges: &[f64]) -> Vec<(f64, f64, f64)> {
    edges
        .windows(2)
        .enumerate()
        .map(|(i, w)| {
            let last = i + 2 == edges.len();
            let count = values
                .iter()
                .filter(|v| **v >= w[0] && (**v < w[1] || (last && **v <= w[1])))
                .count();
            (w[0], w[1], count as f64)
        })
        .collect()
}

/// Distinct labels, numerically ordered when every label is a number.
pub(crate) fn sorted_labels<S: AsRef<str>>(labels: &[S]) -> Vec<String> {
    let mut distinct: Vec<String> = labels.iter().map(|l| l.as_ref().to_string()).collect();
    distinct.sort();
    distinct.dedup();
    if distinct.iter().all(|l| parse_numeric(l).is_some()) {
        distinct.sort_by(|a, b| {
            parse_numeric(a)
                .unwrap_or_default()
                .total_cmp(&parse_numeric(b).unwrap_or_default())
        });
    }
    distinct
}
