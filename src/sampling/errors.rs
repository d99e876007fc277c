//! Five ways a sample can misrepresent its population, measured on a
//! customers table (`Age`, `Region`, `Subscribed`, `Income`, `Website`).

use super::simple_random;
use crate::domain::model::Table;
use crate::stats::descriptive::mean;
use crate::utils::error::{Result, StatsError};
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;

pub const NON_RESPONSE_ROWS: usize = 100;
pub const SAMPLE_ROWS: usize = 50;
pub const YOUNG_AGE_LIMIT: f64 = 30.0;
pub const SELECTED_REGION: &str = "North";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SamplingErrorReport {
    pub population_size: usize,
    /// Population-specific: only customers younger than 30.
    pub young_count: usize,
    pub population_mean_age: f64,
    pub young_mean_age: f64,
    /// Selection: only one region kept.
    pub selected_region: String,
    pub selected_count: usize,
    pub selected_region_distribution: BTreeMap<String, usize>,
    /// Non-response: share of blank `Subscribed` after blanking random rows.
    pub non_response_rate: f64,
    /// Sample error: income mean of the population vs a small random sample.
    pub population_mean_income: f64,
    pub sample_mean_income: f64,
    pub sample_error: f64,
    /// Frame error: only customers with a website are reachable.
    pub frame_size: usize,
    pub frame_excluded: f64,
}

/// Ages of the full population and of the under-30 subset.
#[derive(Debug, Clone, Default)]
pub struct AgeSplit {
    pub population: Vec<f64>,
    pub young: Vec<f64>,
}

pub fn measure_sampling_errors<R: Rng + ?Sized>(
    customers: &Table,
    rng: &mut R,
) -> Result<(SamplingErrorReport, AgeSplit)> {
    let n = customers.len();
    if n == 0 {
        return Err(StatsError::empty_data("customers table has no rows"));
    }

    let ages = customers.numeric_values("Age")?;
    let young: Vec<f64> = ages.iter().copied().filter(|a| *a < YOUNG_AGE_LIMIT).collect();

    let regions = customers.column("Region")?;
    let selected_count = regions.iter().filter(|r| **r == SELECTED_REGION).count();
    let mut selected_region_distribution = BTreeMap::new();
    if selected_count > 0 {
        selected_region_distribution.insert(SELECTED_REGION.to_string(), selected_count);
    }

    // 把隨機 100 列的回覆清空
    let mut subscribed: Vec<String> = customers
        .column("Subscribed")?
        .into_iter()
        .map(str::to_string)
        .collect();
    for i in simple_random(n, NON_RESPONSE_ROWS.min(n), rng)? {
        subscribed[i].clear();
    }
    let missing = subscribed.iter().filter(|s| s.trim().is_empty()).count();

    let incomes = customers.numeric_column("Income")?;
    let population_income: Vec<f64> = incomes.iter().flatten().copied().collect();
    let sample_income: Vec<f64> = simple_random(n, SAMPLE_ROWS.min(n), rng)?
        .into_iter()
        .filter_map(|i| incomes[i])
        .collect();
    let population_mean_income = mean(&population_income)
        .ok_or_else(|| StatsError::empty_data("no numeric Income values"))?;
    let sample_mean_income = mean(&sample_income)
        .ok_or_else(|| StatsError::empty_data("sample has no numeric Income values"))?;

    let frame_size = customers
        .column("Website")?
        .iter()
        .filter(|w| !w.trim().is_empty())
        .count();

    let report = SamplingErrorReport {
        population_size: n,
        young_count: young.len(),
        population_mean_age: mean(&ages).unwrap_or(f64::NAN),
        young_mean_age: mean(&young).unwrap_or(f64::NAN),
        selected_region: SELECTED_REGION.to_string(),
        selected_count,
        selected_region_distribution,
        non_response_rate: missing as f64 / n as f64,
        population_mean_income,
        sample_mean_income,
        sample_error: sample_mean_income - population_mean_income,
        frame_size,
        frame_excluded: 1.0 - frame_size as f64 / n as f64,
    };

    Ok((
        report,
        AgeSplit {
            population: ages,
            young,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn customers(n: usize) -> Table {
        let mut table = Table::new(["Age", "Region", "Subscribed", "Income", "Website"]);
        for i in 0..n {
            table
                .push_row(vec![
                    (20 + i % 40).to_string(),
                    ["North", "South", "East", "West"][i % 4].to_string(),
                    "Yes".to_string(),
                    (50000 + i * 10).to_string(),
                    if i % 5 == 0 { String::new() } else { format!("site{}.com", i) },
                ])
                .unwrap();
        }
        table
    }

    #[test]
    fn test_sampling_errors_report() {
        let mut rng = StdRng::seed_from_u64(42);
        let (report, ages) = measure_sampling_errors(&customers(1000), &mut rng).unwrap();
        assert_eq!(report.population_size, 1000);
        assert_eq!(report.selected_count, 250);
        assert_eq!(report.selected_region_distribution.len(), 1);
        assert!((report.non_response_rate - 0.1).abs() < 1e-12);
        assert_eq!(report.frame_size, 800);
        assert!((report.frame_excluded - 0.2).abs() < 1e-12);
        assert_eq!(report.young_count, 250);
        assert!(ages.young.iter().all(|a| *a < 30.0));
        assert!(
            (report.sample_error - (report.sample_mean_income - report.population_mean_income))
                .abs()
                < 1e-9
        );
    }

    #[test]
    fn test_small_population_caps_row_counts() {
        let mut rng = StdRng::seed_from_u64(1);
        let (report, _) = measure_sampling_errors(&customers(20), &mut rng).unwrap();
        assert_eq!(report.non_response_rate, 1.0);
        assert!((report.sample_mean_income - report.population_mean_income).abs() < 1e-9);
    }

    #[test]
    fn test_missing_column() {
        let table = Table::new(["Age"]);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(measure_sampling_errors(&table, &mut rng).is_err());
    }
}
