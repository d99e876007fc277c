//! Seeded synthetic dataset generators. The same seed always produces the
//! same table.

pub mod loans;
pub mod people;
pub mod populations;
pub mod temperatures;

pub use loans::loans;
pub use people::{customer_behavior, customer_spending, customers, synthetic_customers};
pub use populations::{
    correlation_demo, correlation_demo_table, defects, height_weight, neighbourhood_incomes,
    recovery_times, satisfaction, simulated_normal, DemoSeries,
};
pub use temperatures::{city_sequence, city_temps, daily_temperatures, CITY_SEQUENCES};

use crate::domain::model::Table;
use crate::utils::error::{Result, StatsError};
use rand::distr::weighted::WeightedIndex;
use rand::Rng;
use rand_distr::Distribution;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_SEED: u64 = 42;

pub(crate) fn dist_err<E: fmt::Display>(e: E) -> StatsError {
    StatsError::ProcessingError {
        message: format!("invalid distribution parameters: {}", e),
    }
}

pub(crate) fn fmt2(value: f64) -> String {
    format!("{:.2}", value)
}

/// Categorical draw with fixed weights.
pub(crate) struct Weighted<T> {
    choices: Vec<T>,
    index: WeightedIndex<f64>,
}

impl<T: Copy> Weighted<T> {
    pub(crate) fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        self.choices[self.index.sample(rng)]
    }
}

pub(crate) fn weighted<T: Copy>(choices: &[T], weights: &[f64]) -> Result<Weighted<T>> {
    if choices.len() != weights.len() {
        return Err(dist_err("choices and weights differ in length"));
    }
    Ok(Weighted {
        choices: choices.to_vec(),
        index: WeightedIndex::new(weights).map_err(dist_err)?,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum DatasetKind {
    Loans,
    CityTemps,
    CustomerBehavior,
    Customers,
    CustomerSpending,
    SyntheticCustomers,
    HeightWeight,
    DailyTemperatures,
    SimulatedNormal,
    Correlation,
    Satisfaction,
    Recovery,
    Neighbourhoods,
    Defects,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 14] = [
        DatasetKind::Loans,
        DatasetKind::CityTemps,
        DatasetKind::CustomerBehavior,
        DatasetKind::Customers,
        DatasetKind::CustomerSpending,
        DatasetKind::SyntheticCustomers,
        DatasetKind::HeightWeight,
        DatasetKind::DailyTemperatures,
        DatasetKind::SimulatedNormal,
        DatasetKind::Correlation,
        DatasetKind::Satisfaction,
        DatasetKind::Recovery,
        DatasetKind::Neighbourhoods,
        DatasetKind::Defects,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Loans => "loans",
            DatasetKind::CityTemps => "city-temps",
            DatasetKind::CustomerBehavior => "customer-behavior",
            DatasetKind::Customers => "customers",
            DatasetKind::CustomerSpending => "customer-spending",
            DatasetKind::SyntheticCustomers => "synthetic-customers",
            DatasetKind::HeightWeight => "height-weight",
            DatasetKind::DailyTemperatures => "daily-temperatures",
            DatasetKind::SimulatedNormal => "simulated-normal",
            DatasetKind::Correlation => "correlation",
            DatasetKind::Satisfaction => "satisfaction",
            DatasetKind::Recovery => "recovery",
            DatasetKind::Neighbourhoods => "neighbourhoods",
            DatasetKind::Defects => "defects",
        }
    }

    /// Row count used when none is given. Fixed-shape datasets ignore it.
    pub fn default_rows(&self) -> usize {
        match self {
            DatasetKind::Loans => 2000,
            DatasetKind::CityTemps => 21,
            DatasetKind::CustomerBehavior | DatasetKind::Customers => 1000,
            DatasetKind::CustomerSpending => 500,
            DatasetKind::SyntheticCustomers => 1000,
            DatasetKind::HeightWeight => 100,
            DatasetKind::DailyTemperatures => 365,
            DatasetKind::SimulatedNormal => 400,
            DatasetKind::Correlation => 4 * populations::DEMO_POINTS,
            DatasetKind::Satisfaction => 1000,
            DatasetKind::Recovery => 900,
            DatasetKind::Neighbourhoods => 1000,
            DatasetKind::Defects => 800,
        }
    }

    pub fn default_file_name(&self) -> String {
        match self {
            DatasetKind::Loans => "loan_applications_2000.csv".to_string(),
            DatasetKind::CityTemps => "city_temps_7days.csv".to_string(),
            DatasetKind::CustomerBehavior => "customer_behavior.csv".to_string(),
            DatasetKind::Customers => "customers.csv".to_string(),
            other => format!("{}.csv", other.as_str().replace('-', "_")),
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetKind {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        DatasetKind::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| StatsError::InvalidConfigValueError {
                field: "dataset".to_string(),
                value: s.to_string(),
                reason: format!(
                    "expected one of: {}",
                    DatasetKind::ALL.map(|k| k.as_str()).join(", ")
                ),
            })
    }
}

/// Builds the dataset with `rows` rows (or its default size).
pub fn generate(kind: DatasetKind, rows: Option<usize>, seed: u64) -> Result<Table> {
    let n = rows.unwrap_or_else(|| kind.default_rows());
    match kind {
        DatasetKind::Loans => loans(n, seed),
        DatasetKind::CityTemps => city_temps(),
        DatasetKind::CustomerBehavior => customer_behavior(n, seed),
        DatasetKind::Customers => customers(n, seed),
        DatasetKind::CustomerSpending => customer_spending(n, seed),
        DatasetKind::SyntheticCustomers => synthetic_customers(n, seed),
        DatasetKind::HeightWeight => height_weight(n, seed),
        DatasetKind::DailyTemperatures => daily_temperatures(n, 30.0, 3.0, seed),
        DatasetKind::SimulatedNormal => simulated_normal(seed),
        DatasetKind::Correlation => correlation_demo_table(seed),
        DatasetKind::Satisfaction => satisfaction(n, seed),
        DatasetKind::Recovery => recovery_times(n, seed),
        DatasetKind::Neighbourhoods => neighbourhood_incomes(10, n.div_ceil(10).max(1), seed),
        DatasetKind::Defects => defects(n, seed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("loans".parse::<DatasetKind>().unwrap(), DatasetKind::Loans);
        assert_eq!(
            "CITY_TEMPS".parse::<DatasetKind>().unwrap(),
            DatasetKind::CityTemps
        );
        let err = "weather".parse::<DatasetKind>().unwrap_err();
        assert!(err.to_string().contains("weather"));
    }

    #[test]
    fn test_every_kind_generates() {
        for kind in DatasetKind::ALL {
            let table = generate(kind, Some(40), DEFAULT_SEED).unwrap();
            assert!(!table.is_empty(), "{} produced no rows", kind);
            assert!(kind.default_file_name().ends_with(".csv"));
        }
    }

    #[test]
    fn test_weighted_rejects_bad_weights() {
        assert!(weighted(&["a", "b"], &[1.0]).is_err());
        assert!(weighted(&["a"], &[-1.0]).is_err());
    }
}
