//! Customer-style datasets used by the distribution, variance and
//! sampling-error analyses.

use super::{dist_err, fmt2, weighted};
use crate::domain::model::{round_to, Table};
use crate::utils::error::Result;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, LogNormal, Normal, Poisson};

pub const FIRST_NAMES: [&str; 10] = [
    "Alex", "Jordan", "Taylor", "Morgan", "Casey", "Riley", "Jamie", "Drew", "Quinn", "Avery",
];
pub const REGIONS: [&str; 4] = ["North", "South", "East", "West"];
pub const WEBSITE: &str = "www.customerportal.com";

/// `Age` truncated toward zero then clipped to 18..=80, `Income` clipped to
/// 20k..150k, `Subscribed` Yes with p = 0.7, `Website` blank with p = 0.2.
pub fn customers(n: usize, seed: u64) -> Result<Table> {
    let mut rng = StdRng::seed_from_u64(seed);
    let age = Normal::<f64>::new(40.0, 12.0).map_err(dist_err)?;
    let income = Normal::<f64>::new(60000.0, 15000.0).map_err(dist_err)?;
    let subscribed = weighted(&["Yes", "No"], &[0.7, 0.3])?;

    let mut table = Table::new([
        "CustomerID",
        "Name",
        "Age",
        "Gender",
        "Region",
        "Income",
        "Subscribed",
        "Website",
    ]);
    for i in 1..=n {
        let name = FIRST_NAMES.choose(&mut rng).copied().unwrap_or("Alex");
        let age = (age.sample(&mut rng).trunc() as i64).clamp(18, 80);
        let gender = ["Male", "Female"].choose(&mut rng).copied().unwrap_or("Male");
        let region = REGIONS.choose(&mut rng).copied().unwrap_or("North");
        let income = round_to(income.sample(&mut rng), 2).clamp(20000.0, 150000.0);
        let subscribed = subscribed.draw(&mut rng);
        let website = if rng.random_bool(0.8) { WEBSITE } else { "" };

        table.push_row(vec![
            i.to_string(),
            format!("{}{}", name, i),
            age.to_string(),
            gender.to_string(),
            region.to_string(),
            fmt2(income),
            subscribed.to_string(),
            website.to_string(),
        ])?;
    }
    Ok(table)
}

/// Two discrete columns (Poisson purchases, uniform visits) and two
/// continuous ones (normal spend, exponential time in store).
pub fn customer_behavior(n: usize, seed: u64) -> Result<Table> {
    let mut rng = StdRng::seed_from_u64(seed);
    let purchases = Poisson::<f64>::new(3.0).map_err(dist_err)?;
    let spend = Normal::<f64>::new(50.0, 15.0).map_err(dist_err)?;
    let time_in_store = Exp::<f64>::new(1.0 / 20.0).map_err(dist_err)?;

    let mut table = Table::new([
        "CustomerID",
        "ProductsPurchased",
        "VisitFrequency",
        "AmountSpent",
        "TimeInStore",
    ]);
    for i in 1..=n {
        let products = purchases.sample(&mut rng) as u64;
        let visits: u32 = rng.random_range(1..=12);
        let amount = round_to(spend.sample(&mut rng), 2).max(0.0);
        let minutes = round_to(time_in_store.sample(&mut rng), 2).max(0.0);
        table.push_row(vec![
            i.to_string(),
            products.to_string(),
            visits.to_string(),
            fmt2(amount),
            fmt2(minutes),
        ])?;
    }
    Ok(table)
}

/// `Age`, right-skewed `Income` and an `SpendingScore` weakly tied to both.
pub fn customer_spending(n: usize, seed: u64) -> Result<Table> {
    let mut rng = StdRng::seed_from_u64(seed);
    let age = Normal::<f64>::new(38.0, 12.0).map_err(dist_err)?;
    let income = LogNormal::new(60000f64.ln(), 0.5).map_err(dist_err)?;
    let noise = Normal::<f64>::new(0.0, 10.0).map_err(dist_err)?;

    let mut table = Table::new(["Age", "Income", "SpendingScore"]);
    for _ in 0..n {
        let age = age.sample(&mut rng).round().clamp(18.0, 75.0);
        let income = round_to(income.sample(&mut rng).clamp(15000.0, 250000.0), 2);
        let spending = 50.0 + 0.00025 * (income - 60000.0) - 0.18 * (age - 38.0)
            + noise.sample(&mut rng);
        let spending = spending.clamp(1.0, 100.0).round();
        table.push_row(vec![
            (age as i64).to_string(),
            fmt2(income),
            (spending as i64).to_string(),
        ])?;
    }
    Ok(table)
}

/// Age, income and spending where each feeds the next; the correlation vs
/// causation example.
pub fn synthetic_customers(n: usize, seed: u64) -> Result<Table> {
    let mut rng = StdRng::seed_from_u64(seed);
    let age = Normal::<f64>::new(40.0, 10.0).map_err(dist_err)?;
    let income_noise = Normal::<f64>::new(0.0, 10000.0).map_err(dist_err)?;
    let spending_noise = Normal::<f64>::new(0.0, 5000.0).map_err(dist_err)?;

    let mut table = Table::new(["Age", "Income", "SpendingScore"]);
    for _ in 0..n {
        let age = age.sample(&mut rng);
        let income = age * 1000.0 + income_noise.sample(&mut rng);
        let spending = income * 0.3 + spending_noise.sample(&mut rng);
        table.push_row(vec![fmt2(age), fmt2(income), fmt2(spending)])?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customers_columns_and_clipping() {
        let table = customers(1000, 42).unwrap();
        assert_eq!(table.len(), 1000);
        let ages = table.numeric_values("Age").unwrap();
        assert!(ages.iter().all(|a| (18.0..=80.0).contains(a)));
        let incomes = table.numeric_values("Income").unwrap();
        assert!(incomes.iter().all(|v| (20000.0..=150000.0).contains(v)));

        let websites = table.column("Website").unwrap();
        let blank = websites.iter().filter(|w| w.is_empty()).count();
        assert!(blank > 100 && blank < 300);
        assert!(table.rows[0][1].ends_with('1'));
    }

    #[test]
    fn test_customer_behavior_types() {
        let table = customer_behavior(300, 42).unwrap();
        let visits = table.numeric_values("VisitFrequency").unwrap();
        assert!(visits.iter().all(|v| (1.0..=12.0).contains(v) && v.fract() == 0.0));
        let spent = table.numeric_values("AmountSpent").unwrap();
        assert!(spent.iter().all(|v| *v >= 0.0));
        let products = table.numeric_values("ProductsPurchased").unwrap();
        assert!(products.iter().all(|v| v.fract() == 0.0));
    }

    #[test]
    fn test_customer_spending_bounds() {
        let table = customer_spending(500, 42).unwrap();
        let score = table.numeric_values("SpendingScore").unwrap();
        assert!(score.iter().all(|s| (1.0..=100.0).contains(s)));
        let age = table.numeric_values("Age").unwrap();
        assert!(age.iter().all(|a| (18.0..=75.0).contains(a)));
    }

    #[test]
    fn test_synthetic_customers_are_correlated() {
        let table = synthetic_customers(1000, 42).unwrap();
        let income = table.numeric_values("Income").unwrap();
        let spending = table.numeric_values("SpendingScore").unwrap();
        let r = crate::stats::bivariate::pearson_correlation(&income, &spending).unwrap();
        assert!(r > 0.5);
    }
}
