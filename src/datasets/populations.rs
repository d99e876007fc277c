//! Small simulated populations for the correlation, covariance, normal and
//! sampling-technique analyses.

use super::{dist_err, fmt2, weighted};
use crate::domain::model::Table;
use crate::stats::distribution::linspace;
use crate::utils::error::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Height (cm) ~ N(170, 10); weight (kg) = 0.45·height + N(0, 5).
pub fn height_weight(n: usize, seed: u64) -> Result<Table> {
    let mut rng = StdRng::seed_from_u64(seed);
    let height = Normal::<f64>::new(170.0, 10.0).map_err(dist_err)?;
    let noise = Normal::<f64>::new(0.0, 5.0).map_err(dist_err)?;

    let mut table = Table::new(["Height", "Weight"]);
    for _ in 0..n {
        let h = height.sample(&mut rng);
        let w = h * 0.45 + noise.sample(&mut rng);
        table.push_row(vec![fmt2(h), fmt2(w)])?;
    }
    Ok(table)
}

#[derive(Debug, Clone, PartialEq)]
pub struct DemoSeries {
    pub title: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

pub const DEMO_POINTS: usize = 50;

/// Strong positive, weak positive, none and strong negative correlation.
pub fn correlation_demo(seed: u64) -> Result<Vec<DemoSeries>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let small = Normal::<f64>::new(0.0, 0.5).map_err(dist_err)?;
    let large = Normal::<f64>::new(0.0, 5.0).map_err(dist_err)?;
    let grid = linspace(0.0, 10.0, DEMO_POINTS);

    let strong_pos: Vec<f64> = grid.iter().map(|x| x + small.sample(&mut rng)).collect();
    let weak_pos: Vec<f64> = grid.iter().map(|x| x + large.sample(&mut rng)).collect();
    let none_x: Vec<f64> = (0..DEMO_POINTS).map(|_| rng.random_range(0.0..10.0)).collect();
    let none_y: Vec<f64> = (0..DEMO_POINTS).map(|_| rng.random_range(0.0..10.0)).collect();
    let strong_neg: Vec<f64> = grid.iter().map(|x| -x + small.sample(&mut rng)).collect();

    let series = |title: &str, x: Vec<f64>, y: Vec<f64>| DemoSeries {
        title: title.to_string(),
        x,
        y,
    };
    Ok(vec![
        series("Strong Positive Correlation", grid.clone(), strong_pos),
        series("Weak Positive Correlation", grid.clone(), weak_pos),
        series("No Correlation", none_x, none_y),
        series("Strong Negative Correlation", grid, strong_neg),
    ])
}

/// Long format `series,x,y` for writing the demo to CSV.
pub fn correlation_demo_table(seed: u64) -> Result<Table> {
    let mut table = Table::new(["series", "x", "y"]);
    for s in correlation_demo(seed)? {
        for (x, y) in s.x.iter().zip(&s.y) {
            table.push_row(vec![s.title.clone(), fmt2(*x), fmt2(*y)])?;
        }
    }
    Ok(table)
}

pub const SIMULATED_SIZES: [usize; 3] = [50, 100, 400];

/// Columns `n50`, `n100`, `n400` of N(50, 10) draws; shorter columns are
/// padded with blanks.
pub fn simulated_normal(seed: u64) -> Result<Table> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::<f64>::new(50.0, 10.0).map_err(dist_err)?;
    let columns: Vec<Vec<f64>> = SIMULATED_SIZES
        .iter()
        .map(|&n| (0..n).map(|_| normal.sample(&mut rng)).collect())
        .collect();

    let longest = SIMULATED_SIZES.iter().copied().max().unwrap_or(0);
    let mut table = Table::new(SIMULATED_SIZES.iter().map(|n| format!("n{}", n)));
    for row in 0..longest {
        table.push_row(
            columns
                .iter()
                .map(|c| c.get(row).map(|v| fmt2(*v)).unwrap_or_default())
                .collect(),
        )?;
    }
    Ok(table)
}

/// Satisfaction scores 1..=10 for `n` customers.
pub fn satisfaction(n: usize, seed: u64) -> Result<Table> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut table = Table::new(["CustomerID", "Satisfaction"]);
    for i in 1..=n {
        let score: u32 = rng.random_range(1..=10);
        table.push_row(vec![i.to_string(), score.to_string()])?;
    }
    Ok(table)
}

pub const AGE_GROUPS: [&str; 3] = ["Young", "Middle", "Senior"];

/// Patient recovery days by age group: N(10,2), N(15,3), N(20,4).
pub fn recovery_times(n: usize, seed: u64) -> Result<Table> {
    let mut rng = StdRng::seed_from_u64(seed);
    let group = weighted(&[0usize, 1, 2], &[0.3, 0.4, 0.3])?;
    let by_group = [
        Normal::<f64>::new(10.0, 2.0).map_err(dist_err)?,
        Normal::<f64>::new(15.0, 3.0).map_err(dist_err)?,
        Normal::<f64>::new(20.0, 4.0).map_err(dist_err)?,
    ];

    let mut table = Table::new(["AgeGroup", "RecoveryTime"]);
    for _ in 0..n {
        let g = group.draw(&mut rng);
        table.push_row(vec![
            AGE_GROUPS[g].to_string(),
            fmt2(by_group[g].sample(&mut rng)),
        ])?;
    }
    Ok(table)
}

/// `clusters` neighbourhoods of `size` households; income rises 2000 per
/// neighbourhood number.
pub fn neighbourhood_incomes(clusters: usize, size: usize, seed: u64) -> Result<Table> {
    let mut rng = StdRng::seed_from_u64(seed);
    let income = Normal::<f64>::new(50000.0, 10000.0).map_err(dist_err)?;
    let mut table = Table::new(["Neighborhood", "Income"]);
    for cluster in 1..=clusters {
        for _ in 0..size {
            let value = income.sample(&mut rng) + cluster as f64 * 2000.0;
            table.push_row(vec![cluster.to_string(), fmt2(value)])?;
        }
    }
    Ok(table)
}

pub const DEFECT_RATE: f64 = 0.05;

/// Production line where each product is defective with p = 0.05.
pub fn defects(n: usize, seed: u64) -> Result<Table> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut table = Table::new(["ProductID", "Defect"]);
    for i in 1..=n {
        let defect = u8::from(rng.random_bool(DEFECT_RATE));
        table.push_row(vec![i.to_string(), defect.to_string()])?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::bivariate::pearson_correlation;

    #[test]
    fn test_correlation_demo_signs() {
        let demo = correlation_demo(42).unwrap();
        assert_eq!(demo.len(), 4);
        let r: Vec<f64> = demo
            .iter()
            .map(|s| pearson_correlation(&s.x, &s.y).unwrap())
            .collect();
        assert!(r[0] > 0.95);
        assert!(r[1] > 0.0 && r[1] < r[0]);
        assert!(r[2].abs() < 0.5);
        assert!(r[3] < -0.95);
        assert_eq!(correlation_demo_table(42).unwrap().len(), 200);
    }

    #[test]
    fn test_simulated_normal_pads_short_columns() {
        let table = simulated_normal(42).unwrap();
        assert_eq!(table.headers, vec!["n50", "n100", "n400"]);
        assert_eq!(table.len(), 400);
        assert_eq!(table.numeric_values("n50").unwrap().len(), 50);
        assert_eq!(table.numeric_values("n400").unwrap().len(), 400);
    }

    #[test]
    fn test_populations() {
        let recovery = recovery_times(900, 42).unwrap();
        let groups = recovery.column("AgeGroup").unwrap();
        assert!(groups.iter().all(|g| AGE_GROUPS.contains(g)));

        let hoods = neighbourhood_incomes(10, 100, 42).unwrap();
        assert_eq!(hoods.len(), 1000);
        assert_eq!(hoods.rows[999][0], "10");

        let defects = defects(800, 42).unwrap();
        let rate = defects.numeric_values("Defect").unwrap().iter().sum::<f64>() / 800.0;
        assert!(rate < 0.15);

        let scores = satisfaction(1000, 42).unwrap().numeric_values("Satisfaction").unwrap();
        assert!(scores.iter().all(|s| (1.0..=10.0).contains(s)));
    }
}
