use super::{dist_err, fmt2};
use crate::domain::model::Table;
use crate::utils::error::{Result, StatsError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// Seven days per city, each with median 20. New York and Los Angeles also
/// average 20; Chicago's week averages 141/7.
pub const CITY_SEQUENCES: [(&str, [f64; 7]); 3] = [
    ("New York", [20.0, 21.0, 19.0, 20.0, 21.0, 19.0, 20.0]),
    ("Los Angeles", [22.0, 23.0, 21.0, 18.0, 19.0, 17.0, 20.0]),
    ("Chicago", [12.0, 11.0, 13.0, 20.0, 25.0, 29.0, 31.0]),
];

pub fn city_sequence(city: &str) -> Option<&'static [f64; 7]> {
    CITY_SEQUENCES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(city))
        .map(|(_, temps)| temps)
}

/// Long format: `city,day,temperature`.
pub fn city_temps() -> Result<Table> {
    let mut table = Table::new(["city", "day", "temperature"]);
    for (city, temps) in CITY_SEQUENCES {
        for (day, temp) in temps.iter().enumerate() {
            table.push_row(vec![
                city.to_string(),
                (day + 1).to_string(),
                temp.to_string(),
            ])?;
        }
    }
    Ok(table)
}

/// `n` daily temperatures drawn from N(mean, std).
pub fn daily_temperatures(n: usize, mean: f64, std: f64, seed: u64) -> Result<Table> {
    if !(std.is_finite() && std > 0.0) {
        return Err(StatsError::ValidationError {
            message: format!("temperature std must be positive, got {}", std),
        });
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(mean, std).map_err(dist_err)?;
    let mut table = Table::new(["Day", "Temperature"]);
    for day in 1..=n {
        table.push_row(vec![day.to_string(), fmt2(normal.sample(&mut rng))])?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::descriptive::{mean, median};

    #[test]
    fn test_city_sequences_share_median_twenty() {
        for (_, temps) in CITY_SEQUENCES {
            assert_eq!(median(&temps), Some(20.0));
        }
        assert_eq!(mean(&CITY_SEQUENCES[0].1), Some(20.0));
        assert_eq!(mean(&CITY_SEQUENCES[1].1), Some(20.0));
        let chicago = mean(&CITY_SEQUENCES[2].1).unwrap();
        assert!((chicago - 141.0 / 7.0).abs() < 1e-12);
        assert_eq!(city_temps().unwrap().len(), 21);
        assert!(city_sequence("new york").is_some());
        assert!(city_sequence("Paris").is_none());
    }

    #[test]
    fn test_daily_temperatures() {
        let table = daily_temperatures(365, 30.0, 3.0, 42).unwrap();
        assert_eq!(table.len(), 365);
        let m = mean(&table.numeric_values("Temperature").unwrap()).unwrap();
        assert!((m - 30.0).abs() < 0.5);
        assert!(matches!(
            daily_temperatures(10, 30.0, -1.0, 42),
            Err(StatsError::ValidationError { .. })
        ));
        assert!(daily_temperatures(10, 30.0, 0.0, 42).is_err());
        assert!(daily_temperatures(10, 30.0, f64::NAN, 42).is_err());
    }
}
