use super::{dist_err, weighted};
use crate::domain::model::{format_currency, Table};
use crate::utils::error::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, LogNormal};

pub const LOAN_COLUMNS: [&str; 12] = [
    "loan_id",
    "gender",
    "married",
    "dependents",
    "self_employed",
    "income",
    "loan_amount",
    "term",
    "credit_history",
    "property_area",
    "experience",
    "status",
];

const TERMS: [u32; 9] = [12, 24, 36, 48, 60, 120, 180, 240, 360];
const TERM_WEIGHTS: [f64; 9] = [3.0, 5.0, 12.0, 15.0, 20.0, 15.0, 10.0, 8.0, 7.0];

/// Approval threshold on the synthetic credit score.
pub const APPROVAL_SCORE: f64 = 0.4;

/// Synthetic loan applications; income and loan amount are `$1,234.56` strings.
pub fn loans(n: usize, seed: u64) -> Result<Table> {
    let mut rng = StdRng::seed_from_u64(seed);

    let gender = weighted(&["male", "female"], &[0.52, 0.48])?;
    let married = weighted(&["yes", "no"], &[0.62, 0.38])?;
    let dependents = weighted(&[0u8, 1, 2, 3, 4], &[0.36, 0.28, 0.18, 0.12, 0.06])?;
    let self_employed = weighted(&["yes", "no"], &[0.15, 0.85])?;
    let property_area = weighted(&["urban", "rural"], &[0.7, 0.3])?;
    let credit_history = weighted(&[1u8, 0], &[0.75, 0.25])?;
    let term = weighted(&TERMS, &TERM_WEIGHTS)?;
    let monthly_income = LogNormal::new(5500f64.ln(), 0.45).map_err(dist_err)?;

    let mut table = Table::new(LOAN_COLUMNS);
    for i in 1..=n {
        let gender = gender.draw(&mut rng);
        let married = married.draw(&mut rng);
        let dependents = dependents.draw(&mut rng);
        let self_employed = self_employed.draw(&mut rng);
        let property_area = property_area.draw(&mut rng);
        let credit_history = credit_history.draw(&mut rng);

        let income = monthly_income.sample(&mut rng).clamp(1800.0, 25000.0);
        let term = term.draw(&mut rng);

        let annual_income = income * 12.0;
        let ratio: f64 = rng.random_range(0.08..0.55);
        let loan_amount = (ratio * annual_income).clamp(500.0, 250000.0);

        let affordability = loan_amount / (annual_income + 1.0);
        let mut score = if credit_history == 1 { 1.0 } else { -1.0 };
        if married == "yes" {
            score += 0.2;
        }
        if property_area == "urban" {
            score += 0.1;
        }
        score += 0.5 - affordability;
        score += rng.random_range(-0.2..0.2);
        let status = if score >= APPROVAL_SCORE { "Y" } else { "N" };

        let experience: u32 = rng.random_range(0..=40);

        table.push_row(vec![
            format!("ID{}", 1000 + i),
            gender.to_string(),
            married.to_string(),
            dependents.to_string(),
            self_employed.to_string(),
            format_currency(income),
            format_currency(loan_amount),
            term.to_string(),
            credit_history.to_string(),
            property_area.to_string(),
            experience.to_string(),
            status.to_string(),
        ])?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::parse_currency;

    #[test]
    fn test_loans_shape_and_ranges() {
        let table = loans(500, 42).unwrap();
        assert_eq!(table.len(), 500);
        assert_eq!(table.headers, LOAN_COLUMNS);
        assert_eq!(table.rows[0][0], "ID1001");

        for income in table.column("income").unwrap() {
            let v = parse_currency(income).unwrap();
            assert!((1800.0..=25000.0).contains(&v));
            assert!(income.starts_with('$'));
        }
        for status in table.column("status").unwrap() {
            assert!(status == "Y" || status == "N");
        }
        let experience = table.numeric_values("experience").unwrap();
        assert!(experience.iter().all(|e| (0.0..=40.0).contains(e)));
    }

    #[test]
    fn test_loans_are_seeded() {
        assert_eq!(loans(50, 7).unwrap(), loans(50, 7).unwrap());
        assert_ne!(loans(50, 7).unwrap(), loans(50, 8).unwrap());
    }

    #[test]
    fn test_bad_credit_is_mostly_rejected() {
        let table = loans(2000, 42).unwrap();
        let credit = table.column("credit_history").unwrap();
        let status = table.column("status").unwrap();
        // 信用不良時分數上限 -1 + 0.2 + 0.1 + 0.5 + 0.2 = 0
        assert!(credit
            .iter()
            .zip(&status)
            .filter(|(c, _)| **c == "0")
            .all(|(_, s)| *s == "N"));
    }
}
