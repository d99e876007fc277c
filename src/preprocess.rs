//! Cleaning of the loans CSV into analysis-ready columns.

use crate::domain::model::{parse_currency, parse_numeric, Table};
use crate::utils::error::Result;

pub const REQUIRED_COLUMNS: [&str; 10] = [
    "income",
    "loan_amount",
    "dependents",
    "term",
    "credit_history",
    "gender",
    "married",
    "self_employed",
    "property_area",
    "status",
];

const INTEGER_COLUMNS: [&str; 3] = ["dependents", "term", "credit_history"];
const LOWERCASE_COLUMNS: [&str; 4] = ["gender", "married", "self_employed", "property_area"];

fn integer_cell(cell: &str) -> String {
    match parse_numeric(cell) {
        Some(v) if v.fract() == 0.0 => format!("{}", v as i64),
        _ => String::new(),
    }
}

fn currency_cell(cell: &str) -> String {
    parse_currency(cell).map(|v| v.to_string()).unwrap_or_default()
}

/// Normalizes headers and values, adding `income_num`, `loan_amount_num`
/// and `status_int`.
pub fn preprocess_loans(mut table: Table) -> Result<Table> {
    table.normalize_headers(true);
    for column in REQUIRED_COLUMNS {
        table.pick_column(&[column])?;
    }

    let income = table.column("income")?.into_iter().map(currency_cell).collect();
    table.set_column("income_num", income)?;
    let loan = table
        .column("loan_amount")?
        .into_iter()
        .map(currency_cell)
        .collect();
    table.set_column("loan_amount_num", loan)?;

    for column in INTEGER_COLUMNS {
        table.map_column(column, integer_cell)?;
    }
    for column in LOWERCASE_COLUMNS {
        table.map_column(column, |c| c.trim().to_lowercase())?;
    }
    table.map_column("status", |c| c.trim().to_uppercase())?;

    let status_int = table
        .column("status")?
        .into_iter()
        .map(|s| match s {
            "Y" => "1".to_string(),
            "N" => "0".to_string(),
            _ => String::new(),
        })
        .collect();
    table.set_column("status_int", status_int)?;

    tracing::debug!("🧹 Preprocessed {} loan rows", table.len());
    Ok(table)
}

/// `loans.csv` -> `loans_clean.csv`.
pub fn clean_file_name(input: &str) -> String {
    let file = std::path::Path::new(input)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset");
    format!("{}_clean.csv", file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::StatsError;

    const RAW: &[u8] = b" Loan_ID ,Gender,Married,Dependents,Self_Employed,Income,Loan_Amount,Term,Credit_History,Property_Area,Status\n\
ID1001, Male ,YES,2,No,\"$5,500.00\",\"$12,000.50\",360,1,Urban , y\n\
ID1002,female,no,x,no,bad,\"$900.00\",12.5,,rural,N\n";

    #[test]
    fn test_preprocess_loans() {
        let table = preprocess_loans(Table::from_csv_bytes(RAW).unwrap()).unwrap();
        assert!(table.has_column("loan_id"));
        assert_eq!(table.column("income_num").unwrap(), vec!["5500", ""]);
        assert_eq!(table.column("loan_amount_num").unwrap(), vec!["12000.5", "900"]);
        assert_eq!(table.column("dependents").unwrap(), vec!["2", ""]);
        assert_eq!(table.column("term").unwrap(), vec!["360", ""]);
        assert_eq!(table.column("credit_history").unwrap(), vec!["1", ""]);
        assert_eq!(table.column("gender").unwrap(), vec!["male", "female"]);
        assert_eq!(table.column("property_area").unwrap(), vec!["urban", "rural"]);
        assert_eq!(table.column("status").unwrap(), vec!["Y", "N"]);
        assert_eq!(table.column("status_int").unwrap(), vec!["1", "0"]);
    }

    #[test]
    fn test_missing_required_column() {
        let table = Table::from_csv_bytes(b"income,status\n1,Y\n").unwrap();
        let err = preprocess_loans(table).unwrap_err();
        assert!(matches!(err, StatsError::MissingColumnError { .. }));
    }

    #[test]
    fn test_clean_file_name() {
        assert_eq!(
            clean_file_name("data/loan_applications_2000.csv"),
            "loan_applications_2000_clean.csv"
        );
    }
}
