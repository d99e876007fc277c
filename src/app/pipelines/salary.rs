//! Income against years of experience: IQR outliers and per-year spread.

use super::{money, pick_numeric, INCOME_COLUMNS};
use crate::charts::{Layer, Plot, Rgb};
use crate::core::TableSource;
use crate::domain::model::{AnalysisOutput, Artifact, Table};
use crate::domain::ports::Analysis;
use crate::stats::descriptive::{mean, median, sample_std_dev};
use crate::stats::dispersion::{iqr_fences, outlier_indices};
use crate::utils::error::{Result, StatsError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rows with both experience and income parsed.
struct IncomeByExperience {
    rows: Vec<usize>,
    experience: Vec<f64>,
    income: Vec<f64>,
}

fn income_by_experience(data: &mut Table) -> Result<IncomeByExperience> {
    data.normalize_headers(true);
    let (_, income) = pick_numeric(data, &INCOME_COLUMNS)?;
    let experience = data.numeric_column(data.pick_column(&["experience"])?)?;

    let mut pairs = IncomeByExperience {
        rows: Vec::new(),
        experience: Vec::new(),
        income: Vec::new(),
    };
    for (row, (e, i)) in experience.iter().zip(&income).enumerate() {
        if let (Some(e), Some(i)) = (e, i) {
            pairs.rows.push(row);
            pairs.experience.push(*e);
            pairs.income.push(*i);
        }
    }

    if pairs.rows.is_empty() {
        return Err(StatsError::empty_data(
            "no valid rows with both experience and income",
        ));
    }
    Ok(pairs)
}

/// Sample standard deviation of income per whole year of experience; years
/// with fewer than two rows are skipped.
pub fn spread_by_experience(experience: &[f64], income: &[f64]) -> Vec<(i64, f64)> {
    let mut groups: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for (e, i) in experience.iter().zip(income) {
        groups.entry(e.trunc() as i64).or_default().push(*i);
    }
    groups
        .into_iter()
        .filter_map(|(year, values)| sample_std_dev(&values).map(|s| (year, s)))
        .collect()
}

/// IQR outliers of income, plotted against experience with the mean and
/// median income marked.
pub struct IncomeOutlierAnalysis {
    pub source: TableSource,
}

impl IncomeOutlierAnalysis {
    pub fn new(source: TableSource) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Analysis for IncomeOutlierAnalysis {
    fn name(&self) -> &str {
        "income-outliers"
    }

    async fn extract(&self) -> Result<Table> {
        self.source.load().await
    }

    fn transform(&self, mut data: Table) -> Result<AnalysisOutput> {
        let pairs = income_by_experience(&mut data)?;
        let fences = iqr_fences(&pairs.income)
            .ok_or_else(|| StatsError::empty_data("income has non-finite values"))?;
        let outliers = outlier_indices(&pairs.income, &fences);

        let mean_income = mean(&pairs.income).unwrap_or(f64::NAN);
        let median_income = median(&pairs.income).unwrap_or(f64::NAN);
        let mean_exp = mean(&pairs.experience).unwrap_or(f64::NAN);
        let median_exp = median(&pairs.experience).unwrap_or(f64::NAN);

        let points = |outlier: bool| -> Vec<(f64, f64)> {
            (0..pairs.rows.len())
                .filter(|i| outliers.contains(i) == outlier)
                .map(|i| (pairs.experience[i], pairs.income[i]))
                .collect()
        };

        let mut plot = Plot::new("Income vs Experience with Outliers, Mean (blue), Median (green)")
            .x_label("Experience (years)")
            .y_label("Monthly Income (USD)")
            .layer(Layer::points(points(false), Rgb::SKY).with_label("Applicants"));
        if !outliers.is_empty() {
            plot = plot.layer(
                Layer::points(points(true), Rgb::RED)
                    .with_size(5)
                    .with_opacity(0.9)
                    .with_label("Outliers"),
            );
        }
        plot = plot
            .layer(
                Layer::points(vec![(mean_exp, mean_income)], Rgb::BLUE)
                    .with_size(8)
                    .with_opacity(1.0)
                    .with_label("Mean income"),
            )
            .layer(
                Layer::points(vec![(median_exp, median_income)], Rgb::GREEN)
                    .with_size(8)
                    .with_opacity(1.0)
                    .with_label("Median income"),
            );

        let mut output = AnalysisOutput::new("Income Outlier Detection");
        output
            .line("Source", self.source.describe())
            .line("Rows evaluated", pairs.rows.len())
            .line("Outliers detected", outliers.len())
            .line(
                "Income Q1/Q3",
                format!("{} / {}  (IQR={})", money(fences.q1), money(fences.q3), money(fences.iqr)),
            )
            .line(
                "Lower/Upper fences",
                format!("{} / {}", money(fences.lower), money(fences.upper)),
            )
            .line(
                "Mean income (blue)",
                format!("{} at exp={:.1} yrs", money(mean_income), mean_exp),
            )
            .line(
                "Median income (green)",
                format!("{} at exp={:.1} yrs", money(median_income), median_exp),
            );

        output.artifact(Artifact::Chart {
            name: "salary_outliers.png".to_string(),
            figure: plot.into(),
        });
        if !outliers.is_empty() {
            let rows: Vec<usize> = outliers.iter().map(|&i| pairs.rows[i]).collect();
            output.artifact(Artifact::Csv {
                name: "salary_outliers_only.csv".to_string(),
                table: data.select_rows(&rows),
            });
        }
        Ok(output)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum SpreadMode {
    /// Red "Spread" line per experience year.
    #[default]
    Line,
    /// Salary dots with a short horizontal spread bar per year.
    Overlay,
}

pub struct SpreadByExperienceAnalysis {
    pub source: TableSource,
    pub mode: SpreadMode,
}

impl SpreadByExperienceAnalysis {
    pub fn new(source: TableSource, mode: SpreadMode) -> Self {
        Self { source, mode }
    }
}

#[async_trait]
impl Analysis for SpreadByExperienceAnalysis {
    fn name(&self) -> &str {
        match self.mode {
            SpreadMode::Line => "spread-by-experience",
            SpreadMode::Overlay => "salary-and-spread",
        }
    }

    async fn extract(&self) -> Result<Table> {
        self.source.load().await
    }

    fn transform(&self, mut data: Table) -> Result<AnalysisOutput> {
        let pairs = income_by_experience(&mut data)?;
        let years: Vec<f64> = pairs.experience.iter().map(|e| e.trunc()).collect();
        let spread = spread_by_experience(&years, &pairs.income);

        if spread.is_empty() && self.mode == SpreadMode::Line {
            return Err(StatsError::InsufficientDataError {
                context: "income spread per experience year".to_string(),
                needed: 2,
                found: 1,
            });
        }

        let title = match self.mode {
            SpreadMode::Line => "Salary Spread by Experience",
            SpreadMode::Overlay => "Salary & Spread by Experience",
        };
        let mut output = AnalysisOutput::new(title);
        output.line("Source", self.source.describe());

        if let (Some(first), Some(last)) = (spread.first(), spread.last()) {
            let values: Vec<f64> = spread.iter().map(|(_, s)| *s).collect();
            let (max_year, max_spread) = spread
                .iter()
                .copied()
                .max_by(|a, b| a.1.total_cmp(&b.1))
                .unwrap_or(*first);
            output
                .line("Experience years analyzed", format!("{}–{}", first.0, last.0))
                .line("Mean spread", money(mean(&values).unwrap_or(f64::NAN)))
                .line("Max spread", format!("{} at {} years", money(max_spread), max_year));
        } else {
            output.line(
                "Spread",
                "Not enough data per experience year to compute spread (need at least 2 points per year)",
            );
        }

        let plot = match self.mode {
            SpreadMode::Line => Plot::new("Salary (Income) Spread by Experience")
                .x_label("Experience (years)")
                .y_label("Income spread (Std. Dev., USD)")
                .layer(
                    Layer::line(
                        spread.iter().map(|&(y, s)| (y as f64, s)).collect(),
                        Rgb::RED,
                    )
                    .with_label("Spread"),
                ),
            SpreadMode::Overlay => {
                let salary: Vec<(f64, f64)> =
                    years.iter().copied().zip(pairs.income.iter().copied()).collect();
                let mut plot = Plot::new("Salary vs Experience with Spread")
                    .x_label("Experience (years)")
                    .y_label("Monthly Income (USD)")
                    .layer(Layer::points(salary, Rgb::BLUE).with_label("Salary"));
                if !spread.is_empty() {
                    plot = plot.layer(Layer::Segments {
                        segments: spread
                            .iter()
                            .map(|&(y, s)| ((y as f64 - 0.45, s), (y as f64 + 0.45, s)))
                            .collect(),
                        color: Rgb::GREEN,
                        width: 3,
                        label: Some("Spread".to_string()),
                    });
                }
                plot
            }
        };

        let (chart, csv) = match self.mode {
            SpreadMode::Line => ("spread_by_experience.png", "spread_by_experience.csv"),
            SpreadMode::Overlay => ("salary_and_spread.png", "salary_and_spread.csv"),
        };
        let mut table = Table::new(["experience", "income_std"]);
        for (year, s) in &spread {
            table.push_row(vec![year.to_string(), format!("{:.2}", s)])?;
        }
        output
            .artifact(Artifact::Csv {
                name: csv.to_string(),
                table,
            })
            .artifact(Artifact::Chart {
                name: chart.to_string(),
                figure: plot.into(),
            });
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::DatasetKind;

    fn source() -> TableSource {
        TableSource::generated(DatasetKind::Loans, 7)
    }

    fn salaries() -> Table {
        Table::from_csv_bytes(
            b"Experience,Income\n1,$1000\n1,$1200\n2,$1100\n2,$1250\n3,$1150\n3,$1250\n4,$90000\n,$5\n",
        )
        .unwrap()
    }

    #[test]
    fn test_spread_by_experience_groups_whole_years() {
        let spread = spread_by_experience(&[1.0, 1.9, 2.0, 5.0], &[10.0, 20.0, 7.0, 3.0]);
        assert_eq!(spread.len(), 1);
        assert_eq!(spread[0].0, 1);
        assert!((spread[0].1 - 50f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_income_outliers_flags_extreme_salary() {
        let output = IncomeOutlierAnalysis::new(source())
            .transform(salaries())
            .unwrap();
        assert_eq!(output.value_of("Rows evaluated"), Some("7"));
        assert_eq!(output.value_of("Outliers detected"), Some("1"));

        let outliers = output
            .artifacts
            .iter()
            .find_map(|a| match a {
                Artifact::Csv { name, table } if name == "salary_outliers_only.csv" => Some(table),
                _ => None,
            })
            .unwrap();
        assert_eq!(outliers.column("income").unwrap(), vec!["$90000"]);
    }

    #[test]
    fn test_no_outlier_csv_without_outliers() {
        let data = Table::from_csv_bytes(b"experience,income_num\n1,10\n2,11\n3,12\n").unwrap();
        let output = IncomeOutlierAnalysis::new(source()).transform(data).unwrap();
        assert_eq!(output.artifacts.len(), 1);
    }

    #[test]
    fn test_missing_experience_column() {
        let data = Table::from_csv_bytes(b"income\n1\n").unwrap();
        let err = IncomeOutlierAnalysis::new(source()).transform(data).unwrap_err();
        assert!(matches!(err, StatsError::MissingColumnError { .. }));
    }

    #[test]
    fn test_line_mode_needs_two_rows_per_year() {
        let data = Table::from_csv_bytes(b"experience,income\n1,10\n2,11\n").unwrap();
        let line = SpreadByExperienceAnalysis::new(source(), SpreadMode::Line);
        assert!(matches!(
            line.transform(data.clone()),
            Err(StatsError::InsufficientDataError { .. })
        ));

        let overlay = SpreadByExperienceAnalysis::new(source(), SpreadMode::Overlay);
        let output = overlay.transform(data).unwrap();
        assert!(output.value_of("Spread").unwrap().starts_with("Not enough data"));
    }

    #[test]
    fn test_line_mode_summary() {
        let output = SpreadByExperienceAnalysis::new(source(), SpreadMode::Line)
            .transform(salaries())
            .unwrap();
        assert_eq!(output.value_of("Experience years analyzed"), Some("1–3"));
        assert!(output.value_of("Max spread").unwrap().ends_with("at 1 years"));
    }
}
