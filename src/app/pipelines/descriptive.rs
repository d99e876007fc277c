use super::{pick_numeric, INCOME_COLUMNS, LOAN_AMOUNT_COLUMNS};
use crate::core::TableSource;
use crate::datasets::{city_sequence, CITY_SEQUENCES};
use crate::domain::model::{AnalysisOutput, Artifact, Table};
use crate::domain::ports::Analysis;
use crate::stats::descriptive::{central_tendency, deviation_table};
use crate::stats::dispersion::{measure_of_dispersion, spread_summary, spread_summary_table};
use crate::utils::error::{Result, StatsError};
use async_trait::async_trait;

/// Count, mean, median and modes of the loan amount.
pub struct CentralTendencyAnalysis {
    pub source: TableSource,
}

impl CentralTendencyAnalysis {
    pub fn new(source: TableSource) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Analysis for CentralTendencyAnalysis {
    fn name(&self) -> &str {
        "central-tendency"
    }

    async fn extract(&self) -> Result<Table> {
        self.source.load().await
    }

    fn transform(&self, mut data: Table) -> Result<AnalysisOutput> {
        data.normalize_headers(true);
        let (column, values) = pick_numeric(&data, &LOAN_AMOUNT_COLUMNS)?;
        let values: Vec<f64> = values.into_iter().flatten().collect();
        let stats = central_tendency(&values).ok_or_else(|| {
            StatsError::empty_data(format!("no valid numeric values found for {}", column))
        })?;

        let modes = if stats.modes.is_empty() {
            "(no repeated values)".to_string()
        } else {
            stats
                .modes
                .iter()
                .map(|m| format!("{:.2}", m))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut output = AnalysisOutput::new("loan_amount summary");
        output
            .line("Source", self.source.describe())
            .line("Column used", &column)
            .line("Count", stats.count)
            .line("Mean", format!("{:.2}", stats.mean))
            .line("Median", format!("{:.2}", stats.median))
            .line("Mode(s)", modes);
        output.artifact(Artifact::Json {
            name: "loan_amount_summary.json".to_string(),
            value: serde_json::json!({
                "column_used": column,
                "count": stats.count,
                "mean": stats.mean,
                "median": stats.median,
                "mode": stats.modes,
            }),
        });
        Ok(output)
    }
}

/// Full dispersion profile of one column (income by default).
pub struct DispersionAnalysis {
    pub source: TableSource,
    pub column: Option<String>,
}

impl DispersionAnalysis {
    pub fn new(source: TableSource, column: Option<String>) -> Self {
        Self { source, column }
    }
}

#[async_trait]
impl Analysis for DispersionAnalysis {
    fn name(&self) -> &str {
        "dispersion"
    }

    async fn extract(&self) -> Result<Table> {
        self.source.load().await
    }

    fn transform(&self, mut data: Table) -> Result<AnalysisOutput> {
        data.normalize_headers(true);
        let candidates: Vec<String> = match &self.column {
            Some(column) => vec![column.trim().to_lowercase()],
            None => INCOME_COLUMNS.iter().map(|c| c.to_string()).collect(),
        };
        let candidates: Vec<&str> = candidates.iter().map(String::as_str).collect();
        let (column, values) = pick_numeric(&data, &candidates)?;

        let summary = measure_of_dispersion(&values)?.rounded(2, 4);
        tracing::debug!("📏 {} values analysed in '{}'", summary.count, column);

        let mut output = AnalysisOutput::new(format!("Measures of Dispersion ({})", column));
        output
            .line("Source", self.source.describe())
            .line("Column analyzed", &column);
        for (label, value) in summary.fields() {
            output.line(label, value);
        }
        output.artifact(Artifact::Json {
            name: "dispersion_summary.json".to_string(),
            value: serde_json::json!({
                "column": column,
                "summary": serde_json::to_value(&summary)?,
            }),
        });
        Ok(output)
    }
}

/// Spread statistics for every numeric column, written as `spread_summary.csv`.
pub struct SpreadSummaryAnalysis {
    pub source: TableSource,
}

impl SpreadSummaryAnalysis {
    pub fn new(source: TableSource) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Analysis for SpreadSummaryAnalysis {
    fn name(&self) -> &str {
        "spread-summary"
    }

    async fn extract(&self) -> Result<Table> {
        self.source.load().await
    }

    fn transform(&self, mut data: Table) -> Result<AnalysisOutput> {
        data.normalize_headers(false);
        let summaries = spread_summary(&data)?;

        let mut output = AnalysisOutput::new("Spread Summary (per numeric column)");
        output.line("Input", self.source.describe());
        for (column, s) in &summaries {
            output.line(
                column.as_str(),
                format!(
                    "n={} mean={} std={} iqr={} cv={} outliers={}",
                    s.count,
                    s.mean,
                    s.std_dev_sample,
                    s.iqr,
                    s.coefficient_of_variation,
                    s.num_outliers
                ),
            );
        }
        output.artifact(Artifact::Csv {
            name: "spread_summary.csv".to_string(),
            table: spread_summary_table(&summaries),
        });
        Ok(output)
    }
}

pub enum DeviationInput {
    /// One of the built-in seven-day city sequences.
    City(String),
    Column { source: TableSource, column: String },
}

/// The worked variance table: deviation from the mean and its square per
/// value, with the divide-by-n variance.
pub struct DeviationAnalysis {
    pub input: DeviationInput,
}

impl DeviationAnalysis {
    pub fn new(input: DeviationInput) -> Self {
        Self { input }
    }

    pub fn city(name: impl Into<String>) -> Self {
        Self::new(DeviationInput::City(name.into()))
    }

    fn column(&self) -> &str {
        match &self.input {
            DeviationInput::City(_) => "temperature",
            DeviationInput::Column { column, .. } => column,
        }
    }

    fn describe(&self) -> String {
        match &self.input {
            DeviationInput::City(city) => format!("{} (7 days)", city),
            DeviationInput::Column { source, column } => {
                format!("{} [{}]", source.describe(), column)
            }
        }
    }
}

#[async_trait]
impl Analysis for DeviationAnalysis {
    fn name(&self) -> &str {
        "deviation"
    }

    async fn extract(&self) -> Result<Table> {
        match &self.input {
            DeviationInput::City(city) => {
                let temps = city_sequence(city).ok_or_else(|| {
                    StatsError::InvalidConfigValueError {
                        field: "city".to_string(),
                        value: city.clone(),
                        reason: format!(
                            "expected one of: {}",
                            CITY_SEQUENCES.map(|(name, _)| name).join(", ")
                        ),
                    }
                })?;
                let mut table = Table::new(["day", "temperature"]);
                for (day, t) in temps.iter().enumerate() {
                    table.push_row(vec![(day + 1).to_string(), t.to_string()])?;
                }
                Ok(table)
            }
            DeviationInput::Column { source, .. } => source.load().await,
        }
    }

    fn transform(&self, data: Table) -> Result<AnalysisOutput> {
        let values = data.numeric_values(self.column())?;
        let table = deviation_table(&values)
            .ok_or_else(|| StatsError::empty_data(format!("no numeric values in '{}'", self.column())))?;

        let mut csv = Table::new(["Day", "X", "X - Mean(X)", "(X - Mean(X))^2"]);
        let mut output = AnalysisOutput::new(format!("Deviation table: {}", self.describe()));
        for row in &table.rows {
            csv.push_row(vec![
                row.index.to_string(),
                row.value.to_string(),
                format!("{:.2}", row.deviation),
                format!("{:.2}", row.squared_deviation),
            ])?;
            output.line(
                format!("Day {}", row.index),
                format!(
                    "{}, {:.2}, {:.2}",
                    row.value, row.deviation, row.squared_deviation
                ),
            );
        }

        output
            .line("Mean (X̄)", format!("{:.2}", table.mean))
            .line("Total of (X - X̄)^2", format!("{:.2}", table.sum_of_squares))
            .line("Variance (σ² = avg sq diff)", format!("{:.6}", table.variance))
            .line("Std. Deviation (σ)", format!("{:.6}", table.std_dev));
        output.artifact(Artifact::Csv {
            name: "temperature_deviation.csv".to_string(),
            table: csv,
        });
        Ok(output)
    }
}
