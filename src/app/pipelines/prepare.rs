use crate::core::TableSource;
use crate::datasets::{generate, DatasetKind};
use crate::domain::model::{AnalysisOutput, Artifact, Table};
use crate::domain::ports::Analysis;
use crate::preprocess::{clean_file_name, preprocess_loans};
use crate::stats::descriptive::{mean, median};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Writes a synthetic dataset to CSV.
pub struct GenerateAnalysis {
    pub kind: DatasetKind,
    pub rows: Option<usize>,
    pub seed: u64,
    pub file_name: Option<String>,
}

impl GenerateAnalysis {
    pub fn new(kind: DatasetKind, seed: u64) -> Self {
        Self {
            kind,
            rows: None,
            seed,
            file_name: None,
        }
    }

    fn file_name(&self) -> String {
        self.file_name
            .clone()
            .unwrap_or_else(|| self.kind.default_file_name())
    }
}

/// Mean and median of each city's week, in first-seen city order.
fn city_checks(output: &mut AnalysisOutput, data: &Table) -> Result<()> {
    let cities = data.column("city")?;
    let temps = data.numeric_column("temperature")?;
    let mut seen: Vec<&str> = Vec::new();
    for city in &cities {
        if !seen.contains(city) {
            seen.push(city);
        }
    }
    for city in seen {
        let values: Vec<f64> = cities
            .iter()
            .zip(&temps)
            .filter(|(c, _)| **c == city)
            .filter_map(|(_, t)| *t)
            .collect();
        output.line(
            city,
            format!(
                "Mean = {:.2}, Median = {:.2}",
                mean(&values).unwrap_or(f64::NAN),
                median(&values).unwrap_or(f64::NAN)
            ),
        );
    }
    Ok(())
}

#[async_trait]
impl Analysis for GenerateAnalysis {
    fn name(&self) -> &str {
        "generate"
    }

    async fn extract(&self) -> Result<Table> {
        tracing::info!("🎲 Generating {} (seed {})", self.kind, self.seed);
        generate(self.kind, self.rows, self.seed)
    }

    fn transform(&self, data: Table) -> Result<AnalysisOutput> {
        let mut output = AnalysisOutput::new(format!("Generated dataset: {}", self.kind));
        output
            .line("Rows", data.len())
            .line("Columns", data.headers.join(", "))
            .line("Seed", self.seed);
        match self.kind {
            DatasetKind::CityTemps => city_checks(&mut output, &data)?,
            DatasetKind::Loans => {
                let approved = data.column("status")?.iter().filter(|s| **s == "Y").count();
                output.line(
                    "Approved",
                    format!(
                        "{} ({:.1}%)",
                        approved,
                        approved as f64 * 100.0 / data.len().max(1) as f64
                    ),
                );
            }
            _ => {}
        }
        output.artifact(Artifact::Csv {
            name: self.file_name(),
            table: data,
        });
        Ok(output)
    }
}

/// Cleans a loans CSV into `<name>_clean.csv`.
pub struct PreprocessAnalysis {
    pub source: TableSource,
    pub file_name: Option<String>,
}

impl PreprocessAnalysis {
    pub fn new(source: TableSource) -> Self {
        Self {
            source,
            file_name: None,
        }
    }

    fn file_name(&self) -> String {
        if let Some(name) = &self.file_name {
            return name.clone();
        }
        let input = match &self.source.path {
            Some(path) => path.display().to_string(),
            None => self.source.fallback.default_file_name(),
        };
        clean_file_name(&input)
    }
}

#[async_trait]
impl Analysis for PreprocessAnalysis {
    fn name(&self) -> &str {
        "preprocess"
    }

    async fn extract(&self) -> Result<Table> {
        self.source.load().await
    }

    fn transform(&self, data: Table) -> Result<AnalysisOutput> {
        let cleaned = preprocess_loans(data)?;
        let blank = |column: &str| -> Result<usize> {
            Ok(cleaned
                .column(column)?
                .iter()
                .filter(|c| c.is_empty())
                .count())
        };
        let unparsed_income = blank("income_num")?;
        let unparsed_loan = blank("loan_amount_num")?;
        let unknown_status = blank("status_int")?;
        let name = self.file_name();

        let mut output = AnalysisOutput::new("Cleaned loans dataset");
        output
            .line("Source", self.source.describe())
            .line("Rows", cleaned.len())
            .line("Unparsed income", unparsed_income)
            .line("Unparsed loan_amount", unparsed_loan)
            .line("Unknown status", unknown_status)
            .line("Output", &name);
        output.artifact(Artifact::Csv {
            name,
            table: cleaned,
        });
        Ok(output)
    }
}
