//! The four sampling techniques over their textbook populations, and the
//! five sampling errors measured on the customers table.

use super::{counts_on_edges, sorted_labels};
use crate::charts::{BoxStats, Layer, Plot, Rgb};
use crate::core::TableSource;
use crate::datasets::DatasetKind;
use crate::domain::model::{format_currency, AnalysisOutput, Artifact, Table};
use crate::domain::ports::Analysis;
use crate::sampling::errors::{measure_sampling_errors, SELECTED_REGION, YOUNG_AGE_LIMIT};
use crate::sampling::{cluster, simple_random, stratified, systematic_random_start};
use crate::stats::descriptive::mean;
use crate::stats::distribution::histogram;
use crate::stats::inference::{scaled_t_confidence_interval, ConfidenceInterval};
use crate::utils::error::{Result, StatsError};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;

const CONFIDENCE: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Technique {
    Simple,
    Stratified,
    Cluster,
    Systematic,
}

impl Technique {
    pub fn as_str(&self) -> &'static str {
        match self {
            Technique::Simple => "simple",
            Technique::Stratified => "stratified",
            Technique::Cluster => "cluster",
            Technique::Systematic => "systematic",
        }
    }

    pub fn default_dataset(&self) -> DatasetKind {
        match self {
            Technique::Simple => DatasetKind::Satisfaction,
            Technique::Stratified => DatasetKind::Recovery,
            Technique::Cluster => DatasetKind::Neighbourhoods,
            Technique::Systematic => DatasetKind::Defects,
        }
    }

    fn value_column(&self) -> &'static str {
        match self {
            Technique::Simple => "Satisfaction",
            Technique::Stratified => "RecoveryTime",
            Technique::Cluster => "Income",
            Technique::Systematic => "Defect",
        }
    }

    fn group_column(&self) -> Option<&'static str> {
        match self {
            Technique::Stratified => Some("AgeGroup"),
            Technique::Cluster => Some("Neighborhood"),
            Technique::Simple | Technique::Systematic => None,
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Technique::Simple => "Simple Random Sampling: Customer Satisfaction",
            Technique::Stratified => "Stratified Sampling: Patient Recovery by Age Group",
            Technique::Cluster => "Cluster Sampling: Household Incomes by Neighborhood",
            Technique::Systematic => "Systematic Sampling: Product Defects",
        }
    }

    /// Defect rates are reported as percentages.
    fn scale(&self) -> f64 {
        match self {
            Technique::Systematic => 100.0,
            _ => 1.0,
        }
    }

    fn format(&self, value: f64) -> String {
        match self {
            Technique::Simple => format!("{:.2}", value),
            Technique::Stratified => format!("{:.2} days", value),
            Technique::Cluster => format_currency(value),
            Technique::Systematic => format!("{:.2}%", value),
        }
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Draws a sample with one technique and compares its mean (with a 95% t
/// interval) against the population mean.
pub struct SamplingAnalysis {
    pub technique: Technique,
    pub source: TableSource,
    pub seed: u64,
    /// Simple random sample size.
    pub size: usize,
    /// Stratified sampling fraction per stratum.
    pub fraction: f64,
    /// Number of clusters kept.
    pub clusters: usize,
    /// Systematic step.
    pub step: usize,
    pub value_column: Option<String>,
    pub group_column: Option<String>,
}

impl SamplingAnalysis {
    pub fn new(technique: Technique, seed: u64) -> Self {
        Self {
            technique,
            source: TableSource::generated(technique.default_dataset(), seed),
            seed,
            size: 100,
            fraction: 150.0 / 900.0,
            clusters: 3,
            step: 10,
            value_column: None,
            group_column: None,
        }
    }

    pub fn with_source(mut self, source: TableSource) -> Self {
        self.source = source;
        self
    }

    fn value_column(&self) -> &str {
        self.value_column
            .as_deref()
            .unwrap_or_else(|| self.technique.value_column())
    }

    fn group_labels<'a>(&self, data: &'a Table) -> Result<Vec<&'a str>> {
        let column = self
            .group_column
            .as_deref()
            .or_else(|| self.technique.group_column())
            .ok_or_else(|| StatsError::MissingConfigError {
                field: "group_column".to_string(),
            })?;
        data.column(column)
    }

    /// Row indices of the sample and, for cluster sampling, the chosen
    /// cluster ids.
    fn draw(&self, data: &Table) -> Result<(Vec<usize>, Vec<String>)> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        match self.technique {
            Technique::Simple => Ok((simple_random(data.len(), self.size, &mut rng)?, Vec::new())),
            Technique::Stratified => {
                let labels = self.group_labels(data)?;
                Ok((stratified(&labels, self.fraction, &mut rng)?, Vec::new()))
            }
            Technique::Cluster => {
                let labels = self.group_labels(data)?;
                let picked = cluster(&labels, self.clusters, &mut rng)?;
                Ok((picked.indices, picked.clusters))
            }
            Technique::Systematic => Ok((
                systematic_random_start(data.len(), self.step, &mut rng)?,
                Vec::new(),
            )),
        }
    }

    fn chart(
        &self,
        data: &Table,
        population: &[f64],
        indices: &[usize],
        chosen: &[String],
    ) -> Result<Plot> {
        let sample: Vec<f64> = indices.iter().map(|&i| population[i]).collect();
        let plot = Plot::new(self.technique.title());
        let plot = match self.technique {
            Technique::Simple => {
                let edges = histogram(population, 10, false)?.edges;
                plot.x_label(self.value_column())
                    .y_label("Frequency")
                    .layer(
                        Layer::bars(counts_on_edges(population, &edges), Rgb::BLUE)
                            .with_opacity(0.5)
                            .with_label("Population"),
                    )
                    .layer(
                        Layer::bars(counts_on_edges(&sample, &edges), Rgb::ORANGE)
                            .with_opacity(0.5)
                            .with_label("Sample"),
                    )
            }
            Technique::Stratified => {
                let labels = self.group_labels(data)?;
                let groups = sorted_labels(&labels);
                let (mut pop_bars, mut sample_bars) = (Vec::new(), Vec::new());
                for (i, group) in groups.iter().enumerate() {
                    let x = i as f64;
                    let in_pop = labels.iter().filter(|l| **l == group.as_str()).count();
                    let in_sample = indices
                        .iter()
                        .filter(|&&row| labels[row] == group.as_str())
                        .count();
                    pop_bars.push((x - 0.4, x, in_pop as f64));
                    sample_bars.push((x, x + 0.4, in_sample as f64));
                }
                plot.y_label("Count")
                    .categories(groups)
                    .layer(Layer::bars(pop_bars, Rgb::BLUE).with_opacity(0.5).with_label("Population"))
                    .layer(Layer::bars(sample_bars, Rgb::ORANGE).with_opacity(0.5).with_label("Sample"))
            }
            Technique::Cluster => {
                let labels = self.group_labels(data)?;
                let groups = sorted_labels(&labels);
                let mut plot = plot.y_label("Income ($)").categories(groups.clone());
                for (i, group) in groups.iter().enumerate() {
                    let values: Vec<f64> = labels
                        .iter()
                        .zip(population)
                        .filter(|(l, _)| **l == group.as_str())
                        .map(|(_, v)| *v)
                        .collect();
                    if let Some(stats) = BoxStats::from_values(&values) {
                        let color = if chosen.contains(group) { Rgb::SKY } else { Rgb::GRAY };
                        plot = plot.layer(Layer::BoxPlot {
                            position: i as f64,
                            stats,
                            color,
                        });
                    }
                }
                plot
            }
            Technique::Systematic => {
                let line = population
                    .iter()
                    .enumerate()
                    .map(|(i, v)| ((i + 1) as f64, *v))
                    .collect();
                let points = indices.iter().map(|&i| ((i + 1) as f64, population[i])).collect();
                plot.x_label("Product ID")
                    .y_label("Defect (1=Yes)")
                    .layer(Layer::line(line, Rgb::BLUE).with_label("Population Defects"))
                    .layer(Layer::points(points, Rgb::RED).with_size(4).with_label("Sample"))
            }
        };
        Ok(plot)
    }
}

#[async_trait]
impl Analysis for SamplingAnalysis {
    fn name(&self) -> &str {
        self.technique.as_str()
    }

    async fn extract(&self) -> Result<Table> {
        self.source.load().await
    }

    fn transform(&self, data: Table) -> Result<AnalysisOutput> {
        let column = self.value_column();
        let population: Vec<Option<f64>> = data.numeric_column(column)?;
        if let Some(row) = population.iter().position(Option::is_none) {
            return Err(StatsError::ValidationError {
                message: format!("'{}' has a non-numeric value on row {}", column, row + 1),
            });
        }
        let population: Vec<f64> = population.into_iter().flatten().collect();
        let scale = self.technique.scale();
        let pop_mean = mean(&population)
            .ok_or_else(|| StatsError::empty_data("population has no rows"))?
            * scale;

        let (indices, chosen) = self.draw(&data)?;
        let sample: Vec<f64> = indices.iter().map(|&i| population[i]).collect();
        let ci: ConfidenceInterval = scaled_t_confidence_interval(&sample, CONFIDENCE, scale)?;
        tracing::debug!(
            "🎯 {} sampling kept {} of {} rows",
            self.technique,
            indices.len(),
            population.len()
        );

        let fmt = |v: f64| self.technique.format(v);
        let mut output = AnalysisOutput::new(self.technique.title());
        output
            .line("Source", self.source.describe())
            .line("Population size", population.len())
            .line("Population mean", fmt(pop_mean))
            .line("Sample size", indices.len());
        if !chosen.is_empty() {
            output.line("Selected clusters", chosen.join(", "));
        }
        output
            .line("Sample mean", fmt(ci.mean))
            .line(
                "95% Confidence Interval",
                format!("({}, {})", fmt(ci.lower), fmt(ci.upper)),
            )
            .line(
                "Interval contains population mean",
                if ci.contains(pop_mean) { "yes" } else { "no" },
            );

        let plot = self.chart(&data, &population, &indices, &chosen)?;
        let name = self.technique.as_str();
        output
            .artifact(Artifact::Csv {
                name: format!("{}_sample.csv", name),
                table: data.select_rows(&indices),
            })
            .artifact(Artifact::Chart {
                name: format!("{}_sampling.png", name),
                figure: plot.into(),
            });
        Ok(output)
    }
}

/// Population-specific, selection, non-response, sample and frame errors.
pub struct SamplingErrorsAnalysis {
    pub source: TableSource,
    pub seed: u64,
}

impl SamplingErrorsAnalysis {
    pub fn new(source: TableSource, seed: u64) -> Self {
        Self { source, seed }
    }
}

#[async_trait]
impl Analysis for SamplingErrorsAnalysis {
    fn name(&self) -> &str {
        "sampling-errors"
    }

    async fn extract(&self) -> Result<Table> {
        self.source.load().await
    }

    fn transform(&self, data: Table) -> Result<AnalysisOutput> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let (report, ages) = measure_sampling_errors(&data, &mut rng)?;

        let mut output = AnalysisOutput::new("Sampling Errors");
        output
            .line("Source", self.source.describe())
            .line(
                "1️⃣ Population-specific",
                format!(
                    "{} of {} customers under {}, mean age {:.1} vs population {:.1}",
                    report.young_count,
                    report.population_size,
                    YOUNG_AGE_LIMIT,
                    report.young_mean_age,
                    report.population_mean_age
                ),
            )
            .line(
                "2️⃣ Selection",
                format!(
                    "only {} kept: {} rows, {} region(s) represented",
                    SELECTED_REGION,
                    report.selected_count,
                    report.selected_region_distribution.len()
                ),
            )
            .line(
                "3️⃣ Non-response",
                format!("{:.1}% of Subscribed answers missing", report.non_response_rate * 100.0),
            )
            .line(
                "4️⃣ Sample error",
                format!(
                    "sample mean income {} vs population {} (error {})",
                    format_currency(report.sample_mean_income),
                    format_currency(report.population_mean_income),
                    format_currency(report.sample_error)
                ),
            )
            .line(
                "5️⃣ Frame error",
                format!(
                    "{} customers reachable by website, {:.1}% excluded",
                    report.frame_size,
                    report.frame_excluded * 100.0
                ),
            );

        let edges = histogram(&ages.population, 20, false)?.edges;
        let plot = Plot::new("Population-Specific Error: Age Distribution")
            .x_label("Age")
            .y_label("Count")
            .layer(
                Layer::bars(counts_on_edges(&ages.population, &edges), Rgb::BLUE)
                    .with_opacity(0.5)
                    .with_label("All customers"),
            )
            .layer(
                Layer::bars(counts_on_edges(&ages.young, &edges), Rgb::RED)
                    .with_opacity(0.6)
                    .with_label(format!("Age < {}", YOUNG_AGE_LIMIT)),
            );

        output
            .artifact(Artifact::Json {
                name: "sampling_errors.json".to_string(),
                value: serde_json::to_value(&report)?,
            })
            .artifact(Artifact::Chart {
                name: "population_specific_error.png".to_string(),
                figure: plot.into(),
            });
        Ok(output)
    }
}
