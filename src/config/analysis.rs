//! One configured analysis, as written in a `[[analyses]]` table of a batch
//! file or assembled from a CLI subcommand, and its mapping onto a [`Job`].

use crate::app::pipelines::*;
use crate::app::Job;
use crate::core::TableSource;
use crate::datasets::DatasetKind;
use crate::utils::error::{Result, StatsError};
use crate::utils::validation::{
    validate_file_extension, validate_non_empty_string, validate_path, validate_positive_number,
    validate_range, validate_required_field, Validate,
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisKind {
    Generate,
    Preprocess,
    CentralTendency,
    Dispersion,
    SpreadSummary,
    Deviation,
    IncomeOutliers,
    SpreadByExperience,
    Correlation,
    Covariance,
    Variance,
    Distribution,
    Normal,
    Sampling,
    SamplingErrors,
    SalesDashboard,
    Norms,
}

impl AnalysisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::Generate => "generate",
            AnalysisKind::Preprocess => "preprocess",
            AnalysisKind::CentralTendency => "central-tendency",
            AnalysisKind::Dispersion => "dispersion",
            AnalysisKind::SpreadSummary => "spread-summary",
            AnalysisKind::Deviation => "deviation",
            AnalysisKind::IncomeOutliers => "income-outliers",
            AnalysisKind::SpreadByExperience => "spread-by-experience",
            AnalysisKind::Correlation => "correlation",
            AnalysisKind::Covariance => "covariance",
            AnalysisKind::Variance => "variance",
            AnalysisKind::Distribution => "distribution",
            AnalysisKind::Normal => "normal",
            AnalysisKind::Sampling => "sampling",
            AnalysisKind::SamplingErrors => "sampling-errors",
            AnalysisKind::SalesDashboard => "sales-dashboard",
            AnalysisKind::Norms => "norms",
        }
    }

    /// Dataset generated when the analysis has no input file.
    pub fn default_dataset(&self) -> DatasetKind {
        match self {
            AnalysisKind::Generate
            | AnalysisKind::Preprocess
            | AnalysisKind::CentralTendency
            | AnalysisKind::Dispersion
            | AnalysisKind::SpreadSummary
            | AnalysisKind::IncomeOutliers
            | AnalysisKind::SpreadByExperience => DatasetKind::Loans,
            AnalysisKind::Deviation => DatasetKind::DailyTemperatures,
            AnalysisKind::Correlation | AnalysisKind::Covariance => DatasetKind::HeightWeight,
            AnalysisKind::Variance => DatasetKind::CustomerSpending,
            AnalysisKind::Distribution => DatasetKind::CustomerBehavior,
            AnalysisKind::Normal => DatasetKind::SimulatedNormal,
            AnalysisKind::Sampling => DatasetKind::Satisfaction,
            AnalysisKind::SamplingErrors => DatasetKind::Customers,
            AnalysisKind::SalesDashboard | AnalysisKind::Norms => DatasetKind::Loans,
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSpec {
    pub kind: AnalysisKind,
    /// Input CSV; the analysis falls back to a generated dataset without it.
    pub input: Option<String>,
    pub dataset: Option<DatasetKind>,
    pub rows: Option<usize>,
    pub seed: Option<u64>,
    pub column: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    pub x: Option<String>,
    pub y: Option<String>,
    pub mode: Option<String>,
    pub city: Option<String>,
    pub technique: Option<Technique>,
    pub size: Option<usize>,
    pub fraction: Option<f64>,
    pub clusters: Option<usize>,
    pub step: Option<usize>,
    pub group_column: Option<String>,
    pub interval: Option<[f64; 2]>,
    pub vector: Option<Vec<f64>>,
    #[serde(default)]
    pub discrete: Vec<String>,
    #[serde(default)]
    pub continuous: Vec<String>,
    #[serde(default)]
    pub cumulative: Vec<String>,
    /// Output file name for `generate` and `preprocess`.
    pub output: Option<String>,
}

impl AnalysisSpec {
    pub fn new(kind: AnalysisKind) -> Self {
        Self {
            kind,
            input: None,
            dataset: None,
            rows: None,
            seed: None,
            column: None,
            columns: Vec::new(),
            x: None,
            y: None,
            mode: None,
            city: None,
            technique: None,
            size: None,
            fraction: None,
            clusters: None,
            step: None,
            group_column: None,
            interval: None,
            vector: None,
            discrete: Vec::new(),
            continuous: Vec::new(),
            cumulative: Vec::new(),
            output: None,
        }
    }

    fn source(&self, fallback: DatasetKind, seed: u64) -> TableSource {
        let kind = self.dataset.unwrap_or(fallback);
        let mut source = match &self.input {
            Some(path) => TableSource::file(path, kind),
            None => TableSource::generated(kind, seed),
        };
        source.seed = seed;
        source.with_rows(self.rows)
    }

    fn mode(&self, allowed: &[&str], default: &str) -> Result<String> {
        let mode = self
            .mode
            .as_deref()
            .unwrap_or(default)
            .trim()
            .to_lowercase();
        if !allowed.contains(&mode.as_str()) {
            return Err(StatsError::InvalidConfigValueError {
                field: format!("{}.mode", self.kind),
                value: mode,
                reason: format!("expected one of: {}", allowed.join(", ")),
            });
        }
        Ok(mode)
    }

    fn pair(&self) -> (String, String) {
        (
            self.x.clone().unwrap_or_else(|| "Height".to_string()),
            self.y.clone().unwrap_or_else(|| "Weight".to_string()),
        )
    }

    fn has_table_input(&self) -> bool {
        self.input.is_some() || self.dataset.is_some() || self.column.is_some()
    }

    /// Short human description for dry runs and logs.
    pub fn describe(&self) -> String {
        let mut parts = vec![self.kind.to_string()];
        if let Some(mode) = &self.mode {
            parts.push(format!("mode={}", mode));
        }
        if let Some(technique) = self.technique {
            parts.push(format!("technique={}", technique));
        }
        match (&self.input, self.dataset) {
            (Some(input), _) => parts.push(format!("input={}", input)),
            (None, Some(dataset)) => parts.push(format!("dataset={}", dataset)),
            (None, None) => {}
        }
        if let Some(column) = &self.column {
            parts.push(format!("column={}", column));
        }
        parts.join(" ")
    }

    pub fn to_job(&self, default_seed: u64) -> Result<Job> {
        let seed = self.seed.unwrap_or(default_seed);
        let fallback = self.kind.default_dataset();

        let job = match self.kind {
            AnalysisKind::Generate => {
                let kind = *validate_required_field("generate.dataset", &self.dataset)?;
                Job::Generate(GenerateAnalysis {
                    kind,
                    rows: self.rows,
                    seed,
                    file_name: self.output.clone(),
                })
            }
            AnalysisKind::Preprocess => Job::Preprocess(PreprocessAnalysis {
                source: self.source(fallback, seed),
                file_name: self.output.clone(),
            }),
            AnalysisKind::CentralTendency => {
                Job::CentralTendency(CentralTendencyAnalysis::new(self.source(fallback, seed)))
            }
            AnalysisKind::Dispersion => Job::Dispersion(DispersionAnalysis::new(
                self.source(fallback, seed),
                self.column.clone(),
            )),
            AnalysisKind::SpreadSummary => {
                Job::SpreadSummary(SpreadSummaryAnalysis::new(self.source(fallback, seed)))
            }
            AnalysisKind::Deviation => match &self.column {
                Some(column) => Job::Deviation(DeviationAnalysis::new(DeviationInput::Column {
                    source: self.source(fallback, seed),
                    column: column.clone(),
                })),
                None => Job::Deviation(DeviationAnalysis::city(
                    self.city.clone().unwrap_or_else(|| "New York".to_string()),
                )),
            },
            AnalysisKind::IncomeOutliers => {
                Job::IncomeOutliers(IncomeOutlierAnalysis::new(self.source(fallback, seed)))
            }
            AnalysisKind::SpreadByExperience => {
                let mode = match self.mode(&["line", "overlay"], "line")?.as_str() {
                    "overlay" => SpreadMode::Overlay,
                    _ => SpreadMode::Line,
                };
                Job::SpreadByExperience(SpreadByExperienceAnalysis::new(
                    self.source(fallback, seed),
                    mode,
                ))
            }
            AnalysisKind::Correlation => {
                let (mode, fallback) = match self.mode(&["pair", "demo", "matrix"], "pair")?.as_str() {
                    "demo" => (CorrelationMode::Demo, DatasetKind::Correlation),
                    "matrix" => (
                        CorrelationMode::Matrix {
                            columns: self.columns.clone(),
                        },
                        DatasetKind::CustomerSpending,
                    ),
                    _ => {
                        let (x, y) = self.pair();
                        (CorrelationMode::Pair { x, y }, fallback)
                    }
                };
                Job::Correlation(CorrelationAnalysis::new(self.source(fallback, seed), mode))
            }
            AnalysisKind::Covariance => {
                let (mode, fallback) = match self.mode(&["pair", "matrix", "eigen"], "pair")?.as_str() {
                    "matrix" => (
                        CovarianceMode::Matrix {
                            columns: self.columns.clone(),
                        },
                        DatasetKind::CustomerSpending,
                    ),
                    "eigen" => {
                        validate_required_field("covariance.input", &self.input)?;
                        (CovarianceMode::Eigen, fallback)
                    }
                    _ => {
                        let (x, y) = self.pair();
                        (CovarianceMode::Pair { x, y }, fallback)
                    }
                };
                Job::Covariance(CovarianceAnalysis::new(self.source(fallback, seed), mode))
            }
            AnalysisKind::Variance => Job::Variance(VarianceAnalysis::new(
                self.source(fallback, seed),
                self.columns.clone(),
            )),
            AnalysisKind::Distribution => {
                let source = self.source(fallback, seed);
                if self.discrete.is_empty() && self.continuous.is_empty() && self.cumulative.is_empty() {
                    Job::Distribution(DistributionAnalysis::customer_behavior(source))
                } else {
                    Job::Distribution(DistributionAnalysis {
                        source,
                        discrete: self.discrete.clone(),
                        continuous: self.continuous.clone(),
                        cumulative: self.cumulative.clone(),
                    })
                }
            }
            AnalysisKind::Normal => {
                let interval = self.interval.map(|[a, b]| (a, b));
                if self.has_table_input() {
                    Job::Normal(NormalAnalysis::new(
                        NormalInput::Table {
                            source: self.source(fallback, seed),
                            column: self.column.clone().unwrap_or_else(|| "n400".to_string()),
                        },
                        interval,
                    ))
                } else {
                    let mut analysis = NormalAnalysis::temperatures(seed);
                    if let NormalInput::Simulated { days, .. } = &mut analysis.input {
                        *days = self.rows.unwrap_or(*days);
                    }
                    if interval.is_some() {
                        analysis.interval = interval;
                    }
                    Job::Normal(analysis)
                }
            }
            AnalysisKind::Sampling => {
                let technique = self.technique.unwrap_or(Technique::Simple);
                let mut analysis = SamplingAnalysis::new(technique, seed);
                if self.input.is_some() || self.dataset.is_some() || self.rows.is_some() {
                    analysis = analysis.with_source(self.source(technique.default_dataset(), seed));
                }
                analysis.size = self.size.unwrap_or(analysis.size);
                analysis.fraction = self.fraction.unwrap_or(analysis.fraction);
                analysis.clusters = self.clusters.unwrap_or(analysis.clusters);
                analysis.step = self.step.unwrap_or(analysis.step);
                analysis.value_column = self.column.clone();
                analysis.group_column = self.group_column.clone();
                Job::Sampling(analysis)
            }
            AnalysisKind::SamplingErrors => Job::SamplingErrors(SamplingErrorsAnalysis::new(
                self.source(fallback, seed),
                seed,
            )),
            AnalysisKind::SalesDashboard => {
                let input = validate_required_field("sales-dashboard.input", &self.input)?;
                Job::SalesDashboard(SalesDashboardAnalysis::new(input))
            }
            AnalysisKind::Norms => Job::Norms(match &self.vector {
                Some(vector) => VectorNormsAnalysis::new(vector.clone()),
                None => VectorNormsAnalysis::default(),
            }),
        };
        Ok(job)
    }
}

impl Validate for AnalysisSpec {
    fn validate(&self) -> Result<()> {
        let field = |name: &str| format!("{}.{}", self.kind, name);

        if let Some(input) = &self.input {
            validate_path(&field("input"), input)?;
        }
        if let Some(output) = &self.output {
            validate_file_extension(&field("output"), output, &["csv"])?;
        }
        if let Some(rows) = self.rows {
            validate_positive_number(&field("rows"), rows, 1)?;
        }
        if let Some(size) = self.size {
            validate_positive_number(&field("size"), size, 1)?;
        }
        if let Some(clusters) = self.clusters {
            validate_positive_number(&field("clusters"), clusters, 1)?;
        }
        if let Some(step) = self.step {
            validate_positive_number(&field("step"), step, 1)?;
        }
        if let Some(fraction) = self.fraction {
            validate_range(&field("fraction"), fraction, f64::MIN_POSITIVE, 1.0)?;
        }
        if let Some([a, b]) = self.interval {
            if !(a.is_finite() && b.is_finite() && a <= b) {
                return Err(StatsError::InvalidConfigValueError {
                    field: field("interval"),
                    value: format!("[{}, {}]", a, b),
                    reason: "interval must be two finite bounds, lower first".to_string(),
                });
            }
        }
        for column in self.column.iter().chain(&self.columns) {
            validate_non_empty_string(&field("column"), column)?;
        }
        Ok(())
    }
}
