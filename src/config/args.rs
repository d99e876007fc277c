use crate::app::{Job, RunContext};
use crate::app::pipelines::Technique;
use crate::config::analysis::{AnalysisKind, AnalysisSpec};
use crate::core::ConfigProvider;
use crate::datasets::{DatasetKind, DEFAULT_SEED};
use crate::utils::error::Result;
use crate::utils::validation::{validate_path, Validate};
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "stats-foundations")]
#[command(about = "Descriptive and inferential statistics over CSV and synthetic datasets")]
pub struct CliConfig {
    #[arg(long, global = true, default_value = "./output")]
    pub output_path: String,

    #[arg(long, global = true, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    #[arg(long, global = true, help = "Skip PNG chart rendering")]
    pub no_charts: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Where the table comes from: a CSV file, or a generated dataset.
#[derive(Debug, Clone, Default, Args)]
pub struct InputArgs {
    /// Input CSV file
    #[arg(long)]
    pub input: Option<String>,

    /// Dataset to generate when no input file is given
    #[arg(long, value_enum)]
    pub dataset: Option<DatasetKind>,

    /// Rows of the generated dataset
    #[arg(long)]
    pub rows: Option<usize>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Write a synthetic dataset to CSV
    Generate {
        #[arg(long, value_enum)]
        dataset: DatasetKind,
        #[arg(long)]
        rows: Option<usize>,
        /// Output file name inside the output path
        #[arg(long)]
        output: Option<String>,
    },
    /// Clean a loans CSV into <name>_clean.csv
    Preprocess {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long)]
        output: Option<String>,
    },
    /// Count, mean, median and modes of the loan amount
    CentralTendency {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Dispersion profile of one column (income by default)
    Dispersion {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long)]
        column: Option<String>,
    },
    /// Spread statistics for every numeric column
    SpreadSummary {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Deviation table and population variance
    Deviation {
        /// Built-in seven-day city sequence
        #[arg(long, default_value = "New York", conflicts_with = "column")]
        city: String,
        #[command(flatten)]
        input: InputArgs,
        /// Column to tabulate instead of a city sequence
        #[arg(long)]
        column: Option<String>,
    },
    /// IQR outliers of income plotted against experience
    IncomeOutliers {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Income standard deviation per experience year
    SpreadByExperience {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value = "line", value_parser = ["line", "overlay"])]
        mode: String,
    },
    /// Pearson correlation: one pair, the demo grid, or a matrix
    Correlation {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value = "pair", value_parser = ["pair", "demo", "matrix"])]
        mode: String,
        #[arg(long)]
        x: Option<String>,
        #[arg(long)]
        y: Option<String>,
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },
    /// Variance and covariance, covariance matrix and its eigen decomposition
    Covariance {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value = "pair", value_parser = ["pair", "matrix", "eigen"])]
        mode: String,
        #[arg(long)]
        x: Option<String>,
        #[arg(long)]
        y: Option<String>,
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },
    /// Sample variance of each feature
    Variance {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },
    /// PMF, KDE density and empirical CDF plots
    Distribution {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, value_delimiter = ',')]
        discrete: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        continuous: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        cumulative: Vec<String>,
    },
    /// Density histogram with a normal curve
    Normal {
        #[command(flatten)]
        input: InputArgs,
        /// Column of the input table (simulated temperatures otherwise)
        #[arg(long)]
        column: Option<String>,
        /// P(a ≤ X ≤ b), given as a,b
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
        between: Option<Vec<f64>>,
    },
    /// Simple, stratified, cluster or systematic sampling with a 95% interval
    Sampling {
        #[arg(long, value_enum, default_value_t = Technique::Simple)]
        technique: Technique,
        #[command(flatten)]
        input: InputArgs,
        #[arg(long)]
        size: Option<usize>,
        #[arg(long)]
        fraction: Option<f64>,
        #[arg(long)]
        clusters: Option<usize>,
        #[arg(long)]
        step: Option<usize>,
        #[arg(long)]
        column: Option<String>,
        #[arg(long)]
        group_column: Option<String>,
    },
    /// Five kinds of sampling error on the customers table
    SamplingErrors {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Five-panel chart from headerless sale,cost lines
    SalesDashboard {
        #[arg(long)]
        input: String,
    },
    /// L1, L2, squared L2 and max norms of a vector
    Norms {
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
        vector: Option<Vec<f64>>,
    },
}

impl InputArgs {
    fn apply(&self, spec: &mut AnalysisSpec) {
        spec.input = self.input.clone();
        spec.dataset = self.dataset;
        spec.rows = self.rows;
    }
}

impl Command {
    /// The same description a `[[analyses]]` batch entry would give.
    pub fn spec(&self) -> AnalysisSpec {
        let with_input = |kind: AnalysisKind, input: &InputArgs| {
            let mut spec = AnalysisSpec::new(kind);
            input.apply(&mut spec);
            spec
        };

        match self {
            Command::Generate {
                dataset,
                rows,
                output,
            } => {
                let mut spec = AnalysisSpec::new(AnalysisKind::Generate);
                spec.dataset = Some(*dataset);
                spec.rows = *rows;
                spec.output = output.clone();
                spec
            }
            Command::Preprocess { input, output } => {
                let mut spec = with_input(AnalysisKind::Preprocess, input);
                spec.output = output.clone();
                spec
            }
            Command::CentralTendency { input } => with_input(AnalysisKind::CentralTendency, input),
            Command::Dispersion { input, column } => {
                let mut spec = with_input(AnalysisKind::Dispersion, input);
                spec.column = column.clone();
                spec
            }
            Command::SpreadSummary { input } => with_input(AnalysisKind::SpreadSummary, input),
            Command::Deviation {
                city,
                input,
                column,
            } => {
                let mut spec = with_input(AnalysisKind::Deviation, input);
                spec.city = Some(city.clone());
                spec.column = column.clone();
                spec
            }
            Command::IncomeOutliers { input } => with_input(AnalysisKind::IncomeOutliers, input),
            Command::SpreadByExperience { input, mode } => {
                let mut spec = with_input(AnalysisKind::SpreadByExperience, input);
                spec.mode = Some(mode.clone());
                spec
            }
            Command::Correlation {
                input,
                mode,
                x,
                y,
                columns,
            } => {
                let mut spec = with_input(AnalysisKind::Correlation, input);
                spec.mode = Some(mode.clone());
                spec.x = x.clone();
                spec.y = y.clone();
                spec.columns = columns.clone();
                spec
            }
            Command::Covariance {
                input,
                mode,
                x,
                y,
                columns,
            } => {
                let mut spec = with_input(AnalysisKind::Covariance, input);
                spec.mode = Some(mode.clone());
                spec.x = x.clone();
                spec.y = y.clone();
                spec.columns = columns.clone();
                spec
            }
            Command::Variance { input, columns } => {
                let mut spec = with_input(AnalysisKind::Variance, input);
                spec.columns = columns.clone();
                spec
            }
            Command::Distribution {
                input,
                discrete,
                continuous,
                cumulative,
            } => {
                let mut spec = with_input(AnalysisKind::Distribution, input);
                spec.discrete = discrete.clone();
                spec.continuous = continuous.clone();
                spec.cumulative = cumulative.clone();
                spec
            }
            Command::Normal {
                input,
                column,
                between,
            } => {
                let mut spec = with_input(AnalysisKind::Normal, input);
                spec.column = column.clone();
                // anything but two bounds fails validation as a non-finite interval
                spec.interval = between.as_ref().map(|b| match b.as_slice() {
                    [a, b] => [*a, *b],
                    _ => [f64::NAN, f64::NAN],
                });
                spec
            }
            Command::Sampling {
                technique,
                input,
                size,
                fraction,
                clusters,
                step,
                column,
                group_column,
            } => {
                let mut spec = with_input(AnalysisKind::Sampling, input);
                spec.technique = Some(*technique);
                spec.size = *size;
                spec.fraction = *fraction;
                spec.clusters = *clusters;
                spec.step = *step;
                spec.column = column.clone();
                spec.group_column = group_column.clone();
                spec
            }
            Command::SamplingErrors { input } => with_input(AnalysisKind::SamplingErrors, input),
            Command::SalesDashboard { input } => {
                let mut spec = AnalysisSpec::new(AnalysisKind::SalesDashboard);
                spec.input = Some(input.clone());
                spec
            }
            Command::Norms { vector } => {
                let mut spec = AnalysisSpec::new(AnalysisKind::Norms);
                spec.vector = vector.clone();
                spec
            }
        }
    }
}

impl CliConfig {
    pub fn job(&self) -> Result<Job> {
        self.command.spec().to_job(self.seed)
    }

    pub fn run_context(&self) -> RunContext {
        let mut ctx = RunContext::from_config(self);
        ctx.render_charts = !self.no_charts;
        ctx.monitor = self.monitor;
        ctx
    }
}

impl ConfigProvider for CliConfig {
    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("output_path", &self.output_path)?;
        self.command.spec().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let config = CliConfig::try_parse_from([
            "stats-foundations",
            "dispersion",
            "--input",
            "data/loans.csv",
            "--seed",
            "7",
            "--no-charts",
        ])
        .unwrap();
        assert_eq!(config.seed, 7);
        assert!(!config.run_context().render_charts);
        let spec = config.command.spec();
        assert_eq!(spec.kind, AnalysisKind::Dispersion);
        assert_eq!(spec.input.as_deref(), Some("data/loans.csv"));
        assert_eq!(config.job().unwrap().name(), "dispersion");
    }

    #[test]
    fn test_sampling_technique_defaults_to_simple() {
        let config = CliConfig::try_parse_from(["stats-foundations", "sampling"]).unwrap();
        let spec = config.command.spec();
        assert_eq!(spec.technique, Some(Technique::Simple));
        let batch = AnalysisSpec::new(AnalysisKind::Sampling);
        assert_eq!(
            config.job().unwrap().name(),
            batch.to_job(DEFAULT_SEED).unwrap().name()
        );

        let config =
            CliConfig::try_parse_from(["stats-foundations", "sampling", "--technique", "stratified"])
                .unwrap();
        assert_eq!(config.job().unwrap().name(), "stratified");
    }

    #[test]
    fn test_normal_interval() {
        let config = CliConfig::try_parse_from([
            "stats-foundations",
            "normal",
            "--between",
            "28,31",
        ])
        .unwrap();
        assert_eq!(config.command.spec().interval, Some([28.0, 31.0]));

        let config =
            CliConfig::try_parse_from(["stats-foundations", "normal", "--between", "28"]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_norms_vector_and_validation() {
        let config =
            CliConfig::try_parse_from(["stats-foundations", "norms", "--vector", "3,-4"]).unwrap();
        assert_eq!(config.command.spec().vector, Some(vec![3.0, -4.0]));
        assert!(config.validate().is_ok());

        let config = CliConfig::try_parse_from([
            "stats-foundations",
            "--output-path",
            "",
            "norms",
        ])
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_mode() {
        assert!(CliConfig::try_parse_from([
            "stats-foundations",
            "correlation",
            "--mode",
            "kendall"
        ])
        .is_err());
    }
}
