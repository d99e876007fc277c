//! Wiring between configured analyses and the engine.

pub mod pipelines;

use crate::config::cli::LocalStorage;
use crate::core::{AnalysisEngine, AnalysisPipeline, ConfigProvider, LoadOptions};
use crate::domain::model::RunSummary;
use crate::domain::ports::Analysis;
use crate::utils::error::Result;
use pipelines::*;

/// Settings shared by every analysis of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub output_path: String,
    pub seed: u64,
    pub render_charts: bool,
    pub monitor: bool,
}

impl RunContext {
    pub fn new(output_path: impl Into<String>, seed: u64) -> Self {
        Self {
            output_path: output_path.into(),
            seed,
            render_charts: true,
            monitor: false,
        }
    }

    /// Output path and seed from any configuration source; charts on,
    /// monitoring off.
    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self::new(config.output_path(), config.seed())
    }

    pub fn storage(&self) -> LocalStorage {
        LocalStorage::new(self.output_path.clone())
    }

    pub fn options(&self) -> LoadOptions {
        LoadOptions {
            render_charts: self.render_charts,
        }
    }
}

/// Runs one analysis through extract, transform and load into the output
/// directory of `ctx`.
pub async fn run_analysis<A: Analysis>(analysis: A, ctx: &RunContext) -> Result<RunSummary> {
    tracing::info!("🧮 Running {}", analysis.name());
    let pipeline = AnalysisPipeline::with_options(analysis, ctx.storage(), ctx.options());
    AnalysisEngine::new_with_monitoring(pipeline, ctx.monitor)
        .run()
        .await
}

/// Any analysis the binaries can schedule.
pub enum Job {
    Generate(GenerateAnalysis),
    Preprocess(PreprocessAnalysis),
    CentralTendency(CentralTendencyAnalysis),
    Dispersion(DispersionAnalysis),
    SpreadSummary(SpreadSummaryAnalysis),
    Deviation(DeviationAnalysis),
    IncomeOutliers(IncomeOutlierAnalysis),
    SpreadByExperience(SpreadByExperienceAnalysis),
    Correlation(CorrelationAnalysis),
    Covariance(CovarianceAnalysis),
    Variance(VarianceAnalysis),
    Distribution(DistributionAnalysis),
    Normal(NormalAnalysis),
    Sampling(SamplingAnalysis),
    SamplingErrors(SamplingErrorsAnalysis),
    SalesDashboard(SalesDashboardAnalysis),
    Norms(VectorNormsAnalysis),
}

impl Job {
    pub fn name(&self) -> &str {
        match self {
            Job::Generate(a) => a.name(),
            Job::Preprocess(a) => a.name(),
            Job::CentralTendency(a) => a.name(),
            Job::Dispersion(a) => a.name(),
            Job::SpreadSummary(a) => a.name(),
            Job::Deviation(a) => a.name(),
            Job::IncomeOutliers(a) => a.name(),
            Job::SpreadByExperience(a) => a.name(),
            Job::Correlation(a) => a.name(),
            Job::Covariance(a) => a.name(),
            Job::Variance(a) => a.name(),
            Job::Distribution(a) => a.name(),
            Job::Normal(a) => a.name(),
            Job::Sampling(a) => a.name(),
            Job::SamplingErrors(a) => a.name(),
            Job::SalesDashboard(a) => a.name(),
            Job::Norms(a) => a.name(),
        }
    }

    pub async fn run(self, ctx: &RunContext) -> Result<RunSummary> {
        match self {
            Job::Generate(a) => run_analysis(a, ctx).await,
            Job::Preprocess(a) => run_analysis(a, ctx).await,
            Job::CentralTendency(a) => run_analysis(a, ctx).await,
            Job::Dispersion(a) => run_analysis(a, ctx).await,
            Job::SpreadSummary(a) => run_analysis(a, ctx).await,
            Job::Deviation(a) => run_analysis(a, ctx).await,
            Job::IncomeOutliers(a) => run_analysis(a, ctx).await,
            Job::SpreadByExperience(a) => run_analysis(a, ctx).await,
            Job::Correlation(a) => run_analysis(a, ctx).await,
            Job::Covariance(a) => run_analysis(a, ctx).await,
            Job::Variance(a) => run_analysis(a, ctx).await,
            Job::Distribution(a) => run_analysis(a, ctx).await,
            Job::Normal(a) => run_analysis(a, ctx).await,
            Job::Sampling(a) => run_analysis(a, ctx).await,
            Job::SamplingErrors(a) => run_analysis(a, ctx).await,
            Job::SalesDashboard(a) => run_analysis(a, ctx).await,
            Job::Norms(a) => run_analysis(a, ctx).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct FixedConfig;

    impl ConfigProvider for FixedConfig {
        fn output_path(&self) -> &str {
            "./reports"
        }

        fn seed(&self) -> u64 {
            9
        }
    }

    #[test]
    fn test_context_from_config_provider() {
        let ctx = RunContext::from_config(&FixedConfig);
        assert_eq!(ctx.output_path, "./reports");
        assert_eq!(ctx.seed, 9);
        assert!(ctx.render_charts);
        assert_eq!(ctx.storage().base_path(), "./reports");
    }

    #[tokio::test]
    async fn test_job_writes_into_output_dir() {
        let dir = TempDir::new().unwrap();
        let mut ctx = RunContext::new(dir.path().to_string_lossy(), 42);
        ctx.render_charts = false;

        let job = Job::Norms(VectorNormsAnalysis::default());
        assert_eq!(job.name(), "norms");
        let summary = job.run(&ctx).await.unwrap();
        assert_eq!(summary.written.len(), 1);
        assert!(dir.path().join("vector_norms.json").exists());
    }
}
