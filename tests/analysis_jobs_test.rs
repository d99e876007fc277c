use stats_foundations::app::pipelines::{DeviationAnalysis, Technique, VectorNormsAnalysis};
use stats_foundations::datasets::DatasetKind;
use stats_foundations::domain::model::RunSummary;
use stats_foundations::{run_analysis, AnalysisKind, AnalysisSpec, Job, RunContext, StatsError};
use tempfile::TempDir;

fn context(dir: &TempDir) -> RunContext {
    let mut ctx = RunContext::new(dir.path().to_string_lossy(), 42);
    ctx.render_charts = false;
    ctx
}

fn value<'a>(summary: &'a RunSummary, label: &str) -> Option<&'a str> {
    summary
        .summary
        .iter()
        .find(|l| l.label == label)
        .map(|l| l.value.as_str())
}

#[tokio::test]
async fn test_generate_then_preprocess_then_dispersion() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let ctx = context(&dir);

    let mut generate = AnalysisSpec::new(AnalysisKind::Generate);
    generate.dataset = Some(DatasetKind::Loans);
    generate.rows = Some(300);
    let summary = generate.to_job(ctx.seed)?.run(&ctx).await?;
    assert_eq!(value(&summary, "Rows"), Some("300"));

    let raw = dir.path().join("loan_applications_2000.csv");
    assert!(raw.exists());

    let mut preprocess = AnalysisSpec::new(AnalysisKind::Preprocess);
    preprocess.input = Some(raw.to_string_lossy().to_string());
    preprocess.to_job(ctx.seed)?.run(&ctx).await?;

    let cleaned = dir.path().join("loan_applications_2000_clean.csv");
    assert!(cleaned.exists());
    let header = std::fs::read_to_string(&cleaned)?;
    assert!(header.lines().next().unwrap_or_default().contains("income_num"));

    let mut dispersion = AnalysisSpec::new(AnalysisKind::Dispersion);
    dispersion.input = Some(cleaned.to_string_lossy().to_string());
    let summary = dispersion.to_job(ctx.seed)?.run(&ctx).await?;
    assert!(dir.path().join("dispersion_summary.json").exists());
    assert!(!summary.summary.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_new_york_deviation_table() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let ctx = context(&dir);

    let summary = run_analysis(DeviationAnalysis::city("New York"), &ctx).await?;
    assert_eq!(value(&summary, "Mean (X̄)"), Some("20.00"));
    assert_eq!(value(&summary, "Total of (X - X̄)^2"), Some("4.00"));
    assert_eq!(value(&summary, "Variance (σ² = avg sq diff)"), Some("0.571429"));

    let csv = std::fs::read_to_string(dir.path().join("temperature_deviation.csv"))?;
    assert_eq!(csv.lines().count(), 8);

    Ok(())
}

#[tokio::test]
async fn test_each_sampling_technique_writes_its_sample() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let ctx = context(&dir);

    for technique in [
        Technique::Simple,
        Technique::Stratified,
        Technique::Cluster,
        Technique::Systematic,
    ] {
        let mut spec = AnalysisSpec::new(AnalysisKind::Sampling);
        spec.technique = Some(technique);
        let summary = spec.to_job(ctx.seed)?.run(&ctx).await?;

        assert!(value(&summary, "95% Confidence Interval").is_some());
        let sample = dir.path().join(format!("{}_sample.csv", technique.as_str()));
        assert!(sample.exists(), "missing {}", sample.display());
    }

    Ok(())
}

#[tokio::test]
async fn test_same_seed_same_output() -> anyhow::Result<()> {
    let first = TempDir::new()?;
    let second = TempDir::new()?;

    for dir in [&first, &second] {
        let mut spec = AnalysisSpec::new(AnalysisKind::Generate);
        spec.dataset = Some(DatasetKind::CustomerBehavior);
        spec.to_job(42)?.run(&context(dir)).await?;
    }

    let name = DatasetKind::CustomerBehavior.default_file_name();
    assert_eq!(
        std::fs::read(first.path().join(&name))?,
        std::fs::read(second.path().join(&name))?
    );
    Ok(())
}

#[tokio::test]
async fn test_missing_input_is_io_error() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let ctx = context(&dir);

    let mut spec = AnalysisSpec::new(AnalysisKind::CentralTendency);
    spec.input = Some(dir.path().join("nope.csv").to_string_lossy().to_string());
    let result = spec.to_job(ctx.seed)?.run(&ctx).await;

    assert!(matches!(result, Err(StatsError::IoError(_))));
    Ok(())
}

#[tokio::test]
async fn test_norms_job_json() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let ctx = context(&dir);

    Job::Norms(VectorNormsAnalysis::new(vec![3.0, -4.0]))
        .run(&ctx)
        .await?;

    let json: serde_json::Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("vector_norms.json"))?)?;
    assert_eq!(json["l2"], 5.0);
    assert_eq!(json["l1"], 7.0);
    assert_eq!(json["max"], 4.0);
    Ok(())
}
