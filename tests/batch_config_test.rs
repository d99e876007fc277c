use stats_foundations::config::{ReportEntry, RunReport};
use stats_foundations::BatchConfig;
use stats_foundations::utils::validation::Validate;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

fn batch_toml(output: &str, continue_on_error: bool) -> String {
    format!(
        r#"
[batch]
name = "integration"
output_path = "{output}"
seed = 42
render_charts = false
continue_on_error = {continue_on_error}

[monitoring]
enabled = false

[[analyses]]
kind = "generate"
dataset = "city-temps"

[[analyses]]
kind = "central-tendency"
input = "{output}/does_not_exist.csv"

[[analyses]]
kind = "norms"
vector = [1.0, 2.0, 2.0]
"#
    )
}

async fn run_batch(config: &BatchConfig) -> anyhow::Result<RunReport> {
    let ctx = config.run_context();
    let started_at = chrono::Utc::now();
    let mut entries = Vec::new();

    for job in config.jobs()? {
        let name = job.name().to_string();
        let result = job.run(&ctx).await;
        let failed = result.is_err();
        entries.push(ReportEntry::from_result(&name, &result));
        if failed && !config.continue_on_error() {
            break;
        }
    }

    Ok(RunReport {
        batch: config.batch.name.clone(),
        started_at,
        finished_at: chrono::Utc::now(),
        seed: ctx.seed,
        entries,
    })
}

#[tokio::test]
async fn test_batch_continues_after_failure() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let output = dir.path().to_string_lossy().replace('\\', "/");

    let mut file = NamedTempFile::new()?;
    file.write_all(batch_toml(&output, true).as_bytes())?;

    let config = BatchConfig::from_file(file.path())?;
    config.validate()?;
    assert!(!config.monitoring_enabled());

    let report = run_batch(&config).await?;
    assert_eq!(report.entries.len(), 3);
    assert_eq!(report.failures(), 1);
    assert!(!report.entries[1].succeeded);
    assert!(dir.path().join("city_temps_7days.csv").exists());
    assert!(dir.path().join("vector_norms.json").exists());

    let json = serde_json::to_value(&report)?;
    assert_eq!(json["entries"][0]["analysis"], "generate");
    assert!(json["started_at"].is_string());
    Ok(())
}

#[tokio::test]
async fn test_batch_stops_on_first_failure() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let output = dir.path().to_string_lossy().replace('\\', "/");

    let config = BatchConfig::from_toml_str(&batch_toml(&output, false))?;
    let report = run_batch(&config).await?;

    assert_eq!(report.entries.len(), 2);
    assert!(!dir.path().join("vector_norms.json").exists());
    Ok(())
}

#[tokio::test]
async fn test_batch_rejects_missing_required_field() -> anyhow::Result<()> {
    let config = BatchConfig::from_toml_str(
        r#"
[batch]
name = "broken"
output_path = "./output"

[[analyses]]
kind = "sales-dashboard"
"#,
    )?;

    assert!(config.jobs().is_err());
    Ok(())
}
