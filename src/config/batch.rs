use crate::app::{Job, RunContext};
use crate::config::analysis::AnalysisSpec;
use crate::core::ConfigProvider;
use crate::datasets::DEFAULT_SEED;
use crate::domain::model::RunSummary;
use crate::utils::error::{Result, StatsError};
use crate::utils::validation::{validate_non_empty_string, validate_path, Validate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A TOML file listing analyses to run in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    pub batch: BatchSection,
    pub monitoring: Option<MonitoringConfig>,
    #[serde(default)]
    pub analyses: Vec<AnalysisSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSection {
    pub name: String,
    pub description: Option<String>,
    pub output_path: String,
    pub seed: Option<u64>,
    pub render_charts: Option<bool>,
    pub continue_on_error: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub system_stats: Option<bool>,
}

impl BatchConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(StatsError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| StatsError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| StatsError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("batch.name", &self.batch.name)?;
        validate_path("batch.output_path", &self.batch.output_path)?;

        if self.analyses.is_empty() {
            return Err(StatsError::ConfigValidationError {
                field: "analyses".to_string(),
                message: "at least one [[analyses]] entry is required".to_string(),
            });
        }
        for spec in &self.analyses {
            spec.validate()?;
        }
        Ok(())
    }

    pub fn output_path(&self) -> &str {
        &self.batch.output_path
    }

    pub fn seed(&self) -> u64 {
        self.batch.seed.unwrap_or(DEFAULT_SEED)
    }

    pub fn render_charts(&self) -> bool {
        self.batch.render_charts.unwrap_or(true)
    }

    pub fn continue_on_error(&self) -> bool {
        self.batch.continue_on_error.unwrap_or(false)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring
            .as_ref()
            .map(|m| m.enabled && m.system_stats.unwrap_or(true))
            .unwrap_or(false)
    }

    pub fn run_context(&self) -> RunContext {
        let mut ctx = RunContext::from_config(self);
        ctx.render_charts = self.render_charts();
        ctx.monitor = self.monitoring_enabled();
        ctx
    }

    /// Every configured analysis as a runnable job, in file order.
    pub fn jobs(&self) -> Result<Vec<Job>> {
        self.analyses.iter().map(|spec| spec.to_job(self.seed())).collect()
    }
}

impl ConfigProvider for BatchConfig {
    fn output_path(&self) -> &str {
        &self.batch.output_path
    }

    fn seed(&self) -> u64 {
        self.seed()
    }
}

impl Validate for BatchConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

/// Outcome of one analysis in `run_report.json`.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub analysis: String,
    pub succeeded: bool,
    pub written: Vec<String>,
    pub error: Option<String>,
}

impl ReportEntry {
    pub fn from_result(analysis: &str, result: &Result<RunSummary>) -> Self {
        match result {
            Ok(summary) => Self {
                analysis: analysis.to_string(),
                succeeded: true,
                written: summary.written.clone(),
                error: None,
            },
            Err(e) => Self {
                analysis: analysis.to_string(),
                succeeded: false,
                written: Vec::new(),
                error: Some(e.user_friendly_message()),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub batch: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub seed: u64,
    pub entries: Vec<ReportEntry>,
}

impl RunReport {
    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|e| !e.succeeded).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::analysis::AnalysisKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC: &str = r#"
[batch]
name = "weekly-stats"
output_path = "./stats-output"
seed = 7
render_charts = false

[monitoring]
enabled = true

[[analyses]]
kind = "dispersion"
input = "data/loans.csv"
column = "income"

[[analyses]]
kind = "sampling"
technique = "cluster"
clusters = 4

[[analyses]]
kind = "generate"
dataset = "city-temps"
"#;

    #[test]
    fn test_parse_basic_batch_config() {
        let config = BatchConfig::from_toml_str(BASIC).unwrap();

        assert_eq!(config.batch.name, "weekly-stats");
        assert_eq!(config.seed(), 7);
        assert!(!config.render_charts());
        assert!(config.monitoring_enabled());
        assert_eq!(config.analyses.len(), 3);
        assert_eq!(config.analyses[0].kind, AnalysisKind::Dispersion);
        assert!(config.validate().is_ok());

        let jobs = config.jobs().unwrap();
        let names: Vec<&str> = jobs.iter().map(Job::name).collect();
        assert_eq!(names, vec!["dispersion", "cluster", "generate"]);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("STATS_TEST_DATA_DIR", "/srv/data");

        let toml_content = r#"
[batch]
name = "env"
output_path = "${STATS_TEST_DATA_DIR}/out"

[[analyses]]
kind = "central-tendency"
input = "${STATS_TEST_DATA_DIR}/loans.csv"
"#;

        let config = BatchConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.output_path(), "/srv/data/out");
        assert_eq!(config.analyses[0].input.as_deref(), Some("/srv/data/loans.csv"));

        std::env::remove_var("STATS_TEST_DATA_DIR");
    }

    #[test]
    fn test_unset_env_var_is_kept() {
        let content = BatchConfig::substitute_env_vars("path = \"${STATS_TEST_NOT_SET}\"").unwrap();
        assert_eq!(content, "path = \"${STATS_TEST_NOT_SET}\"");
    }

    #[test]
    fn test_config_validation() {
        let empty = r#"
[batch]
name = "empty"
output_path = "./output"
"#;
        let config = BatchConfig::from_toml_str(empty).unwrap();
        assert!(config.validate().is_err());

        let bad_step = r#"
[batch]
name = "bad"
output_path = "./output"

[[analyses]]
kind = "sampling"
technique = "systematic"
step = 0
"#;
        let config = BatchConfig::from_toml_str(bad_step).unwrap();
        assert!(matches!(
            config.validate(),
            Err(StatsError::InvalidConfigValueError { .. })
        ));
    }

    #[test]
    fn test_unknown_kind_is_parse_error() {
        let content = r#"
[batch]
name = "x"
output_path = "./output"

[[analyses]]
kind = "regression"
"#;
        assert!(matches!(
            BatchConfig::from_toml_str(content),
            Err(StatsError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC.as_bytes()).unwrap();

        let config = BatchConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.batch.name, "weekly-stats");
        let ctx = config.run_context();
        assert_eq!(ctx.output_path, "./stats-output");
        assert_eq!(ctx.seed, 7);
        assert!(!ctx.render_charts);
        assert!(ctx.monitor);
    }

    #[test]
    fn test_report_entry_from_error() {
        let result: Result<RunSummary> = Err(StatsError::empty_data("no rows"));
        let entry = ReportEntry::from_result("dispersion", &result);
        assert!(!entry.succeeded);
        assert!(entry.error.is_some());
    }
}
