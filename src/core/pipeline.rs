use crate::charts;
use crate::domain::model::{AnalysisOutput, Artifact, RunSummary, Table};
use crate::domain::ports::{Analysis, Pipeline, Storage};
use crate::utils::error::{Result, StatsError};
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// PNG rendering needs a system font; off skips charts.
    pub render_charts: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            render_charts: true,
        }
    }
}

/// Wraps an [`Analysis`] into a full [`Pipeline`] whose load phase writes
/// every artifact through the storage.
pub struct AnalysisPipeline<A: Analysis, S: Storage> {
    analysis: A,
    storage: S,
    options: LoadOptions,
}

impl<A: Analysis, S: Storage> AnalysisPipeline<A, S> {
    pub fn new(analysis: A, storage: S) -> Self {
        Self::with_options(analysis, storage, LoadOptions::default())
    }

    pub fn with_options(analysis: A, storage: S, options: LoadOptions) -> Self {
        Self {
            analysis,
            storage,
            options,
        }
    }

    pub fn analysis(&self) -> &A {
        &self.analysis
    }

    async fn write_chart(&self, name: &str, figure: &charts::Figure) -> Result<()> {
        let path = self.storage.resolve(name);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let figure = figure.clone();
        tokio::task::spawn_blocking(move || charts::render(&figure, &path))
            .await
            .map_err(|e| StatsError::ProcessingError {
                message: format!("chart task failed: {}", e),
            })?
    }
}

#[async_trait]
impl<A: Analysis, S: Storage> Pipeline for AnalysisPipeline<A, S> {
    async fn extract(&self) -> Result<Table> {
        tracing::debug!("🔍 Extracting input for {}", self.analysis.name());
        self.analysis.extract().await
    }

    async fn transform(&self, data: Table) -> Result<AnalysisOutput> {
        self.analysis.transform(data)
    }

    async fn load(&self, output: AnalysisOutput) -> Result<RunSummary> {
        let mut written = Vec::new();

        for artifact in &output.artifacts {
            match artifact {
                Artifact::Csv { name, table } => {
                    self.storage.write_file(name, &table.to_csv_bytes()?).await?;
                }
                Artifact::Json { name, value } => {
                    let data = serde_json::to_vec_pretty(value)?;
                    self.storage.write_file(name, &data).await?;
                }
                Artifact::Chart { name, figure } => {
                    if !self.options.render_charts {
                        tracing::debug!("⏭️ Skipping chart {}", name);
                        continue;
                    }
                    self.write_chart(name, figure).await?;
                }
            }
            tracing::debug!("💾 Wrote {}", artifact.name());
            written.push(self.storage.resolve(artifact.name()).display().to_string());
        }

        Ok(RunSummary {
            title: output.title,
            summary: output.summary,
            written,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{Layer, Plot, Rgb};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                StatsError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }

        fn resolve(&self, path: &str) -> PathBuf {
            PathBuf::from("mock").join(path)
        }
    }

    struct FixedAnalysis;

    #[async_trait]
    impl Analysis for FixedAnalysis {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn extract(&self) -> Result<Table> {
            Table::from_csv_bytes(b"x\n1\n2\n3\n")
        }

        fn transform(&self, data: Table) -> Result<AnalysisOutput> {
            let mut output = AnalysisOutput::new("Fixed");
            output.line("rows", data.len());
            output.artifact(Artifact::Csv {
                name: "out/data.csv".to_string(),
                table: data,
            });
            output.artifact(Artifact::Json {
                name: "out/summary.json".to_string(),
                value: serde_json::json!({ "rows": 3 }),
            });
            output.artifact(Artifact::Chart {
                name: "out/chart.png".to_string(),
                figure: Plot::new("c")
                    .layer(Layer::line(vec![(0.0, 0.0), (1.0, 1.0)], Rgb::RED))
                    .into(),
            });
            Ok(output)
        }
    }

    #[tokio::test]
    async fn test_load_writes_tables_and_json() {
        let storage = MockStorage::default();
        let pipeline = AnalysisPipeline::with_options(
            FixedAnalysis,
            storage.clone(),
            LoadOptions {
                render_charts: false,
            },
        );

        let data = pipeline.extract().await.unwrap();
        let output = pipeline.transform(data).await.unwrap();
        let summary = pipeline.load(output).await.unwrap();

        assert_eq!(summary.written.len(), 2);
        assert_eq!(
            storage.get_file("out/data.csv").await.unwrap(),
            b"x\n1\n2\n3\n"
        );
        let json: serde_json::Value =
            serde_json::from_slice(&storage.get_file("out/summary.json").await.unwrap()).unwrap();
        assert_eq!(json["rows"], 3);
        assert!(storage.get_file("out/chart.png").await.is_none());
        assert!(storage.read_file("out/chart.png").await.is_err());
    }
}
