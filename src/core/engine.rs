use crate::domain::model::RunSummary;
use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Drives a [`Pipeline`] through extract, transform and load.
pub struct AnalysisEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> AnalysisEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        tracing::info!("🚀 Starting analysis...");
        self.monitor.log_stats("Start");

        // Extract
        tracing::info!("📥 Extracting data...");
        let data = self.pipeline.extract().await?;
        tracing::info!("📊 Extracted {} rows", data.len());
        self.monitor.log_stats("Extract");

        // Transform
        tracing::info!("🔄 Computing statistics...");
        let output = self.pipeline.transform(data).await?;
        tracing::info!(
            "📊 {}: {} summary lines, {} artifacts",
            output.title,
            output.summary.len(),
            output.artifacts.len()
        );
        self.monitor.log_stats("Transform");

        // Load
        tracing::info!("💾 Writing outputs...");
        let summary = self.pipeline.load(output).await?;
        for file in &summary.written {
            tracing::info!("📁 {}", file);
        }
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(summary)
    }
}
