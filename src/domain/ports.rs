use crate::domain::model::{AnalysisOutput, RunSummary, Table};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Absolute location of `path`, for writers that need a filesystem path.
    fn resolve(&self, path: &str) -> PathBuf;
}

pub trait ConfigProvider: Send + Sync {
    fn output_path(&self) -> &str;
    fn seed(&self) -> u64;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Table>;
    async fn transform(&self, data: Table) -> Result<AnalysisOutput>;
    async fn load(&self, output: AnalysisOutput) -> Result<RunSummary>;
}

/// The analysis-specific half of a pipeline; loading is shared.
#[async_trait]
pub trait Analysis: Send + Sync {
    fn name(&self) -> &str;
    async fn extract(&self) -> Result<Table>;
    fn transform(&self, data: Table) -> Result<AnalysisOutput>;
}
