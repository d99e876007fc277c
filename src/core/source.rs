use crate::datasets::{generate, DatasetKind};
use crate::domain::model::Table;
use crate::utils::error::Result;
use std::path::PathBuf;

/// Where an analysis gets its table: a CSV file, or a generated dataset when
/// no file is given.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSource {
    pub path: Option<PathBuf>,
    pub fallback: DatasetKind,
    pub rows: Option<usize>,
    pub seed: u64,
}

impl TableSource {
    pub fn file(path: impl Into<PathBuf>, fallback: DatasetKind) -> Self {
        Self {
            path: Some(path.into()),
            fallback,
            rows: None,
            seed: crate::datasets::DEFAULT_SEED,
        }
    }

    pub fn generated(kind: DatasetKind, seed: u64) -> Self {
        Self {
            path: None,
            fallback: kind,
            rows: None,
            seed,
        }
    }

    pub fn with_rows(mut self, rows: Option<usize>) -> Self {
        self.rows = rows;
        self
    }

    pub fn describe(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => format!("generated:{} (seed {})", self.fallback, self.seed),
        }
    }

    pub async fn load(&self) -> Result<Table> {
        match &self.path {
            Some(path) => read_table(path).await,
            None => {
                tracing::info!(
                    "📦 No input file given, generating the {} dataset",
                    self.fallback
                );
                generate(self.fallback, self.rows, self.seed)
            }
        }
    }
}

pub async fn read_table(path: &std::path::Path) -> Result<Table> {
    tracing::debug!("📁 Reading {}", path.display());
    let data = tokio::fs::read(path).await?;
    Table::from_csv_bytes(&data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("in.csv");
        std::fs::write(&path, "a,b\n1,2\n").unwrap();

        let source = TableSource::file(&path, DatasetKind::Loans);
        let table = source.load().await.unwrap();
        assert_eq!(table.headers, vec!["a", "b"]);
        assert!(source.describe().ends_with("in.csv"));
    }

    #[tokio::test]
    async fn test_generated_source() {
        let source = TableSource::generated(DatasetKind::HeightWeight, 1).with_rows(Some(10));
        assert_eq!(source.load().await.unwrap().len(), 10);
        assert!(source.describe().starts_with("generated:height-weight"));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let source = TableSource::file("/definitely/not/here.csv", DatasetKind::Loans);
        let err = source.load().await.unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
