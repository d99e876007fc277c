pub mod engine;
pub mod pipeline;
pub mod source;

pub use crate::domain::model::{AnalysisOutput, RunSummary, Table};
pub use crate::domain::ports::{Analysis, ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
pub use engine::AnalysisEngine;
pub use pipeline::{AnalysisPipeline, LoadOptions};
pub use source::{read_table, TableSource};
