pub mod app;
pub mod charts;
pub mod config;
pub mod core;
pub mod datasets;
pub mod domain;
pub mod preprocess;
pub mod sampling;
pub mod stats;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use app::{run_analysis, Job, RunContext};
pub use config::{cli::LocalStorage, AnalysisKind, AnalysisSpec, BatchConfig};
pub use core::{AnalysisEngine, AnalysisPipeline};
pub use utils::error::{Result, StatsError};
