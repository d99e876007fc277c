pub mod analysis;
pub mod batch;
pub mod cli;

#[cfg(feature = "cli")]
pub mod args;

pub use analysis::{AnalysisKind, AnalysisSpec};
pub use batch::{BatchConfig, ReportEntry, RunReport};

#[cfg(feature = "cli")]
pub use args::{CliConfig, Command};
