//! Listening statistics from exported streaming history.
//!
//! The pipeline runs loader → normalizer → aggregator → milestones → report.
//! Callers normally only need [`analyze`] and [`export`].

pub mod aggregator;
pub mod analysis;
pub mod config;
pub mod error;
pub mod export;
pub mod loader;
pub mod logging;
pub mod milestones;
pub mod normalizer;
pub mod report;
pub mod sources;
pub mod types;
pub mod utils;

pub use analysis::{AnalysisOptions, LoadSummary, analyze, analyze_with, summarize};
pub use error::{ExportError, FileError, LoadError, Rejection};
pub use export::export;
pub use sources::{HistorySource, SourceRegistry};
pub use types::{AnalysisResult, PlayEvent};
