// Library interface for healthreport
// Integration tests and benchmarks go through these modules

pub mod assembler;
pub mod catalog;
pub mod config;
pub mod derived;
pub mod error;
pub mod evaluation;
pub mod export;
pub mod layout;
pub mod logging;
pub mod models;
pub mod narrative;
pub mod report;
pub mod rules;
pub mod snapshot;

// Re-export commonly used types for convenience
pub use assembler::{AssembleOptions, Document, ReportAssembler, ReportHeader};
pub use catalog::{ids, MetricCatalog, MetricDefinition};
pub use config::AppConfig;
pub use derived::{DerivedMetrics, LookbackConfig};
pub use error::{HealthReportError, Result};
pub use evaluation::{EvaluationEngine, UnknownSexPolicy};
pub use layout::{Page, PageGeometry, PageItem};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use models::*;
pub use narrative::{NarrativeSummary, PromptBuilder};
pub use snapshot::HealthSnapshot;
