//! Unified error hierarchy for healthreport
//!
//! Per-entry data problems never reach this module: a missing or unusable
//! value degrades to an `unmeasured` evaluation. Only structural and
//! configuration problems surface as errors.

use thiserror::Error;

use crate::export::ExportError;
use crate::layout::PageGeometry;

/// Top-level error type for all report operations
#[derive(Debug, Error)]
pub enum HealthReportError {
    /// Metric catalog is malformed (fatal at startup)
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Page geometry passed to the layout engine is unusable
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    /// Snapshot input could not be read or is inconsistent
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Rendering or export failed
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Metric catalog validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Duplicate metric id: {id}")]
    DuplicateId { id: String },

    #[error("Section {section} references unknown metric: {id}")]
    UnknownMetric { section: String, id: String },

    #[error("No evaluation rule for metric: {id}")]
    MissingRule { id: String },

    #[error("Section {section} has no metrics")]
    EmptySection { section: String },
}

/// Pagination errors, all of them caller configuration bugs
#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("Invalid page geometry: {parameter}={value}")]
    InvalidGeometry { parameter: &'static str, value: f64 },

    #[error("Entry height {entry_height} exceeds usable page height {available}")]
    EntryTooTall { entry_height: f64, available: f64 },
}

/// Snapshot loading errors
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to parse snapshot: {reason}")]
    Parse { reason: String },

    #[error("Invalid snapshot field {field}: {reason}")]
    Invalid { field: String, reason: String },
}

/// Result type alias for report operations
pub type Result<T> = std::result::Result<T, HealthReportError>;

impl HealthReportError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            HealthReportError::Catalog(_) => ErrorSeverity::Critical,
            HealthReportError::Layout(_) => ErrorSeverity::Error,
            HealthReportError::Configuration(_) => ErrorSeverity::Error,
            HealthReportError::Snapshot(SnapshotError::Invalid { .. }) => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            HealthReportError::Catalog(_) => {
                "The metric catalog is inconsistent; this is a bug in the report definitions."
                    .to_string()
            }
            HealthReportError::Layout(LayoutError::InvalidGeometry { parameter, .. }) => {
                let bound = if PageGeometry::allows_zero(parameter) {
                    "zero or positive"
                } else {
                    "positive"
                };
                format!(
                    "Page geometry setting '{}' must be {}. Please check your configuration.",
                    parameter, bound
                )
            }
            HealthReportError::Layout(LayoutError::EntryTooTall { .. }) => {
                "Page margins leave no room for a single entry. Please check your configuration."
                    .to_string()
            }
            HealthReportError::Snapshot(SnapshotError::Parse { reason }) => {
                format!("Could not read health snapshot: {}", reason)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical error requiring a code fix
    Critical,
    /// Error that prevents the operation
    Error,
    /// Warning that doesn't prevent operation
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = HealthReportError::Catalog(CatalogError::DuplicateId {
            id: "bmi".to_string(),
        });
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.severity().to_tracing_level(), tracing::Level::ERROR);

        let err = HealthReportError::Snapshot(SnapshotError::Invalid {
            field: "readings.steps".to_string(),
            reason: "negative".to_string(),
        });
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert_eq!(err.severity().to_tracing_level(), tracing::Level::WARN);
    }

    #[test]
    fn test_user_messages() {
        let err = HealthReportError::Layout(LayoutError::InvalidGeometry {
            parameter: "entry_height",
            value: 0.0,
        });
        assert!(err.user_message().contains("entry_height"));
        assert!(err.user_message().contains("must be positive"));

        let err = HealthReportError::Layout(LayoutError::InvalidGeometry {
            parameter: "top_margin",
            value: -1.0,
        });
        assert!(err.user_message().contains("must be zero or positive"));

        let err = HealthReportError::Snapshot(SnapshotError::Parse {
            reason: "expected value".to_string(),
        });
        assert!(err.user_message().contains("Could not read"));
    }

    #[test]
    fn test_display_includes_context() {
        let err: HealthReportError = CatalogError::UnknownMetric {
            section: "Sleep".to_string(),
            id: "naps".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Catalog error: Section Sleep references unknown metric: naps"
        );
    }
}
