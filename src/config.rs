use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::derived::LookbackConfig;
use crate::evaluation::UnknownSexPolicy;
use crate::layout::PageGeometry;
use crate::logging::LogConfig;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Page geometry handed to the layout engine
    #[serde(default)]
    pub layout: PageGeometry,

    /// Evaluation policies
    #[serde(default)]
    pub evaluation: EvaluationSettings,

    /// Lookback windows and protein factor
    #[serde(default)]
    pub derived: LookbackConfig,

    /// Default report options
    #[serde(default)]
    pub report: ReportSettings,

    /// Logging output
    #[serde(default)]
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Evaluation policies
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationSettings {
    /// Table used for sex-dependent metrics when sex is unknown
    pub unknown_sex_policy: UnknownSexPolicy,
}

/// Default report options, overridable per CLI call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Append the composed narrative page
    pub include_narrative: bool,

    /// Add gait and respiratory sections
    pub extended_sections: bool,
}

impl Default for ReportSettings {
    fn default() -> Self {
        ReportSettings {
            include_narrative: true,
            extended_sections: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            layout: PageGeometry::default(),
            evaluation: EvaluationSettings::default(),
            derived: LookbackConfig::default(),
            report: ReportSettings::default(),
            logging: LogConfig::default(),
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;

        config
            .layout
            .validate()
            .with_context(|| format!("Invalid [layout] in {}", path.as_ref().display()))?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".healthreport")
            .join("config.toml")
    }

    /// Load the file at `path` (or the default location), falling back to defaults
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);

        if !config_path.exists() {
            return Self::default();
        }

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Ignoring config {}: {:#}", config_path.display(), e);
                Self::default()
            }
        }
    }

    /// Save configuration to default location
    pub fn save_default(&mut self) -> Result<PathBuf> {
        let config_path = Self::default_config_path();
        self.save_to_file(&config_path)?;
        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.metadata.version, deserialized.metadata.version);
        assert_eq!(config.layout, deserialized.layout);
        assert_eq!(config.derived, deserialized.derived);
        assert_eq!(config.logging, deserialized.logging);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml_str = r#"
            [metadata]
            version = "1.0"
            created_at = "2024-05-01T00:00:00Z"
            updated_at = "2024-05-01T00:00:00Z"

            [evaluation]
            unknown_sex_policy = "unmeasured"

            [layout]
            entry_height = 90.0
        "#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(config.evaluation.unknown_sex_policy, UnknownSexPolicy::Unmeasured);
        assert_eq!(config.layout.entry_height, 90.0);
        assert_eq!(config.layout.page_height, PageGeometry::a4().page_height);
        assert_eq!(config.derived.protein_factor, dec!(1.2));
        assert!(config.report.include_narrative);
    }

    #[test]
    fn test_config_file_io() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original = AppConfig::default();
        original.derived.sleep_days = 14;
        original.report.extended_sections = true;

        original.save_to_file(&config_path).unwrap();
        let loaded = AppConfig::load_from_file(&config_path).unwrap();

        assert_eq!(loaded.derived.sleep_days, 14);
        assert!(loaded.report.extended_sections);
    }

    #[test]
    fn test_invalid_layout_rejected_on_load() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let mut config = AppConfig::default();
        config.layout.entry_height = -4.0;
        config.save_to_file(&config_path).unwrap();

        assert!(AppConfig::load_from_file(&config_path).is_err());
        assert_eq!(
            AppConfig::load_or_default(Some(&config_path)).layout,
            PageGeometry::default()
        );
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let temp_dir = tempdir().unwrap();
        let config = AppConfig::load_or_default(Some(&temp_dir.path().join("absent.toml")));
        assert_eq!(config.report, ReportSettings::default());
    }
}
