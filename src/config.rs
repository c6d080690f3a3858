//! Configuration system
//!
//! Provides centralized configuration management with:
//! - Environment variable support
//! - Config file loading (optional)
//! - Runtime defaults
//! - Validation and type safety

use crate::aggregation::ReportSettings;
use crate::errors::AnalyzerError;
use crate::parser::{Field, LineFormat};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Report limits
    pub report: ReportConfig,

    /// Log line layout
    pub format: FormatConfig,

    /// Output configuration
    pub output: OutputConfig,

    /// Paths configuration
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub top_ips: usize,
    pub top_urls: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub json_pretty: bool,
    pub color: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub log_directory: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "WARN".to_string(),
            format: "compact".to_string(),
            output: "console".to_string(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        let settings = ReportSettings::default();
        Self {
            top_ips: settings.top_ips,
            top_urls: settings.top_urls,
        }
    }
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            fields: Field::ALL.iter().map(|f| f.name().to_string()).collect(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json_pretty: true,
            color: true,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            log_directory: PathBuf::from("logs"),
        }
    }
}

const LOG_FORMATS: [&str; 3] = ["pretty", "compact", "json"];
const LOG_OUTPUTS: [&str; 3] = ["console", "file", "both"];

impl Config {
    /// Load configuration from an explicit file, or the first default location found,
    /// then apply environment overrides and validate.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default_paths()
                .into_iter()
                .find(|path| path.is_file())
                .map(|path| {
                    info!(config_file = %path.display(), "Loading configuration from file");
                    Self::load_from_file(&path)
                })
                .transpose()?
                .unwrap_or_default(),
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from("traffic-analyzer.toml"),
            PathBuf::from(".traffic-analyzer.toml"),
        ];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("traffic-analyzer").join("config.toml"));
        }
        paths
    }

    /// Load configuration from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        // Logging overrides
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }

        // Report overrides
        if let Ok(val) = env::var("TRAFFIC_ANALYZER_TOP_IPS") {
            self.report.top_ips = val.parse().context("Invalid TRAFFIC_ANALYZER_TOP_IPS")?;
        }
        if let Ok(val) = env::var("TRAFFIC_ANALYZER_TOP_URLS") {
            self.report.top_urls = val.parse().context("Invalid TRAFFIC_ANALYZER_TOP_URLS")?;
        }

        // Format override, comma separated
        if let Ok(val) = env::var("TRAFFIC_ANALYZER_FIELDS") {
            self.format.fields = val.split(',').map(|f| f.trim().to_string()).collect();
        }

        if let Ok(val) = env::var("TRAFFIC_ANALYZER_LOG_DIR") {
            self.paths.log_directory = PathBuf::from(val);
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), AnalyzerError> {
        if self.report.top_ips == 0 {
            return Err(AnalyzerError::config("report.top_ips must be greater than 0"));
        }
        if self.report.top_urls == 0 {
            return Err(AnalyzerError::config("report.top_urls must be greater than 0"));
        }

        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(AnalyzerError::config(format!(
                "logging.format must be one of {LOG_FORMATS:?}, got {:?}",
                self.logging.format
            )));
        }
        if !LOG_OUTPUTS.contains(&self.logging.output.as_str()) {
            return Err(AnalyzerError::config(format!(
                "logging.output must be one of {LOG_OUTPUTS:?}, got {:?}",
                self.logging.output
            )));
        }
        if self.logging.level.parse::<tracing::Level>().is_err() {
            warn!(
                level = %self.logging.level,
                "Unrecognised log level, falling back to filter syntax"
            );
        }

        self.line_format()?;

        Ok(())
    }

    pub fn line_format(&self) -> Result<LineFormat, AnalyzerError> {
        LineFormat::from_names(&self.format.fields)
    }

    pub fn report_settings(&self) -> ReportSettings {
        ReportSettings {
            top_ips: self.report.top_ips,
            top_urls: self.report.top_urls,
        }
    }
}
