//! Trace configuration and management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::severity::TraceSeverity;
use crate::{Error, Result};

/// Trace source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceConfig {
    /// Trace source name reported to listeners.
    pub source_name: String,

    /// Minimum severity dispatched to listeners.
    pub min_severity: TraceSeverity,

    /// In-memory log retention settings.
    pub retention: RetentionSettings,
}

/// In-memory retention settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionSettings {
    /// Capture rendered log lines in the retention buffer.
    pub enabled: bool,

    /// Maximum age of a captured line (in seconds).
    pub window_secs: u64,
}

impl RetentionSettings {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            source_name: "serval-client".to_string(),
            min_severity: TraceSeverity::Information,
            retention: RetentionSettings {
                enabled: false,
                window_secs: 600,
            },
        }
    }
}

impl TraceConfig {
    /// Load configuration from file or create default.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config_file = match config_path {
            Some(path) => path.to_path_buf(),
            None => Self::default_config_path()?,
        };

        if config_file.exists() {
            let content = std::fs::read_to_string(&config_file)?;
            let config: TraceConfig = toml::from_str(&content).map_err(|e| Error::Config {
                message: format!("Failed to parse trace config: {}", e),
            })?;
            Ok(config)
        } else {
            let mut config = Self::default();
            config.load_env_overrides();
            Ok(config)
        }
    }

    /// Save configuration to file.
    pub fn save(&self, config_path: Option<&Path>) -> Result<()> {
        let config_file = match config_path {
            Some(path) => path.to_path_buf(),
            None => Self::default_config_path()?,
        };

        if let Some(parent) = config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| Error::Config {
            message: format!("Failed to serialize trace config: {}", e),
        })?;

        std::fs::write(&config_file, content)?;
        Ok(())
    }

    /// Load environment variable overrides.
    pub fn load_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("SERVAL_TRACE_LEVEL") {
            self.min_severity = match level.to_uppercase().as_str() {
                "CRITICAL" => TraceSeverity::Critical,
                "ERROR" => TraceSeverity::Error,
                "WARNING" => TraceSeverity::Warning,
                "INFORMATION" => TraceSeverity::Information,
                "VERBOSE" => TraceSeverity::Verbose,
                _ => self.min_severity,
            };
        }

        if let Ok(enabled) = std::env::var("SERVAL_LOG_RETENTION") {
            self.retention.enabled = enabled.parse().unwrap_or(self.retention.enabled);
        }

        if let Ok(secs) = std::env::var("SERVAL_LOG_RETENTION_SECS") {
            self.retention.window_secs = secs.parse().unwrap_or(self.retention.window_secs);
        }
    }

    /// Get default configuration file path.
    fn default_config_path() -> Result<PathBuf> {
        let project_dirs =
            ProjectDirs::from("com", "serval", "serval").ok_or_else(|| Error::Config {
                message: "Could not determine config directory".to_string(),
            })?;

        Ok(project_dirs.config_dir().join("trace.toml"))
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.source_name.is_empty() {
            return Err(Error::Config {
                message: "source_name must not be empty".to_string(),
            });
        }

        if self.retention.enabled && self.retention.window_secs == 0 {
            return Err(Error::Config {
                message: "retention window_secs must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}
