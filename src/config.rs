//! Application configuration loaded from TOML
//!
//! Every section is optional; a missing file section falls back to its
//! defaults.
//!
//! ```toml
//! release = "4.16"
//!
//! [report]
//! min_runs = 7
//! success_threshold = 0.98
//! promotion_variant = "JobTier:promote"
//!
//! [[classifier.rule]]
//! dimension = "Platform"
//! value = "aws"
//! pattern = "-aws"
//!
//! [ingest]
//! known_suites = ["openshift-tests"]
//! ```

use crate::ingest::IngestConfig;
use crate::report::ReportConfig;
use crate::variant::ClassifierConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Release the processed runs belong to
    pub release: String,
    pub report: ReportConfig,
    pub classifier: ClassifierConfig,
    pub ingest: IngestConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            release: "main".to_string(),
            report: ReportConfig::default(),
            classifier: ClassifierConfig::default(),
            ingest: IngestConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load and validate a configuration file
    ///
    /// # Errors
    /// Returns error if the file can't be read, isn't valid TOML, or the
    /// report section fails validation.
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read config file: {}", path.as_ref().display())
        })?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content).context("Failed to parse TOML config")?;
        config
            .report
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid [report] section: {}", e))?;
        if config.release.trim().is_empty() {
            anyhow::bail!("release must not be empty");
        }
        Ok(config)
    }

    /// Configuration from `path`, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_toml(p),
            None => Ok(Self::default()),
        }
    }
}
