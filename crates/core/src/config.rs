use crate::lifecycle::logging::LogFormat;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

// ─── Config ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,

    // Request body size limit (MB)
    pub body_limit_mb: usize,

    // Seconds to let in-flight responses drain after shutdown is requested
    pub shutdown_timeout: u64,

    // Logging
    pub log_level: Option<String>,
    pub log_format: LogFormat,
    pub logging_to_file: bool,
    pub log_dir: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            body_limit_mb: 1,
            shutdown_timeout: 5,
            log_level: None,
            log_format: LogFormat::Text,
            logging_to_file: false,
            log_dir: None,
        }
    }
}

impl Config {
    /// Load config from a YAML file, sanitize, and validate.
    pub fn load(path: &str) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse, sanitize and validate YAML contents.
    pub fn from_yaml(contents: &str) -> Result<Self, anyhow::Error> {
        let mut config: Config = serde_yaml_ng::from_str(contents)?;
        config.sanitize();
        config.validate()?;
        Ok(config)
    }

    /// Socket address string to bind.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_mb * 1024 * 1024
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        anyhow::ensure!(!self.host.is_empty(), "host must not be empty");
        anyhow::ensure!(self.port != 0, "port must not be 0");
        anyhow::ensure!(self.body_limit_mb > 0, "body-limit-mb must be positive");
        if let Some(ref level) = self.log_level {
            EnvFilter::try_new(level)
                .map_err(|e| anyhow::anyhow!("invalid log-level '{level}': {e}"))?;
        }
        Ok(())
    }

    fn sanitize(&mut self) {
        self.host = self.host.trim().to_string();
        self.log_level = non_empty(self.log_level.take());
        self.log_dir = non_empty(self.log_dir.take());
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
