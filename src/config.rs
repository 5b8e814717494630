//! Layered configuration: built-in defaults, then environment variables,
//! then an optional YAML file. CLI flags are applied on top by the binary.

use crate::{Result, ScoutError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_DISCOVERY_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_COLLECTOR_TIMEOUT_SECS: u64 = 30;

pub const CONFIG_PATH_ENV: &str = "KUBESCOUT_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    /// Empty disables remote delivery.
    pub api_endpoint: String,
    pub token: String,
    pub insecure_skip_verify: bool,
    pub timeout_secs: u64,
}

impl CollectorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            api_endpoint: String::new(),
            token: String::new(),
            insecure_skip_verify: false,
            timeout_secs: DEFAULT_COLLECTOR_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    #[default]
    Stderr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            output: LogOutput::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub collector: CollectorConfig,
    pub log: LogConfig,
    pub discovery_interval: u64,
    /// Empty means "discover it".
    pub cluster_name: String,
    pub kubeconfig: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            collector: CollectorConfig::default(),
            log: LogConfig::default(),
            discovery_interval: DEFAULT_DISCOVERY_INTERVAL_SECS,
            cluster_name: String::new(),
            kubeconfig: None,
        }
    }
}

// Every field optional so a file only overrides what it mentions.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    collector: FileCollectorConfig,
    log: FileLogConfig,
    discovery_interval: Option<u64>,
    cluster_name: Option<String>,
    kubeconfig: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileCollectorConfig {
    api_endpoint: Option<String>,
    token: Option<String>,
    insecure_skip_verify: Option<bool>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileLogConfig {
    level: Option<String>,
    format: Option<LogFormat>,
    output: Option<LogOutput>,
}

impl Config {
    /// Loads from the process environment and the first config file found
    /// (`explicit_path`, `$KUBESCOUT_CONFIG`, `~/.kubescout/config.yaml`,
    /// `./config.yaml`).
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let env = |key: &str| std::env::var(key).ok();

        let mut config = Self::from_env_with(env);

        let path = explicit_path
            .map(Path::to_path_buf)
            .or_else(|| env(CONFIG_PATH_ENV).filter(|p| !p.is_empty()).map(PathBuf::from))
            .or_else(default_config_path);

        if let Some(path) = path {
            config.apply_file(&path)?;
        }

        Ok(config)
    }

    /// Defaults overridden by whatever `lookup` returns. Empty values count
    /// as unset and unparseable numbers or booleans are ignored.
    pub fn from_env_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let mut config = Self {
            collector: CollectorConfig {
                api_endpoint: var("COLLECTOR_API_ENDPOINT").unwrap_or_default(),
                token: var("COLLECTOR_TOKEN").unwrap_or_default(),
                insecure_skip_verify: var("COLLECTOR_INSECURE_SKIP_VERIFY")
                    .and_then(|v| parse_bool(&v))
                    .unwrap_or(defaults.collector.insecure_skip_verify),
                timeout_secs: var("COLLECTOR_TIMEOUT")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.collector.timeout_secs),
            },
            log: LogConfig {
                level: var("LOG_LEVEL").unwrap_or(defaults.log.level),
                format: match var("LOG_FORMAT").as_deref() {
                    Some("json") => LogFormat::Json,
                    Some("text") => LogFormat::Text,
                    _ => defaults.log.format,
                },
                output: match var("LOG_OUTPUT").as_deref() {
                    Some("stdout") => LogOutput::Stdout,
                    Some("stderr") => LogOutput::Stderr,
                    _ => defaults.log.output,
                },
            },
            discovery_interval: var("DISCOVERY_INTERVAL")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.discovery_interval),
            cluster_name: var("CLUSTER_NAME").unwrap_or_default(),
            kubeconfig: var("KUBECONFIG_PATH").map(PathBuf::from),
        };

        config.normalize();
        config
    }

    pub fn apply_file(&mut self, path: &Path) -> Result<()> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ScoutError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        self.apply_yaml(&text).map_err(|e| match e {
            ScoutError::ConfigError(msg) => {
                ScoutError::ConfigError(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    pub fn apply_yaml(&mut self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }

        let file: FileConfig = serde_yaml::from_str(text)
            .map_err(|e| ScoutError::ConfigError(format!("Invalid config file: {}", e)))?;

        let collector = &mut self.collector;
        set(&mut collector.api_endpoint, file.collector.api_endpoint);
        set(&mut collector.token, file.collector.token);
        set(
            &mut collector.insecure_skip_verify,
            file.collector.insecure_skip_verify,
        );
        set(&mut collector.timeout_secs, file.collector.timeout_secs);

        set(&mut self.log.level, file.log.level);
        set(&mut self.log.format, file.log.format);
        set(&mut self.log.output, file.log.output);

        set(&mut self.discovery_interval, file.discovery_interval);
        set(&mut self.cluster_name, file.cluster_name);
        if file.kubeconfig.is_some() {
            self.kubeconfig = file.kubeconfig;
        }

        self.normalize();
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.discovery_interval)
    }

    pub fn cluster_name_override(&self) -> Option<&str> {
        Some(self.cluster_name.as_str()).filter(|n| !n.is_empty())
    }

    fn normalize(&mut self) {
        if self.discovery_interval == 0 {
            self.discovery_interval = DEFAULT_DISCOVERY_INTERVAL_SECS;
        }
        if self.collector.timeout_secs == 0 {
            self.collector.timeout_secs = DEFAULT_COLLECTOR_TIMEOUT_SECS;
        }
    }
}

fn set<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "yes" => Some(true),
        "0" | "f" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".kubescout").join("config.yaml"))
        .filter(|p| p.is_file())
        .or_else(|| Some(PathBuf::from("config.yaml")).filter(|p| p.is_file()))
}
