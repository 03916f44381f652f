// src/config.rs

use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "certsweep.toml";

#[derive(Debug, Deserialize, Clone)]
pub struct DiscoveryConfig {
    #[serde(default = "default_crt_sh_url")]
    pub crt_sh_url: String,
    #[serde(default = "default_discovery_timeout")]
    pub timeout_secs: u64,
}

fn default_crt_sh_url() -> String {
    crate::discovery::client::DEFAULT_CRT_SH_URL.to_string()
}
fn default_discovery_timeout() -> u64 { 30 }

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            crt_sh_url: default_crt_sh_url(),
            timeout_secs: default_discovery_timeout(),
        }
    }
}

impl DiscoveryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProbeConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,
    #[serde(default = "default_tls_timeout_ms")]
    pub tls_timeout_ms: u64,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_port() -> u16 { 443 }
fn default_http_timeout_ms() -> u64 { crate::probe::DEFAULT_HTTP_TIMEOUT.as_millis() as u64 }
fn default_tls_timeout_ms() -> u64 { crate::inspect::DEFAULT_TLS_TIMEOUT.as_millis() as u64 }
fn default_max_concurrency() -> usize { crate::orchestrator::DEFAULT_MAX_CONCURRENCY }

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            http_timeout_ms: default_http_timeout_ms(),
            tls_timeout_ms: default_tls_timeout_ms(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl ProbeConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    pub fn tls_timeout(&self) -> Duration {
        Duration::from_millis(self.tls_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetadataConfig {
    #[serde(default = "default_metadata_file")]
    pub file: PathBuf,
}

fn default_metadata_file() -> PathBuf {
    PathBuf::from("certsweep-metadata.toml")
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            file: default_metadata_file(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        Ok(cfg)
    }

    /// Load an explicitly named file, or the default file if present.
    /// Only a missing *explicit* file is an error.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}
