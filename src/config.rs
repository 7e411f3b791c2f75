use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "aws-storage-mcp.toml";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: Server,
    pub aws: Aws,
    pub limits: Limits,
    pub logging: Logging,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Server {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
}
fn default_bind_addr() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

impl Default for Server {
    fn default() -> Self { Self { bind_addr: default_bind_addr(), port: default_port() } }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Aws {
    #[serde(default = "default_region")]
    pub region: String,
    /// Profile active at startup; `None` uses the default credential chain.
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default = "default_cli_path")]
    pub cli_path: String,
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,
    #[serde(default)]
    pub config_file: Option<PathBuf>,
    #[serde(default = "default_command_timeout_s")]
    pub command_timeout_s: u64,
}
fn default_region() -> String { "us-east-1".to_string() }
fn default_cli_path() -> String { "aws".to_string() }
fn default_command_timeout_s() -> u64 { 120 }

impl Default for Aws {
    fn default() -> Self {
        Self {
            region: default_region(),
            profile: None,
            cli_path: default_cli_path(),
            credentials_file: None,
            config_file: None,
            command_timeout_s: default_command_timeout_s(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Limits {
    #[serde(default = "default_max_request_kb")]
    pub max_request_kb: usize,
    /// Object bodies above this size are reported but not inlined.
    #[serde(default = "default_max_inline_object_kb")]
    pub max_inline_object_kb: u64,
}
fn default_max_request_kb() -> usize { 8 * 1024 }
fn default_max_inline_object_kb() -> u64 { 1024 }

impl Default for Limits {
    fn default() -> Self {
        Self { max_request_kb: default_max_request_kb(), max_inline_object_kb: default_max_inline_object_kb() }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Logging {
    #[serde(default)]
    pub format: LogFormat,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)?;
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            Ok(serde_json::from_str(&raw)?)
        } else {
            Ok(toml::from_str(&raw)?)
        }
    }

    /// Loads `explicit` if given, else the default file when present, else built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() { Self::load(fallback) } else { Ok(Self::default()) }
            }
        }
    }

    pub fn apply_env(&mut self) {
        if let Ok(region) = std::env::var("AWS_REGION") {
            if !region.trim().is_empty() { self.aws.region = region; }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.bind_addr.trim().is_empty() { anyhow::bail!("bind_addr must not be empty"); }
        if self.aws.region.trim().is_empty() { anyhow::bail!("aws.region must not be empty"); }
        if self.aws.cli_path.trim().is_empty() { anyhow::bail!("aws.cli_path must not be empty"); }
        if self.aws.command_timeout_s == 0 { anyhow::bail!("command_timeout_s must be > 0"); }
        if self.limits.max_request_kb == 0 { anyhow::bail!("max_request_kb must be > 0"); }
        if self.limits.max_inline_object_kb == 0 { anyhow::bail!("max_inline_object_kb must be > 0"); }
        if let Some(p) = &self.aws.profile {
            if p.trim().is_empty() { anyhow::bail!("aws.profile must not be empty when set"); }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.server.bind_addr, "0.0.0.0");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.aws.region, "us-east-1");
        assert_eq!(cfg.limits.max_inline_object_kb, 1024);
        assert_eq!(cfg.logging.format, LogFormat::Json);
        cfg.validate().unwrap();
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let cfg: Config = toml::from_str(
            "[server]\nport = 9000\n[aws]\nprofile = \"dev\"\n[logging]\nformat = \"pretty\"\n",
        )
        .unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.bind_addr, "0.0.0.0");
        assert_eq!(cfg.aws.profile.as_deref(), Some("dev"));
        assert_eq!(cfg.aws.cli_path, "aws");
        assert_eq!(cfg.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn zero_timeout_rejected() {
        let mut cfg = Config::default();
        cfg.aws.command_timeout_s = 0;
        assert!(cfg.validate().is_err());
    }
}
