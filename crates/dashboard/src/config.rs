//! Dashboard configuration
//!
//! Values come from an optional YAML or JSON file, then command-line flags
//! and environment variables override individual fields.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use service_catalog::attributes::{DEFAULT_ADDRESS_TAG, DEFAULT_NAME_TAG};
use service_catalog::{AttributeKeys, ConsulConfig, WatcherConfig};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

/// Default listen address, Go-style (all interfaces)
pub const DEFAULT_LISTEN_ADDR: &str = ":1234";

/// Longest blocking query Consul honors (10 minutes)
pub const MAX_WAIT_TIME_SECS: u64 = 600;

/// Top-level dashboard configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// HTTP listen address (e.g., ":1234" or "127.0.0.1:8080")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Consul agent to watch
    #[serde(default)]
    pub consul: ConsulConfig,
    /// Watch loop settings
    #[serde(default)]
    pub watch: WatchSettings,
}

/// Watch loop settings as they appear in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchSettings {
    /// Long-poll wait in seconds
    #[serde(default = "default_wait_time_secs")]
    pub wait_time_secs: u64,
    /// Pause after a failed call in seconds
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,
    /// Tag key holding the display name
    #[serde(default = "default_name_tag")]
    pub name_tag: String,
    /// Tag key holding the address
    #[serde(default = "default_address_tag")]
    pub address_tag: String,
}

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

fn default_wait_time_secs() -> u64 {
    30
}

fn default_retry_interval_secs() -> u64 {
    15
}

fn default_name_tag() -> String {
    DEFAULT_NAME_TAG.to_string()
}

fn default_address_tag() -> String {
    DEFAULT_ADDRESS_TAG.to_string()
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            wait_time_secs: default_wait_time_secs(),
            retry_interval_secs: default_retry_interval_secs(),
            name_tag: default_name_tag(),
            address_tag: default_address_tag(),
        }
    }
}

impl WatchSettings {
    /// Build the watcher configuration
    pub fn watcher_config(&self) -> Result<WatcherConfig> {
        if self.wait_time_secs == 0 {
            bail!("watch.wait_time_secs must be greater than zero");
        }
        if self.wait_time_secs > MAX_WAIT_TIME_SECS {
            bail!(
                "watch.wait_time_secs must be at most {} (got {})",
                MAX_WAIT_TIME_SECS,
                self.wait_time_secs
            );
        }
        if self.name_tag.is_empty() || self.address_tag.is_empty() {
            bail!("watch tag keys must not be empty");
        }
        if self.name_tag == self.address_tag {
            bail!("watch.name_tag and watch.address_tag must differ");
        }

        Ok(WatcherConfig::default()
            .with_wait_time(Duration::from_secs(self.wait_time_secs))
            .with_retry_interval(Duration::from_secs(self.retry_interval_secs))
            .with_keys(AttributeKeys::new(&self.name_tag, &self.address_tag)))
    }
}

/// Values given on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Listen address
    pub listen_addr: Option<String>,
    /// Consul agent address
    pub consul_addr: Option<String>,
    /// Consul ACL token
    pub consul_token: Option<String>,
    /// Consul datacenter
    pub datacenter: Option<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            consul: ConsulConfig::default(),
            watch: WatchSettings::default(),
        }
    }
}

impl DashboardConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        // YAML by extension, JSON otherwise
        let config = match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))?,
            _ => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))?,
        };

        Ok(config)
    }

    /// Apply command-line and environment overrides
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(listen_addr) = overrides.listen_addr {
            self.listen_addr = listen_addr;
        }
        if let Some(address) = overrides.consul_addr {
            self.consul.address = address;
        }
        if overrides.consul_token.is_some() {
            self.consul.token = overrides.consul_token;
        }
        if overrides.datacenter.is_some() {
            self.consul.datacenter = overrides.datacenter;
        }
    }

    /// Resolve the listen address to a socket address
    pub fn resolve_listen_addr(&self) -> Result<SocketAddr> {
        let addr = self.listen_addr.trim();
        // ":1234" listens on every interface
        let addr = match addr.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{}", port),
            None => addr.to_string(),
        };

        if let Ok(socket_addr) = addr.parse() {
            return Ok(socket_addr);
        }

        addr.to_socket_addrs()
            .with_context(|| format!("Invalid listen address: {}", self.listen_addr))?
            .next()
            .with_context(|| format!("Listen address {} resolved to nothing", self.listen_addr))
    }
}
