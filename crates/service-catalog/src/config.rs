//! Configuration structures for the catalog watcher and the Consul source

use crate::attributes::AttributeKeys;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default long-poll wait
pub const DEFAULT_WAIT_TIME: Duration = Duration::from_secs(30);

/// Default pause after a failed registry call
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(15);

/// Default Consul HTTP address
pub const DEFAULT_CONSUL_ADDR: &str = "http://127.0.0.1:8500";

/// Watcher configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherConfig {
    /// How long a single long-poll call may block
    pub wait_time: Duration,
    /// Pause before retrying after a failed call
    pub retry_interval: Duration,
    /// Tag keys holding the display name and address
    pub keys: AttributeKeys,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            wait_time: DEFAULT_WAIT_TIME,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            keys: AttributeKeys::default(),
        }
    }
}

impl WatcherConfig {
    /// Set the long-poll wait
    pub fn with_wait_time(mut self, wait_time: Duration) -> Self {
        self.wait_time = wait_time;
        self
    }

    /// Set the retry interval
    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// Set the recognized tag keys
    pub fn with_keys(mut self, keys: AttributeKeys) -> Self {
        self.keys = keys;
        self
    }
}

/// Consul agent connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsulConfig {
    /// Agent HTTP address, with or without scheme (e.g., "127.0.0.1:8500")
    #[serde(default = "default_consul_addr")]
    pub address: String,
    /// ACL token sent as `X-Consul-Token`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Datacenter to query instead of the agent's own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacenter: Option<String>,
}

fn default_consul_addr() -> String {
    DEFAULT_CONSUL_ADDR.to_string()
}

impl Default for ConsulConfig {
    fn default() -> Self {
        Self {
            address: default_consul_addr(),
            token: None,
            datacenter: None,
        }
    }
}

impl ConsulConfig {
    /// Create a configuration for the given address
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// Normalized base URL of the agent, without trailing slash
    pub fn base_url(&self) -> Result<String> {
        let address = self.address.trim();
        if address.is_empty() {
            return Err(Error::InvalidConfig("empty Consul address".to_string()));
        }

        let address = if address.contains("://") {
            address.to_string()
        } else {
            format!("http://{}", address)
        };

        let url = reqwest::Url::parse(&address)
            .map_err(|e| Error::InvalidConfig(format!("Consul address {}: {}", address, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::InvalidConfig(format!(
                "unsupported Consul scheme: {}",
                url.scheme()
            )));
        }

        Ok(url.as_str().trim_end_matches('/').to_string())
    }
}
