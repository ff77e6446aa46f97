//! Client configuration loading

use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;
use crate::{Error, Result};

pub const DEFAULT_CONTROLLER_PORT: u16 = 5181;
pub const DEFAULT_PRIVATE_CONTROLLER_PORT: u16 = 5182;
pub const DEFAULT_HTTP_PORT: u16 = 80;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    pub host: String,
    pub controller_port: u16,
    pub private_controller_port: u16,
    pub http_port: u16,
    pub channel: ChannelConfig,
    pub polling: PollingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub max_retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_ms: u64,
    pub paused_policy: PausedPolicy,
}

/// How the poller treats a task reported as paused
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PausedPolicy {
    /// Abort the wait with a task-status error
    #[default]
    Fail,
    /// Keep polling until the task resumes or finishes
    Wait,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            controller_port: DEFAULT_CONTROLLER_PORT,
            private_controller_port: DEFAULT_PRIVATE_CONTROLLER_PORT,
            http_port: DEFAULT_HTTP_PORT,
            channel: ChannelConfig::default(),
            polling: PollingConfig::default(),
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            max_retry_attempts: 5,
            retry_delay_ms: 200,
            connect_timeout_secs: 5,
            request_timeout_secs: 30,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            paused_policy: PausedPolicy::Fail,
        }
    }
}

impl ClientConfig {
    /// Configuration for `host` with every other field defaulted
    pub fn for_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    pub fn load_from_path(config_path: &str) -> Result<Self> {
        let contents = fs::read_to_string(config_path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", config_path, e)))?;
        Self::load_from_str(&contents)
    }

    pub fn load_from_str(contents: &str) -> Result<Self> {
        let config: ClientConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::Config("host must not be empty".to_string()));
        }
        if self.polling.interval_ms == 0 {
            return Err(Error::Config("polling.interval_ms must be positive".to_string()));
        }
        if self.controller_port == self.private_controller_port {
            return Err(Error::Config(format!(
                "controller_port and private_controller_port are both {}",
                self.controller_port
            )));
        }
        Ok(())
    }

    /// Base URL of the task-management endpoint
    pub fn http_base_url(&self) -> String {
        if self.http_port == DEFAULT_HTTP_PORT {
            format!("http://{}", self.host)
        } else {
            format!("http://{}:{}", self.host, self.http_port)
        }
    }

    pub fn controller_url(&self) -> String {
        format!("http://{}:{}", self.host, self.controller_port)
    }

    pub fn private_controller_url(&self) -> String {
        format!("http://{}:{}", self.host, self.private_controller_port)
    }
}

impl ChannelConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}
