//! Client configuration.
//!
//! Every knob follows the same precedence: explicit builder value, then the
//! environment, then a hard default. Exactly one addressing strategy is
//! active per config: an explicit host:port, a registry lookup (local mode
//! without an address), or a remote base URL with a credential.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

use crate::core::{ClientError, Result};

pub const ENV_API_KEY: &str = "AGENTLINE_API_KEY";
pub const ENV_BASE_URL: &str = "AGENTLINE_BASE_URL";
pub const ENV_LOCAL: &str = "AGENTLINE_LOCAL";
pub const ENV_HOST: &str = "AGENTLINE_HOST";
pub const ENV_PORT: &str = "AGENTLINE_PORT";
pub const ENV_TIMEOUT_SECONDS: &str = "AGENTLINE_TIMEOUT_SECONDS";
pub const ENV_STREAM_TIMEOUT_SECONDS: &str = "AGENTLINE_STREAM_TIMEOUT_SECONDS";
pub const ENV_REGISTRY_PATH: &str = "AGENTLINE_REGISTRY_PATH";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8450;
pub const DEFAULT_REGISTRY_PATH: &str = ".agentline/registry";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
const DEFAULT_STREAM_TIMEOUT: Duration = Duration::from_secs(600);

/// Immutable configuration for one [`crate::AgentClient`].
#[derive(Debug, Clone)]
pub struct AgentClientConfig {
    pub agent_id: String,
    pub entrypoint_tag: String,
    pub local: bool,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub api_key: Option<String>,
    pub base_url: Option<Url>,
    pub request_timeout: Duration,
    pub stream_timeout: Duration,
    pub registry_path: PathBuf,
}

impl AgentClientConfig {
    pub fn builder(
        agent_id: impl Into<String>,
        entrypoint_tag: impl Into<String>,
    ) -> AgentClientConfigBuilder {
        AgentClientConfigBuilder::new(agent_id, entrypoint_tag)
    }

    /// Explicit address, if one is configured.
    pub fn address(&self) -> Option<(&str, u16)> {
        match (self.host.as_deref(), self.port) {
            (Some(host), Some(port)) => Some((host, port)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AgentClientConfigBuilder {
    agent_id: String,
    entrypoint_tag: String,
    local: Option<bool>,
    host: Option<String>,
    port: Option<u16>,
    api_key: Option<String>,
    base_url: Option<Url>,
    request_timeout: Option<Duration>,
    stream_timeout: Option<Duration>,
    registry_path: Option<PathBuf>,
}

impl AgentClientConfigBuilder {
    pub fn new(agent_id: impl Into<String>, entrypoint_tag: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            entrypoint_tag: entrypoint_tag.into(),
            ..Self::default()
        }
    }

    pub fn local(mut self, local: bool) -> Self {
        self.local = Some(local);
        self
    }

    pub fn address(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = Some(host.into());
        self.port = Some(port);
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn base_url_str(mut self, base_url: &str) -> Result<Self> {
        let url = Url::parse(base_url).map_err(|e| ClientError::Validation {
            message: format!("invalid base URL '{base_url}': {e}"),
        })?;
        self.base_url = Some(url);
        Ok(self)
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn stream_timeout(mut self, timeout: Duration) -> Self {
        self.stream_timeout = Some(timeout);
        self
    }

    pub fn registry_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.registry_path = Some(path.into());
        self
    }

    /// Apply environment fallbacks, enforce the addressing invariant, and
    /// freeze the configuration.
    pub fn build(self) -> Result<AgentClientConfig> {
        if self.agent_id.is_empty() {
            return Err(ClientError::Validation {
                message: "agent id must not be empty".to_string(),
            });
        }
        if self.entrypoint_tag.is_empty() {
            return Err(ClientError::Validation {
                message: "entrypoint tag must not be empty".to_string(),
            });
        }

        let local = self
            .local
            .or_else(|| env_var(ENV_LOCAL).map(|v| matches!(v.as_str(), "1" | "true" | "yes")))
            .unwrap_or(false);

        // An env-provided address counts as explicit; a missing half falls
        // back to the hard default so AGENTLINE_HOST alone is usable.
        let (host, port) = match (self.host, self.port) {
            (Some(host), Some(port)) => (Some(host), Some(port)),
            (None, None) => {
                let env_host = env_var(ENV_HOST);
                let env_port = env_var(ENV_PORT).and_then(|v| v.parse::<u16>().ok());
                if env_host.is_some() || env_port.is_some() {
                    (
                        Some(env_host.unwrap_or_else(|| DEFAULT_HOST.to_string())),
                        Some(env_port.unwrap_or(DEFAULT_PORT)),
                    )
                } else {
                    (None, None)
                }
            }
            _ => {
                return Err(ClientError::Validation {
                    message: "host and port must be configured together".to_string(),
                });
            }
        };

        let api_key = self.api_key.or_else(|| env_var(ENV_API_KEY));
        let base_url = match self.base_url {
            Some(url) => Some(url),
            None => match env_var(ENV_BASE_URL) {
                Some(raw) => Some(Url::parse(&raw).map_err(|e| ClientError::Validation {
                    message: format!("invalid {ENV_BASE_URL} '{raw}': {e}"),
                })?),
                None => None,
            },
        };

        if local {
            if base_url.is_some() {
                return Err(ClientError::Validation {
                    message: "local mode and a remote base URL are mutually exclusive".to_string(),
                });
            }
        } else {
            if host.is_some() {
                return Err(ClientError::Validation {
                    message: "an explicit host:port only applies to local mode".to_string(),
                });
            }
            if base_url.is_none() {
                return Err(ClientError::Validation {
                    message: format!("remote mode requires a base URL (set {ENV_BASE_URL})"),
                });
            }
            if api_key.is_none() {
                log::warn!("remote mode without an API key; requests may be rejected with 401");
            }
        }

        let request_timeout = self
            .request_timeout
            .or_else(|| env_duration(ENV_TIMEOUT_SECONDS))
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        let stream_timeout = self
            .stream_timeout
            .or_else(|| env_duration(ENV_STREAM_TIMEOUT_SECONDS))
            .unwrap_or(DEFAULT_STREAM_TIMEOUT);

        let registry_path = self
            .registry_path
            .or_else(|| env_var(ENV_REGISTRY_PATH).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REGISTRY_PATH));

        Ok(AgentClientConfig {
            agent_id: self.agent_id,
            entrypoint_tag: self.entrypoint_tag,
            local,
            host,
            port,
            api_key,
            base_url,
            request_timeout,
            stream_timeout,
            registry_path,
        })
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_duration(name: &str) -> Option<Duration> {
    let raw = env_var(name)?;
    match raw.parse::<u64>() {
        Ok(seconds) => Some(Duration::from_secs(seconds)),
        Err(_) => {
            log::warn!("ignoring unparseable {name}={raw}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_config_with_explicit_address() {
        let config = AgentClientConfig::builder("a1", "run")
            .local(true)
            .address("127.0.0.1", 9000)
            .build()
            .unwrap();
        assert!(config.local);
        assert_eq!(config.address(), Some(("127.0.0.1", 9000)));
        assert_eq!(config.request_timeout, Duration::from_secs(300));
    }

    #[test]
    fn local_config_without_address_defers_to_registry() {
        let config = AgentClientConfig::builder("a1", "run")
            .local(true)
            .registry_path("/tmp/reg")
            .build()
            .unwrap();
        assert_eq!(config.address(), None);
        assert_eq!(config.registry_path, PathBuf::from("/tmp/reg"));
    }

    #[test]
    fn remote_config_requires_base_url() {
        let err = AgentClientConfig::builder("a1", "run")
            .api_key("key")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("base URL"));
    }

    #[test]
    fn conflicting_addressing_strategies_are_rejected() {
        let err = AgentClientConfig::builder("a1", "run")
            .local(true)
            .base_url_str("http://api.example.com")
            .unwrap()
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));

        let err = AgentClientConfig::builder("a1", "run")
            .address("127.0.0.1", 9000)
            .base_url_str("http://api.example.com")
            .unwrap()
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("local mode"));
    }

    #[test]
    fn empty_identifiers_are_rejected() {
        assert!(AgentClientConfig::builder("", "run").build().is_err());
        assert!(AgentClientConfig::builder("a1", "").build().is_err());
    }
}
