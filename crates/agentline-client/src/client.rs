//! Agent client facade.
//!
//! Owns the configuration and both transports for its lifetime. The only
//! branching logic here is the dispatch between unary and streaming
//! execution, derived purely from the lexical form of the entrypoint tag.

use std::fmt;
use std::sync::OnceLock;

use reqwest::Url;
use serde_json::Map;

use crate::config::AgentClientConfig;
use crate::core::types::architecture::is_streaming_tag;
use crate::core::{AgentArchitecture, ClientError, JsonValue, Result, RunRequest};
use crate::http::RestTransport;
use crate::registry::LocalRegistry;
use crate::stream::{ChunkStream, StreamTransport};

/// Result of one `run` invocation: a single decoded value for unary
/// entrypoints, a lazy chunk sequence for streaming ones.
pub enum RunOutput {
    Value(JsonValue),
    Stream(ChunkStream),
}

impl RunOutput {
    pub fn into_value(self) -> Result<JsonValue> {
        match self {
            Self::Value(value) => Ok(value),
            Self::Stream(_) => Err(ClientError::Validation {
                message: "entrypoint is streaming; consume the result as a stream".to_string(),
            }),
        }
    }

    pub fn into_stream(self) -> Result<ChunkStream> {
        match self {
            Self::Stream(stream) => Ok(stream),
            Self::Value(_) => Err(ClientError::Validation {
                message: "entrypoint is unary; consume the result as a value".to_string(),
            }),
        }
    }
}

impl fmt::Debug for RunOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Stream(_) => f.debug_tuple("Stream").field(&"..").finish(),
        }
    }
}

#[derive(Debug)]
pub struct AgentClient {
    config: AgentClientConfig,
    rest: RestTransport,
    stream: StreamTransport,
    registry: Option<LocalRegistry>,
    architecture: OnceLock<AgentArchitecture>,
}

impl AgentClient {
    /// Resolve the agent's address and construct both transports.
    ///
    /// Address resolution precedence in local mode: an explicitly supplied
    /// host:port wins; otherwise the registry maps the agent id to an
    /// address. Remote mode uses the configured base URL.
    pub fn new(config: AgentClientConfig) -> Result<Self> {
        let mut registry = None;

        let base_url = if !config.local {
            config.base_url.clone().ok_or_else(|| ClientError::Validation {
                message: "remote mode requires a base URL".to_string(),
            })?
        } else if let Some((host, port)) = config.address() {
            local_url(host, port)?
        } else {
            if !LocalRegistry::is_available() {
                return Err(ClientError::NotFound {
                    message: format!(
                        "no address configured for agent '{}' and local registry support \
                         is not enabled in this build",
                        config.agent_id
                    ),
                });
            }
            let store = LocalRegistry::open(&config.registry_path)?;
            let (host, port) = store.resolve(&config.agent_id)?;
            let url = local_url(&host, port)?;
            registry = Some(store);
            url
        };

        let rest = RestTransport::new(
            base_url.clone(),
            config.api_key.clone(),
            config.request_timeout,
        );
        let stream = StreamTransport::new(base_url, config.api_key.clone(), config.stream_timeout);

        Ok(Self {
            config,
            rest,
            stream,
            registry,
            architecture: OnceLock::new(),
        })
    }

    pub fn config(&self) -> &AgentClientConfig {
        &self.config
    }

    /// The cached architecture, if [`Self::initialize`] has run.
    pub fn architecture(&self) -> Option<&AgentArchitecture> {
        self.architecture.get()
    }

    /// Fetch the agent's architecture once and verify the configured
    /// entrypoint tag exists. Performed implicitly by `run` if skipped.
    pub async fn initialize(&self) -> Result<()> {
        self.load_architecture().await.map(|_| ())
    }

    /// Probe server health through the unary transport.
    pub async fn health(&self) -> Result<()> {
        self.rest.health().await
    }

    /// Invoke the configured entrypoint with keyword arguments.
    pub async fn run(&self, kwargs: Map<String, JsonValue>) -> Result<RunOutput> {
        let request = RunRequest::new(&self.config.entrypoint_tag).with_kwargs(kwargs);
        self.run_with_request(request).await
    }

    /// Invoke the configured entrypoint and consume the result as a stream.
    ///
    /// Fails with a validation error when the configured entrypoint is unary.
    pub async fn run_stream(&self, kwargs: Map<String, JsonValue>) -> Result<ChunkStream> {
        self.run(kwargs).await?.into_stream()
    }

    /// Invoke with a fully specified request, for positional arguments or a
    /// per-request timeout override.
    pub async fn run_with_request(&self, request: RunRequest) -> Result<RunOutput> {
        let architecture = self.load_architecture().await?;
        if !architecture.has_entrypoint(&request.entrypoint_tag) {
            return Err(self.missing_entrypoint(&request.entrypoint_tag, architecture));
        }

        if is_streaming_tag(&request.entrypoint_tag) {
            let opened = self.stream.open(&self.config.agent_id, &request).await;
            self.record_run(opened.is_ok());
            Ok(RunOutput::Stream(opened?))
        } else {
            let result = self.rest.run(&self.config.agent_id, &request).await;
            self.record_run(result.is_ok());
            Ok(RunOutput::Value(result?))
        }
    }

    async fn load_architecture(&self) -> Result<&AgentArchitecture> {
        if let Some(architecture) = self.architecture.get() {
            return Ok(architecture);
        }
        let architecture = self.rest.get_architecture(&self.config.agent_id).await?;
        if !architecture.has_entrypoint(&self.config.entrypoint_tag) {
            return Err(self.missing_entrypoint(&self.config.entrypoint_tag, &architecture));
        }
        Ok(self.architecture.get_or_init(|| architecture))
    }

    fn missing_entrypoint(&self, tag: &str, architecture: &AgentArchitecture) -> ClientError {
        ClientError::NotFound {
            message: format!(
                "entrypoint '{tag}' is not declared by agent '{}' (declared: [{}])",
                self.config.agent_id,
                architecture.tags().join(", ")
            ),
        }
    }

    /// Best-effort telemetry; a failed counter update never fails the run.
    fn record_run(&self, success: bool) {
        if let Some(registry) = &self.registry {
            if let Err(e) = registry.record_run(&self.config.agent_id, success) {
                log::warn!(
                    "failed to record run for agent '{}': {e}",
                    self.config.agent_id
                );
            }
        }
    }
}

fn local_url(host: &str, port: u16) -> Result<Url> {
    Url::parse(&format!("http://{host}:{port}/")).map_err(|e| ClientError::Validation {
        message: format!("invalid agent address {host}:{port}: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn run_output_accessors() {
        let value = RunOutput::Value(json!(1));
        assert_eq!(value.into_value().unwrap(), json!(1));

        let value = RunOutput::Value(json!(1));
        assert!(value.into_stream().is_err());
    }

    #[test]
    fn remote_client_constructs_without_network() {
        let config = AgentClientConfig::builder("a1", "run")
            .base_url_str("http://api.example.com/")
            .unwrap()
            .api_key("key")
            .build()
            .unwrap();
        let client = AgentClient::new(config).unwrap();
        assert!(client.architecture().is_none());
    }

    #[test]
    fn local_url_shape() {
        let url = local_url("127.0.0.1", 8450).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8450/");
    }
}
