//! Unary REST transport.
//!
//! One request, one response, no retries; callers own retry policy. Errors
//! are classified from the HTTP status at this boundary and re-raised typed.

use std::time::Duration;

use reqwest::{Client as HttpClient, RequestBuilder, Response, Url};

use crate::core::serializer;
use crate::core::types::architecture::ArchitectureResponse;
use crate::core::{AgentArchitecture, ClientError, JsonValue, Result, RunRequest, RunResponse};

#[derive(Debug)]
pub struct RestTransport {
    client: HttpClient,
    base_url: Url,
    api_key: Option<String>,
    timeout: Duration,
}

impl RestTransport {
    pub fn new(base_url: Url, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            client: HttpClient::new(),
            base_url,
            api_key,
            timeout,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(|e| ClientError::Validation {
            message: format!("invalid request path '{path}': {e}"),
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Fetch the entrypoint catalog the agent declares.
    pub async fn get_architecture(&self, agent_id: &str) -> Result<AgentArchitecture> {
        let url = self.url(&format!("api/v1/agents/{agent_id}/architecture"))?;
        log::debug!("fetching architecture from {url}");

        let response = self
            .authorize(self.client.get(url).timeout(self.timeout))
            .send()
            .await
            .map_err(map_transport_error)?;
        let response = match check_status(response).await {
            Err(ClientError::NotFound { message }) => {
                return Err(ClientError::NotFound {
                    message: format!("agent '{agent_id}' is unknown to the server: {message}"),
                });
            }
            other => other?,
        };

        let parsed: ArchitectureResponse = response.json().await.map_err(map_transport_error)?;
        if !parsed.success {
            return Err(ClientError::Unknown {
                message: parsed
                    .error
                    .unwrap_or_else(|| "architecture query failed".to_string()),
            });
        }
        parsed.data.ok_or_else(|| ClientError::Unknown {
            message: "architecture response carried no data".to_string(),
        })
    }

    /// Execute one unary run and return the decoded output value.
    pub async fn run(&self, agent_id: &str, request: &RunRequest) -> Result<JsonValue> {
        let url = self.url(&format!("api/v1/agents/{agent_id}/run"))?;
        let timeout = request
            .timeout_seconds
            .map(Duration::from_secs_f64)
            .unwrap_or(self.timeout);
        log::debug!(
            "running '{}' on agent '{agent_id}' via {url}",
            request.entrypoint_tag
        );

        let response = self
            .authorize(self.client.post(url).timeout(timeout).json(request))
            .send()
            .await
            .map_err(map_transport_error)?;
        let response = check_status(response).await?;

        let parsed: RunResponse = response.json().await.map_err(map_transport_error)?;
        if !parsed.success {
            return Err(ClientError::Unknown {
                message: parsed
                    .error
                    .unwrap_or_else(|| "agent run failed without an error message".to_string()),
            });
        }
        let output = parsed.output_data.unwrap_or(JsonValue::Null);
        Ok(serializer::deserialize_value(output, true))
    }

    /// Probe whether the server is reachable and healthy.
    pub async fn health(&self) -> Result<()> {
        let url = self.url("api/v1/health")?;
        let response = self
            .authorize(self.client.get(url).timeout(self.timeout))
            .send()
            .await
            .map_err(map_transport_error)?;
        check_status(response).await.map(|_| ())
    }
}

pub(crate) fn map_transport_error(e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::Timeout {
            message: e.to_string(),
        }
    } else if e.is_connect() {
        ClientError::Connection {
            message: e.to_string(),
        }
    } else if e.is_decode() {
        ClientError::Unknown {
            message: format!("failed to decode response body: {e}"),
        }
    } else {
        ClientError::Connection {
            message: e.to_string(),
        }
    }
}

/// Classify a non-success HTTP status, preferring the server's own error
/// message when the body carries one.
pub(crate) async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<JsonValue>(&body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .or_else(|| v.get("message"))
                .and_then(JsonValue::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            if body.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body
            }
        });
    Err(ClientError::from_status(status.as_u16(), message))
}
