use serde::{Deserialize, Serialize};

/// Suffix marking an entrypoint as streaming.
///
/// The suffix is part of the canonical tag: a server that declares
/// `generate_stream` expects exactly that string back in a run request. The
/// client never strips it; execution mode is derived from the lexical form
/// of the tag alone.
pub const STREAM_SUFFIX: &str = "_stream";

/// A server-declared capability of an agent.
///
/// Tags are unique among the entrypoints of one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entrypoint {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extractor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Entrypoint {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            file: None,
            module: None,
            extractor: None,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_streaming(&self) -> bool {
        is_streaming_tag(&self.tag)
    }
}

/// Whether a tag denotes streaming execution.
pub fn is_streaming_tag(tag: &str) -> bool {
    tag.ends_with(STREAM_SUFFIX)
}

/// The set of entrypoints an agent exposes, as reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentArchitecture {
    pub agent_id: String,
    pub entrypoints: Vec<Entrypoint>,
}

impl AgentArchitecture {
    pub fn entrypoint(&self, tag: &str) -> Option<&Entrypoint> {
        self.entrypoints.iter().find(|e| e.tag == tag)
    }

    pub fn has_entrypoint(&self, tag: &str) -> bool {
        self.entrypoint(tag).is_some()
    }

    pub fn tags(&self) -> Vec<&str> {
        self.entrypoints.iter().map(|e| e.tag.as_str()).collect()
    }
}

/// Wire shape of the architecture query response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchitectureResponse {
    #[serde(default = "super::request::default_true")]
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<AgentArchitecture>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
