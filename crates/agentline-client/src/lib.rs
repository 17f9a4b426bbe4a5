//! Client SDK for invoking hosted or locally-running Agentline agents.
//!
//! The facade resolves where an agent lives (explicit address, local
//! registry, or the remote service), asks it for its declared entrypoints,
//! and dispatches each run to the unary REST transport or the streaming
//! transport based purely on the lexical form of the entrypoint tag.

pub mod client;
pub mod config;
pub mod http;
pub mod registry;
pub mod stream;

pub use client::{AgentClient, RunOutput};
pub use config::AgentClientConfig;
pub use http::RestTransport;
pub use registry::{AgentRecord, LocalRegistry};
pub use stream::{ChunkStream, StreamTransport};

pub use agentline_core as core;
