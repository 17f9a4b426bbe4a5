pub mod error;
pub mod serializer;
pub mod types;

pub use error::{ClientError, ErrorKind, Result};
/// Re-export to ensure the same type is used
pub use serde_json::Value as JsonValue;

pub use serializer::{SerializationStrategy, WireEnvelope};
pub use types::architecture::{AgentArchitecture, Entrypoint};
pub use types::request::{RunRequest, RunResponse};
pub use types::stream::{StreamMessage, StreamMessageType};
