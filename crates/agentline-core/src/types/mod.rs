pub mod architecture;
pub mod request;
pub mod stream;

pub use architecture::{AgentArchitecture, ArchitectureResponse, Entrypoint, STREAM_SUFFIX};
pub use request::{RunRequest, RunResponse};
pub use stream::{StreamMessage, StreamMessageType};
