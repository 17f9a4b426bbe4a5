use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::JsonValue;

/// Type tag of one framed unit on a streaming channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamMessageType {
    Start,
    Chunk,
    Error,
    Done,
    /// Forward compatibility: unrecognized frame types are skipped, not fatal.
    #[serde(other)]
    Unknown,
}

/// Envelope for one frame on a streaming channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub message_type: StreamMessageType,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub data: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StreamMessage {
    pub fn new(message_type: StreamMessageType, data: JsonValue) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            message_type,
            timestamp: Utc::now(),
            data,
            metadata: None,
            error: None,
        }
    }

    pub fn with_metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_tags_are_lowercase_on_the_wire() {
        let msg = StreamMessage::new(StreamMessageType::Chunk, json!("hi"));
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "chunk");
        assert_eq!(value["data"], "hi");
    }

    #[test]
    fn unrecognized_type_parses_as_unknown() {
        let msg: StreamMessage = serde_json::from_str(
            r#"{"id":"1","type":"heartbeat","timestamp":"2026-08-25T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(msg.message_type, StreamMessageType::Unknown);
        assert!(msg.data.is_null());
    }

    #[test]
    fn error_frame_round_trips() {
        let msg = StreamMessage::new(StreamMessageType::Error, JsonValue::Null)
            .with_error("agent crashed");
        let text = serde_json::to_string(&msg).unwrap();
        let parsed: StreamMessage = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.message_type, StreamMessageType::Error);
        assert_eq!(parsed.error.as_deref(), Some("agent crashed"));
    }
}
