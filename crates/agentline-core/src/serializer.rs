//! Value serialization for the wire.
//!
//! Arbitrary application values are wrapped in a [`WireEnvelope`] tagged with
//! the strategy used to encode them, so the receiving side can attempt a
//! faithful reconstruction instead of assuming plain JSON always round-trips.
//!
//! Encoding runs through an ordered chain of total tier functions; each tier
//! either produces an envelope or defers to the next, and the chain
//! terminates in a guaranteed fallback. Encoding never returns an error.
//! Decoding malformed JSON text is the one case permitted to fail.

use std::any::type_name;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::JsonValue;
use crate::error::Result;
use crate::types::stream::StreamMessage;

/// Nesting depth beyond which a value is no longer considered JSON-safe.
/// Deeper subtrees collapse to their string form during deep serialization.
const MAX_DEPTH: usize = 64;

/// How a value was encoded into its envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SerializationStrategy {
    Direct,
    ObjectExtract,
    StringRepr,
    ErrorFallback,
}

/// JSON-safe representation of an application value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireEnvelope {
    pub strategy: SerializationStrategy,
    pub content: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Encode a value as a JSON envelope string. Never fails.
pub fn serialize<T: Serialize + fmt::Debug>(value: &T) -> String {
    encode_envelope(envelope_for(value))
}

/// Build the envelope for a value, walking the strategy chain.
pub fn envelope_for<T: Serialize + fmt::Debug>(value: &T) -> WireEnvelope {
    try_direct(value)
        .or_else(|| try_object_extract(value))
        .unwrap_or_else(|| string_repr(value))
}

fn try_direct<T: Serialize>(value: &T) -> Option<WireEnvelope> {
    let content = serde_json::to_value(value).ok()?;
    if !is_json_safe(&content, 0) {
        return None;
    }
    Some(WireEnvelope {
        strategy: SerializationStrategy::Direct,
        content,
        object_type: None,
        error: None,
    })
}

fn try_object_extract<T: Serialize>(value: &T) -> Option<WireEnvelope> {
    let raw = serde_json::to_value(value).ok()?;
    Some(WireEnvelope {
        strategy: SerializationStrategy::ObjectExtract,
        content: deep_serialize(&raw, 0),
        object_type: Some(type_name::<T>().to_string()),
        error: None,
    })
}

fn string_repr<T: fmt::Debug>(value: &T) -> WireEnvelope {
    WireEnvelope {
        strategy: SerializationStrategy::StringRepr,
        content: JsonValue::String(format!("{value:?}")),
        object_type: Some(type_name::<T>().to_string()),
        error: None,
    }
}

fn error_fallback(object_type: &str, error: &str) -> WireEnvelope {
    WireEnvelope {
        strategy: SerializationStrategy::ErrorFallback,
        content: JsonValue::Null,
        object_type: Some(object_type.to_string()),
        error: Some(error.to_string()),
    }
}

fn encode_envelope(envelope: WireEnvelope) -> String {
    let object_type = envelope.object_type.clone();
    match serde_json::to_string(&envelope) {
        Ok(text) => text,
        Err(e) => {
            let fallback = error_fallback(object_type.as_deref().unwrap_or("unknown"), &e.to_string());
            serde_json::to_string(&fallback).unwrap_or_else(|_| {
                r#"{"strategy":"error_fallback","content":null}"#.to_string()
            })
        }
    }
}

/// Decode a JSON envelope string back into an application value.
///
/// With `reconstruct` set, an explicit `direct` strategy tag returns the
/// normalized `content`; any other or absent strategy falls through to plain
/// recursive normalization of the whole structure.
pub fn deserialize(input: &str, reconstruct: bool) -> Result<JsonValue> {
    let decoded: JsonValue = serde_json::from_str(input)?;
    Ok(deserialize_value(decoded, reconstruct))
}

/// [`deserialize`] for input that is already parsed.
pub fn deserialize_value(value: JsonValue, reconstruct: bool) -> JsonValue {
    let value = unwrap_transport_envelope(value);

    if reconstruct {
        let is_direct = value
            .get("strategy")
            .and_then(JsonValue::as_str)
            .is_some_and(|s| s == "direct");
        if is_direct {
            if let Some(content) = value.get("content") {
                return normalize(content.clone());
            }
        }
        return normalize(value);
    }

    let value = normalize(value);
    match value.get("content") {
        Some(content) => content.clone(),
        None => value,
    }
}

/// Strip the `{type, payload}` message-envelope shape used by the streaming
/// transport. A string payload gets one extra parse attempt, falling back to
/// the raw string if that parse fails.
fn unwrap_transport_envelope(value: JsonValue) -> JsonValue {
    let Some(obj) = value.as_object() else {
        return value;
    };
    if !(obj.contains_key("type") && obj.contains_key("payload")) {
        return value;
    }
    let payload = obj.get("payload").cloned().unwrap_or(JsonValue::Null);
    match payload {
        JsonValue::String(text) => {
            serde_json::from_str(&text).unwrap_or(JsonValue::String(text))
        }
        other => other,
    }
}

/// Encode a stream message, deep-serializing its data and metadata.
///
/// A message that cannot be encoded downgrades to an error-carrying message
/// with the same id, type, and timestamp; this path never fails.
pub fn serialize_message(message: &StreamMessage) -> String {
    let mut wire = message.clone();
    wire.data = deep_serialize(&wire.data, 0);
    if let Some(metadata) = wire.metadata.take() {
        wire.metadata = Some(deep_serialize(&metadata, 0));
    }
    match serde_json::to_string(&wire) {
        Ok(text) => text,
        Err(e) => downgrade_message(message, &e.to_string()),
    }
}

fn downgrade_message(message: &StreamMessage, error: &str) -> String {
    let degraded = StreamMessage {
        id: message.id.clone(),
        message_type: message.message_type,
        timestamp: message.timestamp,
        data: json!({ "error": error }),
        metadata: None,
        error: Some(error.to_string()),
    };
    serde_json::to_string(&degraded).unwrap_or_else(|_| {
        r#"{"id":"","type":"error","timestamp":"1970-01-01T00:00:00Z","data":null}"#.to_string()
    })
}

/// Decode one framed unit from a streaming channel.
pub fn deserialize_message(input: &str) -> Result<StreamMessage> {
    let mut message: StreamMessage = serde_json::from_str(input)?;
    message.data = normalize(message.data);
    message.metadata = message.metadata.map(normalize);
    Ok(message)
}

/// Recursive pass over sequences and mappings; scalars pass through
/// unchanged. Subtrees past the depth bound convert to their string form.
fn deep_serialize(value: &JsonValue, depth: usize) -> JsonValue {
    if depth >= MAX_DEPTH {
        return JsonValue::String(value.to_string());
    }
    match value {
        JsonValue::Array(items) => JsonValue::Array(
            items.iter().map(|v| deep_serialize(v, depth + 1)).collect(),
        ),
        JsonValue::Object(map) => JsonValue::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), deep_serialize(v, depth + 1)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn is_json_safe(value: &JsonValue, depth: usize) -> bool {
    if depth > MAX_DEPTH {
        return false;
    }
    match value {
        JsonValue::Array(items) => items.iter().all(|v| is_json_safe(v, depth + 1)),
        JsonValue::Object(map) => map.values().all(|v| is_json_safe(v, depth + 1)),
        JsonValue::Number(n) => {
            n.is_i64() || n.is_u64() || n.as_f64().is_some_and(f64::is_finite)
        }
        _ => true,
    }
}

fn normalize(value: JsonValue) -> JsonValue {
    match value {
        JsonValue::Array(items) => JsonValue::Array(items.into_iter().map(normalize).collect()),
        JsonValue::Object(map) => {
            JsonValue::Object(map.into_iter().map(|(k, v)| (k, normalize(v))).collect())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::types::stream::StreamMessageType;
    use serde::Serializer;

    /// A value whose Serialize impl always errors.
    #[derive(Debug)]
    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _: S) -> std::result::Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("refusing to serialize"))
        }
    }

    fn deep_value(levels: usize) -> JsonValue {
        let mut value = json!(0);
        for _ in 0..levels {
            value = json!([value]);
        }
        value
    }

    #[test]
    fn json_safe_values_round_trip_directly() {
        let original = json!({"a": [1, 2.5, "three"], "b": {"nested": null}});
        let encoded = serialize(&original);

        let envelope: WireEnvelope = serde_json::from_str(&encoded).unwrap();
        assert_eq!(envelope.strategy, SerializationStrategy::Direct);

        let decoded = deserialize(&encoded, true).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn over_deep_values_take_the_extract_tier() {
        let value = deep_value(MAX_DEPTH + 20);
        let envelope = envelope_for(&value);
        assert_eq!(envelope.strategy, SerializationStrategy::ObjectExtract);
        assert!(envelope.object_type.is_some());
        // The extracted content must itself be fully JSON-safe.
        assert!(is_json_safe(&envelope.content, 0));
    }

    #[test]
    fn failing_serialize_impl_falls_back_to_string_repr() {
        let envelope = envelope_for(&Unserializable);
        assert_eq!(envelope.strategy, SerializationStrategy::StringRepr);
        assert_eq!(envelope.content, json!("Unserializable"));
        assert!(
            envelope
                .object_type
                .as_deref()
                .unwrap()
                .contains("Unserializable")
        );
    }

    #[test]
    fn serialization_always_yields_parseable_json() {
        for encoded in [
            serialize(&Unserializable),
            serialize(&deep_value(MAX_DEPTH * 3)),
            serialize(&json!(null)),
        ] {
            let _: JsonValue = serde_json::from_str(&encoded).unwrap();
        }
    }

    #[test]
    fn error_fallback_envelope_is_parseable() {
        let encoded = serde_json::to_string(&error_fallback("some::Type", "boom")).unwrap();
        let envelope: WireEnvelope = serde_json::from_str(&encoded).unwrap();
        assert_eq!(envelope.strategy, SerializationStrategy::ErrorFallback);
        assert_eq!(envelope.error.as_deref(), Some("boom"));
    }

    #[test]
    fn top_level_content_field_is_unwrapped() {
        let decoded =
            deserialize(r#"{"content": {"x": 1}, "strategy": "direct"}"#, false).unwrap();
        assert_eq!(decoded, json!({"x": 1}));
    }

    #[test]
    fn reconstruct_only_honors_direct_strategy() {
        let direct = deserialize(r#"{"content": 5, "strategy": "direct"}"#, true).unwrap();
        assert_eq!(direct, json!(5));

        let other = deserialize(r#"{"content": 5, "strategy": "string_repr"}"#, true).unwrap();
        assert_eq!(other, json!({"content": 5, "strategy": "string_repr"}));
    }

    #[test]
    fn transport_envelope_payload_is_parsed_once_more() {
        let input = r#"{"type": "chunk", "payload": "{\"content\": {\"x\": 1}, \"strategy\": \"direct\"}"}"#;
        let decoded = deserialize(input, true).unwrap();
        assert_eq!(decoded, json!({"x": 1}));
    }

    #[test]
    fn unparseable_payload_string_stays_raw() {
        let input = r#"{"type": "chunk", "payload": "not json"}"#;
        let decoded = deserialize(input, false).unwrap();
        assert_eq!(decoded, json!("not json"));
    }

    #[test]
    fn malformed_input_is_a_serialization_error() {
        let err = deserialize("{not json", false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Serialization);
    }

    #[test]
    fn messages_round_trip() {
        let message = StreamMessage::new(StreamMessageType::Chunk, json!({"delta": "hi"}))
            .with_metadata(json!({"seq": 4}));
        let encoded = serialize_message(&message);
        let decoded = deserialize_message(&encoded).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn message_downgrade_carries_the_error() {
        let message = StreamMessage::new(StreamMessageType::Chunk, json!({"delta": "hi"}));
        let encoded = downgrade_message(&message, "encoder exploded");
        let decoded: StreamMessage = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.id, message.id);
        assert_eq!(decoded.error.as_deref(), Some("encoder exploded"));
        assert_eq!(decoded.data["error"], "encoder exploded");
    }
}
