#[cfg(test)]
mod tests {
    use agentline_core::serializer;
    use agentline_core::types::architecture::{
        AgentArchitecture, ArchitectureResponse, Entrypoint,
    };
    use agentline_core::types::request::{RunRequest, RunResponse};
    use agentline_core::types::stream::{StreamMessage, StreamMessageType};
    use agentline_core::{ClientError, ErrorKind, SerializationStrategy, WireEnvelope};
    use serde_json::json;

    #[test]
    fn run_request_matches_the_documented_body() {
        let request = RunRequest::new("summarize")
            .add_arg(json!("document text"))
            .kwarg("max_words", json!(100))
            .with_async_execution(true);

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "entrypoint_tag": "summarize",
                "input_args": ["document text"],
                "input_kwargs": {"max_words": 100},
                "async_execution": true
            })
        );
    }

    #[test]
    fn architecture_payload_parses() {
        let raw = json!({
            "success": true,
            "data": {
                "agent_id": "a1",
                "entrypoints": [
                    {"tag": "chat", "file": "agent.py", "description": "unary chat"},
                    {"tag": "chat_stream", "module": "agent"}
                ]
            }
        });
        let resp: ArchitectureResponse = serde_json::from_value(raw).unwrap();
        let arch = resp.data.unwrap();
        assert_eq!(arch.agent_id, "a1");
        assert!(!arch.entrypoint("chat").unwrap().is_streaming());
        assert!(arch.entrypoint("chat_stream").unwrap().is_streaming());
    }

    #[test]
    fn round_trip_for_json_safe_values() {
        for value in [
            json!(null),
            json!(42),
            json!([1, "two", 3.5]),
            json!({"k": {"nested": [true, false]}}),
        ] {
            let encoded = serializer::serialize(&value);
            let decoded = serializer::deserialize(&encoded, true).unwrap();
            assert_eq!(decoded, value, "round trip failed for {value}");
        }
    }

    #[test]
    fn envelope_strategy_tags_use_snake_case() {
        let envelope = WireEnvelope {
            strategy: SerializationStrategy::ObjectExtract,
            content: json!({}),
            object_type: Some("demo".to_string()),
            error: None,
        };
        let text = serde_json::to_string(&envelope).unwrap();
        assert!(text.contains(r#""strategy":"object_extract""#));
    }

    #[test]
    fn unary_response_shapes() {
        let ok: RunResponse = serde_json::from_value(json!({
            "success": true,
            "output_data": {"content": 1, "strategy": "direct"}
        }))
        .unwrap();
        assert!(ok.success);

        let failed: RunResponse =
            serde_json::from_value(json!({"success": false, "error": "boom"})).unwrap();
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("boom"));
    }

    #[test]
    fn stream_message_survives_its_own_wire_format() {
        let done = StreamMessage::new(
            StreamMessageType::Done,
            json!({"usage": {"tokens": 12}}),
        );
        let encoded = serializer::serialize_message(&done);
        let decoded = serializer::deserialize_message(&encoded).unwrap();
        assert_eq!(decoded.message_type, StreamMessageType::Done);
        assert_eq!(decoded.data["usage"]["tokens"], 12);
    }

    #[test]
    fn missing_tag_error_names_both_tag_and_agent() {
        let arch = AgentArchitecture {
            agent_id: "a1".to_string(),
            entrypoints: vec![Entrypoint::new("run")],
        };
        // The facade formats this error; the taxonomy kind is what matters here.
        let err = ClientError::NotFound {
            message: format!("entrypoint 'missing' not declared by agent '{}'", arch.agent_id),
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("missing"));
        assert!(err.to_string().contains("a1"));
    }
}
