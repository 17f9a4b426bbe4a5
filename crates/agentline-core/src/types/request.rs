use serde::{Deserialize, Serialize};
use serde_json::Map;

use crate::JsonValue;

pub(crate) fn default_true() -> bool {
    true
}

/// Body of a single invocation, unary or streaming.
///
/// Constructed fresh per call; the same request value is never reused across
/// invocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    pub entrypoint_tag: String,
    #[serde(default)]
    pub input_args: Vec<JsonValue>,
    #[serde(default)]
    pub input_kwargs: Map<String, JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<f64>,
    #[serde(default)]
    pub async_execution: bool,
}

impl RunRequest {
    pub fn new(entrypoint_tag: impl Into<String>) -> Self {
        Self {
            entrypoint_tag: entrypoint_tag.into(),
            input_args: Vec::new(),
            input_kwargs: Map::new(),
            timeout_seconds: None,
            async_execution: false,
        }
    }

    pub fn add_arg(mut self, value: impl Into<JsonValue>) -> Self {
        self.input_args.push(value.into());
        self
    }

    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.input_kwargs.insert(key.into(), value.into());
        self
    }

    pub fn with_kwargs(mut self, kwargs: Map<String, JsonValue>) -> Self {
        self.input_kwargs = kwargs;
        self
    }

    pub fn with_timeout_seconds(mut self, seconds: f64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    pub fn with_async_execution(mut self, async_execution: bool) -> Self {
        self.async_execution = async_execution;
        self
    }
}

/// Wire shape of the unary run response.
///
/// An absent `success` field means the call succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResponse {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_data: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_wire_shape() {
        let request = RunRequest::new("echo")
            .add_arg(json!(1))
            .kwarg("x", json!({"nested": true}))
            .with_timeout_seconds(30.0);

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["entrypoint_tag"], "echo");
        assert_eq!(value["input_args"], json!([1]));
        assert_eq!(value["input_kwargs"]["x"]["nested"], json!(true));
        assert_eq!(value["timeout_seconds"], json!(30.0));
        assert_eq!(value["async_execution"], json!(false));
    }

    #[test]
    fn response_success_defaults_to_true() {
        let resp: RunResponse = serde_json::from_str(r#"{"output_data": 7}"#).unwrap();
        assert!(resp.success);
        assert_eq!(resp.output_data, Some(json!(7)));
    }

    #[test]
    fn response_failure_carries_message() {
        let resp: RunResponse =
            serde_json::from_str(r#"{"success": false, "error": "boom"}"#).unwrap();
        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("boom"));
    }
}
