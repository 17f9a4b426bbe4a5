//! Streaming transport.
//!
//! Opens a channel to the agent with the run request as the opening frame,
//! then yields decoded chunk payloads one frame at a time, in the order the
//! server sent them. The produced stream is single-pass; dropping it closes
//! the underlying connection, which is the only cancellation mechanism.

use std::io;
use std::time::Duration;

use async_stream::try_stream;
use futures::TryStreamExt;
use futures::stream::{BoxStream, StreamExt};
use reqwest::{Client as HttpClient, Url, header};
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;

use crate::core::{ClientError, JsonValue, Result, RunRequest, StreamMessageType, serializer};
use crate::http::{check_status, map_transport_error};

/// Lazy, forward-only sequence of decoded chunk values.
///
/// Terminates cleanly after a `done` frame; an `error` frame terminates it
/// by yielding `Err`, so callers can distinguish the two.
pub type ChunkStream = BoxStream<'static, Result<JsonValue>>;

#[derive(Debug)]
pub struct StreamTransport {
    client: HttpClient,
    base_url: Url,
    api_key: Option<String>,
    stream_timeout: Duration,
}

impl StreamTransport {
    pub fn new(base_url: Url, api_key: Option<String>, stream_timeout: Duration) -> Self {
        Self {
            client: HttpClient::new(),
            base_url,
            api_key,
            stream_timeout,
        }
    }

    /// Open the channel and send the run request as the first frame.
    pub async fn open(&self, agent_id: &str, request: &RunRequest) -> Result<ChunkStream> {
        let mut url = self
            .base_url
            .join(&format!("api/v1/agents/{agent_id}/stream"))
            .map_err(|e| ClientError::Validation {
                message: format!("invalid stream path for agent '{agent_id}': {e}"),
            })?;
        // The token rides along as a query parameter as well, for channels
        // that cannot carry custom headers.
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("token", key);
        }
        log::debug!(
            "opening stream for '{}' on agent '{agent_id}'",
            request.entrypoint_tag
        );

        let mut http_request = self
            .client
            .post(url)
            .timeout(self.stream_timeout)
            .header(header::ACCEPT, "text/event-stream")
            .json(request);
        if let Some(key) = &self.api_key {
            http_request = http_request.bearer_auth(key);
        }

        let response = http_request.send().await.map_err(map_transport_error)?;
        let response = check_status(response).await?;

        let bytes = response.bytes_stream().map_err(io::Error::other);
        let mut lines = StreamReader::new(bytes).lines();

        let stream = try_stream! {
            let mut frame_buf = String::new();
            let mut finished = false;

            while !finished {
                let line = lines.next_line().await.map_err(|e| ClientError::Connection {
                    message: format!("stream read failed: {e}"),
                })?;
                // EOF with data still buffered means the last frame never
                // got its blank-line terminator; an undispatched frame is
                // incomplete and is dropped, not decoded.
                let Some(line) = line else { break };

                if !line.is_empty() {
                    // SSE framing: accumulate data lines until the blank
                    // separator; event/id/comment lines are not used here.
                    if let Some(data) = line.strip_prefix("data:") {
                        if !frame_buf.is_empty() {
                            frame_buf.push('\n');
                        }
                        frame_buf.push_str(data.trim_start());
                    }
                    continue;
                }
                if frame_buf.is_empty() {
                    continue;
                }

                let frame = std::mem::take(&mut frame_buf);
                let message = match serializer::deserialize_message(&frame) {
                    Ok(message) => message,
                    Err(e) => {
                        log::warn!("skipping undecodable frame: {e}");
                        continue;
                    }
                };
                match message.message_type {
                    StreamMessageType::Start => {
                        log::debug!("stream {} started", message.id);
                    }
                    StreamMessageType::Chunk => {
                        yield serializer::deserialize_value(message.data, true);
                    }
                    StreamMessageType::Done => {
                        if !message.data.is_null() {
                            yield serializer::deserialize_value(message.data, true);
                        }
                        finished = true;
                    }
                    StreamMessageType::Error => {
                        let reason = message
                            .error
                            .or_else(|| {
                                message
                                    .data
                                    .get("error")
                                    .and_then(JsonValue::as_str)
                                    .map(str::to_string)
                            })
                            .unwrap_or_else(|| {
                                "stream terminated with an unspecified error".to_string()
                            });
                        let failed: Result<()> = Err(ClientError::Unknown { message: reason });
                        failed?;
                    }
                    StreamMessageType::Unknown => {
                        log::warn!("skipping frame {} with unrecognized type", message.id);
                    }
                }
            }

            if !finished {
                let closed: Result<()> = Err(ClientError::Connection {
                    message: "channel closed before a done frame arrived".to_string(),
                });
                closed?;
            }
        };

        Ok(stream.boxed())
    }
}
