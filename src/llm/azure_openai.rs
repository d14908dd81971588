//! Azure OpenAI chat orchestrator
//!
//! Drives one user turn end to end: send the streaming chat request, decode
//! SSE chunks, accumulate any tool call, execute the transcript query, splice
//! the tool request/result pair into the conversation and re-issue the
//! request, until the model ends a stream with plain text only.
//!
//! The resume protocol is an explicit loop over a growing message list (not
//! recursion), with a fresh decoder and accumulator per cycle. Tool cycles
//! are capped per turn; once the cap is reached the request is re-sent
//! without the tool descriptor so the model has to answer in text.

use std::sync::Arc;

use anyhow::Result;
use futures::StreamExt;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::config::OpenAiConfig;
use crate::services::TranscriptSource;

use super::streaming::{ChatChunk, SseDecoder, ToolCallAccumulator};
use super::{LlmError, Message, StreamCallback, StreamEvent, ToolCallPhase, ToolCallRequest};

/// Name of the single tool exposed to the model
pub const TRANSCRIPT_QUERY_TOOL: &str = "query_video_transcription";

/// Terminal message emitted when the model endpoint fails
///
/// Transport failures are not retried and never surface raw error detail to
/// the consumer; the turn ends with exactly one `Text` event carrying this.
pub const APOLOGY_MESSAGE: &str =
    "Sorry, something went wrong while answering your question. Please try again later.";

/// Maximum tool cycles per user turn
const MAX_TOOL_CYCLES: usize = 3;

pub struct AzureOpenAiChat {
    client: reqwest::Client,
    config: OpenAiConfig,
    transcript: Arc<dyn TranscriptSource>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    stream: bool,
    temperature: f32,
    max_tokens: u32,
}

/// Result of one streamed user turn
#[derive(Debug, Clone)]
pub struct TurnResult {
    /// Final answer text (the apology string when `degraded`)
    pub text: String,
    /// True when the turn ended via the transport-failure fallback rather
    /// than a real model answer
    pub degraded: bool,
}

/// What one request/stream cycle produced
enum CycleOutcome {
    /// Stream ended with no pending tool call; text is the final answer
    Answer(String),
    /// The model requested the transcript tool
    ToolCall {
        request: ToolCallRequest,
        args: Map<String, Value>,
    },
}

impl AzureOpenAiChat {
    pub fn new(config: OpenAiConfig, transcript: Arc<dyn TranscriptSource>) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            transcript,
        }
    }

    /// Run one user turn: stream, execute at most `MAX_TOOL_CYCLES` tool
    /// calls, and return the final answer.
    ///
    /// Events are delivered to `callback` strictly in generation order. Any
    /// transport failure ends the turn with a single apology `Text` event
    /// and a `degraded` result; the error detail goes to the log only.
    pub async fn stream_turn(
        &self,
        mut messages: Vec<Message>,
        video_id: &str,
        callback: &StreamCallback,
    ) -> Result<TurnResult> {
        let mut cycles = 0;

        loop {
            let with_tool = cycles < MAX_TOOL_CYCLES;
            if !with_tool {
                tracing::warn!(
                    "Tool cycle cap ({}) reached, requesting a plain-text answer",
                    MAX_TOOL_CYCLES
                );
            }

            let outcome = match self.run_cycle(&messages, with_tool, callback).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Chat stream failed, ending turn with fallback: {:#}", e);
                    callback(StreamEvent::Text {
                        content: APOLOGY_MESSAGE.to_string(),
                    });
                    return Ok(TurnResult {
                        text: APOLOGY_MESSAGE.to_string(),
                        degraded: true,
                    });
                }
            };

            match outcome {
                CycleOutcome::Answer(text) => {
                    return Ok(TurnResult {
                        text,
                        degraded: false,
                    })
                }
                CycleOutcome::ToolCall { request, args } => {
                    callback(StreamEvent::ToolCall {
                        phase: ToolCallPhase::End,
                        name: request.function.name.clone(),
                        args: args.clone(),
                    });

                    let query = args.get("query").and_then(Value::as_str).unwrap_or("");
                    tracing::debug!("Executing transcript query: {:?}", query);
                    let transcript = self.transcript.query(query, video_id).await;

                    // Request/response adjacency: the assistant's recorded
                    // tool call, immediately followed by the tool result
                    // keyed to the same id.
                    let call_id = request.id.clone();
                    messages.push(Message::assistant_tool_call(request));
                    messages.push(Message::tool_result(call_id, transcript));
                    cycles += 1;
                }
            }
        }
    }

    /// One request/stream cycle: send, decode, accumulate, classify
    async fn run_cycle(
        &self,
        messages: &[Message],
        with_tool: bool,
        callback: &StreamCallback,
    ) -> Result<CycleOutcome> {
        let response = self.send_request(messages, with_tool).await?;

        let mut decoder = SseDecoder::new();
        let mut accumulator = ToolCallAccumulator::new();
        let mut answer = String::new();
        let mut tool_detected = false;

        let mut stream = response.bytes_stream();
        'read: while let Some(item) = stream.next().await {
            let bytes = item.map_err(LlmError::from_network_error)?;
            for chunk in decoder.push(&bytes) {
                if process_chunk(&chunk, &mut accumulator, &mut answer, with_tool, callback) {
                    // Mirror the upstream contract: once the finish condition
                    // names a completed tool call, nothing further in this
                    // stream matters.
                    tool_detected = true;
                    break 'read;
                }
            }
        }

        if !tool_detected {
            for chunk in decoder.finish() {
                if process_chunk(&chunk, &mut accumulator, &mut answer, with_tool, callback) {
                    tool_detected = true;
                    break;
                }
            }
        }

        if tool_detected {
            let args = accumulator.final_args();
            if let Some(request) = accumulator.into_request() {
                return Ok(CycleOutcome::ToolCall { request, args });
            }
        }

        Ok(CycleOutcome::Answer(answer))
    }

    async fn send_request(
        &self,
        messages: &[Message],
        with_tool: bool,
    ) -> Result<reqwest::Response> {
        let mut body = ChatRequest {
            messages,
            tools: None,
            tool_choice: None,
            stream: true,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };
        if with_tool {
            body.tools = Some(vec![transcript_query_tool()]);
            body.tool_choice = Some("auto");
        }

        let response = self
            .client
            .post(self.chat_url())
            .header("api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(LlmError::from_network_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::from_http_status(status, error_text).into());
        }

        Ok(response)
    }

    fn chat_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.deployment,
            self.config.api_version
        )
    }
}

/// Apply one decoded payload. Returns true when a completed transcript-query
/// tool call has been detected and the cycle should stop reading.
fn process_chunk(
    chunk: &ChatChunk,
    accumulator: &mut ToolCallAccumulator,
    answer: &mut String,
    with_tool: bool,
    callback: &StreamCallback,
) -> bool {
    let Some(choice) = chunk.choice() else {
        return false;
    };

    if let Some(tool_calls) = &choice.delta.tool_calls {
        // Exactly one tool call is tracked; parallel calls are unsupported.
        if let Some(delta) = tool_calls.first() {
            accumulator.observe(delta);
            callback(StreamEvent::ToolCall {
                phase: ToolCallPhase::Start,
                name: accumulator.name().unwrap_or_default().to_string(),
                args: accumulator.partial_args(),
            });
        }
    }

    if with_tool
        && choice.finished_for_tool_calls()
        && accumulator.is_call_to(TRANSCRIPT_QUERY_TOOL)
    {
        return true;
    }

    if let Some(content) = &choice.delta.content {
        if !content.is_empty() {
            answer.push_str(content);
            callback(StreamEvent::Text {
                content: content.clone(),
            });
        }
    }

    false
}

/// The single function-tool descriptor sent with each request
fn transcript_query_tool() -> Value {
    json!({
        "type": "function",
        "function": {
            "name": TRANSCRIPT_QUERY_TOOL,
            "description": "Look up transcript excerpts from the current video that are relevant to the user's question",
            "parameters": {
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The user's question or search keywords"
                    }
                },
                "required": ["query"]
            }
        }
    })
}
