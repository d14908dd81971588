//! Shared types for the chat wire format and streaming events

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Role in a conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A message in a conversation
///
/// Serializes to the chat-completions wire shape: optional fields are omitted
/// entirely so an assistant tool-call message carries no `content` key and a
/// plain text message carries no `tool_calls` key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallRequest>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Assistant message that records a tool invocation (no text content)
    pub fn assistant_tool_call(call: ToolCallRequest) -> Self {
        Self {
            role: Role::Assistant,
            content: None,
            tool_calls: Some(vec![call]),
            tool_call_id: None,
        }
    }

    /// Tool-role message carrying a tool's output, keyed to the request id
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// A recorded tool invocation, as the model requested it
///
/// `arguments` is the raw accumulated JSON string. It is echoed back to the
/// model verbatim in the resume request, so it is kept unparsed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

impl ToolCallRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: "function".to_string(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// Phase of a tool call as observed by the consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolCallPhase {
    /// The model is still emitting the call (args may be partial)
    Start,
    /// Arguments are complete and the tool is about to run
    End,
}

/// Events emitted to the consumer during a streaming turn
///
/// All `Text` events before a tool call's `Start` belong to the pre-tool
/// phase; `Text` events after `End` belong to the final answer. Events are
/// delivered strictly in generation order.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// A content delta from the assistant
    Text { content: String },
    /// Tool call progress: partial args during `Start`, complete args at `End`
    ToolCall {
        phase: ToolCallPhase,
        name: String,
        args: Map<String, Value>,
    },
}

/// Callback invoked for each stream event as it is generated
///
/// Implementations should be fast and non-blocking.
pub type StreamCallback = Box<dyn Fn(StreamEvent) + Send + Sync>;
