//! Defensive serde model of the chat-completions streaming payload
//!
//! The upstream schema is loose: any field may be absent on any given chunk.
//! Everything is optional; absent or mistyped fields read as "not present"
//! instead of failing the whole payload.

use serde::Deserialize;

/// One parsed `data:` payload from the stream
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

impl ChatChunk {
    /// The first choice, if the payload carried any
    pub fn choice(&self) -> Option<&ChunkChoice> {
        self.choices.first()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl ChunkChoice {
    /// True when the model paused generation to request tool execution
    pub fn finished_for_tool_calls(&self) -> bool {
        self.finish_reason.as_deref() == Some("tool_calls")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

/// Incremental fragment of a tool call
///
/// `id` and `function.name` arrive once, on the first fragment; later
/// fragments usually carry only `function.arguments`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolCallDelta {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub function: Option<FunctionDelta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FunctionDelta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_delta_parses() {
        let chunk: ChatChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{"content":"Hi"}}]}"#).unwrap();
        let choice = chunk.choice().unwrap();
        assert_eq!(choice.delta.content.as_deref(), Some("Hi"));
        assert!(choice.delta.tool_calls.is_none());
        assert!(!choice.finished_for_tool_calls());
    }

    #[test]
    fn tool_call_delta_parses() {
        let chunk: ChatChunk = serde_json::from_str(
            r#"{"choices":[{"delta":{"tool_calls":[{"id":"c1","function":{"name":"query_video_transcription"}}]}}]}"#,
        )
        .unwrap();
        let calls = chunk.choice().unwrap().delta.tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].id.as_deref(), Some("c1"));
        assert_eq!(
            calls[0].function.as_ref().unwrap().name.as_deref(),
            Some("query_video_transcription")
        );
    }

    #[test]
    fn finish_reason_tool_calls_detected() {
        let chunk: ChatChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{},"finish_reason":"tool_calls"}]}"#)
                .unwrap();
        assert!(chunk.choice().unwrap().finished_for_tool_calls());
    }

    #[test]
    fn empty_choices_tolerated() {
        let chunk: ChatChunk = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(chunk.choice().is_none());

        // Missing choices key entirely
        let chunk: ChatChunk = serde_json::from_str(r#"{"id":"x"}"#).unwrap();
        assert!(chunk.choice().is_none());
    }

    #[test]
    fn mistyped_fields_read_as_absent() {
        // finish_reason null is a common shape mid-stream
        let chunk: ChatChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{"content":null},"finish_reason":null}]}"#)
                .unwrap();
        let choice = chunk.choice().unwrap();
        assert!(choice.delta.content.is_none());
        assert!(choice.finish_reason.is_none());
    }
}
