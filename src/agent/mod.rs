//! Chat agent: owns conversation history and runs one turn at a time

pub mod conversation;

use anyhow::Result;

use crate::llm::{AzureOpenAiChat, Message, StreamCallback};

/// Drives question/answer turns against one video
///
/// History is owned here and carried across turns; the orchestrator itself is
/// stateless between invocations, so independent agents (e.g. two concurrent
/// sessions) do not interfere.
pub struct ChatAgent {
    llm: AzureOpenAiChat,
    system_prompt: String,
    history: Vec<Message>,
}

impl ChatAgent {
    pub fn new(llm: AzureOpenAiChat, system_prompt: impl Into<String>) -> Self {
        Self {
            llm,
            system_prompt: system_prompt.into(),
            history: Vec::new(),
        }
    }

    /// Ask one question about `video_id`, streaming events to `callback`
    ///
    /// Returns the final answer text. A turn that ended in the transport
    /// apology is not recorded: the apology is not a real answer, and
    /// replaying it to the model on the next turn would only confuse it.
    pub async fn ask(
        &mut self,
        question: &str,
        video_id: &str,
        callback: &StreamCallback,
    ) -> Result<String> {
        let messages = conversation::build_messages(&self.system_prompt, &self.history, question);
        let turn = self.llm.stream_turn(messages, video_id, callback).await?;

        if !turn.degraded {
            self.history.push(Message::user(question));
            self.history.push(Message::assistant(turn.text.clone()));
        }
        Ok(turn.text)
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}
