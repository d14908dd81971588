//! Conversation assembly for one chat turn
//!
//! Ordering contract: system prompt first, then prior history filtered to
//! user/assistant roles, then the new question exactly once. (Earlier
//! iterations of this flow sometimes duplicated the question before and
//! after history; that was a bug, not a feature.) The caller's history is
//! never mutated.

use crate::llm::{Message, Role};

pub fn build_messages(system_prompt: &str, history: &[Message], question: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(system_prompt));
    messages.extend(
        history
            .iter()
            .filter(|m| matches!(m.role, Role::User | Role::Assistant))
            .cloned(),
    );
    messages.push(Message::user(question));
    messages
}
