//! LLM client and streaming protocol handling

mod azure_openai;
mod error;
pub mod streaming;
mod types;

pub use azure_openai::{AzureOpenAiChat, TurnResult, APOLOGY_MESSAGE, TRANSCRIPT_QUERY_TOOL};
pub use error::LlmError;
pub use types::*;
