//! vidchat: streaming video Q&A assistant
//!
//! This library provides:
//! - A streaming tool-augmented chat orchestrator over the Azure OpenAI
//!   chat-completions API (one transcript-search tool, SSE streaming)
//! - A chunk-boundary-safe SSE decoder and incremental tool-call accumulator
//! - Thin clients for the transcript-query and video-indexing backends
//! - A chat agent that owns conversation history across turns

pub mod agent;
pub mod config;
pub mod llm;
pub mod services;

pub use config::Config;
