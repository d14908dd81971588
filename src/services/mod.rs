//! Thin clients for the video-processing backend

mod indexing;
mod transcript;

pub use indexing::IndexingClient;
pub use transcript::{TranscriptClient, TranscriptResponse, TranscriptSegment, TranscriptSource};
