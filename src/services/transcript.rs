//! Transcript query gateway
//!
//! Given a free-text query and a video identifier, returns relevant
//! transcript excerpts. Infallible by contract: any transport failure or
//! non-2xx status collapses into a deterministic "nothing found" string so
//! the chat turn keeps going instead of crashing. No retry.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Source of transcript excerpts for the chat orchestrator
///
/// Trait seam so the orchestrator can be exercised with fakes in tests.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch transcript text relevant to `query` for `video_id`
    ///
    /// Never fails; on any error the implementation must return a fallback
    /// string naming the query.
    async fn query(&self, query: &str, video_id: &str) -> String;
}

#[derive(Debug, Serialize)]
struct TranscriptQuery<'a> {
    query: &'a str,
    #[serde(rename = "videoId")]
    video_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct TranscriptResponse {
    pub text: String,
    #[serde(rename = "relevantSegments")]
    pub relevant_segments: Option<Vec<TranscriptSegment>>,
}

#[derive(Debug, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub confidence: f64,
}

pub struct TranscriptClient {
    client: reqwest::Client,
    endpoint: String,
}

impl TranscriptClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Deterministic degraded answer handed to the model when the backend
    /// is unreachable or unhappy
    pub fn fallback_text(query: &str) -> String {
        format!("No transcript content related to \"{query}\" could be found.")
    }

    async fn try_query(&self, query: &str, video_id: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&TranscriptQuery { query, video_id })
            .send()
            .await
            .context("Failed to reach transcript query endpoint")?
            .error_for_status()
            .context("Transcript query endpoint returned an error status")?;

        let body: TranscriptResponse = response
            .json()
            .await
            .context("Failed to parse transcript query response")?;
        Ok(body.text)
    }
}

#[async_trait]
impl TranscriptSource for TranscriptClient {
    async fn query(&self, query: &str, video_id: &str) -> String {
        match self.try_query(query, video_id).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    "Transcript query for {:?} (video {:?}) failed, degrading: {:#}",
                    query,
                    video_id,
                    e
                );
                Self::fallback_text(query)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_names_the_query() {
        assert_eq!(
            TranscriptClient::fallback_text("machine learning"),
            "No transcript content related to \"machine learning\" could be found."
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_degrades_to_fallback() {
        // Nothing listens on this port
        let client = TranscriptClient::new("http://127.0.0.1:1/api/transcription");
        let text = client.query("AI", "demo.mp4").await;
        assert_eq!(text, TranscriptClient::fallback_text("AI"));
    }
}
