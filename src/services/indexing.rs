//! Client for the video-indexing backend
//!
//! Kicks off transcript indexing for an uploaded video and removes index
//! documents when a video is deleted. Unlike the transcript gateway these
//! calls surface errors: they run as standalone CLI commands, not inside a
//! chat turn.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
struct VideoRequest<'a> {
    video_name: &'a str,
}

pub struct IndexingClient {
    client: reqwest::Client,
    index_endpoint: String,
    delete_endpoint: String,
}

impl IndexingClient {
    pub fn new(index_endpoint: impl Into<String>, delete_endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            index_endpoint: index_endpoint.into(),
            delete_endpoint: delete_endpoint.into(),
        }
    }

    /// Trigger transcript indexing for an uploaded video
    ///
    /// Returns the backend's status message.
    pub async fn index(&self, video_name: &str) -> Result<String> {
        self.post(&self.index_endpoint, video_name)
            .await
            .with_context(|| format!("Failed to index video '{video_name}'"))
    }

    /// Remove a video's documents from the search index
    pub async fn delete(&self, video_name: &str) -> Result<String> {
        self.post(&self.delete_endpoint, video_name)
            .await
            .with_context(|| format!("Failed to delete index for video '{video_name}'"))
    }

    async fn post(&self, endpoint: &str, video_name: &str) -> Result<String> {
        if video_name.is_empty() {
            bail!("video name must not be empty");
        }

        let response = self
            .client
            .post(endpoint)
            .json(&VideoRequest { video_name })
            .send()
            .await
            .context("request failed")?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            bail!("backend returned {status}: {body}");
        }

        // The backend replies with {"status": "..."}; fall back to the raw
        // body if the shape ever changes.
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("status").and_then(Value::as_str).map(String::from))
            .unwrap_or(body);
        Ok(message)
    }
}
