//! Model client contract and the bundled OpenAI-compatible HTTP client.
//!
//! - `client`: `/chat/completions` dispatch, streaming and 503 fallback
//! - `retry`: bounded backoff for transient failures
//! - `sse`: incremental server-sent-event decoding

use crate::error::ApiError;
use crate::types::Message;
use async_trait::async_trait;

mod client;
mod retry;
mod sse;

pub use client::ApiClient;

/// Sink for streamed text deltas. Each chunk is only borrowed for the call.
pub type ChunkCallback<'a> = dyn for<'c> FnMut(&'c str) + Send + 'a;

/// Minimal model API interface used by the agent loop.
///
/// This trait lets tests provide deterministic scripted replies without
/// network calls while the production path uses [`ApiClient`].
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send the full message list and return the assistant reply text.
    async fn chat(&self, messages: &[Message]) -> Result<String, ApiError>;

    /// Streaming variant. `on_chunk` receives each text delta in order and
    /// the return value is their concatenation.
    ///
    /// Clients without streaming support deliver the whole reply as one
    /// chunk.
    async fn chat_stream(
        &self,
        messages: &[Message],
        on_chunk: &mut ChunkCallback<'_>,
    ) -> Result<String, ApiError> {
        let text = self.chat(messages).await?;
        if !text.is_empty() {
            on_chunk(&text);
        }
        Ok(text)
    }
}
