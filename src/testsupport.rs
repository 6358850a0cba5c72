//! Shared test fixtures for tool and agent test modules.

use crate::api::{ChunkCallback, LlmClient};
use crate::error::ApiError;
use crate::types::Message;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

static TEST_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Temporary directory fixture with best-effort cleanup.
#[derive(Debug)]
pub struct TestTempDir {
    path: PathBuf,
}

impl TestTempDir {
    /// Create a unique temporary directory with a readable prefix.
    pub fn new(prefix: &str) -> Self {
        let suffix = TEST_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let dir = std::env::temp_dir().join(format!("apiprobe-{prefix}-{millis}-{suffix}"));
        fs::create_dir_all(&dir).expect("failed to create temporary fixture directory");
        Self { path: dir }
    }

    /// Root directory path for this fixture.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Build a child path under the fixture root.
    pub fn child(&self, relative: &str) -> PathBuf {
        self.path.join(relative)
    }

    /// Write UTF-8 text to a child path, creating parent directories as needed.
    pub fn write_text(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.child(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent directories for fixture");
        }
        fs::write(&path, content).expect("failed to write fixture file");
        path
    }
}

impl Drop for TestTempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Model client that replays a fixed script of replies.
///
/// Every request is recorded. Streaming splits each reply into two chunks so
/// tests can observe incremental delivery. Running past the end of the
/// script is an `InvalidResponse` error.
#[derive(Default)]
pub struct ScriptedClient {
    script: Mutex<VecDeque<Result<String, ApiError>>>,
    requests: Mutex<Vec<Vec<Message>>>,
    calls: AtomicUsize,
}

impl ScriptedClient {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_results(replies.into_iter().map(|reply| Ok(reply.into())).collect())
    }

    /// Script that may include failures.
    pub fn with_results(results: Vec<Result<String, ApiError>>) -> Self {
        Self {
            script: Mutex::new(results.into()),
            ..Self::default()
        }
    }

    /// Number of model calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Message lists sent with each call, in order.
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }

    fn next_reply(&self, messages: &[Message]) -> Result<String, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(messages.to_vec());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::InvalidResponse("script exhausted".into())))
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn chat(&self, messages: &[Message]) -> Result<String, ApiError> {
        self.next_reply(messages)
    }

    async fn chat_stream(
        &self,
        messages: &[Message],
        on_chunk: &mut ChunkCallback<'_>,
    ) -> Result<String, ApiError> {
        let reply = self.next_reply(messages)?;
        let mut mid = reply.len() / 2;
        while !reply.is_char_boundary(mid) {
            mid += 1;
        }
        let (head, tail) = reply.split_at(mid);
        for chunk in [head, tail] {
            if !chunk.is_empty() {
                on_chunk(chunk);
            }
        }
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_dir_fixture_writes_and_resolves_paths() {
        let fixture = TestTempDir::new("fixture");
        let file = fixture.write_text("nested/file.txt", "hello");
        assert_eq!(fs::read_to_string(file).unwrap(), "hello");
    }

    #[tokio::test]
    async fn scripted_client_replays_then_errors() {
        let client = ScriptedClient::new(["one"]);
        assert_eq!(client.chat(&[Message::user("a")]).await.unwrap(), "one");
        assert!(client.chat(&[]).await.is_err());
        assert_eq!(client.calls(), 2);
        assert_eq!(client.requests()[0], vec![Message::user("a")]);
    }

    #[tokio::test]
    async fn scripted_stream_splits_on_char_boundary() {
        let client = ScriptedClient::new(["h\u{e9}llo"]);
        let mut chunks = Vec::new();
        let text = client
            .chat_stream(&[], &mut |chunk: &str| chunks.push(chunk.to_string()))
            .await
            .unwrap();
        assert_eq!(chunks.concat(), text);
        assert_eq!(chunks.len(), 2);
    }
}
