//! Client for OpenAI-compatible `/chat/completions` endpoints.

use super::retry::RetryPolicy;
use super::sse::{SseDecoder, DONE_PAYLOAD};
use super::{ChunkCallback, LlmClient};
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::types::{ChatChunk, ChatRequest, ChatResponse, Message};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;

/// HTTP model client with bearer auth, bounded retries and SSE streaming.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: Option<f64>,
    retry_policy: RetryPolicy,
}

impl ApiClient {
    /// Build a client from resolved API configuration.
    pub fn new(config: &ApiConfig) -> Self {
        Self::new_with_retry_policy(config, RetryPolicy::from_config(config))
    }

    fn new_with_retry_policy(config: &ApiConfig, retry_policy: RetryPolicy) -> Self {
        // Fall back to reqwest defaults if builder creation fails for any reason.
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.trim().to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            retry_policy,
        }
    }

    fn request<'a>(&'a self, messages: &'a [Message], stream: bool) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            stream,
        }
    }

    /// Send one request and return the response once its status is 2xx.
    async fn send_once(&self, body: &ChatRequest<'_>) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut req = self.http.post(&url).json(body);
        if !self.api_key.is_empty() {
            req = req.bearer_auth(&self.api_key);
        }
        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                code: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn send_with_retries(
        &self,
        body: &ChatRequest<'_>,
    ) -> Result<reqwest::Response, ApiError> {
        let mut failures: u32 = 0;
        loop {
            match self.send_once(body).await {
                Ok(response) => return Ok(response),
                Err(err) => {
                    failures = failures.saturating_add(1);
                    let Some(delay) = self.retry_policy.next_delay(&err, failures, body.stream)
                    else {
                        return Err(err);
                    };
                    tracing::warn!(failures, ?delay, error = %err, "model request failed; retrying");
                    sleep(delay).await;
                }
            }
        }
    }
}

#[async_trait]
impl LlmClient for ApiClient {
    async fn chat(&self, messages: &[Message]) -> Result<String, ApiError> {
        let response = self
            .send_with_retries(&self.request(messages, false))
            .await?;
        let text = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("{e}: {text}")))?;
        let choice = parsed.choices.into_iter().next().ok_or_else(|| {
            ApiError::InvalidResponse("response contained no choices".to_string())
        })?;
        Ok(choice.message.content.unwrap_or_default())
    }

    async fn chat_stream(
        &self,
        messages: &[Message],
        on_chunk: &mut ChunkCallback<'_>,
    ) -> Result<String, ApiError> {
        let mut response = match self.send_with_retries(&self.request(messages, true)).await {
            Ok(response) => response,
            Err(err) if err.status_code() == Some(503) => {
                tracing::warn!("streaming unavailable (503); falling back to a single request");
                let text = self.chat(messages).await?;
                if !text.is_empty() {
                    on_chunk(&text);
                }
                return Ok(text);
            }
            Err(err) => return Err(err),
        };

        let mut decoder = SseDecoder::default();
        let mut full = String::new();
        let mut done = false;
        while !done {
            let Some(bytes) = response.chunk().await? else {
                break;
            };
            done = forward_payloads(decoder.push(&bytes), &mut full, on_chunk)?;
        }
        if !done {
            forward_payloads(decoder.finish(), &mut full, on_chunk)?;
        }
        Ok(full)
    }
}

/// Forward the text deltas in `payloads`. Returns `true` once `[DONE]` is
/// seen; anything after it is ignored.
fn forward_payloads(
    payloads: Vec<String>,
    full: &mut String,
    on_chunk: &mut ChunkCallback<'_>,
) -> Result<bool, ApiError> {
    for payload in payloads {
        if payload.trim() == DONE_PAYLOAD {
            return Ok(true);
        }
        let chunk: ChatChunk = serde_json::from_str(&payload)
            .map_err(|e| ApiError::InvalidResponse(format!("bad stream chunk: {e}")))?;
        let delta = chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content);
        if let Some(text) = delta.filter(|text| !text.is_empty()) {
            on_chunk(&text);
            full.push_str(&text);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn config(base_url: String) -> ApiConfig {
        ApiConfig {
            base_url,
            api_key: "test-key".to_string(),
            model: "dummy-model".to_string(),
            timeout_secs: 3,
            ..ApiConfig::default()
        }
    }

    fn fast_retries() -> RetryPolicy {
        RetryPolicy {
            retries: 1,
            first_delay: Duration::from_millis(1),
            delay_cap: Duration::from_millis(5),
        }
    }

    fn http_response(status: &str, content_type: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    /// Answer successive connections with `responses`, returning the raw
    /// requests seen.
    async fn serve(responses: Vec<String>) -> (String, tokio::task::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let mut seen = Vec::new();
            for response in responses {
                let (mut stream, _) = listener.accept().await.expect("accept");
                let mut buf = vec![0u8; 16384];
                let n = stream.read(&mut buf).await.unwrap_or(0);
                seen.push(String::from_utf8_lossy(&buf[..n]).to_string());
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
            seen
        });
        (format!("http://{addr}"), handle)
    }

    const CHAT_BODY: &str = r#"{"id":"ok","choices":[{"index":0,"message":{"role":"assistant","content":"done"},"finish_reason":"stop"}]}"#;

    #[tokio::test]
    async fn chat_returns_first_choice_content_and_sends_bearer() {
        let (base, server) = serve(vec![http_response("200 OK", "application/json", CHAT_BODY)]).await;
        let client = ApiClient::new(&config(base));
        let text = client.chat(&[Message::user("hello")]).await.unwrap();
        assert_eq!(text, "done");

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("POST /chat/completions"));
        assert!(requests[0].to_ascii_lowercase().contains("authorization: bearer test-key"));
        assert!(requests[0].contains("\"model\":\"dummy-model\""));
        assert!(!requests[0].contains("\"stream\""));
    }

    #[tokio::test]
    async fn chat_retries_transient_429() {
        let (base, _server) = serve(vec![
            http_response("429 Too Many Requests", "application/json", "{\"error\":\"rate\"}"),
            http_response("200 OK", "application/json", CHAT_BODY),
        ])
        .await;
        let client = ApiClient::new_with_retry_policy(&config(base), fast_retries());
        assert_eq!(client.chat(&[Message::user("hi")]).await.unwrap(), "done");
    }

    #[tokio::test]
    async fn chat_surfaces_client_errors_without_retry() {
        let (base, _server) = serve(vec![http_response(
            "401 Unauthorized",
            "application/json",
            "{\"error\":\"bad key\"}",
        )])
        .await;
        let client = ApiClient::new_with_retry_policy(&config(base), fast_retries());
        let err = client.chat(&[Message::user("hi")]).await.unwrap_err();
        assert_eq!(err.status_code(), Some(401));
        assert!(err.to_string().contains("bad key"));
    }

    #[tokio::test]
    async fn chat_rejects_response_without_choices() {
        let (base, _server) =
            serve(vec![http_response("200 OK", "application/json", "{\"choices\":[]}")]).await;
        let client = ApiClient::new(&config(base));
        let err = client.chat(&[Message::user("hi")]).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)), "got: {err}");
    }

    #[tokio::test]
    async fn stream_forwards_deltas_and_stops_at_done() {
        let sse = concat!(
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"Final \"}}]}\n\n",
            ": keep-alive\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"Answer: hi\"}}]}\n\n",
            "data: [DONE]\n\n",
        );
        let (base, server) = serve(vec![http_response("200 OK", "text/event-stream", sse)]).await;
        let client = ApiClient::new(&config(base));
        let mut chunks = Vec::new();
        let text = client
            .chat_stream(&[Message::user("hi")], &mut |chunk: &str| {
                chunks.push(chunk.to_string())
            })
            .await
            .unwrap();
        assert_eq!(text, "Final Answer: hi");
        assert_eq!(chunks, vec!["Final ", "Answer: hi"]);
        let requests = server.await.unwrap();
        assert!(requests[0].contains("\"stream\":true"));
    }

    #[tokio::test]
    async fn stream_falls_back_to_chat_on_503() {
        let (base, server) = serve(vec![
            http_response("503 Service Unavailable", "text/plain", "busy"),
            http_response("200 OK", "application/json", CHAT_BODY),
        ])
        .await;
        let client = ApiClient::new_with_retry_policy(&config(base), fast_retries());
        let mut chunks = Vec::new();
        let text = client
            .chat_stream(&[Message::user("hi")], &mut |chunk: &str| {
                chunks.push(chunk.to_string())
            })
            .await
            .unwrap();
        assert_eq!(text, "done");
        assert_eq!(chunks, vec!["done"]);
        let requests = server.await.unwrap();
        assert_eq!(requests.len(), 2);
        assert!(!requests[1].contains("\"stream\""));
    }

    #[tokio::test]
    async fn client_respects_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _accept = tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.expect("accept");
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let mut api = config(format!("http://{addr}"));
        api.timeout_secs = 1;
        let client = ApiClient::new_with_retry_policy(
            &api,
            RetryPolicy {
                retries: 0,
                ..RetryPolicy::default()
            },
        );
        let err = client.chat(&[Message::user("hello")]).await.unwrap_err();
        match err {
            ApiError::Http(inner) => assert!(inner.is_timeout(), "unexpected error: {inner}"),
            other => panic!("expected timeout Http error, got: {other}"),
        }
    }
}
