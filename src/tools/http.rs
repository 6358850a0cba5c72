//! HTTP request tool.
//!
//! Sends one request with an arbitrary method, headers and body, and reports
//! status, timing, headers and the (truncated) body back to the model.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use super::{schema_text, Tool};
use crate::error::ToolError;
use crate::textutil::truncate_with_suffix_by_bytes;

/// Maximum bytes of response body to return.
const MAX_BODY_LEN: usize = 8000;

/// Tool that performs an HTTP request against the API under test.
pub struct HttpRequestTool {
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct Args {
    #[serde(default = "default_method")]
    method: String,
    url: String,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    /// A string is sent as-is; any other JSON value is sent as JSON.
    #[serde(default)]
    body: Option<Value>,
}

fn default_method() -> String {
    "GET".to_string()
}

impl HttpRequestTool {
    pub fn new(timeout: Duration) -> Self {
        // Fall back to reqwest defaults if builder creation fails for any reason.
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { http }
    }
}

#[async_trait]
impl Tool for HttpRequestTool {
    fn name(&self) -> &str {
        "http_request"
    }

    fn description(&self) -> &str {
        "Send an HTTP request and return the status, headers, timing and response body."
    }

    fn parameter_schema(&self) -> String {
        schema_text(serde_json::json!({
            "type": "object",
            "properties": {
                "method": { "type": "string", "description": "HTTP method, default GET" },
                "url": { "type": "string", "description": "Absolute http(s) URL" },
                "headers": { "type": "object", "description": "Header name to value" },
                "body": { "description": "String body, or any JSON value to send as JSON" }
            },
            "required": ["url"]
        }))
    }

    async fn execute(&self, arguments: &str) -> Result<String, ToolError> {
        let args: Args = serde_json::from_str(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        let method = reqwest::Method::from_bytes(args.method.trim().to_ascii_uppercase().as_bytes())
            .map_err(|_| ToolError::InvalidArguments(format!("invalid method `{}`", args.method)))?;
        let url = reqwest::Url::parse(&args.url)
            .map_err(|e| ToolError::InvalidArguments(format!("invalid url `{}`: {e}", args.url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ToolError::InvalidArguments(format!(
                "unsupported url scheme `{}`",
                url.scheme()
            )));
        }

        let mut request = self.http.request(method.clone(), url);
        for (name, value) in &args.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        request = match args.body {
            None | Some(Value::Null) => request,
            Some(Value::String(text)) => request.body(text),
            Some(json) => request.json(&json),
        };

        tracing::debug!(%method, url = %args.url, "sending http request");
        let started = Instant::now();
        let response = request
            .send()
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        let status = response.status();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    value.to_str().unwrap_or("<binary>").to_string(),
                )
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        let elapsed = started.elapsed();

        Ok(format_response(
            &status.to_string(),
            elapsed,
            &headers,
            &body,
        ))
    }
}

/// Render a response summary for the model.
fn format_response(
    status: &str,
    elapsed: Duration,
    headers: &[(String, String)],
    body: &str,
) -> String {
    let mut out = format!("Status: {status}\nTime: {} ms\nHeaders:\n", elapsed.as_millis());
    for (name, value) in headers {
        out.push_str(&format!("  {name}: {value}\n"));
    }
    out.push_str("Body:\n");
    let pretty = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| serde_json::to_string_pretty(&json).ok());
    let body = pretty.as_deref().unwrap_or(body);
    if body.is_empty() {
        out.push_str("<empty>");
    } else {
        out.push_str(&truncate_with_suffix_by_bytes(
            body,
            MAX_BODY_LEN,
            "...[truncated]",
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one canned response and hand back the raw request.
    async fn serve_once(response: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap();
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&buf[..n]).to_string()
        });
        (format!("http://{addr}"), handle)
    }

    fn tool() -> HttpRequestTool {
        HttpRequestTool::new(Duration::from_secs(5))
    }

    #[test]
    fn name_is_http_request() {
        assert_eq!(tool().name(), "http_request");
        assert!(tool().parameter_schema().contains("\"url\""));
    }

    #[tokio::test]
    async fn invalid_json_returns_error() {
        let err = tool().execute("not json").await.unwrap_err();
        assert!(err.to_string().contains("invalid arguments"));
    }

    #[tokio::test]
    async fn invalid_method_returns_error() {
        let err = tool()
            .execute(r#"{"method":"GE T","url":"http://localhost"}"#)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid method"), "got: {err}");
    }

    #[tokio::test]
    async fn non_http_scheme_is_rejected() {
        let err = tool()
            .execute(r#"{"url":"file:///etc/passwd"}"#)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unsupported url scheme"), "got: {err}");
    }

    #[tokio::test]
    async fn request_reports_status_headers_and_pretty_body() {
        let (base, server) = serve_once(
            "HTTP/1.1 201 Created\r\nContent-Type: application/json\r\nContent-Length: 11\r\nConnection: close\r\n\r\n{\"id\":\"42\"}",
        )
        .await;
        let args = format!(
            r#"{{"method":"post","url":"{base}/items","headers":{{"X-Trace":"abc"}},"body":{{"name":"x"}}}}"#
        );
        let out = tool().execute(&args).await.unwrap();
        assert!(out.starts_with("Status: 201 Created"), "got: {out}");
        assert!(out.contains("content-type: application/json"), "got: {out}");
        assert!(out.contains("\"id\": \"42\""), "got: {out}");

        let raw_request = server.await.unwrap();
        assert!(raw_request.starts_with("POST /items"), "got: {raw_request}");
        assert!(raw_request.to_ascii_lowercase().contains("x-trace: abc"));
        assert!(raw_request.contains("{\"name\":\"x\"}"));
    }

    #[tokio::test]
    async fn connection_failure_is_execution_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = tool()
            .execute(&format!(r#"{{"url":"http://{addr}/"}}"#))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("execution failed"), "got: {err}");
    }

    #[test]
    fn format_response_marks_empty_and_truncates_large_bodies() {
        let out = format_response("204 No Content", Duration::from_millis(3), &[], "");
        assert!(out.contains("Time: 3 ms"));
        assert!(out.ends_with("<empty>"));

        let big = "x".repeat(MAX_BODY_LEN + 10);
        let out = format_response("200 OK", Duration::ZERO, &[], &big);
        assert!(out.ends_with("...[truncated]"));
    }
}
