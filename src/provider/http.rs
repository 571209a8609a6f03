//! Shared HTTP client, auth headers and SSE framing.

use std::sync::OnceLock;

use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use futures::Stream;
use tracing::warn;

use crate::error::{ChatError, Result};

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
///
/// A builder failure is returned to the caller and retried on the next call.
pub fn shared_client() -> Result<&'static reqwest::Client> {
    if let Some(client) = SHARED_CLIENT.get() {
        return Ok(client);
    }
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .pool_max_idle_per_host(4)
        .build()
        .map_err(|e| ChatError::Configuration(format!("failed to build HTTP client: {e}")))?;
    // a concurrent initializer may win; its client is used and ours dropped
    Ok(SHARED_CLIENT.get_or_init(|| client))
}

/// Headers for a Bearer-token API.
pub fn bearer_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {api_key}")) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// Headers for the Anthropic API (x-api-key + version pin).
pub fn anthropic_headers(api_key: &str, version: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(api_key) {
        headers.insert("x-api-key", val);
    }
    if let Ok(val) = HeaderValue::from_str(version) {
        headers.insert("anthropic-version", val);
    }
    headers
}

/// Parse an SSE `data:` line, returning None for `[DONE]` and other fields.
pub fn parse_sse_data(line: &str) -> Option<&str> {
    let data = line
        .strip_prefix("data:")
        .map(|d| d.strip_prefix(' ').unwrap_or(d))?;
    if data == "[DONE]" {
        return None;
    }
    Some(data)
}

/// Map a non-success HTTP status to an error.
pub fn status_to_error(status: u16, body: &str) -> ChatError {
    match status {
        401 | 403 => ChatError::Authentication(body.to_string()),
        429 => ChatError::RateLimited {
            retry_after_ms: extract_retry_after(body),
        },
        _ => ChatError::api(status, body),
    }
}

fn extract_retry_after(body: &str) -> Option<u64> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("retry_after"))
                .and_then(|r| r.as_f64())
                .map(|s| (s * 1000.0) as u64)
        })
}

/// Send a streaming request and fail fast on a non-200 status.
pub async fn send_streaming(
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response> {
    let resp = request.send().await?;
    let status = resp.status().as_u16();
    if status != 200 {
        let body_text = resp.text().await.unwrap_or_default();
        return Err(status_to_error(status, &body_text));
    }
    Ok(resp)
}

/// Split a streaming response body into SSE `data:` payloads.
///
/// Dropping the returned stream drops the response and closes the connection.
pub fn sse_data_stream(resp: reqwest::Response) -> BoxStream<'static, Result<String>> {
    sse_data_payloads(resp.bytes_stream())
}

/// Frame raw body chunks into SSE `data:` payloads.
///
/// Bytes are buffered until a full line arrives, so a multibyte character
/// split across two chunks decodes intact.
pub(crate) fn sse_data_payloads<S, B>(byte_stream: S) -> BoxStream<'static, Result<String>>
where
    S: Stream<Item = std::result::Result<B, reqwest::Error>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut buffer: Vec<u8> = Vec::new();
        futures::pin_mut!(byte_stream);

        while let Some(chunk_result) = byte_stream.next().await {
            let chunk = match chunk_result {
                Ok(c) => c,
                Err(e) => {
                    yield Err(ChatError::Network(e));
                    break;
                }
            };

            buffer.extend_from_slice(chunk.as_ref());

            while let Some(line_end) = buffer.iter().position(|b| *b == b'\n') {
                let raw_line: Vec<u8> = buffer.drain(..=line_end).collect();
                if let Some(data) = decode_data_line(&raw_line) {
                    yield Ok(data);
                }
            }
        }

        if let Some(data) = decode_data_line(&buffer) {
            yield Ok(data);
        }
    };

    Box::pin(stream)
}

fn decode_data_line(raw_line: &[u8]) -> Option<String> {
    let line = match std::str::from_utf8(raw_line) {
        Ok(line) => line.trim(),
        Err(err) => {
            warn!(error = %err, "dropping SSE line that is not valid UTF-8");
            return None;
        }
    };
    if line.is_empty() || line.starts_with(':') {
        return None;
    }
    parse_sse_data(line).map(str::to_string)
}
