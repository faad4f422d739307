//! HTTP transport used by `fetch`.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, trace};

use crate::errors::TransportError;

/// Called with `(loaded, total)` bytes while the body downloads.
pub type ProgressCallback<'a> = &'a mut (dyn FnMut(u64, u64) + Send);

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    /// Parsed JSON body, or the raw text as a JSON string.
    pub body: serde_json::Value,
}

impl HttpResponse {
    pub fn content_length(&self) -> Option<&str> {
        self.headers.get("content-length").map(String::as_str)
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform a GET. Non-2xx responses are errors carrying the status.
    /// A zero `timeout` means the request never times out.
    async fn get(
        &self,
        url: &str,
        timeout: Duration,
        on_progress: ProgressCallback<'_>,
    ) -> Result<HttpResponse, TransportError>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        timeout: Duration,
        on_progress: ProgressCallback<'_>,
    ) -> Result<HttpResponse, TransportError> {
        debug!(url, timeout_ms = timeout.as_millis() as u64, "GET");
        let map_err = |e: reqwest::Error| transport_error(e, timeout);

        let mut request = self.client.get(url);
        if !timeout.is_zero() {
            request = request.timeout(timeout);
        }
        let mut response = request.send().await.map_err(map_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::with_status(
                format!("Request failed with status code {}", status.as_u16()),
                status.as_u16(),
            ));
        }

        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let total = response.content_length();
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(map_err)? {
            body.extend_from_slice(&chunk);
            trace!(loaded = body.len(), ?total, "chunk");
            if let Some(total) = total {
                on_progress(body.len() as u64, total);
            }
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            headers,
            body: parse_body(&body),
        })
    }
}

fn transport_error(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        return TransportError::new(format!("timeout of {}ms exceeded", timeout.as_millis()));
    }
    match err.status() {
        Some(status) => TransportError::with_status(err.to_string(), status.as_u16()),
        None => TransportError::new(err.to_string()),
    }
}

/// JSON when the body parses, otherwise the text itself.
pub fn parse_body(bytes: &[u8]) -> serde_json::Value {
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::get};
    use serde_json::json;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn body_parses_json_or_keeps_text() {
        assert_eq!(parse_body(br#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(parse_body(b"hello"), json!("hello"));
    }

    #[tokio::test]
    async fn success_returns_status_headers_and_body() {
        let base = serve(Router::new().route("/data", get(|| async { Json(json!({"id": 7})) }))).await;
        let mut ticks = Vec::new();
        let mut on_progress = |loaded: u64, total: u64| ticks.push((loaded, total));

        let response = ReqwestTransport::new()
            .get(&format!("{}/data", base), Duration::from_secs(5), &mut on_progress)
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!({"id": 7}));
        assert!(response.headers.contains_key("content-type"));
        let (loaded, total) = *ticks.last().unwrap();
        assert_eq!(loaded, total);
    }

    #[tokio::test]
    async fn not_found_carries_status() {
        let base = serve(Router::new().route(
            "/missing",
            get(|| async { (StatusCode::NOT_FOUND, "nope") }),
        ))
        .await;

        let err = ReqwestTransport::new()
            .get(&format!("{}/missing", base), Duration::from_secs(5), &mut |_: u64, _: u64| {})
            .await
            .unwrap_err();

        assert_eq!(err.status, Some(404));
        assert_eq!(err.message, "Request failed with status code 404");
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let base = serve(Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        ))
        .await;

        let err = ReqwestTransport::new()
            .get(&format!("{}/slow", base), Duration::from_millis(100), &mut |_: u64, _: u64| {})
            .await
            .unwrap_err();

        assert_eq!(err.status, None);
        assert_eq!(err.message, "timeout of 100ms exceeded");
    }

    #[tokio::test]
    async fn zero_timeout_waits_for_the_server() {
        let base = serve(Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Json(json!({"late": true}))
            }),
        ))
        .await;

        let response = ReqwestTransport::new()
            .get(&format!("{}/slow", base), Duration::ZERO, &mut |_: u64, _: u64| {})
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!({"late": true}));
    }
}
