// Resilient transport: HTTP GET with bounded retry, one pooled session per client
// and a counter of physical attempts.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::{
    config::ClientConfig,
    error::{ApiError, ClientError, TransportError},
    request::QueryParams,
    retry::{CircuitBreaker, RetryPolicy},
};

/// A single physical GET returning decoded JSON.
#[async_trait]
pub trait HttpTransport: Send + Sync + 'static {
    async fn get_json(&self, url: &str, params: &QueryParams) -> Result<Value, TransportError>;
}

/// Production transport backed by one long-lived `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;

        Ok(Self { client })
    }

    /// Reuses a caller-built client, e.g. one with custom proxy or TLS settings.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get_json(&self, url: &str, params: &QueryParams) -> Result<Value, TransportError> {
        let response = self.client.get(url).query(params).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status_code: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

/// Wraps a transport with the retry policy and optional circuit breaker.
pub struct ResilientTransport {
    transport: Box<dyn HttpTransport>,
    retry_policy: RetryPolicy,
    circuit_breaker: Option<Mutex<CircuitBreaker>>,
    num_queries: AtomicUsize,
}

impl ResilientTransport {
    pub fn new(
        transport: impl HttpTransport,
        retry_policy: RetryPolicy,
        circuit_breaker: Option<CircuitBreaker>,
    ) -> Self {
        Self {
            transport: Box::new(transport),
            retry_policy,
            circuit_breaker: circuit_breaker.map(Mutex::new),
            num_queries: AtomicUsize::new(0),
        }
    }

    /// Physical attempts made so far, failed ones included.
    pub fn num_queries(&self) -> usize {
        self.num_queries.load(Ordering::SeqCst)
    }

    pub async fn query(&self, url: &str, params: &QueryParams) -> Result<Value, ApiError> {
        if let Some(cb) = &self.circuit_breaker {
            let allowed = cb.lock().should_allow_call();
            if let Err(remaining) = allowed {
                warn!(url, "circuit breaker open, skipping query");
                return Err(ApiError::CircuitBreakerOpen {
                    retry_after_ms: remaining.as_millis() as u64,
                });
            }
        }

        let result = self.query_with_retry(url, params).await;

        if let Some(cb) = &self.circuit_breaker {
            let mut cb = cb.lock();
            match &result {
                Ok(_) => cb.success(),
                Err(_) => cb.fail(),
            }
        }

        result
    }

    async fn query_with_retry(&self, url: &str, params: &QueryParams) -> Result<Value, ApiError> {
        let max_attempts = self.retry_policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.num_queries.fetch_add(1, Ordering::SeqCst);
            debug!(url, attempt, "sending query");

            match self.transport.get_json(url, params).await {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= max_attempts => {
                    error!(url, attempts = attempt, "gave up retrying query, last error: {err}");
                    return Err(ApiError::RetriesExhausted {
                        attempts: attempt,
                        source: err,
                    });
                }
                Err(err) => {
                    let backoff = self.retry_policy.backoff.delay(attempt);
                    warn!(
                        url,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        "query failed: {err}"
                    );
                    if !backoff.is_zero() {
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::mock_server::{MockServer, ServerMode};
    use super::*;
    use crate::{config::CircuitBreakerConfig, retry::BackoffStrategy};
    use serde_json::json;
    use std::{sync::Arc, time::Duration};

    const URL: &str = "https://api.test/farfnd/v4/oneWayFares";

    fn resilient(server: &MockServer, attempts: u32) -> ResilientTransport {
        ResilientTransport::new(server.clone(), RetryPolicy::immediate(attempts), None)
    }

    #[tokio::test]
    async fn test_succeeds_on_fifth_attempt() {
        let server = MockServer::new();
        server.add_response("oneWayFares", json!({"fares": []}));
        server.fail_next_requests(4);

        let transport = resilient(&server, 5);
        let value = tokio_test::assert_ok!(transport.query(URL, &QueryParams::new()).await);

        assert_eq!(value, json!({"fares": []}));
        assert_eq!(transport.num_queries(), 5);
        assert_eq!(server.request_count(), 5);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let server = MockServer::new();
        server.set_mode(ServerMode::CompleteOutage);

        let transport = resilient(&server, 5);
        let err = tokio_test::assert_err!(transport.query(URL, &QueryParams::new()).await);

        assert!(matches!(
            err,
            ApiError::RetriesExhausted {
                attempts: 5,
                source: TransportError::Network(_)
            }
        ));
        assert_eq!(transport.num_queries(), 5);
    }

    #[tokio::test]
    async fn test_malformed_json_is_retried() {
        let server = MockServer::new();
        server.set_mode(ServerMode::MalformedJson);

        let transport = resilient(&server, 3);
        let err = transport.query(URL, &QueryParams::new()).await.unwrap_err();

        assert!(matches!(
            err,
            ApiError::RetriesExhausted {
                source: TransportError::Decode(_),
                ..
            }
        ));
        assert_eq!(transport.num_queries(), 3);
    }

    #[tokio::test]
    async fn test_counter_accumulates_across_queries() {
        let server = MockServer::new();
        server.add_response("oneWayFares", json!({}));
        let transport = resilient(&server, 5);

        for _ in 0..3 {
            transport.query(URL, &QueryParams::new()).await.unwrap();
        }
        server.fail_next_requests(1);
        transport.query(URL, &QueryParams::new()).await.unwrap();

        assert_eq!(transport.num_queries(), 5);
    }

    struct RecordingBackoff(Arc<Mutex<Vec<u32>>>);

    impl BackoffStrategy for RecordingBackoff {
        fn delay(&self, attempt: u32) -> Duration {
            self.0.lock().push(attempt);
            Duration::ZERO
        }
    }

    #[tokio::test]
    async fn test_backoff_consulted_between_attempts_only() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let server = MockServer::new();
        server.set_mode(ServerMode::CompleteOutage);

        let transport = ResilientTransport::new(
            server.clone(),
            RetryPolicy::new(5, RecordingBackoff(seen.clone())),
            None,
        );
        let _ = transport.query(URL, &QueryParams::new()).await;

        assert_eq!(*seen.lock(), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_open_breaker_skips_physical_attempts() {
        let server = MockServer::new();
        server.set_mode(ServerMode::CompleteOutage);

        let breaker = CircuitBreaker::new(&CircuitBreakerConfig {
            failure_threshold: 1,
            success_threshold: 1,
            reset_timeout_ms: 60_000,
        });
        let transport = ResilientTransport::new(server.clone(), RetryPolicy::immediate(2), Some(breaker));

        let _ = transport.query(URL, &QueryParams::new()).await;
        assert_eq!(transport.num_queries(), 2);

        let err = transport.query(URL, &QueryParams::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::CircuitBreakerOpen { .. }));
        assert_eq!(transport.num_queries(), 2);
        assert_eq!(server.request_count(), 2);
    }

    struct SlowOutage;

    #[async_trait]
    impl HttpTransport for SlowOutage {
        async fn get_json(&self, _url: &str, _params: &QueryParams) -> Result<Value, TransportError> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Err(TransportError::Network("Service unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_half_open_breaker_lets_one_concurrent_query_through() {
        let breaker = CircuitBreaker::new(&CircuitBreakerConfig {
            failure_threshold: 1,
            success_threshold: 1,
            reset_timeout_ms: 0,
        });
        let transport = ResilientTransport::new(SlowOutage, RetryPolicy::immediate(1), Some(breaker));
        let params = QueryParams::new();

        let _ = transport.query(URL, &params).await;
        assert_eq!(transport.num_queries(), 1);

        let (a, b, c, d) = tokio::join!(
            transport.query(URL, &params),
            transport.query(URL, &params),
            transport.query(URL, &params),
            transport.query(URL, &params),
        );
        let results = [a, b, c, d];

        let rejected = results
            .iter()
            .filter(|r| matches!(r, Err(ApiError::CircuitBreakerOpen { .. })))
            .count();
        assert_eq!(rejected, 3);
        assert_eq!(transport.num_queries(), 2);
    }

    // One-shot HTTP server on a loopback port: answers the first request with
    // `status_line` and `body`, and hands back the raw request it received.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request: Vec<u8> = Vec::new();
            let mut chunk = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });
        (format!("http://{addr}/farfnd/v4/oneWayFares"), handle)
    }

    fn loopback_transport() -> ReqwestTransport {
        ReqwestTransport::from_client(reqwest::Client::builder().no_proxy().build().unwrap())
    }

    #[tokio::test]
    async fn test_reqwest_maps_server_error_to_status() {
        let (url, server) = serve_once("500 Internal Server Error", r#"{"message":"boom"}"#).await;

        let err = loopback_transport()
            .get_json(&url, &QueryParams::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TransportError::Status { status_code: 500, ref message } if message.contains("boom")
        ));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_reqwest_maps_non_json_body_to_decode() {
        let (url, server) = serve_once("200 OK", "<html>maintenance</html>").await;

        let err = loopback_transport()
            .get_json(&url, &QueryParams::new())
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Decode(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_reqwest_sends_query_and_decodes_json() {
        let (url, server) = serve_once("200 OK", r#"{"fares":[],"size":0}"#).await;
        let mut params = QueryParams::new();
        params.insert("departureAirportIataCode".to_string(), "DUB".to_string());

        let value = tokio_test::assert_ok!(loopback_transport().get_json(&url, &params).await);

        assert_eq!(value, json!({"fares": [], "size": 0}));
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /farfnd/v4/oneWayFares?departureAirportIataCode=DUB "));
    }
}
