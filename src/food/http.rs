//! JSON-over-HTTP client with bounded retries and exponential backoff.

use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

use super::error::{Result, ScanError};

/// Which failures are worth another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryMode {
    /// Every failure is retried, client errors included.
    AllFailures,
    /// 4xx responses other than 429 fail immediately.
    Strict,
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub mode: RetryMode,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            mode: RetryMode::AllFailures,
        }
    }
}

impl RetryPolicy {
    /// Delay before the attempt following `attempt` (zero-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    fn should_retry(&self, error: &ScanError) -> bool {
        match self.mode {
            RetryMode::AllFailures => true,
            RetryMode::Strict => error.is_transient(),
        }
    }
}

/// Run `operation` until it succeeds or the policy gives up, sleeping
/// `base_delay * 2^attempt` between attempts. The last error is returned.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.max_retries.max(1);
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                log::warn!("{} attempt {} failed: {}", label, attempt + 1, e);
                if attempt + 1 >= attempts || !policy.should_retry(&e) {
                    return Err(e);
                }
                tokio::time::sleep(policy.delay_for(attempt)).await;
                attempt += 1;
            }
        }
    }
}

/// Shared HTTP client handed to every provider.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    policy: RetryPolicy,
}

impl HttpClient {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            client: Client::new(),
            policy,
        }
    }

    pub fn with_client(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Send the request built by `build` and parse the body as JSON,
    /// retrying per the policy. `build` runs once per attempt because
    /// multipart bodies cannot be replayed.
    pub async fn request_json<F>(&self, label: &str, build: F) -> Result<Value>
    where
        F: Fn(&Client) -> Result<RequestBuilder>,
    {
        let client = &self.client;
        let build = &build;
        retry_with_backoff(&self.policy, label, move || async move {
            send_json(build(client)?).await
        })
        .await
    }

    pub async fn get_json(&self, label: &str, url: &str, query: &[(&str, String)]) -> Result<Value> {
        self.request_json(label, |client| Ok(client.get(url).query(query)))
            .await
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

async fn send_json(request: RequestBuilder) -> Result<Value> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ScanError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::time::Instant;

    fn server_error() -> ScanError {
        ScanError::Status {
            status: 503,
            body: "unavailable".to_string(),
        }
    }

    #[test]
    fn delays_double_each_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(4000));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_third_attempt_after_two_delays() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let started = Instant::now();

        let result = retry_with_backoff(&policy, "test", move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(server_error())
            } else {
                Ok("ok")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1s after the first failure, 2s after the second
        let waited = started.elapsed();
        assert!(waited >= Duration::from_millis(3000));
        assert!(waited < Duration::from_millis(4000));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_retries_without_final_delay() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let started = Instant::now();

        let result: Result<()> = retry_with_backoff(&policy, "test", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(server_error())
        })
        .await;

        assert!(matches!(result, Err(ScanError::Status { status: 503, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // no sleep after the last attempt
        let waited = started.elapsed();
        assert!(waited >= Duration::from_millis(3000));
        assert!(waited < Duration::from_millis(7000));
    }

    #[tokio::test(start_paused = true)]
    async fn source_mode_retries_client_errors() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let _: Result<()> = retry_with_backoff(&policy, "test", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(ScanError::Status {
                status: 404,
                body: String::new(),
            })
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn strict_mode_stops_on_client_error_but_retries_429() {
        let policy = RetryPolicy {
            mode: RetryMode::Strict,
            ..RetryPolicy::default()
        };

        let calls = AtomicU32::new(0);
        let counter = &calls;
        let _: Result<()> = retry_with_backoff(&policy, "test", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(ScanError::Status {
                status: 401,
                body: String::new(),
            })
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let calls = AtomicU32::new(0);
        let counter = &calls;
        let _: Result<()> = retry_with_backoff(&policy, "test", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(ScanError::Status {
                status: 429,
                body: String::new(),
            })
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    /// Serve one canned response per connection, then stop accepting.
    async fn serve(replies: Vec<(&'static str, &'static str)>) -> (String, Arc<AtomicU32>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/food", listener.local_addr().unwrap());
        let connections = Arc::new(AtomicU32::new(0));
        let seen = connections.clone();

        tokio::spawn(async move {
            for (status, body) in replies {
                let (mut socket, _) = listener.accept().await.unwrap();
                seen.fetch_add(1, Ordering::SeqCst);

                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = socket.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);
                }

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
        });

        (url, connections)
    }

    fn client(policy: RetryPolicy) -> HttpClient {
        let client = Client::builder().pool_max_idle_per_host(0).build().unwrap();
        HttpClient::with_client(client, policy)
    }

    #[tokio::test(start_paused = true)]
    async fn request_json_retries_server_errors_until_success() {
        let (url, connections) = serve(vec![
            ("503 Service Unavailable", "busy"),
            ("503 Service Unavailable", "busy"),
            ("200 OK", r#"{"category":"apple","probability":0.9}"#),
        ])
        .await;
        let http = client(RetryPolicy::default());
        let builds = AtomicU32::new(0);
        let started = Instant::now();

        let value = http
            .request_json("local", |client| {
                builds.fetch_add(1, Ordering::SeqCst);
                Ok(client.get(&url))
            })
            .await
            .unwrap();

        assert_eq!(value["category"], "apple");
        assert_eq!(connections.load(Ordering::SeqCst), 3);
        assert_eq!(builds.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= Duration::from_millis(3000));
    }

    #[tokio::test]
    async fn non_success_status_keeps_code_and_body() {
        let (url, _) = serve(vec![("404 Not Found", "no such food")]).await;
        let http = client(RetryPolicy {
            max_retries: 1,
            ..RetryPolicy::default()
        });

        let err = http.get_json("local", &url, &[]).await.unwrap_err();
        match err {
            ScanError::Status { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "no such food");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_an_error() {
        let (url, connections) = serve(vec![("200 OK", "{not json")]).await;
        let http = client(RetryPolicy {
            max_retries: 1,
            ..RetryPolicy::default()
        });

        assert!(matches!(
            http.get_json("local", &url, &[]).await,
            Err(ScanError::Http(_))
        ));
        assert_eq!(connections.load(Ordering::SeqCst), 1);
    }
}
