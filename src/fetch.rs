use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{error, warn};

/// Per-request timeout for every outbound HTTP call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Default retry budget per request.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Backoff unit: the wait before attempt `k + 1` is `k` units.
pub const BACKOFF_UNIT: Duration = Duration::from_secs(1);

/// Why a single attempt failed.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("RPC error: {0}")]
    Rpc(String),
    #[error("decode error: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Transport-neutral description of one outbound call.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl Request {
    pub fn get(url: &str) -> Self {
        Self {
            method: Method::Get,
            url: url.to_string(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post_json(url: &str, body: Value) -> Self {
        Self {
            method: Method::Post,
            url: url.to_string(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Value for a query key, if present.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Raw response: status code plus undecoded body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

/// Seam between the retry logic and the network.
pub trait Transport {
    fn send(&self, request: &Request) -> impl Future<Output = Result<Response, FetchError>> + Send;
}

/// reqwest-backed transport used in production.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: &Request) -> Result<Response, FetchError> {
        let builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        let builder = builder.query(&request.query);
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };

        let resp = builder.send().await.map_err(transport_error)?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(transport_error)?;
        Ok(Response { status, body })
    }
}

/// URLs can carry credentials (Telegram puts the bot token in the path), so
/// they are stripped before the error reaches any log line.
fn transport_error(e: reqwest::Error) -> FetchError {
    FetchError::Transport(e.without_url().to_string())
}

/// Bounded attempt budget with linear backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub unit: Duration,
}

impl RetryPolicy {
    /// Linear policy with the production one-second unit. `max_attempts` is
    /// clamped to at least one.
    pub fn linear(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            unit: BACKOFF_UNIT,
        }
    }

    /// Wait before the next attempt, after `attempt` attempts have been made.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.unit * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::linear(DEFAULT_MAX_ATTEMPTS)
    }
}

/// GET/POST returning a JSON body. Success means HTTP 200 and a parseable body.
///
/// Returns `None` once the attempt budget is exhausted.
pub async fn fetch_json<T: Transport>(
    transport: &T,
    request: &Request,
    policy: &RetryPolicy,
) -> Option<Value> {
    fetch_validated(transport, request, policy, |_| Ok(())).await
}

/// JSON-RPC call. On top of [`fetch_json`] semantics, a top-level `error`
/// field fails the attempt even on HTTP 200.
pub async fn fetch_rpc<T: Transport>(
    transport: &T,
    request: &Request,
    policy: &RetryPolicy,
) -> Option<Value> {
    fetch_validated(transport, request, policy, check_rpc_error).await
}

fn check_rpc_error(body: &Value) -> Result<(), FetchError> {
    match body.get("error") {
        None | Some(Value::Null) => Ok(()),
        Some(err) => {
            let msg = err
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string());
            Err(FetchError::Rpc(msg))
        }
    }
}

async fn fetch_validated<T, F>(
    transport: &T,
    request: &Request,
    policy: &RetryPolicy,
    validate: F,
) -> Option<Value>
where
    T: Transport,
    F: Fn(&Value) -> Result<(), FetchError>,
{
    let max = policy.max_attempts.max(1);
    let mut last_err: Option<FetchError> = None;

    for attempt in 1..=max {
        match attempt_once(transport, request, &validate).await {
            Ok(body) => return Some(body),
            Err(e) => {
                warn!(
                    "Request failed (attempt {attempt}/{max}) for {}: {e}",
                    request.url
                );
                last_err = Some(e);
            }
        }
        if attempt < max {
            tokio::time::sleep(policy.delay_after(attempt)).await;
        }
    }

    if let Some(e) = last_err {
        error!("All {max} attempts failed for {}: {e}", request.url);
    }
    None
}

async fn attempt_once<T, F>(
    transport: &T,
    request: &Request,
    validate: &F,
) -> Result<Value, FetchError>
where
    T: Transport,
    F: Fn(&Value) -> Result<(), FetchError>,
{
    let resp = transport.send(request).await?;
    if resp.status != 200 {
        return Err(FetchError::Status(resp.status));
    }
    let body: Value =
        serde_json::from_str(&resp.body).map_err(|e| FetchError::Decode(e.to_string()))?;
    validate(&body)?;
    Ok(body)
}

/// In-memory transports for tests.
#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Answers every request through a closure and records what was sent.
    pub struct FnTransport<F> {
        handler: F,
        pub requests: Mutex<Vec<Request>>,
    }

    impl<F> FnTransport<F>
    where
        F: Fn(&Request) -> Result<Response, FetchError> + Sync,
    {
        pub fn new(handler: F) -> Self {
            Self {
                handler,
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn sent(&self) -> Vec<Request> {
            self.requests.lock().unwrap().clone()
        }

        pub fn count_to(&self, url: &str) -> usize {
            self.sent().iter().filter(|r| r.url == url).count()
        }
    }

    impl<F> Transport for FnTransport<F>
    where
        F: Fn(&Request) -> Result<Response, FetchError> + Sync,
    {
        async fn send(&self, request: &Request) -> Result<Response, FetchError> {
            self.requests.lock().unwrap().push(request.clone());
            (self.handler)(request)
        }
    }

    pub fn ok(body: Value) -> Result<Response, FetchError> {
        Ok(Response {
            status: 200,
            body: body.to_string(),
        })
    }

    pub fn status(code: u16) -> Result<Response, FetchError> {
        Ok(Response {
            status: code,
            body: String::new(),
        })
    }

    /// Policy with a tiny backoff unit for paused-clock tests.
    pub fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            unit: Duration::from_millis(10),
        }
    }
}
