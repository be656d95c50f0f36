//! Resilient HTTP retrieval: a direct attempt with browser-like headers,
//! then an ordered chain of public CORS proxies, each with its own
//! response-unwrapping rule. Callers get a `Result` so "fetch failed" is
//! distinguishable from "zero results", but exhaustion never panics and is
//! expected to be non-fatal at every call site.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::debug;

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const BROWSER_ACCEPT: &str =
    "application/json, application/rss+xml, application/xml, text/xml, */*";

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self { status: 200, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

/// Seam under the proxy chain so the fallback order is testable with
/// scripted responses.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, browser_headers: bool)
        -> Result<TransportResponse, TransportError>;
}

/// Production transport backed by reqwest.
pub struct ReqwestTransport {
    client: reqwest::Client,
    user_agent: String,
}

impl ReqwestTransport {
    pub fn new(config: &FetchConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .gzip(true)
            .brotli(true)
            .timeout(config.timeout)
            .build()
            .context("building reqwest client")?;
        Ok(Self { client, user_agent: config.user_agent.clone() })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        browser_headers: bool,
    ) -> Result<TransportResponse, TransportError> {
        let mut request = self.client.get(url);
        if browser_headers {
            request = request
                .header(reqwest::header::USER_AGENT, &self.user_agent)
                .header(reqwest::header::ACCEPT, BROWSER_ACCEPT);
        }
        let response = request.send().await.map_err(|e| TransportError(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| TransportError(e.to_string()))?;
        Ok(TransportResponse { status, body })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProxyUnwrap {
    /// Payload arrives wrapped in a `contents` field that may itself be a
    /// JSON string requiring a second parse.
    AllOrigins,
    /// Body is the payload.
    Passthrough,
}

struct ProxyEndpoint {
    prefix: &'static str,
    unwrap: ProxyUnwrap,
}

impl ProxyEndpoint {
    fn proxied_url(&self, target: &str) -> String {
        format!("{}{}", self.prefix, urlencoding::encode(target))
    }
}

const PROXIES: &[ProxyEndpoint] = &[
    ProxyEndpoint { prefix: "https://api.allorigins.win/get?url=", unwrap: ProxyUnwrap::AllOrigins },
    ProxyEndpoint { prefix: "https://corsproxy.io/?", unwrap: ProxyUnwrap::Passthrough },
    ProxyEndpoint { prefix: "https://api.codetabs.com/v1/proxy?quest=", unwrap: ProxyUnwrap::Passthrough },
    ProxyEndpoint { prefix: "https://thingproxy.freeboard.io/fetch/", unwrap: ProxyUnwrap::Passthrough },
];

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("all fetch attempts exhausted for {url} ({attempts} attempts)")]
    Exhausted { url: String, attempts: usize },
}

/// Direct-then-proxy-chain fetcher shared by every source adapter. Adapters
/// never see proxy details.
pub struct ProxyFetcher {
    transport: Arc<dyn Transport>,
}

impl ProxyFetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Fetcher over a real HTTP client.
    pub fn over_http(config: FetchConfig) -> anyhow::Result<Self> {
        Ok(Self::new(Arc::new(ReqwestTransport::new(&config)?)))
    }

    /// Fetch a URL expected to yield JSON. An HTML error page in place of
    /// JSON counts as a failed attempt and the chain continues.
    pub async fn fetch_json(&self, url: &str) -> Result<JsonValue, FetchError> {
        match self.transport.get(url, true).await {
            Ok(resp) if resp.is_success() => {
                if let Some(value) = parse_json_payload(&resp.body) {
                    return Ok(value);
                }
                debug!(url, "direct fetch returned non-JSON payload");
            }
            Ok(resp) => debug!(url, status = resp.status, "direct fetch non-success"),
            Err(err) => debug!(url, %err, "direct fetch failed"),
        }

        for proxy in PROXIES {
            let proxied = proxy.proxied_url(url);
            match self.transport.get(&proxied, false).await {
                Ok(resp) if resp.is_success() => {
                    if let Some(value) = unwrap_proxy_json(proxy.unwrap, &resp.body) {
                        return Ok(value);
                    }
                    debug!(url, proxy = proxy.prefix, "proxy returned unparseable payload");
                }
                Ok(resp) => debug!(url, proxy = proxy.prefix, status = resp.status, "proxy non-success"),
                Err(err) => debug!(url, proxy = proxy.prefix, %err, "proxy request failed"),
            }
        }

        Err(FetchError::Exhausted { url: url.to_string(), attempts: 1 + PROXIES.len() })
    }

    /// Fetch a URL expected to yield text (RSS/XML). Same chain, but no JSON
    /// validation of the body.
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        match self.transport.get(url, true).await {
            Ok(resp) if resp.is_success() && !resp.body.trim().is_empty() => {
                return Ok(resp.body);
            }
            Ok(resp) => debug!(url, status = resp.status, "direct fetch non-success"),
            Err(err) => debug!(url, %err, "direct fetch failed"),
        }

        for proxy in PROXIES {
            let proxied = proxy.proxied_url(url);
            match self.transport.get(&proxied, false).await {
                Ok(resp) if resp.is_success() => {
                    if let Some(text) = unwrap_proxy_text(proxy.unwrap, &resp.body) {
                        return Ok(text);
                    }
                }
                Ok(resp) => debug!(url, proxy = proxy.prefix, status = resp.status, "proxy non-success"),
                Err(err) => debug!(url, proxy = proxy.prefix, %err, "proxy request failed"),
            }
        }

        Err(FetchError::Exhausted { url: url.to_string(), attempts: 1 + PROXIES.len() })
    }
}

fn looks_like_html(body: &str) -> bool {
    let head = body.trim_start().get(..15).unwrap_or(body.trim_start());
    let lower = head.to_ascii_lowercase();
    lower.starts_with("<!doctype") || lower.starts_with("<html")
}

fn parse_json_payload(body: &str) -> Option<JsonValue> {
    if looks_like_html(body) {
        return None;
    }
    serde_json::from_str(body).ok()
}

fn unwrap_proxy_json(unwrap: ProxyUnwrap, body: &str) -> Option<JsonValue> {
    match unwrap {
        ProxyUnwrap::Passthrough => parse_json_payload(body),
        ProxyUnwrap::AllOrigins => {
            let wrapper: JsonValue = serde_json::from_str(body).ok()?;
            match wrapper.get("contents")? {
                JsonValue::String(inner) => parse_json_payload(inner),
                other => Some(other.clone()),
            }
        }
    }
}

fn unwrap_proxy_text(unwrap: ProxyUnwrap, body: &str) -> Option<String> {
    match unwrap {
        ProxyUnwrap::Passthrough => {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(body.to_string())
            }
        }
        ProxyUnwrap::AllOrigins => {
            let wrapper: JsonValue = serde_json::from_str(body).ok()?;
            wrapper.get("contents")?.as_str().map(ToString::to_string)
        }
    }
}

/// Scripted transport for tests: responses are queued per URL, and any URL
/// without a queue entry fails the request.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: std::sync::Mutex<
        std::collections::HashMap<String, std::collections::VecDeque<Result<TransportResponse, TransportError>>>,
    >,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, url: &str, result: Result<TransportResponse, TransportError>) {
        self.responses
            .lock()
            .expect("scripted transport lock")
            .entry(url.to_string())
            .or_default()
            .push_back(result);
    }

    pub fn push_ok(&self, url: &str, body: &str) {
        self.push(url, Ok(TransportResponse::ok(body)));
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(
        &self,
        url: &str,
        _browser_headers: bool,
    ) -> Result<TransportResponse, TransportError> {
        let mut map = self.responses.lock().expect("scripted transport lock");
        match map.get_mut(url).and_then(|queue| queue.pop_front()) {
            Some(result) => result,
            None => Err(TransportError(format!("no scripted response for {url}"))),
        }
    }
}
