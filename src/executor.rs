//! HTTP step execution.
//!
//! One request per step, timed end to end. Transport failures are folded
//! into the outcome instead of being returned as errors, so a virtual user
//! keeps generating load no matter what the network does.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, Url};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::domain::StepPayload;
use crate::error::TransportErrorKind;

/// Where a request ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Http(u16),
    Transport(TransportErrorKind),
}

impl OutcomeStatus {
    /// HTTP status, or 0 when no response was received.
    pub fn code(&self) -> u16 {
        match self {
            OutcomeStatus::Http(code) => *code,
            OutcomeStatus::Transport(_) => 0,
        }
    }

    pub fn is_transport_error(&self) -> bool {
        matches!(self, OutcomeStatus::Transport(_))
    }
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeStatus::Http(code) => write!(f, "{code}"),
            OutcomeStatus::Transport(kind) => write!(f, "transport:{}", kind.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub status: OutcomeStatus,
    pub body: String,
    pub latency: Duration,
}

impl StepOutcome {
    pub fn http(code: u16, body: impl Into<String>, latency: Duration) -> Self {
        Self {
            status: OutcomeStatus::Http(code),
            body: body.into(),
            latency,
        }
    }

    pub fn transport_error(kind: TransportErrorKind, latency: Duration) -> Self {
        Self {
            status: OutcomeStatus::Transport(kind),
            body: String::new(),
            latency,
        }
    }
}

#[async_trait]
pub trait StepExecutor: Send + Sync {
    async fn execute(&self, method: Method, path: &str, payload: &StepPayload) -> StepOutcome;
}

/// `reqwest`-backed executor. The client is shared by all virtual users so
/// they draw from one connection pool.
#[derive(Clone)]
pub struct HttpStepExecutor {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpStepExecutor {
    pub fn new(base_url: Url, timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_str(user_agent)?);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;
        Ok(Self { base_url, client })
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl StepExecutor for HttpStepExecutor {
    async fn execute(&self, method: Method, path: &str, payload: &StepPayload) -> StepOutcome {
        let url = self.url_for(path);
        let started = Instant::now();

        let resp = match self.client.request(method, &url).json(payload).send().await {
            Ok(resp) => resp,
            Err(e) => {
                let kind = TransportErrorKind::classify(&e);
                debug!(%url, error = %e, kind = kind.as_str(), "request failed");
                return StepOutcome::transport_error(kind, started.elapsed());
            }
        };

        let status = resp.status().as_u16();
        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(%url, status, error = %e, "response body read failed");
                String::new()
            }
        };

        StepOutcome::http(status, body, started.elapsed())
    }
}
