// Backend HTTP client
//
// Wraps `reqwest::Client` with the two endpoints the payment backend
// exposes: a JSON POST that appends a payment record, and a GET that
// returns per-receiver aggregates. Both may live on different deployments,
// so each carries its own URL.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{BackendReply, DailyStats, SubmitAck};
use crate::transport::TransportConfig;

/// Longest slice of a response body carried into error messages.
const BODY_PREVIEW_LEN: usize = 200;

/// Raw HTTP client for the payment backend.
///
/// Reads every response, so a backend refusal surfaces as
/// [`Error::Backend`] instead of being mistaken for success.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    submit_url: Url,
    stats_url: Url,
    /// Per-request timeout the inner client enforces, when known.
    timeout: Option<Duration>,
}

impl BackendClient {
    /// Create a new client from a `TransportConfig`.
    pub fn new(submit_url: Url, stats_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            submit_url,
            stats_url,
            timeout: Some(transport.timeout),
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, submit_url: Url, stats_url: Url) -> Self {
        Self {
            http,
            submit_url,
            stats_url,
            timeout: None,
        }
    }

    /// Record the timeout `http` was built with, so timeouts report it.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The endpoint payment records are posted to.
    pub fn submit_url(&self) -> &Url {
        &self.submit_url
    }

    /// The endpoint statistics are read from.
    pub fn stats_url(&self) -> &Url {
        &self.stats_url
    }

    // ── Submission ───────────────────────────────────────────────────

    /// POST a payment record as JSON.
    ///
    /// A 2xx reply whose body cannot be interpreted still counts as
    /// accepted; the returned [`SubmitAck::confirmed`] is `false` then.
    pub async fn submit<T: Serialize + Sync>(&self, record: &T) -> Result<SubmitAck, Error> {
        debug!("POST {}", self.submit_url);

        let resp = self
            .http
            .post(self.submit_url.clone())
            .json(record)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                message: preview(&body).to_owned(),
            });
        }

        parse_submit_reply(&body)
    }

    // ── Statistics ───────────────────────────────────────────────────

    /// GET payment aggregates for one receiver.
    ///
    /// `date` is forwarded verbatim; when `None` the backend picks its own
    /// notion of today.
    pub async fn daily_stats(&self, user_email: &str, date: Option<&str>) -> Result<DailyStats, Error> {
        let mut url = self.stats_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("userEmail", user_email);
            if let Some(date) = date {
                query.append_pair("date", date);
            }
        }

        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                message: preview(&body).to_owned(),
            });
        }

        parse_stats_reply(&body)
    }

    /// Report reqwest timeouts with the configured budget.
    fn transport_error(&self, err: reqwest::Error) -> Error {
        match self.timeout {
            Some(timeout) if err.is_timeout() => Error::Timeout {
                timeout_secs: timeout.as_secs(),
            },
            _ => Error::Transport(err),
        }
    }
}

// ── Reply parsing ────────────────────────────────────────────────────

fn parse_submit_reply(body: &str) -> Result<SubmitAck, Error> {
    if body.trim().is_empty() {
        trace!("empty submission reply, treating as accepted");
        return Ok(SubmitAck::default());
    }

    match serde_json::from_str::<BackendReply>(body) {
        Ok(reply) => {
            if reply.success == Some(false) || reply.error.is_some() {
                return Err(Error::Backend {
                    message: reply
                        .error
                        .or(reply.message)
                        .unwrap_or_else(|| "request refused".into()),
                });
            }
            Ok(SubmitAck {
                message: reply.message,
                confirmed: reply.success == Some(true),
            })
        }
        Err(e) => {
            // Apps Script error pages and redirect stubs are HTML.
            trace!(error = %e, "non-JSON submission reply, treating as accepted");
            Ok(SubmitAck::default())
        }
    }
}

fn parse_stats_reply(body: &str) -> Result<DailyStats, Error> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(body)),
            body: body.to_owned(),
        })?;

    if let Some(message) = value.get("error").and_then(serde_json::Value::as_str) {
        return Err(Error::Backend {
            message: message.to_owned(),
        });
    }

    serde_json::from_value(value).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: body.to_owned(),
    })
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(BODY_PREVIEW_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
