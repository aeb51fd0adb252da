// ── Submission with bounded retries ──
//
// One submission = up to `max_attempts` sends with linear backoff between
// them, all raced against a single overall timeout. When the timer wins
// the in-flight request future is dropped.

use std::future::Future;
use std::time::Duration;

use funrun_api::{BackendClient, SubmitAck};
use tracing::{debug, warn};

use crate::error::{CoreError, FailureKind};
use crate::model::PaymentRecord;

/// Retry and timeout budget for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitPolicy {
    /// Total sends, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// After failed attempt `n` the submitter waits `n × backoff_step`.
    pub backoff_step: Duration,
    /// Budget for every attempt and backoff together.
    pub timeout: Duration,
}

impl Default for SubmitPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step: Duration::from_secs(1),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Something that can deliver a payment record to the backend.
pub trait PaymentTransport: Send + Sync {
    fn send(
        &self,
        record: &PaymentRecord,
    ) -> impl Future<Output = Result<SubmitAck, funrun_api::Error>> + Send;
}

impl PaymentTransport for BackendClient {
    fn send(
        &self,
        record: &PaymentRecord,
    ) -> impl Future<Output = Result<SubmitAck, funrun_api::Error>> + Send {
        self.submit(record)
    }
}

/// A record the backend accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    /// How many sends it took.
    pub attempts: u32,
    pub ack: SubmitAck,
}

impl SubmissionReceipt {
    pub fn message(&self) -> Option<&str> {
        self.ack.message.as_deref()
    }
}

/// Sends records through a [`PaymentTransport`] under a [`SubmitPolicy`].
#[derive(Debug, Clone)]
pub struct Submitter<T> {
    transport: T,
    policy: SubmitPolicy,
}

impl<T: PaymentTransport> Submitter<T> {
    pub fn new(transport: T, policy: SubmitPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> SubmitPolicy {
        self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send `record`, retrying transient failures.
    ///
    /// Backend refusals and other non-transient errors return at once.
    pub async fn submit(&self, record: &PaymentRecord) -> Result<SubmissionReceipt, CoreError> {
        if let Ok(result) = tokio::time::timeout(self.policy.timeout, self.send_with_retry(record)).await {
            result
        } else {
            warn!(
                timeout_secs = self.policy.timeout.as_secs(),
                "submission timed out, abandoning request"
            );
            Err(CoreError::Timeout {
                timeout_secs: self.policy.timeout.as_secs(),
            })
        }
    }

    async fn send_with_retry(&self, record: &PaymentRecord) -> Result<SubmissionReceipt, CoreError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(attempt, max_attempts, "sending payment record");

            let err = match self.transport.send(record).await {
                Ok(ack) => {
                    return Ok(SubmissionReceipt {
                        attempts: attempt,
                        ack,
                    });
                }
                Err(err) => err,
            };

            if err.is_auth() {
                return Err(CoreError::SubmissionFailed {
                    attempts: attempt,
                    last_error: err.to_string(),
                    kind: FailureKind::Auth,
                });
            }
            if !err.is_transient() {
                return Err(err.into());
            }
            if attempt >= max_attempts {
                return Err(CoreError::SubmissionFailed {
                    attempts: attempt,
                    last_error: err.to_string(),
                    kind: FailureKind::of(&err),
                });
            }

            let backoff = self.policy.backoff_step.saturating_mul(attempt);
            warn!(
                attempt,
                error = %err,
                backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                "submission attempt failed, retrying"
            );
            tokio::time::sleep(backoff).await;
        }
    }
}
