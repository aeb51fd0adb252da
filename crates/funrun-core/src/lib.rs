//! Domain logic for recording fun-run payments.
//!
//! Sits between `funrun-api` (raw HTTP) and the `funrun` binary:
//!
//! - **[`PaymentRecorder`]** runs the form-submit flow: rate limit,
//!   sanitize, validate, stamp the record from policy and session, then
//!   submit with bounded retries and a timeout race ([`Submitter`]).
//! - **[`AccessPolicy`]** turns a Google ID token into a [`StaffIdentity`],
//!   enforcing the school domain and the authorized-users list.
//! - **[`SessionStore`]** persists the signed-in staff member for 24 hours.
//! - **[`StatsReader`]** reads per-receiver payment totals.
//! - **[`security`]** holds the leaf checks: input sanitizer, field
//!   validators, sliding-window rate limiter, and security event logging.

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod recorder;
pub mod security;
pub mod session;
pub mod stats;
pub mod submit;

// ── Primary re-exports ──────────────────────────────────────────────
pub use auth::{AccessPolicy, AuthError, IdTokenClaims, decode_claims};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{PaymentPolicy, RecorderConfig, SchoolPolicy};
pub use error::{CoreError, FailureKind, ValidationError};
pub use model::{College, PaymentForm, PaymentMethod, PaymentRecord, StaffIdentity};
pub use recorder::{PaymentRecorder, RecordOutcome};
pub use security::{RateLimitPolicy, RateLimiter};
pub use session::{Restored, SessionError, SessionStore, StoredSession};
pub use stats::{StatsReader, StatsReport};
pub use submit::{PaymentTransport, SubmissionReceipt, SubmitPolicy, Submitter};

// Wire types callers see in receipts and reports.
pub use funrun_api::{DailyStats, SubmitAck};
