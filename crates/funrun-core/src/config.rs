// ── Runtime recorder configuration ──
//
// These types describe *where* records go and *which* policies apply.
// They never touch disk: the CLI builds a `RecorderConfig` from
// funrun-config and hands it in.

use std::time::Duration;

use chrono::{DateTime, FixedOffset, Offset, SecondsFormat, Utc};
use url::Url;

use crate::error::CoreError;
use crate::model::PaymentMethod;
use crate::security::RateLimitPolicy;
use crate::submit::SubmitPolicy;

/// Manila is UTC+8 all year (no daylight saving).
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 8;

/// Email domain shared by staff and student accounts.
pub const DEFAULT_SCHOOL_DOMAIN: &str = "g.cjc.edu.ph";

/// The fun-run registration fee, in pesos.
pub const DEFAULT_PAYMENT_AMOUNT: u32 = 200;

/// The school: which email domain belongs to it and which clock it keeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchoolPolicy {
    /// Email domain without the leading `@`.
    pub domain: String,
    pub utc_offset: FixedOffset,
}

impl SchoolPolicy {
    pub fn new(domain: impl Into<String>, utc_offset_hours: i32) -> Result<Self, CoreError> {
        let domain = domain.into().trim_start_matches('@').to_ascii_lowercase();
        if domain.is_empty() {
            return Err(CoreError::Config {
                message: "school domain must not be empty".into(),
            });
        }
        let utc_offset = utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| CoreError::Config {
                message: format!("UTC offset out of range: {utc_offset_hours} hours"),
            })?;
        Ok(Self { domain, utc_offset })
    }

    /// `MM/DD/YYYY, hh:mm:ss AM/PM` in school time, as stamped on records.
    pub fn submitted_at(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.utc_offset)
            .format("%m/%d/%Y, %I:%M:%S %p")
            .to_string()
    }

    /// `M/D/YYYY` in school time: the date key the statistics endpoint uses.
    pub fn stats_date(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.utc_offset)
            .format("%-m/%-d/%Y")
            .to_string()
    }
}

impl Default for SchoolPolicy {
    fn default() -> Self {
        Self {
            domain: DEFAULT_SCHOOL_DOMAIN.into(),
            utc_offset: FixedOffset::east_opt(DEFAULT_UTC_OFFSET_HOURS * 3600)
                .unwrap_or_else(|| Utc.fix()),
        }
    }
}

/// The fixed price. Neither value is ever taken from form input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentPolicy {
    pub amount: u32,
    pub method: PaymentMethod,
}

impl Default for PaymentPolicy {
    fn default() -> Self {
        Self {
            amount: DEFAULT_PAYMENT_AMOUNT,
            method: PaymentMethod::Cash,
        }
    }
}

/// Everything the recorder needs to talk to the backend.
///
/// Built by the CLI, passed to [`PaymentRecorder`](crate::PaymentRecorder).
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Endpoint payment records are POSTed to.
    pub submit_url: Url,
    /// Endpoint statistics are read from (often the same deployment).
    pub stats_url: Url,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    pub school: SchoolPolicy,
    pub payment: PaymentPolicy,
    pub submit: SubmitPolicy,
    pub form_rate_limit: RateLimitPolicy,
}

impl RecorderConfig {
    pub fn new(submit_url: Url, stats_url: Url) -> Self {
        Self {
            submit_url,
            stats_url,
            request_timeout: Duration::from_secs(30),
            school: SchoolPolicy::default(),
            payment: PaymentPolicy::default(),
            submit: SubmitPolicy::default(),
            form_rate_limit: RateLimitPolicy::FORM_SUBMISSION,
        }
    }
}

/// ISO-8601 UTC with millisecond precision and a `Z` suffix.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
