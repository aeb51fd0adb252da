// ── Payment recorder ──
//
// The form-submit flow: rate limit, sanitize, validate, stamp the record
// with policy and session fields, then hand it to the submitter. Each step
// fails with its own `CoreError` variant so the caller can pick a message.

use std::str::FromStr;
use std::sync::Arc;

use funrun_api::{BackendClient, TransportConfig};
use serde_json::json;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::config::{PaymentPolicy, RecorderConfig, SchoolPolicy, iso_timestamp};
use crate::error::{CoreError, ValidationError};
use crate::model::{College, PaymentForm, PaymentRecord, StaffIdentity};
use crate::security::{
    MAX_INPUT_LEN, RateLimitPolicy, RateLimiter, is_valid_email, is_valid_name,
    is_valid_student_id, log_security_event, sanitize_input,
};
use crate::submit::{PaymentTransport, SubmissionReceipt, Submitter};

/// Longest course/program name accepted.
pub const MAX_COURSE_LEN: usize = 100;

/// A recorded payment and the backend's acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    pub record: PaymentRecord,
    pub receipt: SubmissionReceipt,
}

/// Validates form input and submits payment records.
pub struct PaymentRecorder<T = BackendClient> {
    submitter: Submitter<T>,
    limiter: Arc<RateLimiter>,
    clock: Arc<dyn Clock>,
    school: SchoolPolicy,
    payment: PaymentPolicy,
    form_rate_limit: RateLimitPolicy,
}

impl PaymentRecorder<BackendClient> {
    /// Recorder talking to the configured backend over HTTP.
    pub fn connect(config: &RecorderConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig::default().with_timeout(config.request_timeout);
        let client = BackendClient::new(
            config.submit_url.clone(),
            config.stats_url.clone(),
            &transport,
        )?;
        Ok(Self::new(client, config))
    }
}

impl<T: PaymentTransport> PaymentRecorder<T> {
    /// In-memory rate limiter on the wall clock.
    pub fn new(transport: T, config: &RecorderConfig) -> Self {
        Self {
            submitter: Submitter::new(transport, config.submit),
            limiter: Arc::new(RateLimiter::in_memory()),
            clock: Arc::new(SystemClock),
            school: config.school.clone(),
            payment: config.payment,
            form_rate_limit: config.form_rate_limit,
        }
    }

    /// Share a limiter (and its store) with other recorders.
    #[must_use]
    pub fn with_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    /// Time source for record stamps and rate-limit retry hints.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn transport(&self) -> &T {
        self.submitter.transport()
    }

    pub fn school(&self) -> &SchoolPolicy {
        &self.school
    }

    pub fn payment(&self) -> PaymentPolicy {
        self.payment
    }

    /// Take one payment: the full form-submit flow.
    pub async fn record(
        &self,
        form: &PaymentForm,
        staff: &StaffIdentity,
    ) -> Result<RecordOutcome, CoreError> {
        self.check_rate_limit(staff)?;
        let record = self.prepare(form, staff)?;
        let receipt = self.submit_record(&record, staff).await?;
        Ok(RecordOutcome { record, receipt })
    }

    /// Sanitize and validate `form`, then build the record.
    ///
    /// Does not touch the rate limiter or the network, so it doubles as a
    /// dry run.
    pub fn prepare(
        &self,
        form: &PaymentForm,
        staff: &StaffIdentity,
    ) -> Result<PaymentRecord, ValidationError> {
        let student_name = clean("studentName", &form.student_name)?;
        let student_id = clean("studentId", &form.student_id)?;
        let email = clean("email", &form.email)?;
        let college = clean("college", &form.college)?;
        let course = clean("course", &form.course)?;

        if student_name.is_empty() {
            return Err(ValidationError::MissingName);
        }
        if !is_valid_name(&student_name) {
            log_security_event("invalid_name_format", &json!({ "studentName": student_name }));
            return Err(ValidationError::InvalidName);
        }

        if student_id.is_empty() {
            return Err(ValidationError::MissingStudentId);
        }
        if !is_valid_student_id(&student_id) {
            log_security_event("invalid_student_id_format", &json!({ "studentId": student_id }));
            return Err(ValidationError::InvalidStudentId);
        }

        if email.is_empty() {
            return Err(ValidationError::MissingEmail);
        }
        if !is_valid_email(&email, &self.school.domain) {
            log_security_event("invalid_email_format", &json!({ "email": email }));
            return Err(ValidationError::InvalidEmail {
                domain: self.school.domain.clone(),
            });
        }

        if college.is_empty() {
            return Err(ValidationError::MissingCollege);
        }
        let college =
            College::from_str(&college).map_err(|_| ValidationError::UnknownCollege { value: college })?;

        if course.is_empty() {
            return Err(ValidationError::MissingCourse);
        }
        if course.chars().count() > MAX_COURSE_LEN {
            return Err(ValidationError::CourseTooLong {
                max: MAX_COURSE_LEN,
            });
        }

        let now = self.clock.now();
        Ok(PaymentRecord {
            student_name,
            student_id,
            email,
            college,
            course,
            payment_amount: self.payment.amount,
            payment_method: self.payment.method,
            received_by: staff.received_by(),
            receiver_email: staff.email.clone(),
            receiver_google_id: staff.google_id.clone(),
            timestamp: iso_timestamp(now),
            submitted_at: self.school.submitted_at(now),
        })
    }

    /// Check the fields a caller could have altered after [`prepare`](Self::prepare).
    pub fn validate_record(
        &self,
        record: &PaymentRecord,
        staff: &StaffIdentity,
    ) -> Result<(), ValidationError> {
        if record.payment_amount != self.payment.amount {
            log_security_event(
                "payment_amount_tampered",
                &json!({ "expected": self.payment.amount, "actual": record.payment_amount }),
            );
            return Err(ValidationError::AmountMismatch {
                expected: self.payment.amount,
                actual: record.payment_amount,
            });
        }

        if record.payment_method != self.payment.method {
            log_security_event(
                "payment_method_tampered",
                &json!({
                    "expected": self.payment.method.to_string(),
                    "actual": record.payment_method.to_string(),
                }),
            );
            return Err(ValidationError::MethodMismatch {
                expected: self.payment.method,
                actual: record.payment_method,
            });
        }

        if record.received_by != staff.received_by()
            || record.receiver_email != staff.email
            || record.receiver_google_id != staff.google_id
        {
            log_security_event(
                "receiver_mismatch",
                &json!({ "receivedBy": record.received_by, "staff": staff.email }),
            );
            return Err(ValidationError::ReceiverMismatch);
        }

        Ok(())
    }

    /// Re-validate `record` against policy and `staff`, then send it.
    pub async fn submit_record(
        &self,
        record: &PaymentRecord,
        staff: &StaffIdentity,
    ) -> Result<SubmissionReceipt, CoreError> {
        self.validate_record(record, staff)?;

        debug!(student_id = %record.student_id, college = %record.college, "submitting payment");
        let receipt = self.submitter.submit(record).await?;
        info!(
            student_id = %record.student_id,
            college = %record.college,
            received_by = %record.receiver_email,
            attempts = receipt.attempts,
            confirmed = receipt.ack.confirmed,
            "payment recorded"
        );
        Ok(receipt)
    }

    fn check_rate_limit(&self, staff: &StaffIdentity) -> Result<(), CoreError> {
        let key = staff.submission_key();
        // Keys idle for a full window carry no live attempts.
        self.limiter.evict_idle(self.form_rate_limit.window);
        if self.limiter.check(&key, self.form_rate_limit) {
            return Ok(());
        }

        log_security_event("rate_limit_exceeded", &json!({ "user": staff.email }));
        let status = self.limiter.status(&key, self.form_rate_limit);
        let retry_after = status
            .reset_at
            .signed_duration_since(self.clock.now())
            .to_std()
            .unwrap_or_default();
        Err(CoreError::RateLimitExceeded { retry_after })
    }
}

impl<T> std::fmt::Debug for PaymentRecorder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentRecorder")
            .field("school", &self.school)
            .field("payment", &self.payment)
            .field("form_rate_limit", &self.form_rate_limit)
            .finish_non_exhaustive()
    }
}

/// Sanitize one field, enforce the input cap, and trim the result.
fn clean(field: &'static str, raw: &str) -> Result<String, ValidationError> {
    let sanitized = sanitize_input(raw);
    if sanitized.chars().count() > MAX_INPUT_LEN {
        return Err(ValidationError::InputTooLong {
            field,
            max: MAX_INPUT_LEN,
        });
    }
    Ok(sanitized.trim().to_owned())
}
