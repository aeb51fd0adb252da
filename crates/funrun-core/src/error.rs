// ── Core error types ──
//
// User-facing errors from funrun-core. Consumers never see HTTP status
// codes or JSON parse failures directly: the `From<funrun_api::Error>`
// impl folds transport-layer errors into the taxonomy below.

use std::time::Duration;

use thiserror::Error;

use crate::auth::AuthError;
use crate::model::PaymentMethod;
use crate::session::SessionError;

/// A form field that failed validation. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Input too long. Please keep it under {max} characters.")]
    InputTooLong { field: &'static str, max: usize },

    #[error("Please enter the student name")]
    MissingName,

    #[error("Please enter a valid student name (letters, spaces, hyphens, and apostrophes only)")]
    InvalidName,

    #[error("Please enter the student ID")]
    MissingStudentId,

    #[error(
        "Please enter a valid student ID (3-20 characters, letters, numbers, hyphens, and underscores only)"
    )]
    InvalidStudentId,

    #[error("Please enter the student email")]
    MissingEmail,

    #[error("Please enter a valid email address ending in @{domain}")]
    InvalidEmail { domain: String },

    #[error("Please select a college")]
    MissingCollege,

    #[error("Unknown college '{value}'")]
    UnknownCollege { value: String },

    #[error("Please enter the course/program")]
    MissingCourse,

    #[error("Course name is too long. Please keep it under {max} characters.")]
    CourseTooLong { max: usize },

    #[error("Payment amount must be {expected}, got {actual}")]
    AmountMismatch { expected: u32, actual: u32 },

    #[error("Payment method must be {expected}, got {actual}")]
    MethodMismatch {
        expected: PaymentMethod,
        actual: PaymentMethod,
    },

    #[error("Receiver fields do not match the signed-in staff member")]
    ReceiverMismatch,
}

impl ValidationError {
    /// The form field this error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InputTooLong { field, .. } => field,
            Self::MissingName | Self::InvalidName => "studentName",
            Self::MissingStudentId | Self::InvalidStudentId => "studentId",
            Self::MissingEmail | Self::InvalidEmail { .. } => "email",
            Self::MissingCollege | Self::UnknownCollege { .. } => "college",
            Self::MissingCourse | Self::CourseTooLong { .. } => "course",
            Self::AmountMismatch { .. } => "paymentAmount",
            Self::MethodMismatch { .. } => "paymentMethod",
            Self::ReceiverMismatch => "receivedBy",
        }
    }
}

/// Why the last submission attempt failed, for choosing a hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Network,
    Auth,
    Other,
}

impl FailureKind {
    pub(crate) fn of(err: &funrun_api::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_auth() {
            Self::Auth
        } else if matches!(err, funrun_api::Error::Transport(_) | funrun_api::Error::Http { .. }) {
            Self::Network
        } else {
            Self::Other
        }
    }
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Client-side rejections ───────────────────────────────────────
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Too many submissions. Please wait {}s before trying again.", retry_after.as_secs().max(1))]
    RateLimitExceeded { retry_after: Duration },

    #[error(transparent)]
    Authentication(#[from] AuthError),

    // ── Transport ────────────────────────────────────────────────────
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Failed to send payment data after {attempts} attempts. Last error: {last_error}")]
    SubmissionFailed {
        attempts: u32,
        last_error: String,
        kind: FailureKind,
    },

    // ── Backend ──────────────────────────────────────────────────────
    #[error("Backend rejected the record: {message}")]
    Rejected { message: String },

    #[error("Backend request failed: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Local state ──────────────────────────────────────────────────
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Short message suitable for showing to the staff member.
    ///
    /// Transport failures collapse into one generic line with a hint for
    /// the likely cause.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::RateLimitExceeded { .. } => {
                "Too many submissions. Please wait a moment before trying again.".into()
            }
            Self::Authentication(_)
            | Self::SubmissionFailed {
                kind: FailureKind::Auth,
                ..
            } => "Authentication error. Please sign out and sign in again.".into(),
            Self::Timeout { .. }
            | Self::SubmissionFailed {
                kind: FailureKind::Timeout,
                ..
            } => "Request timed out. Please check your internet connection and try again.".into(),
            Self::SubmissionFailed {
                kind: FailureKind::Network,
                ..
            } => "Network error. Please check your internet connection and try again.".into(),
            Self::Rejected { message } => format!("The payment was not recorded: {message}"),
            _ => "Failed to record payment. Please try again.".into(),
        }
    }

    /// Returns `true` if re-authenticating might resolve this error.
    pub fn requires_reauth(&self) -> bool {
        matches!(
            self,
            Self::Authentication(_)
                | Self::SubmissionFailed {
                    kind: FailureKind::Auth,
                    ..
                }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<funrun_api::Error> for CoreError {
    fn from(err: funrun_api::Error) -> Self {
        match err {
            funrun_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            funrun_api::Error::Backend { message } => CoreError::Rejected { message },
            funrun_api::Error::Http { status, message } => CoreError::Api {
                message: format!("HTTP {status}: {message}"),
                status: Some(status),
            },
            funrun_api::Error::Transport(e) => CoreError::Api {
                message: e.to_string(),
                status: e.status().map(|s| s.as_u16()),
            },
            funrun_api::Error::ClientBuild(message) => CoreError::Config { message },
            funrun_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_name_their_field() {
        assert_eq!(ValidationError::InvalidStudentId.field(), "studentId");
        assert_eq!(
            ValidationError::InputTooLong {
                field: "course",
                max: 255
            }
            .field(),
            "course"
        );
        assert_eq!(
            ValidationError::AmountMismatch {
                expected: 200,
                actual: 1
            }
            .field(),
            "paymentAmount"
        );
    }

    #[test]
    fn transport_failures_get_cause_hints() {
        let timeout = CoreError::SubmissionFailed {
            attempts: 3,
            last_error: "Request timed out after 30s".into(),
            kind: FailureKind::Timeout,
        };
        assert!(timeout.user_message().contains("timed out"));

        let network = CoreError::SubmissionFailed {
            attempts: 3,
            last_error: "connection refused".into(),
            kind: FailureKind::Network,
        };
        assert!(network.user_message().starts_with("Network error"));

        let auth = CoreError::SubmissionFailed {
            attempts: 3,
            last_error: "HTTP 403".into(),
            kind: FailureKind::Auth,
        };
        assert!(auth.requires_reauth());

        let other = CoreError::Internal("boom".into());
        assert_eq!(other.user_message(), "Failed to record payment. Please try again.");
    }

    #[test]
    fn submission_failed_carries_last_error() {
        let err = CoreError::SubmissionFailed {
            attempts: 3,
            last_error: "HTTP 503".into(),
            kind: FailureKind::Network,
        };
        assert_eq!(
            err.to_string(),
            "Failed to send payment data after 3 attempts. Last error: HTTP 503"
        );
    }

    #[test]
    fn backend_refusal_maps_to_rejected() {
        let err: CoreError = funrun_api::Error::Backend {
            message: "Missing required fields".into(),
        }
        .into();
        assert!(matches!(err, CoreError::Rejected { .. }));
    }

    #[test]
    fn request_timeout_keeps_its_budget() {
        let err: CoreError = funrun_api::Error::Timeout { timeout_secs: 30 }.into();
        assert!(matches!(err, CoreError::Timeout { timeout_secs: 30 }));
        assert_eq!(err.to_string(), "Request timed out after 30s");
    }

    #[test]
    fn rate_limit_message_never_says_zero_seconds() {
        let err = CoreError::RateLimitExceeded {
            retry_after: Duration::from_millis(200),
        };
        assert_eq!(
            err.to_string(),
            "Too many submissions. Please wait 1s before trying again."
        );
    }
}
