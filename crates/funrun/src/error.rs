//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and distinct exit codes.

use miette::Diagnostic;
use thiserror::Error;

use funrun_config::ConfigError;
use funrun_core::{AuthError, CoreError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const REJECTED: i32 = 4;
    pub const RATE_LIMITED: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Session / authentication ─────────────────────────────────────
    #[error("Not signed in")]
    #[diagnostic(
        code(funrun::not_signed_in),
        help("Sign in first: funrun login --id-token <JWT>")
    )]
    NotSignedIn,

    #[error("Session expired")]
    #[diagnostic(
        code(funrun::session_expired),
        help("Sessions last {max_age_hours} hours. Sign in again: funrun login --id-token <JWT>")
    )]
    SessionExpired { max_age_hours: i64 },

    #[error("{reason}")]
    #[diagnostic(
        code(funrun::auth_failed),
        help("Sign out and sign in again with an authorized school account.")
    )]
    AuthFailed { reason: String },

    #[error("Session storage failed: {message}")]
    #[diagnostic(code(funrun::session))]
    Session { message: String },

    // ── Input ────────────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(funrun::validation))]
    Validation { field: String, reason: String },

    #[error("Too many attempts, retry in {retry_after_secs}s")]
    #[diagnostic(
        code(funrun::rate_limited),
        help("Please wait a moment before trying again.")
    )]
    RateLimited { retry_after_secs: u64 },

    // ── Backend ──────────────────────────────────────────────────────
    #[error("Failed to send payment data after {attempts} attempts: {last_error}")]
    #[diagnostic(code(funrun::submission_failed), help("{hint}"))]
    SubmissionFailed {
        attempts: u32,
        last_error: String,
        hint: String,
    },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(funrun::timeout),
        help(
            "Request timed out. Please check your internet connection and try again.\n\
             Submissions as a whole are bounded by --timeout or backend.timeout; \
             each HTTP request, including stats, by backend.request_timeout."
        )
    )]
    Timeout { seconds: u64 },

    #[error("The backend did not record the payment: {message}")]
    #[diagnostic(
        code(funrun::rejected),
        help("Check the student details; the backend refused this record.")
    )]
    Rejected { message: String },

    #[error("Backend error: {message}")]
    #[diagnostic(code(funrun::api_error))]
    ApiError { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Backend URL is not configured")]
    #[diagnostic(
        code(funrun::no_config),
        help(
            "Create a config with: funrun config init\n\
             Expected at: {path}\n\
             Or set FUNRUN_BACKEND__SUBMIT_URL / pass --backend-url."
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(funrun::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Prompt failed: {0}")]
    #[diagnostic(
        code(funrun::prompt),
        help("Pass every field as a flag when running without a terminal.")
    )]
    Prompt(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    #[diagnostic(code(funrun::serialize))]
    Serialize(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotSignedIn | Self::SessionExpired { .. } | Self::AuthFailed { .. } => {
                exit_code::AUTH
            }
            Self::Validation { .. } | Self::NoConfig { .. } | Self::Config(_) => exit_code::USAGE,
            Self::RateLimited { .. } => exit_code::RATE_LIMITED,
            Self::SubmissionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Rejected { .. } => exit_code::REJECTED,
            _ => exit_code::GENERAL,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Missing { path, .. } => CliError::NoConfig {
                path: path.display().to_string(),
            },
            other => CliError::Config(other),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let hint = err.user_message();
        match err {
            CoreError::Validation(e) => CliError::Validation {
                field: e.field().into(),
                reason: e.to_string(),
            },

            CoreError::RateLimitExceeded { retry_after } => CliError::RateLimited {
                retry_after_secs: retry_after.as_secs().max(1),
            },

            CoreError::Authentication(e) => e.into(),

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::SubmissionFailed {
                attempts,
                last_error,
                kind: _,
            } => CliError::SubmissionFailed {
                attempts,
                last_error,
                hint,
            },

            CoreError::Rejected { message } => CliError::Rejected { message },

            CoreError::Api { message, status: _ } | CoreError::Internal(message) => {
                CliError::ApiError { message }
            }

            CoreError::Session(e) => CliError::Session {
                message: e.to_string(),
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

impl From<AuthError> for CliError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NotSignedIn => CliError::NotSignedIn,
            AuthError::SessionExpired => CliError::SessionExpired { max_age_hours: 24 },
            other => CliError::AuthFailed {
                reason: other.to_string(),
            },
        }
    }
}

impl From<funrun_core::SessionError> for CliError {
    fn from(err: funrun_core::SessionError) -> Self {
        CliError::Session {
            message: err.to_string(),
        }
    }
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Prompt(e.to_string())
}
