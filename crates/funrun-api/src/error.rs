use thiserror::Error;

/// Top-level error type for the `funrun-api` crate.
///
/// Covers transport failures, non-success HTTP statuses, and the backend's
/// own `{"success": false, "error": ...}` replies. `funrun-core` maps these
/// into its user-facing taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Building the underlying HTTP client failed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── HTTP ────────────────────────────────────────────────────────
    /// The backend answered with a non-success status code.
    #[error("Backend returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    // ── Backend ─────────────────────────────────────────────────────
    /// The backend processed the request and refused it.
    #[error("Backend rejected the request: {message}")]
    Backend { message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    ///
    /// Anything that failed before the backend could judge the payload
    /// counts: network errors, timeouts, 5xx, 408 and 429. A backend
    /// rejection is final.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => !e.is_builder() && !e.is_decode(),
            Self::Timeout { .. } => true,
            Self::Http { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            _ => false,
        }
    }

    /// Returns `true` if the failure looks like a timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout(),
            Self::Timeout { .. } => true,
            Self::Http { status, .. } => *status == 408,
            _ => false,
        }
    }

    /// Returns `true` if the backend refused the request on authorization grounds.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Http { status: 401 | 403, .. })
    }
}
