//! Security event logging.
//!
//! Events go through `tracing` under a dedicated target so operators can
//! route them separately (`RUST_LOG=funrun::security=warn`).

use tracing::warn;

/// `tracing` target every security event is emitted under.
pub const SECURITY_TARGET: &str = "funrun::security";

/// Emit a security event with its contextual details.
pub fn log_security_event(event: &str, details: &serde_json::Value) {
    warn!(target: SECURITY_TARGET, event, details = %details, "security event");
}
