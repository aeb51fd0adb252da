// ── Input hardening ──
//
// Sanitizer, field validators, the sliding-window rate limiter, and the
// security event log they report to.

pub mod audit;
pub mod rate_limit;
pub mod sanitize;
pub mod validate;

pub use audit::log_security_event;
pub use rate_limit::{MemoryStore, RateLimitPolicy, RateLimitStatus, RateLimitStore, RateLimiter};
pub use sanitize::{MAX_INPUT_LEN, sanitize_input};
pub use validate::{is_valid_domain, is_valid_email, is_valid_name, is_valid_student_id};
