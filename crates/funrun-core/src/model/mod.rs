// ── Domain model ──
//
// Plain data types shared by the recorder, the session store, and the CLI.

pub mod payment;
pub mod staff;

pub use payment::{College, PaymentForm, PaymentMethod, PaymentRecord};
pub use staff::StaffIdentity;
