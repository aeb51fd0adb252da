// ── Staff identity ──

use serde::{Deserialize, Serialize};

/// An authenticated, authorized staff member.
///
/// Only produced by [`AccessPolicy::authenticate`](crate::auth::AccessPolicy::authenticate)
/// or by restoring a persisted session, never from free-text input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffIdentity {
    pub name: String,
    pub email: String,
    /// Google account subject (`sub` claim).
    pub google_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl StaffIdentity {
    /// The `receivedBy` label stamped on every record this staff member takes.
    pub fn received_by(&self) -> String {
        format!("{} ({})", self.name, self.email)
    }

    /// Rate-limit key for form submissions by this staff member.
    pub fn submission_key(&self) -> String {
        format!("form_submission_{}", self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn received_by_combines_name_and_email() {
        let staff = StaffIdentity {
            name: "Finance Office".into(),
            email: "finance@g.cjc.edu.ph".into(),
            google_id: "42".into(),
            picture: None,
        };
        assert_eq!(staff.received_by(), "Finance Office (finance@g.cjc.edu.ph)");
        assert_eq!(staff.submission_key(), "form_submission_finance@g.cjc.edu.ph");
    }
}
