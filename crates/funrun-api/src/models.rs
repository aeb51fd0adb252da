// ── Backend wire types ──
//
// Shapes the Apps Script backend produces. Request payloads are owned by
// `funrun-core`; this module only describes what comes back.

use serde::{Deserialize, Serialize};

/// Raw reply from the submission endpoint.
///
/// The backend answers `{"success": true, "message": ...}` on a write and
/// `{"success": false, "error": ...}` when it refuses the payload.
#[derive(Debug, Deserialize)]
pub(crate) struct BackendReply {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Acknowledgement of an accepted submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitAck {
    /// Backend-provided confirmation text, if the body was readable.
    pub message: Option<String>,
    /// `false` when the body could not be interpreted and success was
    /// inferred from the status code alone.
    pub confirmed: bool,
}

/// Per-receiver payment aggregates from the statistics endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    #[serde(default)]
    pub today_payments: u64,
    #[serde(default)]
    pub today_amount: f64,
    #[serde(default)]
    pub total_payments: u64,
    #[serde(default)]
    pub total_amount: f64,
    /// The date the backend evaluated "today" against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl DailyStats {
    /// Payments recorded before the evaluated date.
    pub fn previous_payments(&self) -> u64 {
        self.total_payments.saturating_sub(self.today_payments)
    }

    /// Amount collected before the evaluated date.
    pub fn previous_amount(&self) -> f64 {
        (self.total_amount - self.today_amount).max(0.0)
    }
}
