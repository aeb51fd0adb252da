// ── Payment domain types ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// College the paying student belongs to.
///
/// Serialized as the short code the backend uses to pick a department sheet.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum College {
    Cabe,
    Cedas,
    Chs,
    Coe,
    Ccis,
}

impl College {
    /// Full department name, as shown on the form.
    pub fn label(self) -> &'static str {
        match self {
            Self::Cabe => "College of Accountancy, Business and Entrepreneurship (CABE)",
            Self::Cedas => "College of Education, Arts and Sciences (CEDAS)",
            Self::Chs => "College of Health Sciences (CHS)",
            Self::Coe => "College of Engineering (COE)",
            Self::Ccis => "College of Computing and Information Sciences (CCIS)",
        }
    }
}

/// How the student paid.
///
/// Only [`Cash`](Self::Cash) is accepted for the fun run; the other methods
/// exist so a tampered payload can be named precisely when it is rejected.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum PaymentMethod {
    #[default]
    Cash,
    #[serde(rename = "Bank Transfer")]
    #[strum(serialize = "Bank Transfer")]
    BankTransfer,
    #[serde(rename = "GCash")]
    #[strum(serialize = "GCash")]
    GCash,
    #[serde(rename = "PayMaya")]
    #[strum(serialize = "PayMaya")]
    PayMaya,
    Check,
}

/// Raw form input, exactly as typed by the staff member.
///
/// Nothing here is trusted. The recorder sanitizes and validates it before
/// a [`PaymentRecord`] is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentForm {
    pub student_name: String,
    pub student_id: String,
    pub email: String,
    /// College code; parsed into [`College`] during validation.
    pub college: String,
    pub course: String,
}

/// A validated payment, ready for the backend.
///
/// `payment_amount` and `payment_method` come from policy, and the
/// `receiv*` fields from the authenticated session. The recorder checks
/// both again right before transmission, so a record mutated after
/// construction is refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub student_name: String,
    pub student_id: String,
    pub email: String,
    pub college: College,
    pub course: String,
    pub payment_amount: u32,
    pub payment_method: PaymentMethod,
    /// `"{name} ({email})"` of the receiving staff member.
    pub received_by: String,
    pub receiver_email: String,
    pub receiver_google_id: String,
    /// ISO-8601 UTC instant the record was built.
    pub timestamp: String,
    /// The same instant in the school's local time, for display.
    pub submitted_at: String,
}
