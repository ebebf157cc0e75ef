use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How long the requestor may keep the items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanDuration {
    /// Fixed return point after the loan leaves
    #[default]
    Standard,
    /// Staff ("docente") loans with a multi-day look-ahead window
    Extended,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanItemLine {
    pub item_id: i64,
    pub code: String,
    pub quantity: u32,
    pub exit_condition_id: Option<i64>,
    pub exit_observations: String,
}

/// Payload posted to the loan creation endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanDraft {
    /// Sent as the idempotency key, never serialized into the body
    #[serde(skip)]
    pub client_ref: Uuid,
    pub requestor_id: i64,
    pub scheduled_return_date: DateTime<Utc>,
    pub reason: String,
    pub duration: LoanDuration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub associated_event: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub items: Vec<LoanItemLine>,
}

/// Record returned by the API after a loan is created
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedLoan {
    pub id: i64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}
