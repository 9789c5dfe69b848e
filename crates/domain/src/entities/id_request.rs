use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::ApprovalStatus;

/// A member's request for a digital alumni ID card. One per member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdRequest {
    pub user_id: String,
    pub status: ApprovalStatus,
    /// Form contents as submitted (name on card, photo, etc).
    pub details: Value,
    pub requested_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl IdRequest {
    pub fn new(user_id: String, details: Value) -> Self {
        Self {
            user_id,
            status: ApprovalStatus::Pending,
            details,
            requested_at: Utc::now(),
            decided_at: None,
        }
    }
}
