use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Event,
    Announcement,
    Approval,
    Reminder,
    General,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Event => "event",
            NotificationType::Announcement => "announcement",
            NotificationType::Approval => "approval",
            NotificationType::Reminder => "reminder",
            NotificationType::General => "general",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "event" => Ok(NotificationType::Event),
            "announcement" => Ok(NotificationType::Announcement),
            "approval" => Ok(NotificationType::Approval),
            "reminder" => Ok(NotificationType::Reminder),
            "general" => Ok(NotificationType::General),
            other => Err(DomainError::ParseError(format!(
                "unknown notification type: {}",
                other
            ))),
        }
    }
}

/// What callers supply; id, timestamps and read flag are filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub data: Option<Value>,
    pub read: bool,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub created_at: DateTime<Utc>,
}

impl From<NewNotification> for Notification {
    fn from(new: NewNotification) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: new.user_id,
            kind: new.kind,
            title: new.title,
            message: new.message,
            data: new.data,
            read: false,
            timestamp: now.timestamp_millis(),
            created_at: now,
        }
    }
}
