use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

pub const ASSOCIATION_ANNOUNCEMENT: &str = "alumni_association";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: String,
    pub title: String,
    pub content: String,
    /// `alumni_association` or the name of the posting department.
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

impl Announcement {
    pub fn new(title: String, content: String, kind: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.trim().to_string(),
            content: content.trim().to_string(),
            kind,
            created_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.title.is_empty() || self.content.is_empty() {
            return Err(DomainError::ValidationError(
                "Please fill in all fields".to_string(),
            ));
        }
        Ok(())
    }
}
