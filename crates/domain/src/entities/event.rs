use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::errors::DomainError;

/// Largest capacity an event can be stored with.
pub const MAX_EVENT_CAPACITY: u32 = i32::MAX as u32;

/// Global events are organised by the alumni association for everyone;
/// department events are scoped to one school department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "department", rename_all = "snake_case")]
pub enum EventScope {
    Global,
    Department(String),
}

impl EventScope {
    pub fn department(&self) -> Option<&str> {
        match self {
            EventScope::Global => None,
            EventScope::Department(dept) => Some(dept),
        }
    }
}

/// Input for creating an event, as filled in on the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub location: String,
    #[serde(default)]
    pub capacity: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub location: String,
    pub capacity: Option<u32>,
    pub scope: EventScope,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub attendees: BTreeSet<String>,
}

impl Event {
    pub fn new(input: NewEvent, scope: EventScope, created_by: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            date: input.date,
            location: input.location.trim().to_string(),
            capacity: input.capacity,
            scope,
            created_by,
            created_at: Utc::now(),
            attendees: BTreeSet::new(),
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self.scope, EventScope::Global)
    }

    pub fn is_full(&self) -> bool {
        self.capacity
            .map(|cap| self.attendees.len() >= cap as usize)
            .unwrap_or(false)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.title.is_empty()
            || self.description.is_empty()
            || self.location.is_empty()
        {
            return Err(DomainError::ValidationError(
                "Please fill in all required fields".to_string(),
            ));
        }
        if self.capacity == Some(0) {
            return Err(DomainError::ValidationError(
                "Capacity must be greater than zero".to_string(),
            ));
        }
        if self.capacity.is_some_and(|c| c > MAX_EVENT_CAPACITY) {
            return Err(DomainError::ValidationError(format!(
                "Capacity cannot exceed {}",
                MAX_EVENT_CAPACITY
            )));
        }
        if let EventScope::Department(dept) = &self.scope {
            if dept.trim().is_empty() {
                return Err(DomainError::ValidationError(
                    "Department events need a department".to_string(),
                ));
            }
        }
        Ok(())
    }
}
