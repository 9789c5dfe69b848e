use crate::entities::Event;
use crate::errors::DomainError;
use async_trait::async_trait;

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Event>, DomainError>;
    /// Global events ordered by date, latest first.
    async fn find_global(&self) -> Result<Vec<Event>, DomainError>;
    /// One department's events ordered by date, latest first.
    async fn find_by_department(&self, department: &str) -> Result<Vec<Event>, DomainError>;
    async fn save(&self, event: &Event) -> Result<Event, DomainError>;
    /// Adds the attendee unless the event is at capacity
    /// (`DomainError::EventFull`). `false` when already attending.
    async fn add_attendee(&self, event_id: &str, uid: &str) -> Result<bool, DomainError>;
    async fn remove_attendee(&self, event_id: &str, uid: &str) -> Result<bool, DomainError>;
}
