use crate::entities::Notification;
use crate::errors::DomainError;
use async_trait::async_trait;

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Notification>, DomainError>;
    /// A member's notifications, newest first.
    async fn find_by_user(&self, uid: &str) -> Result<Vec<Notification>, DomainError>;
    async fn save(&self, notification: &Notification) -> Result<Notification, DomainError>;
    async fn save_batch(&self, notifications: &[Notification]) -> Result<(), DomainError>;
    async fn mark_read(&self, id: &str) -> Result<(), DomainError>;
    /// Returns how many were changed.
    async fn mark_all_read(&self, uid: &str) -> Result<usize, DomainError>;
    async fn delete(&self, id: &str) -> Result<(), DomainError>;
    async fn count_unread(&self, uid: &str) -> Result<usize, DomainError>;
}
