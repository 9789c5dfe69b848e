use crate::entities::Announcement;
use crate::errors::DomainError;
use async_trait::async_trait;

#[async_trait]
pub trait AnnouncementRepository: Send + Sync {
    async fn save(&self, announcement: &Announcement) -> Result<Announcement, DomainError>;
    /// Newest first.
    async fn find_all(&self) -> Result<Vec<Announcement>, DomainError>;
}
