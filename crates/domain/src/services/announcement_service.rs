use crate::entities::{Announcement, ApprovalStatus};
use crate::errors::DomainError;
use crate::repositories::{AnnouncementRepository, UserRepository};
use crate::services::NotificationService;
use std::sync::Arc;
use tracing::{info, warn};

pub struct AnnouncementService {
    announcement_repository: Arc<dyn AnnouncementRepository>,
    user_repository: Arc<dyn UserRepository>,
    notifications: Arc<NotificationService>,
}

impl AnnouncementService {
    pub fn new(
        announcement_repository: Arc<dyn AnnouncementRepository>,
        user_repository: Arc<dyn UserRepository>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            announcement_repository,
            user_repository,
            notifications,
        }
    }

    /// Stores the announcement. With `notify_members` every approved member
    /// also gets an in-app notification; fan-out failures are only logged.
    pub async fn create_announcement(
        &self,
        title: &str,
        content: &str,
        kind: &str,
        notify_members: bool,
    ) -> Result<Announcement, DomainError> {
        let announcement = Announcement::new(title.to_string(), content.to_string(), kind.to_string());
        announcement.validate()?;
        let saved = self.announcement_repository.save(&announcement).await?;
        info!(id = %saved.id, kind = %saved.kind, "announcement posted");

        if notify_members {
            match self.fan_out(&saved).await {
                Ok(count) => info!(id = %saved.id, count, "announcement fanned out"),
                Err(e) => warn!(id = %saved.id, error = %e, "announcement fan-out failed"),
            }
        }
        Ok(saved)
    }

    pub async fn list_announcements(&self) -> Result<Vec<Announcement>, DomainError> {
        self.announcement_repository.find_all().await
    }

    async fn fan_out(&self, announcement: &Announcement) -> Result<usize, DomainError> {
        let members: Vec<String> = self
            .user_repository
            .find_by_status(ApprovalStatus::Approved)
            .await?
            .into_iter()
            .map(|u| u.uid)
            .collect();
        if members.is_empty() {
            return Ok(0);
        }
        self.notifications
            .send_announcement(&members, &announcement.title, &announcement.content)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Role, ASSOCIATION_ANNOUNCEMENT};
    use crate::test_support::*;

    #[tokio::test]
    async fn fan_out_reaches_approved_members_only() {
        let store = InMemoryStore::new();
        seed(
            &store,
            &[
                member("a", Role::Alumni, ApprovalStatus::Approved),
                member("p", Role::Alumni, ApprovalStatus::Pending),
            ],
        )
        .await;
        let notifications = notification_service(&store);
        let service = AnnouncementService::new(store.clone(), store.clone(), notifications.clone());

        service
            .create_announcement("Homecoming", "See you there", ASSOCIATION_ANNOUNCEMENT, true)
            .await
            .unwrap();

        assert_eq!(notifications.unread_count("a").await.unwrap(), 1);
        assert_eq!(notifications.unread_count("p").await.unwrap(), 0);
        assert_eq!(service.list_announcements().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn blank_announcement_rejected() {
        let store = InMemoryStore::new();
        let service = AnnouncementService::new(store.clone(), store.clone(), notification_service(&store));
        let err = service
            .create_announcement("  ", "body", ASSOCIATION_ANNOUNCEMENT, false)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ValidationError(_)));
    }
}
