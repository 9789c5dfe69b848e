use crate::entities::{NewNotification, Notification, NotificationType};
use crate::errors::DomainError;
use crate::repositories::NotificationRepository;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// In-app notification inbox.
pub struct NotificationService {
    notification_repository: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    pub fn new(notification_repository: Arc<dyn NotificationRepository>) -> Self {
        Self {
            notification_repository,
        }
    }

    pub async fn create(&self, new: NewNotification) -> Result<Notification, DomainError> {
        if new.title.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Notification title cannot be empty".to_string(),
            ));
        }
        let saved = self.notification_repository.save(&new.into()).await?;
        debug!(user_id = %saved.user_id, kind = %saved.kind, "notification created");
        Ok(saved)
    }

    /// Sends the same notification to every listed member.
    pub async fn send_bulk(
        &self,
        user_ids: &[String],
        kind: NotificationType,
        title: &str,
        message: &str,
        data: Option<Value>,
    ) -> Result<usize, DomainError> {
        let batch: Vec<Notification> = user_ids
            .iter()
            .map(|uid| {
                NewNotification {
                    user_id: uid.clone(),
                    kind,
                    title: title.to_string(),
                    message: message.to_string(),
                    data: data.clone(),
                }
                .into()
            })
            .collect();
        self.notification_repository.save_batch(&batch).await?;
        info!(count = batch.len(), kind = %kind, "sent bulk notifications");
        Ok(batch.len())
    }

    pub async fn notify_event_attendees(
        &self,
        event_id: &str,
        event_title: &str,
        attendee_ids: &[String],
        message: &str,
    ) -> Result<usize, DomainError> {
        self.send_bulk(
            attendee_ids,
            NotificationType::Event,
            event_title,
            message,
            Some(json!({ "eventId": event_id })),
        )
        .await
    }

    pub async fn send_announcement(
        &self,
        user_ids: &[String],
        title: &str,
        message: &str,
    ) -> Result<usize, DomainError> {
        self.send_bulk(user_ids, NotificationType::Announcement, title, message, None)
            .await
    }

    pub async fn notify_approval(
        &self,
        user_id: &str,
        title: &str,
        message: &str,
        approval_type: &str,
    ) -> Result<Notification, DomainError> {
        self.create(NewNotification {
            user_id: user_id.to_string(),
            kind: NotificationType::Approval,
            title: title.to_string(),
            message: message.to_string(),
            data: Some(json!({ "approvalType": approval_type })),
        })
        .await
    }

    pub async fn send_reminder(
        &self,
        user_id: &str,
        title: &str,
        message: &str,
        data: Option<Value>,
    ) -> Result<Notification, DomainError> {
        self.create(NewNotification {
            user_id: user_id.to_string(),
            kind: NotificationType::Reminder,
            title: title.to_string(),
            message: message.to_string(),
            data,
        })
        .await
    }

    pub async fn list_for_user(&self, uid: &str) -> Result<Vec<Notification>, DomainError> {
        self.notification_repository.find_by_user(uid).await
    }

    pub async fn unread_count(&self, uid: &str) -> Result<usize, DomainError> {
        self.notification_repository.count_unread(uid).await
    }

    pub async fn mark_read(&self, uid: &str, notification_id: &str) -> Result<(), DomainError> {
        self.owned(uid, notification_id).await?;
        self.notification_repository.mark_read(notification_id).await
    }

    pub async fn mark_all_read(&self, uid: &str) -> Result<usize, DomainError> {
        self.notification_repository.mark_all_read(uid).await
    }

    pub async fn delete(&self, uid: &str, notification_id: &str) -> Result<(), DomainError> {
        self.owned(uid, notification_id).await?;
        self.notification_repository.delete(notification_id).await
    }

    async fn owned(&self, uid: &str, notification_id: &str) -> Result<Notification, DomainError> {
        let notification = self
            .notification_repository
            .find_by_id(notification_id)
            .await?
            .ok_or_else(|| DomainError::NotificationNotFound(notification_id.to_string()))?;
        if notification.user_id != uid {
            return Err(DomainError::Forbidden(
                "notification belongs to another member".to_string(),
            ));
        }
        Ok(notification)
    }
}
