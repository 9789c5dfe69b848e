use crate::entities::{Event, EventScope, NewEvent};
use crate::errors::DomainError;
use crate::repositories::EventRepository;
use crate::services::NotificationService;
use std::sync::Arc;
use tracing::info;

pub struct EventService {
    event_repository: Arc<dyn EventRepository>,
    notifications: Arc<NotificationService>,
}

impl EventService {
    pub fn new(event_repository: Arc<dyn EventRepository>, notifications: Arc<NotificationService>) -> Self {
        Self {
            event_repository,
            notifications,
        }
    }

    pub async fn create_global_event(&self, input: NewEvent, created_by: &str) -> Result<Event, DomainError> {
        self.create(input, EventScope::Global, created_by).await
    }

    pub async fn create_department_event(
        &self,
        department: &str,
        input: NewEvent,
        created_by: &str,
    ) -> Result<Event, DomainError> {
        self.create(input, EventScope::Department(department.trim().to_string()), created_by)
            .await
    }

    async fn create(&self, input: NewEvent, scope: EventScope, created_by: &str) -> Result<Event, DomainError> {
        let event = Event::new(input, scope, created_by.to_string());
        event.validate()?;
        let saved = self.event_repository.save(&event).await?;
        info!(event_id = %saved.id, title = %saved.title, "event created");
        Ok(saved)
    }

    pub async fn get_event(&self, event_id: &str) -> Result<Event, DomainError> {
        self.event_repository
            .find_by_id(event_id)
            .await?
            .ok_or_else(|| DomainError::EventNotFound(event_id.to_string()))
    }

    /// Newest date first.
    pub async fn list_global_events(&self) -> Result<Vec<Event>, DomainError> {
        self.event_repository.find_global().await
    }

    pub async fn list_department_events(&self, department: &str) -> Result<Vec<Event>, DomainError> {
        self.event_repository.find_by_department(department.trim()).await
    }

    /// Idempotent. Fails with `EventFull` once capacity is reached.
    pub async fn rsvp(&self, event_id: &str, uid: &str) -> Result<Event, DomainError> {
        if self.event_repository.add_attendee(event_id, uid).await? {
            info!(event_id = %event_id, uid = %uid, "rsvp recorded");
        }
        self.get_event(event_id).await
    }

    pub async fn cancel_rsvp(&self, event_id: &str, uid: &str) -> Result<Event, DomainError> {
        self.event_repository.remove_attendee(event_id, uid).await?;
        self.get_event(event_id).await
    }

    /// Sends `message` to everyone who RSVP'd. Returns how many were notified.
    pub async fn notify_attendees(&self, event_id: &str, message: &str) -> Result<usize, DomainError> {
        let event = self.get_event(event_id).await?;
        let attendees: Vec<String> = event.attendees.iter().cloned().collect();
        if attendees.is_empty() {
            return Ok(0);
        }
        self.notifications
            .notify_event_attendees(&event.id, &event.title, &attendees, message)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use chrono::NaiveDate;

    fn input(title: &str, day: u32, capacity: Option<u32>) -> NewEvent {
        NewEvent {
            title: title.into(),
            description: "Reunion".into(),
            date: NaiveDate::from_ymd_opt(2025, 6, day).unwrap(),
            location: "Gym".into(),
            capacity,
        }
    }

    fn service(store: &Arc<InMemoryStore>) -> EventService {
        EventService::new(store.clone(), notification_service(store))
    }

    #[tokio::test]
    async fn listings_are_scoped_and_newest_first() {
        let store = InMemoryStore::new();
        let service = service(&store);
        service.create_global_event(input("early", 1, None), "admin").await.unwrap();
        service.create_global_event(input("late", 20, None), "admin").await.unwrap();
        service
            .create_department_event("Nursing", input("dept", 5, None), "head")
            .await
            .unwrap();

        let global: Vec<String> = service
            .list_global_events()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(global, vec!["late", "early"]);
        assert_eq!(service.list_department_events("Nursing").await.unwrap().len(), 1);
        assert!(service.list_department_events("Arts").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_fields_rejected() {
        let store = InMemoryStore::new();
        let service = service(&store);
        let mut bad = input("x", 1, None);
        bad.description = String::new();
        let err = service.create_global_event(bad, "admin").await.unwrap_err();
        assert!(matches!(err, DomainError::ValidationError(_)));

        let err = service
            .create_department_event(" ", input("x", 1, None), "head")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ValidationError(_)));
    }

    #[tokio::test]
    async fn rsvp_is_idempotent_and_capacity_bound() {
        let store = InMemoryStore::new();
        let service = service(&store);
        let event = service.create_global_event(input("x", 1, Some(1)), "admin").await.unwrap();

        assert_eq!(service.rsvp(&event.id, "a").await.unwrap().attendees.len(), 1);
        assert_eq!(service.rsvp(&event.id, "a").await.unwrap().attendees.len(), 1);

        let err = service.rsvp(&event.id, "b").await.unwrap_err();
        assert!(matches!(err, DomainError::EventFull(_)));

        service.cancel_rsvp(&event.id, "a").await.unwrap();
        assert_eq!(service.rsvp(&event.id, "b").await.unwrap().attendees.len(), 1);
    }

    #[tokio::test]
    async fn attendees_get_notified() {
        let store = InMemoryStore::new();
        let service = service(&store);
        let event = service.create_global_event(input("x", 1, None), "admin").await.unwrap();
        assert_eq!(service.notify_attendees(&event.id, "Soon").await.unwrap(), 0);

        service.rsvp(&event.id, "a").await.unwrap();
        service.rsvp(&event.id, "b").await.unwrap();
        assert_eq!(service.notify_attendees(&event.id, "Soon").await.unwrap(), 2);
        assert_eq!(notification_service(&store).unread_count("a").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unknown_event_is_not_found() {
        let store = InMemoryStore::new();
        let err = service(&store).rsvp("nope", "a").await.unwrap_err();
        assert!(matches!(err, DomainError::EventNotFound(_)));
    }
}
