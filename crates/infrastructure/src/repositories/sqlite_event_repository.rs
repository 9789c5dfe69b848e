use crate::database::{event_attendees, events, run_blocking, SqlitePool, StoreError};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use domain::{DomainError, Event, EventRepository, EventScope};
use std::collections::{BTreeSet, HashMap};

#[derive(Queryable, Selectable, Insertable, Debug)]
#[diesel(table_name = events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
struct EventModel {
    id: String,
    title: String,
    description: String,
    date: NaiveDate,
    location: String,
    capacity: Option<i32>,
    department: Option<String>,
    created_by: String,
    created_at: NaiveDateTime,
}

impl From<&Event> for EventModel {
    fn from(event: &Event) -> Self {
        EventModel {
            id: event.id.clone(),
            title: event.title.clone(),
            description: event.description.clone(),
            date: event.date,
            location: event.location.clone(),
            capacity: event.capacity.map(|c| c.min(i32::MAX as u32) as i32),
            department: event.scope.department().map(str::to_string),
            created_by: event.created_by.clone(),
            created_at: event.created_at.naive_utc(),
        }
    }
}

impl EventModel {
    fn into_event(self, attendees: BTreeSet<String>) -> Event {
        let scope = match self.department {
            Some(dept) => EventScope::Department(dept),
            None => EventScope::Global,
        };
        Event {
            id: self.id,
            title: self.title,
            description: self.description,
            date: self.date,
            location: self.location,
            capacity: self.capacity.map(|c| c.max(0) as u32),
            scope,
            created_by: self.created_by,
            created_at: self.created_at.and_utc(),
            attendees,
        }
    }
}

fn hydrate(conn: &mut SqliteConnection, rows: Vec<EventModel>) -> Result<Vec<Event>, StoreError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let mut attendees: HashMap<String, BTreeSet<String>> = HashMap::new();
    let attendee_rows = event_attendees::table
        .filter(event_attendees::event_id.eq_any(&ids))
        .select((event_attendees::event_id, event_attendees::user_id))
        .load::<(String, String)>(conn)?;
    for (event_id, uid) in attendee_rows {
        attendees.entry(event_id).or_default().insert(uid);
    }
    Ok(rows
        .into_iter()
        .map(|row| {
            let going = attendees.remove(&row.id).unwrap_or_default();
            row.into_event(going)
        })
        .collect())
}

fn find_row(conn: &mut SqliteConnection, event_id: &str) -> Result<EventModel, StoreError> {
    events::table
        .find(event_id)
        .select(EventModel::as_select())
        .first::<EventModel>(conn)
        .optional()?
        .ok_or_else(|| DomainError::EventNotFound(event_id.to_string()).into())
}

pub struct SqliteEventRepository {
    pool: SqlitePool,
}

impl SqliteEventRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for SqliteEventRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Event>, DomainError> {
        let id = id.to_string();
        run_blocking(&self.pool, move |conn| {
            let row = events::table
                .find(&id)
                .select(EventModel::as_select())
                .first::<EventModel>(conn)
                .optional()?;
            match row {
                Some(row) => Ok(hydrate(conn, vec![row])?.pop()),
                None => Ok(None),
            }
        })
        .await
    }

    async fn find_global(&self) -> Result<Vec<Event>, DomainError> {
        run_blocking(&self.pool, |conn| {
            let rows = events::table
                .filter(events::department.is_null())
                .order((events::date.desc(), events::created_at.desc()))
                .select(EventModel::as_select())
                .load::<EventModel>(conn)?;
            hydrate(conn, rows)
        })
        .await
    }

    async fn find_by_department(&self, department: &str) -> Result<Vec<Event>, DomainError> {
        let department = department.to_string();
        run_blocking(&self.pool, move |conn| {
            let rows = events::table
                .filter(events::department.eq(&department))
                .order((events::date.desc(), events::created_at.desc()))
                .select(EventModel::as_select())
                .load::<EventModel>(conn)?;
            hydrate(conn, rows)
        })
        .await
    }

    async fn save(&self, event: &Event) -> Result<Event, DomainError> {
        let model = EventModel::from(event);
        let attendees = event.attendees.clone();
        run_blocking(&self.pool, move |conn| {
            diesel::insert_into(events::table).values(&model).execute(conn)?;
            Ok(model.into_event(attendees))
        })
        .await
    }

    async fn add_attendee(&self, event_id: &str, uid: &str) -> Result<bool, DomainError> {
        let event_id = event_id.to_string();
        let uid = uid.to_string();
        run_blocking(&self.pool, move |conn| {
            // Capacity check and insert share one write lock.
            conn.immediate_transaction::<_, StoreError, _>(|conn| {
                let event = find_row(conn, &event_id)?;
                let already: i64 = event_attendees::table
                    .find((&event_id, &uid))
                    .count()
                    .get_result(conn)?;
                if already > 0 {
                    return Ok(false);
                }
                if let Some(capacity) = event.capacity {
                    let going: i64 = event_attendees::table
                        .filter(event_attendees::event_id.eq(&event_id))
                        .count()
                        .get_result(conn)?;
                    if going >= i64::from(capacity) {
                        return Err(DomainError::EventFull(event_id.clone()).into());
                    }
                }
                diesel::insert_into(event_attendees::table)
                    .values((
                        event_attendees::event_id.eq(&event_id),
                        event_attendees::user_id.eq(&uid),
                    ))
                    .execute(conn)?;
                Ok(true)
            })
        })
        .await
    }

    async fn remove_attendee(&self, event_id: &str, uid: &str) -> Result<bool, DomainError> {
        let event_id = event_id.to_string();
        let uid = uid.to_string();
        run_blocking(&self.pool, move |conn| {
            find_row(conn, &event_id)?;
            let removed = diesel::delete(event_attendees::table.find((&event_id, &uid)))
                .execute(conn)?;
            Ok(removed > 0)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_db::temp_database;
    use domain::NewEvent;
    use std::sync::Arc;

    fn event(title: &str, day: u32, scope: EventScope, capacity: Option<u32>) -> Event {
        Event::new(
            NewEvent {
                title: title.into(),
                description: "Reunion".into(),
                date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
                location: "Hall".into(),
                capacity,
            },
            scope,
            "admin".into(),
        )
    }

    #[tokio::test]
    async fn scopes_are_kept_apart() {
        let (_dir, db) = temp_database();
        let repo = SqliteEventRepository::new(db.get_pool().clone());
        repo.save(&event("g1", 1, EventScope::Global, None)).await.unwrap();
        repo.save(&event("g2", 9, EventScope::Global, None)).await.unwrap();
        repo.save(&event("d1", 5, EventScope::Department("Arts".into()), None))
            .await
            .unwrap();

        let global: Vec<String> = repo.find_global().await.unwrap().into_iter().map(|e| e.title).collect();
        assert_eq!(global, vec!["g2", "g1"]);
        let arts = repo.find_by_department("Arts").await.unwrap();
        assert_eq!(arts.len(), 1);
        assert_eq!(arts[0].scope, EventScope::Department("Arts".into()));
    }

    #[tokio::test]
    async fn saved_event_matches_what_is_read_back() {
        let (_dir, db) = temp_database();
        let repo = SqliteEventRepository::new(db.get_pool().clone());
        let saved = repo
            .save(&event("huge", 3, EventScope::Global, Some(u32::MAX)))
            .await
            .unwrap();
        let loaded = repo.find_by_id(&saved.id).await.unwrap().unwrap();
        assert_eq!(saved.capacity, loaded.capacity);
        assert_eq!(saved.capacity, Some(i32::MAX as u32));
    }

    #[tokio::test]
    async fn capacity_holds_under_concurrent_rsvps() {
        let (_dir, db) = temp_database();
        let repo = Arc::new(SqliteEventRepository::new(db.get_pool().clone()));
        let e = event("small", 1, EventScope::Global, Some(3));
        repo.save(&e).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..10 {
            let repo = repo.clone();
            let id = e.id.clone();
            handles.push(tokio::spawn(async move {
                repo.add_attendee(&id, &format!("u{}", i)).await
            }));
        }
        let mut admitted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(true) => admitted += 1,
                Err(DomainError::EventFull(_)) => {}
                other => panic!("unexpected rsvp result: {:?}", other),
            }
        }
        assert_eq!(admitted, 3);
        assert_eq!(repo.find_by_id(&e.id).await.unwrap().unwrap().attendees.len(), 3);
    }

    #[tokio::test]
    async fn rsvp_twice_is_a_noop() {
        let (_dir, db) = temp_database();
        let repo = SqliteEventRepository::new(db.get_pool().clone());
        let e = event("x", 1, EventScope::Global, Some(1));
        repo.save(&e).await.unwrap();

        assert!(repo.add_attendee(&e.id, "a").await.unwrap());
        assert!(!repo.add_attendee(&e.id, "a").await.unwrap());
        assert!(repo.remove_attendee(&e.id, "a").await.unwrap());
        assert!(!repo.remove_attendee(&e.id, "a").await.unwrap());
    }
}
