use crate::database::{notifications, run_blocking, SqlitePool, StoreError};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use domain::{DomainError, Notification, NotificationRepository, NotificationType};
use std::str::FromStr;

#[derive(Queryable, Selectable, Insertable, Debug)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
struct NotificationModel {
    id: String,
    user_id: String,
    kind: String,
    title: String,
    message: String,
    data: Option<String>,
    read: bool,
    timestamp: i64,
    created_at: NaiveDateTime,
}

impl TryFrom<&Notification> for NotificationModel {
    type Error = DomainError;

    fn try_from(n: &Notification) -> Result<Self, Self::Error> {
        let data = n
            .data
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| DomainError::ParseError(e.to_string()))?;
        Ok(NotificationModel {
            id: n.id.clone(),
            user_id: n.user_id.clone(),
            kind: n.kind.as_str().to_string(),
            title: n.title.clone(),
            message: n.message.clone(),
            data,
            read: n.read,
            timestamp: n.timestamp,
            created_at: n.created_at.naive_utc(),
        })
    }
}

impl TryFrom<NotificationModel> for Notification {
    type Error = DomainError;

    fn try_from(model: NotificationModel) -> Result<Self, Self::Error> {
        let data = model
            .data
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| DomainError::ParseError(e.to_string()))?;
        Ok(Notification {
            id: model.id,
            user_id: model.user_id,
            kind: NotificationType::from_str(&model.kind)?,
            title: model.title,
            message: model.message,
            data,
            read: model.read,
            timestamp: model.timestamp,
            created_at: model.created_at.and_utc(),
        })
    }
}

fn convert(rows: Vec<NotificationModel>) -> Result<Vec<Notification>, StoreError> {
    rows.into_iter()
        .map(|row| Notification::try_from(row).map_err(StoreError::from))
        .collect()
}

pub struct SqliteNotificationRepository {
    pool: SqlitePool,
}

impl SqliteNotificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for SqliteNotificationRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Notification>, DomainError> {
        let id = id.to_string();
        run_blocking(&self.pool, move |conn| {
            let row = notifications::table
                .find(&id)
                .select(NotificationModel::as_select())
                .first::<NotificationModel>(conn)
                .optional()?;
            Ok(convert(row.into_iter().collect())?.pop())
        })
        .await
    }

    async fn find_by_user(&self, uid: &str) -> Result<Vec<Notification>, DomainError> {
        let uid = uid.to_string();
        run_blocking(&self.pool, move |conn| {
            let rows = notifications::table
                .filter(notifications::user_id.eq(&uid))
                .order(notifications::timestamp.desc())
                .select(NotificationModel::as_select())
                .load::<NotificationModel>(conn)?;
            convert(rows)
        })
        .await
    }

    async fn save(&self, notification: &Notification) -> Result<Notification, DomainError> {
        let model = NotificationModel::try_from(notification)?;
        run_blocking(&self.pool, move |conn| {
            diesel::insert_into(notifications::table)
                .values(&model)
                .execute(conn)?;
            Ok(())
        })
        .await?;
        Ok(notification.clone())
    }

    async fn save_batch(&self, batch: &[Notification]) -> Result<(), DomainError> {
        let models = batch
            .iter()
            .map(NotificationModel::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        run_blocking(&self.pool, move |conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                for model in &models {
                    diesel::insert_into(notifications::table)
                        .values(model)
                        .execute(conn)?;
                }
                Ok(())
            })
        })
        .await
    }

    async fn mark_read(&self, id: &str) -> Result<(), DomainError> {
        let id = id.to_string();
        run_blocking(&self.pool, move |conn| {
            let rows = diesel::update(notifications::table.find(&id))
                .set(notifications::read.eq(true))
                .execute(conn)?;
            if rows == 0 {
                return Err(DomainError::NotificationNotFound(id.clone()).into());
            }
            Ok(())
        })
        .await
    }

    async fn mark_all_read(&self, uid: &str) -> Result<usize, DomainError> {
        let uid = uid.to_string();
        run_blocking(&self.pool, move |conn| {
            let rows = diesel::update(
                notifications::table
                    .filter(notifications::user_id.eq(&uid))
                    .filter(notifications::read.eq(false)),
            )
            .set(notifications::read.eq(true))
            .execute(conn)?;
            Ok(rows)
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<(), DomainError> {
        let id = id.to_string();
        run_blocking(&self.pool, move |conn| {
            diesel::delete(notifications::table.find(&id)).execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn count_unread(&self, uid: &str) -> Result<usize, DomainError> {
        let uid = uid.to_string();
        run_blocking(&self.pool, move |conn| {
            let count: i64 = notifications::table
                .filter(notifications::user_id.eq(&uid))
                .filter(notifications::read.eq(false))
                .count()
                .get_result(conn)?;
            Ok(count as usize)
        })
        .await
    }
}
