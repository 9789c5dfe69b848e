use crate::database::{announcements, run_blocking, SqlitePool};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use domain::{Announcement, AnnouncementRepository, DomainError};

#[derive(Queryable, Selectable, Insertable, Debug)]
#[diesel(table_name = announcements)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
struct AnnouncementModel {
    id: String,
    title: String,
    content: String,
    kind: String,
    created_at: NaiveDateTime,
}

impl From<AnnouncementModel> for Announcement {
    fn from(model: AnnouncementModel) -> Self {
        Announcement {
            id: model.id,
            title: model.title,
            content: model.content,
            kind: model.kind,
            created_at: model.created_at.and_utc(),
        }
    }
}

pub struct SqliteAnnouncementRepository {
    pool: SqlitePool,
}

impl SqliteAnnouncementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnnouncementRepository for SqliteAnnouncementRepository {
    async fn save(&self, announcement: &Announcement) -> Result<Announcement, DomainError> {
        let model = AnnouncementModel {
            id: announcement.id.clone(),
            title: announcement.title.clone(),
            content: announcement.content.clone(),
            kind: announcement.kind.clone(),
            created_at: announcement.created_at.naive_utc(),
        };
        run_blocking(&self.pool, move |conn| {
            diesel::insert_into(announcements::table)
                .values(&model)
                .execute(conn)?;
            Ok(())
        })
        .await?;
        Ok(announcement.clone())
    }

    async fn find_all(&self) -> Result<Vec<Announcement>, DomainError> {
        run_blocking(&self.pool, |conn| {
            let rows = announcements::table
                .order(announcements::created_at.desc())
                .select(AnnouncementModel::as_select())
                .load::<AnnouncementModel>(conn)?;
            Ok(rows.into_iter().map(Announcement::from).collect())
        })
        .await
    }
}
