use crate::database::{id_requests, run_blocking, SqlitePool, StoreError};
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use domain::{ApprovalStatus, DomainError, IdRequest, IdRequestRepository};
use std::str::FromStr;

#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug)]
#[diesel(table_name = id_requests)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
struct IdRequestModel {
    user_id: String,
    status: String,
    details: String,
    requested_at: NaiveDateTime,
    decided_at: Option<NaiveDateTime>,
}

impl TryFrom<&IdRequest> for IdRequestModel {
    type Error = DomainError;

    fn try_from(request: &IdRequest) -> Result<Self, Self::Error> {
        Ok(IdRequestModel {
            user_id: request.user_id.clone(),
            status: request.status.as_str().to_string(),
            details: serde_json::to_string(&request.details)
                .map_err(|e| DomainError::ParseError(e.to_string()))?,
            requested_at: request.requested_at.naive_utc(),
            decided_at: request.decided_at.map(|d| d.naive_utc()),
        })
    }
}

impl TryFrom<IdRequestModel> for IdRequest {
    type Error = DomainError;

    fn try_from(model: IdRequestModel) -> Result<Self, Self::Error> {
        Ok(IdRequest {
            user_id: model.user_id,
            status: ApprovalStatus::from_str(&model.status)?,
            details: serde_json::from_str(&model.details)
                .map_err(|e| DomainError::ParseError(e.to_string()))?,
            requested_at: model.requested_at.and_utc(),
            decided_at: model.decided_at.map(|d| d.and_utc()),
        })
    }
}

fn find_row(conn: &mut SqliteConnection, uid: &str) -> Result<Option<IdRequest>, StoreError> {
    let row = id_requests::table
        .find(uid)
        .select(IdRequestModel::as_select())
        .first::<IdRequestModel>(conn)
        .optional()?;
    Ok(row.map(IdRequest::try_from).transpose()?)
}

pub struct SqliteIdRequestRepository {
    pool: SqlitePool,
}

impl SqliteIdRequestRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdRequestRepository for SqliteIdRequestRepository {
    async fn find_by_user(&self, uid: &str) -> Result<Option<IdRequest>, DomainError> {
        let uid = uid.to_string();
        run_blocking(&self.pool, move |conn| find_row(conn, &uid)).await
    }

    async fn find_by_status(&self, status: ApprovalStatus) -> Result<Vec<IdRequest>, DomainError> {
        run_blocking(&self.pool, move |conn| {
            let rows = id_requests::table
                .filter(id_requests::status.eq(status.as_str()))
                .order(id_requests::requested_at.asc())
                .select(IdRequestModel::as_select())
                .load::<IdRequestModel>(conn)?;
            rows.into_iter()
                .map(|row| IdRequest::try_from(row).map_err(StoreError::from))
                .collect()
        })
        .await
    }

    async fn upsert(&self, request: &IdRequest) -> Result<IdRequest, DomainError> {
        let model = IdRequestModel::try_from(request)?;
        run_blocking(&self.pool, move |conn| {
            diesel::insert_into(id_requests::table)
                .values(&model)
                .on_conflict(id_requests::user_id)
                .do_update()
                .set(&model)
                .execute(conn)?;
            Ok(())
        })
        .await?;
        Ok(request.clone())
    }

    async fn set_status(
        &self,
        uid: &str,
        status: ApprovalStatus,
    ) -> Result<IdRequest, DomainError> {
        let uid = uid.to_string();
        run_blocking(&self.pool, move |conn| {
            let rows = diesel::update(id_requests::table.find(&uid))
                .set((
                    id_requests::status.eq(status.as_str()),
                    id_requests::decided_at.eq(Some(Utc::now().naive_utc())),
                ))
                .execute(conn)?;
            if rows == 0 {
                return Err(DomainError::IdRequestNotFound(uid.clone()).into());
            }
            find_row(conn, &uid)?.ok_or_else(|| DomainError::IdRequestNotFound(uid.clone()).into())
        })
        .await
    }
}
