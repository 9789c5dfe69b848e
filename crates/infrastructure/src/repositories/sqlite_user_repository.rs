use crate::database::{connections, profile_items, run_blocking, users, SqlitePool, StoreError};
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use domain::{
    ApprovalStatus, DomainError, ProfileItem, ProfileItemKind, Role, User, UserRepository,
};
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

// Database model - separate from domain entity
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserModel {
    uid: String,
    email: String,
    first_name: String,
    last_name: String,
    address: Option<String>,
    province: Option<String>,
    school_department: Option<String>,
    course: Option<String>,
    student_id: Option<String>,
    year_graduated: Option<String>,
    phone: Option<String>,
    photo_data_url: Option<String>,
    summary: Option<String>,
    role: String,
    status: String,
    is_locked: bool,
    digital_id_status: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

/// The fields a member may edit on their own profile.
#[derive(AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
struct ProfileChangeset {
    first_name: String,
    last_name: String,
    address: Option<String>,
    province: Option<String>,
    school_department: Option<String>,
    course: Option<String>,
    student_id: Option<String>,
    year_graduated: Option<String>,
    phone: Option<String>,
    photo_data_url: Option<String>,
    summary: Option<String>,
    updated_at: NaiveDateTime,
}

#[derive(Queryable, Selectable, Insertable, Debug)]
#[diesel(table_name = profile_items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
struct ProfileItemModel {
    user_id: String,
    kind: String,
    id: String,
    payload: String,
    position: i64,
}

impl From<&User> for UserModel {
    fn from(user: &User) -> Self {
        UserModel {
            uid: user.uid.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            address: user.address.clone(),
            province: user.province.clone(),
            school_department: user.school_department.clone(),
            course: user.course.clone(),
            student_id: user.student_id.clone(),
            year_graduated: user.year_graduated.clone(),
            phone: user.phone.clone(),
            photo_data_url: user.photo_data_url.clone(),
            summary: user.summary.clone(),
            role: user.role.as_str().to_string(),
            status: user.status.as_str().to_string(),
            is_locked: user.is_locked,
            digital_id_status: user.digital_id_status.map(|s| s.as_str().to_string()),
            created_at: user.created_at.naive_utc(),
            updated_at: user.updated_at.naive_utc(),
        }
    }
}

impl From<&User> for ProfileChangeset {
    fn from(user: &User) -> Self {
        ProfileChangeset {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            address: user.address.clone(),
            province: user.province.clone(),
            school_department: user.school_department.clone(),
            course: user.course.clone(),
            student_id: user.student_id.clone(),
            year_graduated: user.year_graduated.clone(),
            phone: user.phone.clone(),
            photo_data_url: user.photo_data_url.clone(),
            summary: user.summary.clone(),
            updated_at: Utc::now().naive_utc(),
        }
    }
}

impl UserModel {
    fn into_user(
        self,
        items: Vec<ProfileItem>,
        connections: BTreeSet<String>,
    ) -> Result<User, DomainError> {
        let mut user = User {
            uid: self.uid,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            address: self.address,
            province: self.province,
            school_department: self.school_department,
            course: self.course,
            student_id: self.student_id,
            year_graduated: self.year_graduated,
            phone: self.phone,
            photo_data_url: self.photo_data_url,
            summary: self.summary,
            role: Role::from_str(&self.role)?,
            status: ApprovalStatus::from_str(&self.status)?,
            is_locked: self.is_locked,
            digital_id_status: self
                .digital_id_status
                .as_deref()
                .map(ApprovalStatus::from_str)
                .transpose()?,
            connections,
            experiences: Vec::new(),
            skills: Vec::new(),
            accomplishments: Vec::new(),
            created_at: self.created_at.and_utc(),
            updated_at: self.updated_at.and_utc(),
        };
        for item in items {
            match item {
                ProfileItem::Experience(e) => user.experiences.push(e),
                ProfileItem::Skill(s) => user.skills.push(s),
                ProfileItem::Accomplishment(a) => user.accomplishments.push(a),
            }
        }
        Ok(user)
    }
}

/// Attaches nested lists and connections to a batch of user rows.
fn hydrate(conn: &mut SqliteConnection, rows: Vec<UserModel>) -> Result<Vec<User>, StoreError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let uids: Vec<String> = rows.iter().map(|r| r.uid.clone()).collect();

    let mut items: HashMap<String, Vec<ProfileItem>> = HashMap::new();
    let item_rows = profile_items::table
        .filter(profile_items::user_id.eq_any(&uids))
        .order(profile_items::position.asc())
        .select(ProfileItemModel::as_select())
        .load::<ProfileItemModel>(conn)?;
    for row in item_rows {
        let item: ProfileItem = serde_json::from_str(&row.payload)
            .map_err(|e| DomainError::ParseError(e.to_string()))?;
        items.entry(row.user_id).or_default().push(item);
    }

    let mut links: HashMap<String, BTreeSet<String>> = HashMap::new();
    let link_rows = connections::table
        .filter(connections::user_id.eq_any(&uids))
        .select((connections::user_id, connections::other_id))
        .load::<(String, String)>(conn)?;
    for (uid, other) in link_rows {
        links.entry(uid).or_default().insert(other);
    }

    rows.into_iter()
        .map(|row| {
            let uid = row.uid.clone();
            row.into_user(
                items.remove(&uid).unwrap_or_default(),
                links.remove(&uid).unwrap_or_default(),
            )
            .map_err(StoreError::from)
        })
        .collect()
}

fn load_one(conn: &mut SqliteConnection, uid: &str) -> Result<Option<User>, StoreError> {
    let row = users::table
        .find(uid)
        .select(UserModel::as_select())
        .first::<UserModel>(conn)
        .optional()?;
    match row {
        Some(row) => Ok(hydrate(conn, vec![row])?.pop()),
        None => Ok(None),
    }
}

fn load_existing(conn: &mut SqliteConnection, uid: &str) -> Result<User, StoreError> {
    load_one(conn, uid)?.ok_or_else(|| DomainError::UserNotFound(uid.to_string()).into())
}

fn ensure_updated(rows: usize, uid: &str) -> Result<(), StoreError> {
    if rows == 0 {
        return Err(DomainError::UserNotFound(uid.to_string()).into());
    }
    Ok(())
}

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn load_where<F>(&self, filter: F) -> Result<Vec<User>, DomainError>
    where
        F: FnOnce(users::BoxedQuery<'static, diesel::sqlite::Sqlite>) -> users::BoxedQuery<'static, diesel::sqlite::Sqlite>
            + Send
            + 'static,
    {
        run_blocking(&self.pool, move |conn| {
            let rows = filter(users::table.into_boxed())
                .order(users::created_at.asc())
                .select(UserModel::as_select())
                .load::<UserModel>(conn)?;
            hydrate(conn, rows)
        })
        .await
    }

    async fn update_field<F>(&self, uid: &str, apply: F) -> Result<User, DomainError>
    where
        F: FnOnce(&mut SqliteConnection, &str, NaiveDateTime) -> QueryResult<usize> + Send + 'static,
    {
        let uid = uid.to_string();
        run_blocking(&self.pool, move |conn| {
            let rows = apply(conn, &uid, Utc::now().naive_utc())?;
            ensure_updated(rows, &uid)?;
            load_existing(conn, &uid)
        })
        .await
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn find_by_id(&self, uid: &str) -> Result<Option<User>, DomainError> {
        let uid = uid.to_string();
        run_blocking(&self.pool, move |conn| load_one(conn, &uid)).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let email = email.trim().to_lowercase();
        Ok(self
            .load_where(move |q| q.filter(users::email.eq(email)))
            .await?
            .into_iter()
            .next())
    }

    async fn find_all(&self) -> Result<Vec<User>, DomainError> {
        self.load_where(|q| q).await
    }

    async fn find_by_status(&self, status: ApprovalStatus) -> Result<Vec<User>, DomainError> {
        self.load_where(move |q| q.filter(users::status.eq(status.as_str())))
            .await
    }

    async fn find_by_role(&self, role: Role) -> Result<Vec<User>, DomainError> {
        self.load_where(move |q| q.filter(users::role.eq(role.as_str())))
            .await
    }

    async fn find_by_department(&self, department: &str) -> Result<Vec<User>, DomainError> {
        let department = department.to_string();
        self.load_where(move |q| q.filter(users::school_department.eq(department)))
            .await
    }

    async fn count_all(&self) -> Result<usize, DomainError> {
        run_blocking(&self.pool, |conn| {
            let count: i64 = users::table.count().get_result(conn)?;
            Ok(count as usize)
        })
        .await
    }

    async fn count_by_status(&self, status: ApprovalStatus) -> Result<usize, DomainError> {
        run_blocking(&self.pool, move |conn| {
            let count: i64 = users::table
                .filter(users::status.eq(status.as_str()))
                .count()
                .get_result(conn)?;
            Ok(count as usize)
        })
        .await
    }

    async fn count_by_role(&self, role: Role) -> Result<usize, DomainError> {
        run_blocking(&self.pool, move |conn| {
            let count: i64 = users::table
                .filter(users::role.eq(role.as_str()))
                .count()
                .get_result(conn)?;
            Ok(count as usize)
        })
        .await
    }

    async fn save(&self, user: &User) -> Result<User, DomainError> {
        let model = UserModel::from(user);
        let uid = user.uid.clone();
        run_blocking(&self.pool, move |conn| {
            diesel::insert_into(users::table)
                .values(&model)
                .on_conflict(users::uid)
                .do_update()
                .set(&model)
                .execute(conn)?;
            load_existing(conn, &uid)
        })
        .await
    }

    async fn update_profile(&self, user: &User) -> Result<User, DomainError> {
        let changes = ProfileChangeset::from(user);
        let uid = user.uid.clone();
        run_blocking(&self.pool, move |conn| {
            let rows = diesel::update(users::table.find(&uid))
                .set(&changes)
                .execute(conn)?;
            ensure_updated(rows, &uid)?;
            load_existing(conn, &uid)
        })
        .await
    }

    async fn set_status(&self, uid: &str, status: ApprovalStatus) -> Result<User, DomainError> {
        self.update_field(uid, move |conn, uid, now| {
            diesel::update(users::table.find(uid))
                .set((users::status.eq(status.as_str()), users::updated_at.eq(now)))
                .execute(conn)
        })
        .await
    }

    async fn set_role(&self, uid: &str, role: Role) -> Result<User, DomainError> {
        self.update_field(uid, move |conn, uid, now| {
            diesel::update(users::table.find(uid))
                .set((users::role.eq(role.as_str()), users::updated_at.eq(now)))
                .execute(conn)
        })
        .await
    }

    async fn set_department(&self, uid: &str, department: &str) -> Result<User, DomainError> {
        let department = department.to_string();
        self.update_field(uid, move |conn, uid, now| {
            diesel::update(users::table.find(uid))
                .set((users::school_department.eq(department), users::updated_at.eq(now)))
                .execute(conn)
        })
        .await
    }

    async fn set_role_and_department(
        &self,
        uid: &str,
        role: Role,
        department: &str,
    ) -> Result<User, DomainError> {
        let department = department.to_string();
        // A single UPDATE writes both columns, so they can never diverge.
        self.update_field(uid, move |conn, uid, now| {
            diesel::update(users::table.find(uid))
                .set((
                    users::role.eq(role.as_str()),
                    users::school_department.eq(department),
                    users::updated_at.eq(now),
                ))
                .execute(conn)
        })
        .await
    }

    async fn set_locked(&self, uid: &str, locked: bool) -> Result<User, DomainError> {
        self.update_field(uid, move |conn, uid, now| {
            diesel::update(users::table.find(uid))
                .set((users::is_locked.eq(locked), users::updated_at.eq(now)))
                .execute(conn)
        })
        .await
    }

    async fn set_digital_id_status(
        &self,
        uid: &str,
        status: ApprovalStatus,
    ) -> Result<User, DomainError> {
        self.update_field(uid, move |conn, uid, now| {
            diesel::update(users::table.find(uid))
                .set((
                    users::digital_id_status.eq(Some(status.as_str())),
                    users::updated_at.eq(now),
                ))
                .execute(conn)
        })
        .await
    }

    async fn add_profile_item(&self, uid: &str, item: &ProfileItem) -> Result<(), DomainError> {
        let uid = uid.to_string();
        let kind = item.kind().as_str().to_string();
        let id = item.id().to_string();
        let payload =
            serde_json::to_string(item).map_err(|e| DomainError::ParseError(e.to_string()))?;

        run_blocking(&self.pool, move |conn| {
            conn.immediate_transaction::<_, StoreError, _>(|conn| {
                let exists: i64 = users::table.find(&uid).count().get_result(conn)?;
                ensure_updated(exists as usize, &uid)?;

                let last: Option<i64> = profile_items::table
                    .filter(profile_items::user_id.eq(&uid))
                    .select(diesel::dsl::max(profile_items::position))
                    .first(conn)?;
                let row = ProfileItemModel {
                    user_id: uid.clone(),
                    kind,
                    id,
                    payload,
                    position: last.unwrap_or(0) + 1,
                };
                diesel::insert_into(profile_items::table)
                    .values(&row)
                    .execute(conn)?;
                diesel::update(users::table.find(&uid))
                    .set(users::updated_at.eq(Utc::now().naive_utc()))
                    .execute(conn)?;
                Ok(())
            })
        })
        .await
    }

    async fn remove_profile_item(
        &self,
        uid: &str,
        kind: ProfileItemKind,
        item_id: &str,
    ) -> Result<bool, DomainError> {
        let uid = uid.to_string();
        let item_id = item_id.to_string();
        run_blocking(&self.pool, move |conn| {
            let removed = diesel::delete(
                profile_items::table
                    .filter(profile_items::user_id.eq(&uid))
                    .filter(profile_items::kind.eq(kind.as_str()))
                    .filter(profile_items::id.eq(&item_id)),
            )
            .execute(conn)?;
            Ok(removed > 0)
        })
        .await
    }

    async fn add_connection(&self, uid: &str, other_uid: &str) -> Result<(), DomainError> {
        let uid = uid.to_string();
        let other_uid = other_uid.to_string();
        run_blocking(&self.pool, move |conn| {
            conn.immediate_transaction::<_, StoreError, _>(|conn| {
                for member in [&uid, &other_uid] {
                    let exists: i64 = users::table.find(member).count().get_result(conn)?;
                    ensure_updated(exists as usize, member)?;
                }
                for (from, to) in [(&uid, &other_uid), (&other_uid, &uid)] {
                    diesel::insert_or_ignore_into(connections::table)
                        .values((connections::user_id.eq(from), connections::other_id.eq(to)))
                        .execute(conn)?;
                }
                Ok(())
            })
        })
        .await
    }
}
