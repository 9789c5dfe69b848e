//! Password credentials and opaque session tokens stored next to the
//! member records.

use crate::database::{credentials, run_blocking, sessions, SqlitePool, StoreError};
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, Utc};
use diesel::prelude::*;
use domain::{AuthIdentity, DomainError, IdentityProvider};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::debug;

const TOKEN_BYTES: usize = 32;
const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 7;

/// Smallest Argon2 memory cost, in KiB. Only for tests and local tooling.
pub const MIN_PASSWORD_MEMORY_KIB: u32 = Params::MIN_M_COST;

#[derive(Queryable, Selectable, Insertable, Debug)]
#[diesel(table_name = credentials)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
struct CredentialModel {
    email: String,
    uid: String,
    password_hash: String,
    display_name: String,
    created_at: NaiveDateTime,
}

impl CredentialModel {
    fn identity(&self) -> AuthIdentity {
        AuthIdentity {
            uid: self.uid.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

fn hash_password(argon2: &Argon2<'_>, password: &str) -> Result<String, DomainError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| DomainError::RepositoryError(format!("password hashing failed: {}", e)))
}

fn verify_password(argon2: &Argon2<'_>, password: &str, hash: &str) -> Result<bool, DomainError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| DomainError::RepositoryError(format!("stored hash is invalid: {}", e)))?;
    Ok(argon2.verify_password(password.as_bytes(), &parsed).is_ok())
}

fn new_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub struct SqliteIdentityProvider {
    pool: SqlitePool,
    argon2: Argon2<'static>,
    session_ttl: Duration,
}

impl SqliteIdentityProvider {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            argon2: Argon2::default(),
            session_ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS),
        }
    }

    /// Sessions issued from now on expire after `ttl`.
    pub fn with_session_ttl(mut self, ttl: std::time::Duration) -> Result<Self, DomainError> {
        self.session_ttl = Duration::from_std(ttl)
            .map_err(|e| DomainError::ValidationError(format!("invalid session lifetime: {}", e)))?;
        Ok(self)
    }

    /// Argon2id with a custom memory cost in KiB.
    pub fn with_memory_cost(pool: SqlitePool, memory_kib: u32) -> Result<Self, DomainError> {
        let params = Params::new(memory_kib, Params::DEFAULT_T_COST, Params::DEFAULT_P_COST, None)
            .map_err(|e| DomainError::ValidationError(format!("invalid password cost: {}", e)))?;
        Ok(Self {
            pool,
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            session_ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS),
        })
    }
}

#[async_trait]
impl IdentityProvider for SqliteIdentityProvider {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<AuthIdentity, DomainError> {
        let email = email.trim().to_lowercase();
        let password = password.to_string();
        let display_name = display_name.to_string();
        let argon2 = self.argon2.clone();

        run_blocking(&self.pool, move |conn| {
            let taken: i64 = credentials::table.find(&email).count().get_result(conn)?;
            if taken > 0 {
                return Err(DomainError::EmailAlreadyExists(email.clone()).into());
            }
            let password_hash = hash_password(&argon2, &password)?;
            let model = CredentialModel {
                email: email.clone(),
                uid: uuid::Uuid::new_v4().to_string(),
                password_hash,
                display_name,
                created_at: Utc::now().naive_utc(),
            };
            diesel::insert_into(credentials::table)
                .values(&model)
                .execute(conn)
                .map_err(|e| match e {
                    diesel::result::Error::DatabaseError(
                        diesel::result::DatabaseErrorKind::UniqueViolation,
                        _,
                    ) => StoreError::Domain(DomainError::EmailAlreadyExists(email.clone())),
                    other => StoreError::Diesel(other),
                })?;
            Ok(model.identity())
        })
        .await
    }

    async fn verify_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<AuthIdentity>, DomainError> {
        let email = email.trim().to_lowercase();
        let password = password.to_string();
        let argon2 = self.argon2.clone();
        run_blocking(&self.pool, move |conn| {
            let row = credentials::table
                .find(&email)
                .select(CredentialModel::as_select())
                .first::<CredentialModel>(conn)
                .optional()?;
            let Some(row) = row else {
                return Ok(None);
            };
            let valid = verify_password(&argon2, &password, &row.password_hash)?;
            Ok(valid.then(|| row.identity()))
        })
        .await
    }

    async fn issue_session(&self, identity: &AuthIdentity) -> Result<String, DomainError> {
        let uid = identity.uid.clone();
        let ttl = self.session_ttl;
        run_blocking(&self.pool, move |conn| {
            let now = Utc::now().naive_utc();
            let purged = diesel::delete(sessions::table.filter(sessions::expires_at.le(now)))
                .execute(conn)?;
            if purged > 0 {
                debug!(purged, "expired sessions removed");
            }

            let token = new_token();
            let expires_at = now.checked_add_signed(ttl).unwrap_or(NaiveDateTime::MAX);
            diesel::insert_into(sessions::table)
                .values((
                    sessions::token.eq(&token),
                    sessions::uid.eq(&uid),
                    sessions::created_at.eq(now),
                    sessions::expires_at.eq(expires_at),
                ))
                .execute(conn)?;
            Ok(token)
        })
        .await
    }

    async fn resolve_session(&self, token: &str) -> Result<Option<AuthIdentity>, DomainError> {
        let token = token.to_string();
        run_blocking(&self.pool, move |conn| {
            let row = sessions::table
                .inner_join(credentials::table.on(credentials::uid.eq(sessions::uid)))
                .filter(sessions::token.eq(&token))
                .filter(sessions::expires_at.gt(Utc::now().naive_utc()))
                .select(CredentialModel::as_select())
                .first::<CredentialModel>(conn)
                .optional()?;
            Ok(row.map(|r| r.identity()))
        })
        .await
    }

    async fn revoke_session(&self, token: &str) -> Result<(), DomainError> {
        let token = token.to_string();
        run_blocking(&self.pool, move |conn| {
            diesel::delete(sessions::table.find(&token)).execute(conn)?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_db::temp_database;

    fn provider() -> (tempfile::TempDir, SqliteIdentityProvider) {
        let (dir, db) = temp_database();
        let idp = SqliteIdentityProvider::with_memory_cost(db.get_pool().clone(), MIN_PASSWORD_MEMORY_KIB)
            .unwrap();
        (dir, idp)
    }

    #[tokio::test]
    async fn password_roundtrip() {
        let (_dir, idp) = provider();
        let created = idp.create_account("Ana@Example.com", "secret1", "Ana Cruz").await.unwrap();

        let ok = idp.verify_password("ana@example.com", "secret1").await.unwrap();
        assert_eq!(ok, Some(created));
        assert!(idp.verify_password("ana@example.com", "nope").await.unwrap().is_none());
        assert!(idp.verify_password("who@example.com", "secret1").await.unwrap().is_none());
    }

    #[test]
    fn hashes_are_salted_argon2id() {
        let argon2 = Argon2::default();
        let a = hash_password(&argon2, "secret1").unwrap();
        let b = hash_password(&argon2, "secret1").unwrap();
        assert!(a.starts_with("$argon2id$"));
        assert_ne!(a, b);
        assert!(verify_password(&argon2, "secret1", &a).unwrap());
        assert!(!verify_password(&argon2, "secret2", &a).unwrap());
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let (_dir, idp) = provider();
        idp.create_account("a@b.com", "secret1", "A").await.unwrap();
        let err = idp.create_account("A@B.com", "secret2", "A").await.unwrap_err();
        assert!(matches!(err, DomainError::EmailAlreadyExists(_)));
    }

    #[tokio::test]
    async fn sessions_resolve_until_revoked() {
        let (_dir, idp) = provider();
        let identity = idp.create_account("a@b.com", "secret1", "A").await.unwrap();
        let token = idp.issue_session(&identity).await.unwrap();
        assert_eq!(token.len(), TOKEN_BYTES * 2);

        assert_eq!(idp.resolve_session(&token).await.unwrap(), Some(identity));
        idp.revoke_session(&token).await.unwrap();
        assert!(idp.resolve_session(&token).await.unwrap().is_none());
    }

    fn stored_sessions(idp: &SqliteIdentityProvider) -> i64 {
        let mut conn = idp.pool.get().unwrap();
        sessions::table.count().get_result(&mut conn).unwrap()
    }

    #[tokio::test]
    async fn expired_sessions_stop_resolving_and_are_purged() {
        let (_dir, idp) = provider();
        let idp = idp.with_session_ttl(std::time::Duration::ZERO).unwrap();
        let identity = idp.create_account("a@b.com", "secret1", "A").await.unwrap();

        let first = idp.issue_session(&identity).await.unwrap();
        assert!(idp.resolve_session(&first).await.unwrap().is_none());
        assert_eq!(stored_sessions(&idp), 1);

        // The next login sweeps the stale row.
        idp.issue_session(&identity).await.unwrap();
        assert_eq!(stored_sessions(&idp), 1);
    }
}
