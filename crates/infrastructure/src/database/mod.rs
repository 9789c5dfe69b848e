use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection};
use domain::DomainError;
use tracing::info;

pub mod schema;
pub use schema::*;

pub type SqlitePool = r2d2::Pool<ConnectionManager<SqliteConnection>>;

/// Per-connection pragmas. SQLite does not persist these.
#[derive(Debug, Clone, Copy)]
struct ConnectionOptions;

impl CustomizeConnection<SqliteConnection, r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .map_err(r2d2::Error::QueryError)
    }
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (or creates) the database file and applies the schema.
    pub fn new(database_path: &str) -> Result<Self, DomainError> {
        let manager = ConnectionManager::<SqliteConnection>::new(database_path);
        let pool = r2d2::Pool::builder()
            .connection_customizer(Box::new(ConnectionOptions))
            .build(manager)
            .map_err(|e| DomainError::RepositoryError(e.to_string()))?;

        let mut conn = pool
            .get()
            .map_err(|e| DomainError::RepositoryError(e.to_string()))?;
        conn.batch_execute("PRAGMA journal_mode = WAL;")
            .and_then(|_| conn.batch_execute(SCHEMA_SQL))
            .map_err(|e| DomainError::RepositoryError(e.to_string()))?;

        info!(path = %database_path, "database ready");
        Ok(Database { pool })
    }

    pub fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Failure inside a blocking store call: either the driver or a domain rule
/// checked within the same transaction.
#[derive(Debug)]
pub(crate) enum StoreError {
    Diesel(diesel::result::Error),
    Domain(DomainError),
}

impl From<diesel::result::Error> for StoreError {
    fn from(e: diesel::result::Error) -> Self {
        StoreError::Diesel(e)
    }
}

impl From<DomainError> for StoreError {
    fn from(e: DomainError) -> Self {
        StoreError::Domain(e)
    }
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Diesel(e) => DomainError::RepositoryError(e.to_string()),
            StoreError::Domain(e) => e,
        }
    }
}

/// Runs `f` with a pooled connection on the blocking thread pool.
pub(crate) async fn run_blocking<T, F>(pool: &SqlitePool, f: F) -> Result<T, DomainError>
where
    T: Send + 'static,
    F: FnOnce(&mut SqliteConnection) -> Result<T, StoreError> + Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| DomainError::RepositoryError(e.to_string()))?;
        f(&mut *conn).map_err(DomainError::from)
    })
    .await
    .map_err(|e| DomainError::RepositoryError(e.to_string()))?
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("twice.db");
        let path = path.to_str().unwrap();
        Database::new(path).unwrap();
        Database::new(path).unwrap();
    }
}
