pub mod database;
pub mod email;
pub mod identity;
pub mod repositories;

pub use database::{Database, SqlitePool};
pub use email::{HttpEmailNotifier, LogEmailNotifier};
pub use identity::{SqliteIdentityProvider, MIN_PASSWORD_MEMORY_KIB};
pub use repositories::*;
