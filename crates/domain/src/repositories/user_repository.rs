use crate::entities::{ApprovalStatus, ProfileItem, ProfileItemKind, Role, User};
use crate::errors::DomainError;
use async_trait::async_trait;

/// Repository trait - defines what we need from persistence layer
/// This is a PORT in hexagonal architecture
///
/// Field setters bump `updated_at` and return the stored record, or
/// `DomainError::UserNotFound` when the uid is unknown.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, uid: &str) -> Result<Option<User>, DomainError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;
    async fn find_all(&self) -> Result<Vec<User>, DomainError>;
    async fn find_by_status(&self, status: ApprovalStatus) -> Result<Vec<User>, DomainError>;
    async fn find_by_role(&self, role: Role) -> Result<Vec<User>, DomainError>;
    async fn find_by_department(&self, department: &str) -> Result<Vec<User>, DomainError>;
    async fn count_all(&self) -> Result<usize, DomainError>;
    async fn count_by_status(&self, status: ApprovalStatus) -> Result<usize, DomainError>;
    async fn count_by_role(&self, role: Role) -> Result<usize, DomainError>;

    async fn save(&self, user: &User) -> Result<User, DomainError>;
    /// Writes the self-editable profile fields only.
    async fn update_profile(&self, user: &User) -> Result<User, DomainError>;
    async fn set_status(&self, uid: &str, status: ApprovalStatus) -> Result<User, DomainError>;
    async fn set_role(&self, uid: &str, role: Role) -> Result<User, DomainError>;
    async fn set_department(&self, uid: &str, department: &str) -> Result<User, DomainError>;
    /// Role and department land together or not at all.
    async fn set_role_and_department(
        &self,
        uid: &str,
        role: Role,
        department: &str,
    ) -> Result<User, DomainError>;
    async fn set_locked(&self, uid: &str, locked: bool) -> Result<User, DomainError>;
    async fn set_digital_id_status(
        &self,
        uid: &str,
        status: ApprovalStatus,
    ) -> Result<User, DomainError>;

    /// Appends one entry to a nested profile list.
    async fn add_profile_item(&self, uid: &str, item: &ProfileItem) -> Result<(), DomainError>;
    /// Removes one entry; `false` when nothing matched.
    async fn remove_profile_item(
        &self,
        uid: &str,
        kind: ProfileItemKind,
        item_id: &str,
    ) -> Result<bool, DomainError>;
    /// Records the connection in both members' sets.
    async fn add_connection(&self, uid: &str, other_uid: &str) -> Result<(), DomainError>;
}
