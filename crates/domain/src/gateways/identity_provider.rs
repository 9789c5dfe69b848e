use crate::entities::AuthIdentity;
use crate::errors::DomainError;
use async_trait::async_trait;

/// Credential and session backend. Knows nothing about roles or approval;
/// those live on the user record.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Fails with `DomainError::EmailAlreadyExists` on a duplicate email.
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<AuthIdentity, DomainError>;

    /// `None` when the email is unknown or the password does not match.
    async fn verify_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<AuthIdentity>, DomainError>;

    async fn issue_session(&self, identity: &AuthIdentity) -> Result<String, DomainError>;

    async fn resolve_session(&self, token: &str) -> Result<Option<AuthIdentity>, DomainError>;

    async fn revoke_session(&self, token: &str) -> Result<(), DomainError>;
}
