use crate::entities::{ApprovalStatus, IdRequest};
use crate::errors::DomainError;
use async_trait::async_trait;

#[async_trait]
pub trait IdRequestRepository: Send + Sync {
    async fn find_by_user(&self, uid: &str) -> Result<Option<IdRequest>, DomainError>;
    async fn find_by_status(&self, status: ApprovalStatus) -> Result<Vec<IdRequest>, DomainError>;
    /// Inserts or replaces the member's request.
    async fn upsert(&self, request: &IdRequest) -> Result<IdRequest, DomainError>;
    async fn set_status(&self, uid: &str, status: ApprovalStatus)
        -> Result<IdRequest, DomainError>;
}
