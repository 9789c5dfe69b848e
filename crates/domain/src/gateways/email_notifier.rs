use crate::errors::DomainError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalEmail {
    pub uid: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionEmail {
    pub uid: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Result reported by the email endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailReceipt {
    pub success: bool,
    pub message: String,
}

/// Transactional email sender. Callers treat it as fire-and-forget.
#[async_trait]
pub trait EmailNotifier: Send + Sync {
    async fn send_approval_email(&self, email: &ApprovalEmail)
        -> Result<EmailReceipt, DomainError>;

    async fn send_rejection_email(
        &self,
        email: &RejectionEmail,
    ) -> Result<EmailReceipt, DomainError>;
}
