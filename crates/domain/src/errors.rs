use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("User not found with uid: {0}")]
    UserNotFound(String),

    #[error("Post not found with id: {0}")]
    PostNotFound(String),

    #[error("Comment not found with id: {0}")]
    CommentNotFound(String),

    #[error("Event not found with id: {0}")]
    EventNotFound(String),

    #[error("Notification not found with id: {0}")]
    NotificationNotFound(String),

    #[error("Alumni ID request not found for user: {0}")]
    IdRequestNotFound(String),

    #[error("Email already registered: {0}")]
    EmailAlreadyExists(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Too many failed login attempts for: {0}")]
    TooManyRequests(String),

    #[error("Account awaiting approval: {0}")]
    PendingApproval(String),

    #[error("Account locked: {0}")]
    AccountLocked(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Event is full: {0}")]
    EventFull(String),

    #[error("Repository error: {0}")]
    RepositoryError(String),

    #[error("Email delivery error: {0}")]
    EmailDeliveryError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl DomainError {
    /// Message suitable for showing to an end user. Internal details are
    /// never included.
    pub fn user_message(&self) -> String {
        match self {
            DomainError::InvalidCredentials => "Invalid email or password.".to_string(),
            DomainError::TooManyRequests(_) => {
                "Too many attempts. Please try again later.".to_string()
            }
            DomainError::PendingApproval(_) => "Your account is awaiting admin approval. \
                You will be notified once your account is approved."
                .to_string(),
            DomainError::AccountLocked(_) => {
                "Your account has been locked. Please contact an administrator.".to_string()
            }
            DomainError::EmailAlreadyExists(_) => {
                "An account with this email already exists.".to_string()
            }
            DomainError::Unauthenticated => "Please log in to continue.".to_string(),
            DomainError::Forbidden(_) => "You do not have access to this page.".to_string(),
            DomainError::ValidationError(msg) => msg.clone(),
            DomainError::EventFull(_) => "This event has reached its capacity.".to_string(),
            DomainError::UserNotFound(_)
            | DomainError::PostNotFound(_)
            | DomainError::CommentNotFound(_)
            | DomainError::EventNotFound(_)
            | DomainError::NotificationNotFound(_)
            | DomainError::IdRequestNotFound(_) => "The requested item was not found.".to_string(),
            DomainError::RepositoryError(_)
            | DomainError::EmailDeliveryError(_)
            | DomainError::ParseError(_) => "Something went wrong. Please try again.".to_string(),
        }
    }

    /// Login failures that are not covered by a specific message fall back to
    /// a generic one.
    pub fn login_message(&self) -> String {
        match self {
            DomainError::InvalidCredentials
            | DomainError::TooManyRequests(_)
            | DomainError::PendingApproval(_)
            | DomainError::AccountLocked(_) => self.user_message(),
            _ => "Login failed. Please try again.".to_string(),
        }
    }
}
