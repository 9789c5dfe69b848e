use crate::entities::{Comment, Post};
use crate::errors::DomainError;
use async_trait::async_trait;

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Post>, DomainError>;
    /// Every post, newest first.
    async fn find_all(&self) -> Result<Vec<Post>, DomainError>;
    /// One author's posts, newest first.
    async fn find_by_user(&self, uid: &str) -> Result<Vec<Post>, DomainError>;
    async fn save(&self, post: &Post) -> Result<Post, DomainError>;
    async fn delete(&self, id: &str) -> Result<(), DomainError>;
    /// `false` when the member had already liked the post.
    async fn add_like(&self, post_id: &str, uid: &str) -> Result<bool, DomainError>;
    async fn remove_like(&self, post_id: &str, uid: &str) -> Result<bool, DomainError>;
    async fn add_comment(&self, post_id: &str, comment: &Comment) -> Result<(), DomainError>;
    async fn remove_comment(&self, post_id: &str, comment_id: &str) -> Result<bool, DomainError>;
}
