use crate::entities::{Comment, Post, User, Visibility};
use crate::errors::DomainError;
use crate::repositories::{PostRepository, UserRepository};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Whether `viewer_uid` may see `post`. `author` is the post author's
/// record; a missing author counts as having no connections.
///
/// Friends-only posts check the author's connection set only.
pub fn is_visible_to(post: &Post, viewer_uid: &str, author: Option<&User>) -> bool {
    if post.is_owned_by(viewer_uid) {
        return true;
    }
    match post.visibility {
        Visibility::Public => true,
        Visibility::Friends => author.map_or(false, |a| a.is_connected_to(viewer_uid)),
        Visibility::OnlyMe => false,
    }
}

/// Keeps the posts the viewer may see, preserving order.
pub fn filter_visible(
    viewer_uid: &str,
    posts: Vec<Post>,
    authors: &HashMap<String, User>,
) -> Vec<Post> {
    posts
        .into_iter()
        .filter(|post| is_visible_to(post, viewer_uid, authors.get(&post.user_id)))
        .collect()
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub text: String,
    pub image: Option<String>,
    pub visibility: Option<Visibility>,
}

pub struct FeedService {
    post_repository: Arc<dyn PostRepository>,
    user_repository: Arc<dyn UserRepository>,
}

impl FeedService {
    pub fn new(
        post_repository: Arc<dyn PostRepository>,
        user_repository: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            post_repository,
            user_repository,
        }
    }

    pub async fn create_post(&self, author_uid: &str, new: NewPost) -> Result<Post, DomainError> {
        let author = self.load_user(author_uid).await?;
        let post = Post::new(
            &author,
            new.text.trim().to_string(),
            new.image.filter(|i| !i.is_empty()),
            new.visibility.unwrap_or_default(),
        );
        post.validate()?;
        let saved = self.post_repository.save(&post).await?;
        info!(post_id = %saved.id, author = %author_uid, visibility = %saved.visibility, "post created");
        Ok(saved)
    }

    /// Everything the viewer may see, newest first.
    pub async fn feed_for(&self, viewer_uid: &str) -> Result<Vec<Post>, DomainError> {
        let posts = self.post_repository.find_all().await?;
        let authors = self.authors_of(&posts).await?;
        Ok(filter_visible(viewer_uid, posts, &authors))
    }

    /// One member's posts as seen by `viewer_uid`.
    pub async fn posts_by(&self, author_uid: &str, viewer_uid: &str) -> Result<Vec<Post>, DomainError> {
        let posts = self.post_repository.find_by_user(author_uid).await?;
        let authors = self.authors_of(&posts).await?;
        Ok(filter_visible(viewer_uid, posts, &authors))
    }

    pub async fn get_post(&self, post_id: &str, viewer_uid: &str) -> Result<Post, DomainError> {
        let post = self.load_post(post_id).await?;
        let author = self.user_repository.find_by_id(&post.user_id).await?;
        if !is_visible_to(&post, viewer_uid, author.as_ref()) {
            // Hidden posts are indistinguishable from missing ones.
            return Err(DomainError::PostNotFound(post_id.to_string()));
        }
        Ok(post)
    }

    pub async fn delete_post(&self, post_id: &str, uid: &str) -> Result<(), DomainError> {
        let post = self.load_post(post_id).await?;
        if !post.is_owned_by(uid) {
            return Err(DomainError::Forbidden("only the author can delete a post".to_string()));
        }
        self.post_repository.delete(post_id).await?;
        info!(post_id = %post_id, "post deleted");
        Ok(())
    }

    /// Returns the like count afterwards. Liking twice is a no-op.
    pub async fn like(&self, post_id: &str, uid: &str) -> Result<usize, DomainError> {
        self.get_post(post_id, uid).await?;
        self.post_repository.add_like(post_id, uid).await?;
        Ok(self.load_post(post_id).await?.likes())
    }

    pub async fn unlike(&self, post_id: &str, uid: &str) -> Result<usize, DomainError> {
        self.post_repository.remove_like(post_id, uid).await?;
        Ok(self.load_post(post_id).await?.likes())
    }

    pub async fn add_comment(
        &self,
        post_id: &str,
        uid: &str,
        text: &str,
    ) -> Result<Comment, DomainError> {
        if text.trim().is_empty() {
            return Err(DomainError::ValidationError("Comment cannot be empty".to_string()));
        }
        self.get_post(post_id, uid).await?;
        let author = self.load_user(uid).await?;
        let comment = Comment::new(&author, text.trim().to_string());
        self.post_repository.add_comment(post_id, &comment).await?;
        Ok(comment)
    }

    /// The comment's author or the post's author may remove a comment.
    pub async fn delete_comment(
        &self,
        post_id: &str,
        comment_id: &str,
        uid: &str,
    ) -> Result<(), DomainError> {
        let post = self.load_post(post_id).await?;
        let comment = post
            .comments
            .iter()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| DomainError::CommentNotFound(comment_id.to_string()))?;
        if comment.user_id != uid && !post.is_owned_by(uid) {
            return Err(DomainError::Forbidden(
                "only the commenter or the post author can delete a comment".to_string(),
            ));
        }
        self.post_repository.remove_comment(post_id, comment_id).await?;
        Ok(())
    }

    async fn authors_of(&self, posts: &[Post]) -> Result<HashMap<String, User>, DomainError> {
        let mut authors = HashMap::new();
        for post in posts {
            if authors.contains_key(&post.user_id) {
                continue;
            }
            if let Some(user) = self.user_repository.find_by_id(&post.user_id).await? {
                authors.insert(post.user_id.clone(), user);
            }
        }
        Ok(authors)
    }

    async fn load_post(&self, post_id: &str) -> Result<Post, DomainError> {
        self.post_repository
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::PostNotFound(post_id.to_string()))
    }

    async fn load_user(&self, uid: &str) -> Result<User, DomainError> {
        self.user_repository
            .find_by_id(uid)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(uid.to_string()))
    }
}
