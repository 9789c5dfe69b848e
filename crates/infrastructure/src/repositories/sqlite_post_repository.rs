use crate::database::{post_comments, post_likes, posts, run_blocking, SqlitePool, StoreError};
use async_trait::async_trait;
use diesel::prelude::*;
use domain::{Comment, DomainError, Post, PostRepository, Visibility};
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

#[derive(Queryable, Selectable, Insertable, Debug)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
struct PostModel {
    id: String,
    user_id: String,
    user_name: String,
    user_avatar: String,
    text: String,
    image: String,
    visibility: String,
    timestamp: i64,
}

#[derive(Queryable, Selectable, Insertable, Debug)]
#[diesel(table_name = post_comments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
struct CommentModel {
    id: String,
    post_id: String,
    user_id: String,
    user_name: String,
    text: String,
    timestamp: i64,
}

impl From<&Post> for PostModel {
    fn from(post: &Post) -> Self {
        PostModel {
            id: post.id.clone(),
            user_id: post.user_id.clone(),
            user_name: post.user_name.clone(),
            user_avatar: post.user_avatar.clone(),
            text: post.text.clone(),
            image: post.image.clone(),
            visibility: post.visibility.as_str().to_string(),
            timestamp: post.timestamp,
        }
    }
}

impl CommentModel {
    fn new(post_id: &str, comment: &Comment) -> Self {
        CommentModel {
            id: comment.id.clone(),
            post_id: post_id.to_string(),
            user_id: comment.user_id.clone(),
            user_name: comment.user_name.clone(),
            text: comment.text.clone(),
            timestamp: comment.timestamp,
        }
    }
}

impl From<CommentModel> for Comment {
    fn from(model: CommentModel) -> Self {
        Comment {
            id: model.id,
            user_id: model.user_id,
            user_name: model.user_name,
            text: model.text,
            timestamp: model.timestamp,
        }
    }
}

/// Loads likes and comments for a batch of post rows, keeping row order.
fn hydrate(conn: &mut SqliteConnection, rows: Vec<PostModel>) -> Result<Vec<Post>, StoreError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();

    let mut likes: HashMap<String, BTreeSet<String>> = HashMap::new();
    let like_rows = post_likes::table
        .filter(post_likes::post_id.eq_any(&ids))
        .select((post_likes::post_id, post_likes::user_id))
        .load::<(String, String)>(conn)?;
    for (post_id, uid) in like_rows {
        likes.entry(post_id).or_default().insert(uid);
    }

    let mut comments: HashMap<String, Vec<Comment>> = HashMap::new();
    let comment_rows = post_comments::table
        .filter(post_comments::post_id.eq_any(&ids))
        .order(post_comments::timestamp.asc())
        .select(CommentModel::as_select())
        .load::<CommentModel>(conn)?;
    for row in comment_rows {
        comments.entry(row.post_id.clone()).or_default().push(row.into());
    }

    rows.into_iter()
        .map(|row| -> Result<Post, StoreError> {
            Ok(Post {
                visibility: Visibility::from_str(&row.visibility)?,
                liked_by: likes.remove(&row.id).unwrap_or_default(),
                comments: comments.remove(&row.id).unwrap_or_default(),
                id: row.id,
                user_id: row.user_id,
                user_name: row.user_name,
                user_avatar: row.user_avatar,
                text: row.text,
                image: row.image,
                timestamp: row.timestamp,
            })
        })
        .collect()
}

fn ensure_post(conn: &mut SqliteConnection, post_id: &str) -> Result<(), StoreError> {
    let exists: i64 = posts::table.find(post_id).count().get_result(conn)?;
    if exists == 0 {
        return Err(DomainError::PostNotFound(post_id.to_string()).into());
    }
    Ok(())
}

pub struct SqlitePostRepository {
    pool: SqlitePool,
}

impl SqlitePostRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for SqlitePostRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Post>, DomainError> {
        let id = id.to_string();
        run_blocking(&self.pool, move |conn| {
            let row = posts::table
                .find(&id)
                .select(PostModel::as_select())
                .first::<PostModel>(conn)
                .optional()?;
            match row {
                Some(row) => Ok(hydrate(conn, vec![row])?.pop()),
                None => Ok(None),
            }
        })
        .await
    }

    async fn find_all(&self) -> Result<Vec<Post>, DomainError> {
        run_blocking(&self.pool, |conn| {
            let rows = posts::table
                .order(posts::timestamp.desc())
                .select(PostModel::as_select())
                .load::<PostModel>(conn)?;
            hydrate(conn, rows)
        })
        .await
    }

    async fn find_by_user(&self, uid: &str) -> Result<Vec<Post>, DomainError> {
        let uid = uid.to_string();
        run_blocking(&self.pool, move |conn| {
            let rows = posts::table
                .filter(posts::user_id.eq(&uid))
                .order(posts::timestamp.desc())
                .select(PostModel::as_select())
                .load::<PostModel>(conn)?;
            hydrate(conn, rows)
        })
        .await
    }

    async fn save(&self, post: &Post) -> Result<Post, DomainError> {
        let model = PostModel::from(post);
        run_blocking(&self.pool, move |conn| {
            diesel::insert_into(posts::table).values(&model).execute(conn)?;
            Ok(())
        })
        .await?;
        Ok(post.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), DomainError> {
        let id = id.to_string();
        run_blocking(&self.pool, move |conn| {
            // Likes and comments go with the post through ON DELETE CASCADE.
            diesel::delete(posts::table.find(&id)).execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn add_like(&self, post_id: &str, uid: &str) -> Result<bool, DomainError> {
        let post_id = post_id.to_string();
        let uid = uid.to_string();
        run_blocking(&self.pool, move |conn| {
            ensure_post(conn, &post_id)?;
            let inserted = diesel::insert_or_ignore_into(post_likes::table)
                .values((post_likes::post_id.eq(&post_id), post_likes::user_id.eq(&uid)))
                .execute(conn)?;
            Ok(inserted > 0)
        })
        .await
    }

    async fn remove_like(&self, post_id: &str, uid: &str) -> Result<bool, DomainError> {
        let post_id = post_id.to_string();
        let uid = uid.to_string();
        run_blocking(&self.pool, move |conn| {
            ensure_post(conn, &post_id)?;
            let removed = diesel::delete(
                post_likes::table
                    .filter(post_likes::post_id.eq(&post_id))
                    .filter(post_likes::user_id.eq(&uid)),
            )
            .execute(conn)?;
            Ok(removed > 0)
        })
        .await
    }

    async fn add_comment(&self, post_id: &str, comment: &Comment) -> Result<(), DomainError> {
        let post_id = post_id.to_string();
        let model = CommentModel::new(&post_id, comment);
        run_blocking(&self.pool, move |conn| {
            ensure_post(conn, &post_id)?;
            diesel::insert_into(post_comments::table)
                .values(&model)
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn remove_comment(&self, post_id: &str, comment_id: &str) -> Result<bool, DomainError> {
        let post_id = post_id.to_string();
        let comment_id = comment_id.to_string();
        run_blocking(&self.pool, move |conn| {
            let removed = diesel::delete(
                post_comments::table
                    .filter(post_comments::post_id.eq(&post_id))
                    .filter(post_comments::id.eq(&comment_id)),
            )
            .execute(conn)?;
            Ok(removed > 0)
        })
        .await
    }
}
