use crate::error::ApiResult;
use crate::extract::Member;
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use domain::{Comment, NewPost, Post, Visibility};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub text: String,
    pub image: Option<String>,
    pub visibility: Option<Visibility>,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

pub async fn feed(State(state): State<AppState>, member: Member) -> ApiResult<Json<Vec<Post>>> {
    Ok(Json(state.app.feed_service.feed_for(&member.user.uid).await?))
}

pub async fn posts_by(
    State(state): State<AppState>,
    member: Member,
    Path(author): Path<String>,
) -> ApiResult<Json<Vec<Post>>> {
    Ok(Json(
        state.app.feed_service.posts_by(&author, &member.user.uid).await?,
    ))
}

pub async fn create_post(
    State(state): State<AppState>,
    member: Member,
    Json(payload): Json<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<Post>)> {
    let post = state
        .app
        .feed_service
        .create_post(
            &member.user.uid,
            NewPost {
                text: payload.text,
                image: payload.image,
                visibility: payload.visibility,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn get_post(
    State(state): State<AppState>,
    member: Member,
    Path(id): Path<String>,
) -> ApiResult<Json<Post>> {
    Ok(Json(state.app.feed_service.get_post(&id, &member.user.uid).await?))
}

pub async fn delete_post(
    State(state): State<AppState>,
    member: Member,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.app.feed_service.delete_post(&id, &member.user.uid).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn like(
    State(state): State<AppState>,
    member: Member,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let likes = state.app.feed_service.like(&id, &member.user.uid).await?;
    Ok(Json(json!({ "likes": likes })))
}

pub async fn unlike(
    State(state): State<AppState>,
    member: Member,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let likes = state.app.feed_service.unlike(&id, &member.user.uid).await?;
    Ok(Json(json!({ "likes": likes })))
}

pub async fn add_comment(
    State(state): State<AppState>,
    member: Member,
    Path(id): Path<String>,
    Json(payload): Json<CommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let comment = state
        .app
        .feed_service
        .add_comment(&id, &member.user.uid, &payload.text)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    member: Member,
    Path((post_id, comment_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state
        .app
        .feed_service
        .delete_comment(&post_id, &comment_id, &member.user.uid)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
