use crate::error::{ApiError, ApiResult};
use crate::extract::Member;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use domain::{
    CompanyGroup, IdRequest, Notification, ProfileItem, ProfileItemKind, ProfileUpdate, User,
};
use serde::Deserialize;
use serde_json::{json, Value};

pub async fn my_profile(member: Member) -> Json<User> {
    Json(member.user)
}

pub async fn update_profile(
    State(state): State<AppState>,
    member: Member,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Json<User>> {
    let user = state
        .app
        .profile_service
        .update_profile(&member.user.uid, update)
        .await?;
    Ok(Json(user))
}

pub async fn get_profile(
    State(state): State<AppState>,
    _member: Member,
    Path(uid): Path<String>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.app.profile_service.get_profile(&uid).await?))
}

pub async fn add_item(
    State(state): State<AppState>,
    member: Member,
    Json(item): Json<ProfileItem>,
) -> ApiResult<(StatusCode, Json<ProfileItem>)> {
    let saved = state.app.profile_service.add_item(&member.user.uid, item).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn remove_item(
    State(state): State<AppState>,
    member: Member,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let kind: ProfileItemKind = kind.parse()?;
    state
        .app
        .profile_service
        .remove_item(&member.user.uid, kind, &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn grouped_experiences(
    State(state): State<AppState>,
    _member: Member,
    Path(uid): Path<String>,
) -> ApiResult<Json<Vec<CompanyGroup>>> {
    let today = Utc::now().date_naive();
    Ok(Json(
        state.app.profile_service.grouped_experiences(&uid, today).await?,
    ))
}

pub async fn connect(
    State(state): State<AppState>,
    member: Member,
    Path(other): Path<String>,
) -> ApiResult<StatusCode> {
    state.app.profile_service.connect(&member.user.uid, &other).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn submit_id_request(
    State(state): State<AppState>,
    member: Member,
    Json(details): Json<Value>,
) -> ApiResult<(StatusCode, Json<IdRequest>)> {
    if !details.is_object() {
        return Err(ApiError::BadRequest("ID request details must be an object".to_string()));
    }
    let request = state
        .app
        .profile_service
        .submit_id_request(&member.user.uid, details)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

#[derive(Debug, Deserialize)]
pub struct DirectoryQuery {
    pub department: Option<String>,
    pub q: Option<String>,
}

pub async fn directory(
    State(state): State<AppState>,
    _member: Member,
    Query(query): Query<DirectoryQuery>,
) -> ApiResult<Json<Vec<User>>> {
    let users = state
        .app
        .directory_service
        .search_alumni(query.department.as_deref(), query.q.as_deref())
        .await?;
    Ok(Json(users))
}

pub async fn notifications(
    State(state): State<AppState>,
    member: Member,
) -> ApiResult<Json<Vec<Notification>>> {
    Ok(Json(
        state.app.notification_service.list_for_user(&member.user.uid).await?,
    ))
}

pub async fn unread_count(State(state): State<AppState>, member: Member) -> ApiResult<Json<Value>> {
    let unread = state.app.notification_service.unread_count(&member.user.uid).await?;
    Ok(Json(json!({ "unread": unread })))
}

pub async fn mark_read(
    State(state): State<AppState>,
    member: Member,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.app.notification_service.mark_read(&member.user.uid, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_all_read(State(state): State<AppState>, member: Member) -> ApiResult<Json<Value>> {
    let updated = state.app.notification_service.mark_all_read(&member.user.uid).await?;
    Ok(Json(json!({ "updated": updated })))
}

pub async fn delete_notification(
    State(state): State<AppState>,
    member: Member,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.app.notification_service.delete(&member.user.uid, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
