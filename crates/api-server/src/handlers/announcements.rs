use crate::error::ApiResult;
use crate::extract::{Admin, Member};
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use domain::{Announcement, ASSOCIATION_ANNOUNCEMENT};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementRequest {
    pub title: String,
    pub content: String,
    pub kind: Option<String>,
    #[serde(default)]
    pub notify_members: bool,
}

pub async fn list(State(state): State<AppState>, _member: Member) -> ApiResult<Json<Vec<Announcement>>> {
    Ok(Json(state.app.announcement_service.list_announcements().await?))
}

pub async fn create(
    State(state): State<AppState>,
    _admin: Admin,
    Json(payload): Json<AnnouncementRequest>,
) -> ApiResult<(StatusCode, Json<Announcement>)> {
    let kind = payload.kind.as_deref().unwrap_or(ASSOCIATION_ANNOUNCEMENT);
    let announcement = state
        .app
        .announcement_service
        .create_announcement(&payload.title, &payload.content, kind, payload.notify_members)
        .await?;
    Ok((StatusCode::CREATED, Json(announcement)))
}
