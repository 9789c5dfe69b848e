use crate::error::ApiResult;
use crate::extract::{Admin, DeptHead, Member};
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use domain::{DomainError, Event, NewEvent, User};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct NotifyRequest {
    pub message: String,
}

pub async fn list_global(State(state): State<AppState>, _member: Member) -> ApiResult<Json<Vec<Event>>> {
    Ok(Json(state.app.event_service.list_global_events().await?))
}

/// Events of the caller's own department; empty when they have none.
pub async fn list_mine(State(state): State<AppState>, member: Member) -> ApiResult<Json<Vec<Event>>> {
    let events = match member.user.department() {
        Some(dept) => state.app.event_service.list_department_events(dept).await?,
        None => Vec::new(),
    };
    Ok(Json(events))
}

pub async fn get_event(
    State(state): State<AppState>,
    _member: Member,
    Path(id): Path<String>,
) -> ApiResult<Json<Event>> {
    Ok(Json(state.app.event_service.get_event(&id).await?))
}

pub async fn rsvp(
    State(state): State<AppState>,
    member: Member,
    Path(id): Path<String>,
) -> ApiResult<Json<Event>> {
    Ok(Json(state.app.event_service.rsvp(&id, &member.user.uid).await?))
}

pub async fn cancel_rsvp(
    State(state): State<AppState>,
    member: Member,
    Path(id): Path<String>,
) -> ApiResult<Json<Event>> {
    Ok(Json(
        state.app.event_service.cancel_rsvp(&id, &member.user.uid).await?,
    ))
}

pub async fn create_global(
    State(state): State<AppState>,
    admin: Admin,
    Json(input): Json<NewEvent>,
) -> ApiResult<(StatusCode, Json<Event>)> {
    let event = state
        .app
        .event_service
        .create_global_event(input, &admin.user.uid)
        .await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn notify_attendees(
    State(state): State<AppState>,
    _admin: Admin,
    Path(id): Path<String>,
    Json(payload): Json<NotifyRequest>,
) -> ApiResult<Json<Value>> {
    let notified = state
        .app
        .event_service
        .notify_attendees(&id, &payload.message)
        .await?;
    Ok(Json(json!({ "notified": notified })))
}

pub(crate) fn head_department(user: &User) -> Result<String, DomainError> {
    user.department()
        .map(str::to_string)
        .ok_or_else(|| DomainError::Forbidden("department head without a department".to_string()))
}

pub async fn list_department(
    State(state): State<AppState>,
    head: DeptHead,
) -> ApiResult<Json<Vec<Event>>> {
    let dept = head_department(&head.user)?;
    Ok(Json(state.app.event_service.list_department_events(&dept).await?))
}

pub async fn create_department(
    State(state): State<AppState>,
    head: DeptHead,
    Json(input): Json<NewEvent>,
) -> ApiResult<(StatusCode, Json<Event>)> {
    let dept = head_department(&head.user)?;
    let event = state
        .app
        .event_service
        .create_department_event(&dept, input, &head.user.uid)
        .await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// A department head may only message attendees of their own events.
pub async fn notify_department_attendees(
    State(state): State<AppState>,
    head: DeptHead,
    Path(id): Path<String>,
    Json(payload): Json<NotifyRequest>,
) -> ApiResult<Json<Value>> {
    let dept = head_department(&head.user)?;
    let event = state.app.event_service.get_event(&id).await?;
    if event.scope.department() != Some(dept.as_str()) {
        return Err(DomainError::Forbidden(format!("event {} is not in {}", id, dept)).into());
    }
    let notified = state
        .app
        .event_service
        .notify_attendees(&id, &payload.message)
        .await?;
    Ok(Json(json!({ "notified": notified })))
}
