use crate::error::ApiResult;
use crate::extract::{Admin, DeptHead, SuperAdmin};
use crate::handlers::events::head_department;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use domain::{
    AnalyticsSummary, ApprovalStatus, AssignableRole, Course, DepartmentCount, IdRequest,
    Notification, User,
};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct StatusFilter {
    pub status: Option<ApprovalStatus>,
    pub department: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: AssignableRole,
}

#[derive(Debug, Deserialize)]
pub struct DepartmentRequest {
    pub department: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRequest {
    pub name: String,
    pub dept_name: String,
}

#[derive(Debug, Deserialize)]
pub struct ReminderRequest {
    pub title: String,
    pub message: String,
    pub data: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct LockRequest {
    pub locked: bool,
}

/// `?status=` narrows to one review state, `?department=` to one department.
pub async fn list_users(
    State(state): State<AppState>,
    _admin: Admin,
    Query(filter): Query<StatusFilter>,
) -> ApiResult<Json<Vec<User>>> {
    let approvals = &state.app.approval_service;
    let mut users = match (filter.status, filter.department.as_deref()) {
        (_, Some(dept)) => approvals.users_by_department(dept).await?,
        (Some(ApprovalStatus::Pending), None) => approvals.list_pending().await?,
        (Some(ApprovalStatus::Approved), None) => approvals.list_approved().await?,
        _ => approvals.list_all_users().await?,
    };
    if let Some(status) = filter.status {
        users.retain(|u| u.status == status);
    }
    Ok(Json(users))
}

pub async fn department_heads(State(state): State<AppState>, _admin: Admin) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.app.approval_service.list_department_heads().await?))
}

pub async fn approve(
    State(state): State<AppState>,
    _admin: Admin,
    Path(uid): Path<String>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.app.approval_service.approve(&uid).await?))
}

pub async fn reject(
    State(state): State<AppState>,
    _admin: Admin,
    Path(uid): Path<String>,
    payload: Option<Json<RejectRequest>>,
) -> ApiResult<Json<User>> {
    let reason = payload.and_then(|Json(p)| p.reason);
    Ok(Json(state.app.approval_service.reject(&uid, reason).await?))
}

pub async fn change_role(
    State(state): State<AppState>,
    _admin: Admin,
    Path(uid): Path<String>,
    Json(payload): Json<RoleRequest>,
) -> ApiResult<Json<User>> {
    Ok(Json(
        state.app.approval_service.change_role(&uid, payload.role).await?,
    ))
}

pub async fn assign_department(
    State(state): State<AppState>,
    _admin: Admin,
    Path(uid): Path<String>,
    Json(payload): Json<DepartmentRequest>,
) -> ApiResult<Json<User>> {
    Ok(Json(
        state
            .app
            .approval_service
            .assign_department(&uid, &payload.department)
            .await?,
    ))
}

pub async fn promote(
    State(state): State<AppState>,
    _admin: Admin,
    Path(uid): Path<String>,
    Json(payload): Json<DepartmentRequest>,
) -> ApiResult<Json<User>> {
    Ok(Json(
        state
            .app
            .approval_service
            .promote_to_department_head(&uid, &payload.department)
            .await?,
    ))
}

pub async fn remind(
    State(state): State<AppState>,
    _admin: Admin,
    Path(uid): Path<String>,
    Json(payload): Json<ReminderRequest>,
) -> ApiResult<(StatusCode, Json<Notification>)> {
    state.app.profile_service.get_profile(&uid).await?;
    let notification = state
        .app
        .notification_service
        .send_reminder(&uid, &payload.title, &payload.message, payload.data)
        .await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

pub async fn departments(State(state): State<AppState>, _admin: Admin) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(state.app.approval_service.all_departments().await?))
}

pub async fn add_course(
    State(state): State<AppState>,
    _admin: Admin,
    Json(payload): Json<CourseRequest>,
) -> ApiResult<(StatusCode, Json<Course>)> {
    let course = state
        .app
        .approval_service
        .add_course(&payload.name, &payload.dept_name)
        .await?;
    Ok((StatusCode::CREATED, Json(course)))
}

pub async fn analytics(State(state): State<AppState>, _admin: Admin) -> ApiResult<Json<AnalyticsSummary>> {
    Ok(Json(state.app.approval_service.analytics_summary().await?))
}

pub async fn department_analytics(
    State(state): State<AppState>,
    _admin: Admin,
) -> ApiResult<Json<Vec<DepartmentCount>>> {
    Ok(Json(state.app.approval_service.department_summary().await?))
}

pub async fn id_requests(
    State(state): State<AppState>,
    _admin: Admin,
    Query(filter): Query<StatusFilter>,
) -> ApiResult<Json<Vec<IdRequest>>> {
    let status = filter.status.unwrap_or(ApprovalStatus::Pending);
    Ok(Json(state.app.approval_service.list_id_requests(status).await?))
}

pub async fn approve_id_request(
    State(state): State<AppState>,
    _admin: Admin,
    Path(uid): Path<String>,
) -> ApiResult<Json<IdRequest>> {
    Ok(Json(state.app.approval_service.approve_id_request(&uid).await?))
}

pub async fn reject_id_request(
    State(state): State<AppState>,
    _admin: Admin,
    Path(uid): Path<String>,
) -> ApiResult<Json<IdRequest>> {
    Ok(Json(state.app.approval_service.reject_id_request(&uid).await?))
}

pub async fn set_locked(
    State(state): State<AppState>,
    _super_admin: SuperAdmin,
    Path(uid): Path<String>,
    Json(payload): Json<LockRequest>,
) -> ApiResult<Json<User>> {
    Ok(Json(
        state.app.approval_service.set_locked(&uid, payload.locked).await?,
    ))
}

pub async fn department_members(
    State(state): State<AppState>,
    head: DeptHead,
) -> ApiResult<Json<Vec<User>>> {
    let dept = head_department(&head.user)?;
    Ok(Json(state.app.approval_service.users_by_department(&dept).await?))
}
