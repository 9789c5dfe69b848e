use crate::error::{ApiError, ApiResult};
use crate::extract::Session;
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use domain::{AuthIdentity, RegistrationDetails, User};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(flatten)]
    pub details: RegistrationDetails,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
    /// Path of the screen the member should be sent to.
    pub landing: &'static str,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    info!(email = %payload.email, "registration request");
    let user = state
        .app
        .auth_service
        .register(&payload.email, &payload.password, payload.details)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let outcome = state
        .app
        .auth_service
        .login(&payload.email, &payload.password)
        .await
        .map_err(ApiError::Login)?;
    Ok(Json(LoginResponse {
        token: outcome.token,
        user: outcome.user,
        landing: outcome.landing.path(),
    }))
}

pub async fn logout(State(state): State<AppState>, session: Session) -> ApiResult<StatusCode> {
    state.app.auth_service.logout(&session.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(session: Session) -> Json<AuthIdentity> {
    Json(session.identity)
}
