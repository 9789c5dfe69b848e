use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domain::{DomainError, Route};
use serde_json::json;
use tracing::{error, warn};

#[derive(Debug)]
pub enum ApiError {
    Domain(DomainError),
    /// Login failures use the login-screen wording.
    Login(DomainError),
    /// The route guard turned the caller away.
    Guard(Route),
    BadRequest(String),
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        ApiError::Domain(e)
    }
}

fn domain_status(e: &DomainError) -> StatusCode {
    match e {
        DomainError::ValidationError(_) | DomainError::ParseError(_) => StatusCode::BAD_REQUEST,
        DomainError::InvalidCredentials | DomainError::Unauthenticated => StatusCode::UNAUTHORIZED,
        DomainError::PendingApproval(_)
        | DomainError::AccountLocked(_)
        | DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
        DomainError::UserNotFound(_)
        | DomainError::PostNotFound(_)
        | DomainError::CommentNotFound(_)
        | DomainError::EventNotFound(_)
        | DomainError::NotificationNotFound(_)
        | DomainError::IdRequestNotFound(_) => StatusCode::NOT_FOUND,
        DomainError::EmailAlreadyExists(_) | DomainError::EventFull(_) => StatusCode::CONFLICT,
        DomainError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
        DomainError::RepositoryError(_) | DomainError::EmailDeliveryError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_code(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "bad_request",
        StatusCode::UNAUTHORIZED => "unauthorized",
        StatusCode::FORBIDDEN => "forbidden",
        StatusCode::NOT_FOUND => "not_found",
        StatusCode::CONFLICT => "conflict",
        StatusCode::TOO_MANY_REQUESTS => "too_many_requests",
        _ => "internal_error",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, redirect) = match &self {
            ApiError::Domain(e) | ApiError::Login(e) => {
                let status = domain_status(e);
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    error!(error = %e, "request failed");
                } else {
                    warn!(error = %e, "request rejected");
                }
                let message = match &self {
                    ApiError::Login(_) => e.login_message(),
                    _ => e.user_message(),
                };
                let redirect = matches!(e, DomainError::Unauthenticated).then_some(Route::Login);
                (status, message, redirect)
            }
            ApiError::Guard(route) => {
                let status = if *route == Route::Login {
                    StatusCode::UNAUTHORIZED
                } else {
                    StatusCode::FORBIDDEN
                };
                let message = if status == StatusCode::UNAUTHORIZED {
                    DomainError::Unauthenticated.user_message()
                } else {
                    DomainError::Forbidden(String::new()).user_message()
                };
                (status, message, Some(*route))
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone(), None),
        };

        let mut body = json!({
            "error": error_code(status),
            "message": message,
        });
        if let Some(route) = redirect {
            body["redirect"] = json!(route.path());
        }
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
