use crate::error::ApiError;
use crate::AppState;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use domain::{AuthIdentity, DomainError, GuardDecision, GuardPolicy, User};
use std::marker::PhantomData;

fn bearer_token(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// A resolved session. Does not look at the user record.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub identity: AuthIdentity,
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(ApiError::Domain(DomainError::Unauthenticated))?;
        let identity = state
            .app
            .auth_service
            .current_identity(&token)
            .await?
            .ok_or(ApiError::Domain(DomainError::Unauthenticated))?;
        Ok(Session { token, identity })
    }
}

/// Which guard a handler sits behind.
pub trait Policy: Send + Sync + 'static {
    fn policy() -> GuardPolicy;
}

pub struct ApprovedMember;
pub struct AssociationAdmin;
pub struct DepartmentHead;
pub struct SuperAdminOnly;

impl Policy for ApprovedMember {
    fn policy() -> GuardPolicy {
        GuardPolicy::approved_member()
    }
}

impl Policy for AssociationAdmin {
    fn policy() -> GuardPolicy {
        GuardPolicy::alumni_association_admin()
    }
}

impl Policy for DepartmentHead {
    fn policy() -> GuardPolicy {
        GuardPolicy::department_head()
    }
}

impl Policy for SuperAdminOnly {
    fn policy() -> GuardPolicy {
        GuardPolicy::super_admin()
    }
}

/// The caller's stored user record, admitted by policy `P`.
pub struct Guarded<P> {
    pub user: User,
    _policy: PhantomData<P>,
}

#[async_trait]
impl<P: Policy> FromRequestParts<AppState> for Guarded<P> {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let identity = match bearer_token(parts) {
            Some(token) => state.app.auth_service.current_identity(&token).await?,
            None => None,
        };
        match state.app.route_guard.check(identity.as_ref(), &P::policy()).await {
            GuardDecision::Allow(user) => Ok(Guarded {
                user,
                _policy: PhantomData,
            }),
            GuardDecision::Redirect(route) => Err(ApiError::Guard(route)),
        }
    }
}

pub type Member = Guarded<ApprovedMember>;
pub type Admin = Guarded<AssociationAdmin>;
pub type DeptHead = Guarded<DepartmentHead>;
pub type SuperAdmin = Guarded<SuperAdminOnly>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc"))).as_deref(), Some("abc"));
        assert!(bearer_token(&parts(Some("Basic abc"))).is_none());
        assert!(bearer_token(&parts(Some("Bearer  "))).is_none());
        assert!(bearer_token(&parts(None)).is_none());
    }
}
