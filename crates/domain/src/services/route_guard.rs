use crate::entities::{AuthIdentity, Role, Route, User};
use crate::repositories::UserRepository;
use std::sync::Arc;
use tracing::warn;

/// Allow-list of roles plus where to send everybody else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardPolicy {
    pub name: &'static str,
    pub allowed_roles: Vec<Role>,
    /// Members and dept heads must also be approved.
    pub require_approval: bool,
    /// Authenticated, but the role is not on the list.
    pub denied_redirect: Route,
    /// The user record could not be read.
    pub error_redirect: Route,
}

impl GuardPolicy {
    pub fn alumni_association_admin() -> Self {
        Self {
            name: "alumni_association_admin",
            allowed_roles: vec![Role::AlumniAssociationAdmin, Role::SuperAdmin],
            require_approval: false,
            denied_redirect: Route::Home,
            error_redirect: Route::Home,
        }
    }

    pub fn department_head() -> Self {
        Self {
            name: "department_head",
            allowed_roles: vec![Role::DeptHead],
            require_approval: true,
            denied_redirect: Route::AlumniAdmin,
            error_redirect: Route::Login,
        }
    }

    pub fn super_admin() -> Self {
        Self {
            name: "super_admin",
            allowed_roles: vec![Role::SuperAdmin],
            require_approval: false,
            denied_redirect: Route::Home,
            error_redirect: Route::Login,
        }
    }

    /// Any approved member, or any admin.
    pub fn approved_member() -> Self {
        Self {
            name: "approved_member",
            allowed_roles: vec![
                Role::Alumni,
                Role::DeptHead,
                Role::AlumniAssociationAdmin,
                Role::SuperAdmin,
            ],
            require_approval: true,
            denied_redirect: Route::Login,
            error_redirect: Route::Login,
        }
    }

    fn admits(&self, user: &User) -> bool {
        if user.is_locked || !self.allowed_roles.contains(&user.role) {
            return false;
        }
        !self.require_approval || user.can_access_app()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GuardDecision {
    Allow(User),
    Redirect(Route),
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allow(_))
    }
}

/// Gates access on the caller's stored role. Read-only and fails closed.
pub struct RouteGuard {
    user_repository: Arc<dyn UserRepository>,
}

impl RouteGuard {
    pub fn new(user_repository: Arc<dyn UserRepository>) -> Self {
        Self { user_repository }
    }

    pub async fn check(
        &self,
        identity: Option<&AuthIdentity>,
        policy: &GuardPolicy,
    ) -> GuardDecision {
        let Some(identity) = identity else {
            return GuardDecision::Redirect(Route::Login);
        };

        match self.user_repository.find_by_id(&identity.uid).await {
            Ok(Some(user)) if policy.admits(&user) => GuardDecision::Allow(user),
            Ok(Some(_)) => GuardDecision::Redirect(policy.denied_redirect),
            Ok(None) => {
                warn!(uid = %identity.uid, guard = policy.name, "no user record for identity");
                GuardDecision::Redirect(policy.error_redirect)
            }
            Err(e) => {
                warn!(uid = %identity.uid, guard = policy.name, error = %e, "role lookup failed");
                GuardDecision::Redirect(policy.error_redirect)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ApprovalStatus;
    use crate::test_support::*;
    use rstest::rstest;
    use std::sync::atomic::Ordering;

    fn identity(uid: &str) -> AuthIdentity {
        AuthIdentity {
            uid: uid.to_string(),
            email: format!("{}@example.com", uid),
            display_name: uid.to_string(),
        }
    }

    #[rstest]
    #[case(Role::Alumni, GuardPolicy::alumni_association_admin(), Some(Route::Home))]
    #[case(Role::DeptHead, GuardPolicy::alumni_association_admin(), Some(Route::Home))]
    #[case(Role::AlumniAssociationAdmin, GuardPolicy::alumni_association_admin(), None)]
    #[case(Role::SuperAdmin, GuardPolicy::alumni_association_admin(), None)]
    #[case(Role::Alumni, GuardPolicy::department_head(), Some(Route::AlumniAdmin))]
    #[case(Role::DeptHead, GuardPolicy::department_head(), None)]
    #[case(Role::AlumniAssociationAdmin, GuardPolicy::super_admin(), Some(Route::Home))]
    #[case(Role::SuperAdmin, GuardPolicy::super_admin(), None)]
    #[tokio::test]
    async fn role_allow_lists(
        #[case] role: Role,
        #[case] policy: GuardPolicy,
        #[case] redirect: Option<Route>,
    ) {
        let store = InMemoryStore::new();
        seed(&store, &[member("x", role, ApprovalStatus::Approved)]).await;
        let guard = RouteGuard::new(store.clone());

        let decision = guard.check(Some(&identity("x")), &policy).await;
        match redirect {
            None => assert!(decision.is_allowed()),
            Some(route) => assert_eq!(decision, GuardDecision::Redirect(route)),
        }
    }

    #[tokio::test]
    async fn unauthenticated_goes_to_login() {
        let guard = RouteGuard::new(InMemoryStore::new());
        let decision = guard
            .check(None, &GuardPolicy::alumni_association_admin())
            .await;
        assert_eq!(decision, GuardDecision::Redirect(Route::Login));
    }

    #[tokio::test]
    async fn lookup_errors_fail_closed() {
        let store = InMemoryStore::new();
        seed(&store, &[member("x", Role::SuperAdmin, ApprovalStatus::Approved)]).await;
        store.fail_user_reads.store(true, Ordering::SeqCst);
        let guard = RouteGuard::new(store.clone());

        let decision = guard.check(Some(&identity("x")), &GuardPolicy::super_admin()).await;
        assert_eq!(decision, GuardDecision::Redirect(Route::Login));

        let decision = guard
            .check(Some(&identity("x")), &GuardPolicy::alumni_association_admin())
            .await;
        assert_eq!(decision, GuardDecision::Redirect(Route::Home));
    }

    #[tokio::test]
    async fn pending_members_are_not_approved_members() {
        let store = InMemoryStore::new();
        seed(&store, &[member("p", Role::Alumni, ApprovalStatus::Pending)]).await;
        let guard = RouteGuard::new(store.clone());

        let decision = guard
            .check(Some(&identity("p")), &GuardPolicy::approved_member())
            .await;
        assert_eq!(decision, GuardDecision::Redirect(Route::Login));
    }

    #[tokio::test]
    async fn locked_admins_are_turned_away() {
        let store = InMemoryStore::new();
        let mut admin = member("a", Role::SuperAdmin, ApprovalStatus::Approved);
        admin.is_locked = true;
        seed(&store, &[admin]).await;
        let guard = RouteGuard::new(store.clone());

        let decision = guard.check(Some(&identity("a")), &GuardPolicy::super_admin()).await;
        assert!(!decision.is_allowed());
    }

    #[tokio::test]
    async fn unknown_user_record_redirects() {
        let guard = RouteGuard::new(InMemoryStore::new());
        let decision = guard
            .check(Some(&identity("ghost")), &GuardPolicy::department_head())
            .await;
        assert_eq!(decision, GuardDecision::Redirect(Route::Login));
    }
}
