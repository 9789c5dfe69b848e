use crate::entities::{ApprovalStatus, AssignableRole, Course, IdRequest, Role, User};
use crate::errors::DomainError;
use crate::gateways::{ApprovalEmail, EmailNotifier, RejectionEmail};
use crate::repositories::{CourseRepository, IdRequestRepository, UserRepository};
use crate::services::NotificationService;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{info, warn};

/// Counts shown on the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_users: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub alumni: usize,
    pub department_heads: usize,
    /// Percentage of all users that are approved, rounded.
    pub approval_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentCount {
    pub department: String,
    pub users: usize,
}

/// Admin review of registrations, roles and digital ID requests.
pub struct ApprovalService {
    user_repository: Arc<dyn UserRepository>,
    id_request_repository: Arc<dyn IdRequestRepository>,
    course_repository: Arc<dyn CourseRepository>,
    email_notifier: Arc<dyn EmailNotifier>,
    notifications: Arc<NotificationService>,
}

impl ApprovalService {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        id_request_repository: Arc<dyn IdRequestRepository>,
        course_repository: Arc<dyn CourseRepository>,
        email_notifier: Arc<dyn EmailNotifier>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            user_repository,
            id_request_repository,
            course_repository,
            email_notifier,
            notifications,
        }
    }

    pub async fn list_pending(&self) -> Result<Vec<User>, DomainError> {
        self.user_repository.find_by_status(ApprovalStatus::Pending).await
    }

    pub async fn list_approved(&self) -> Result<Vec<User>, DomainError> {
        self.user_repository.find_by_status(ApprovalStatus::Approved).await
    }

    pub async fn list_department_heads(&self) -> Result<Vec<User>, DomainError> {
        self.user_repository.find_by_role(Role::DeptHead).await
    }

    pub async fn list_all_users(&self) -> Result<Vec<User>, DomainError> {
        self.user_repository.find_all().await
    }

    pub async fn users_by_department(&self, department: &str) -> Result<Vec<User>, DomainError> {
        self.user_repository.find_by_department(department).await
    }

    /// Approves a registration and then tries to email the member.
    ///
    /// The email is attempted only after the status write succeeded, and a
    /// delivery failure is logged without touching the stored status.
    pub async fn approve(&self, uid: &str) -> Result<User, DomainError> {
        self.load_user(uid).await?;
        let user = self
            .user_repository
            .set_status(uid, ApprovalStatus::Approved)
            .await?;
        info!(uid = %uid, "registration approved");

        let email = ApprovalEmail {
            uid: user.uid.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        };
        match self.email_notifier.send_approval_email(&email).await {
            Ok(receipt) if receipt.success => info!(uid = %uid, "approval email sent"),
            Ok(receipt) => warn!(uid = %uid, message = %receipt.message, "approval email refused"),
            Err(e) => warn!(uid = %uid, error = %e, "approval email failed"),
        }

        if let Err(e) = self
            .notifications
            .notify_approval(
                uid,
                "Account approved",
                "Your Alumni Link account has been approved. Welcome!",
                "registration",
            )
            .await
        {
            warn!(uid = %uid, error = %e, "approval notification failed");
        }

        Ok(user)
    }

    pub async fn reject(&self, uid: &str, reason: Option<String>) -> Result<User, DomainError> {
        self.load_user(uid).await?;
        let user = self
            .user_repository
            .set_status(uid, ApprovalStatus::Rejected)
            .await?;
        info!(uid = %uid, "registration rejected");

        let email = RejectionEmail {
            uid: user.uid.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            reason: reason.filter(|r| !r.trim().is_empty()),
        };
        match self.email_notifier.send_rejection_email(&email).await {
            Ok(receipt) if receipt.success => info!(uid = %uid, "rejection email sent"),
            Ok(receipt) => warn!(uid = %uid, message = %receipt.message, "rejection email refused"),
            Err(e) => warn!(uid = %uid, error = %e, "rejection email failed"),
        }

        Ok(user)
    }

    /// Switching to `dept_head` keeps the member's current department and
    /// fails if there is none. Use `promote_to_department_head` to set both.
    pub async fn change_role(&self, uid: &str, role: AssignableRole) -> Result<User, DomainError> {
        let user = self.load_user(uid).await?;
        if user.role.is_admin() {
            return Err(DomainError::Forbidden(
                "administrator roles cannot be changed here".to_string(),
            ));
        }
        let role = Role::from(role);
        if role == Role::DeptHead && user.department().is_none() {
            return Err(DomainError::ValidationError(
                "Assign a department before making this user a department head".to_string(),
            ));
        }
        let updated = self.user_repository.set_role(uid, role).await?;
        info!(uid = %uid, role = %role, "role changed");
        Ok(updated)
    }

    pub async fn assign_department(&self, uid: &str, department: &str) -> Result<User, DomainError> {
        let department = required_department(department)?;
        self.load_user(uid).await?;
        let updated = self.user_repository.set_department(uid, department).await?;
        info!(uid = %uid, department = %department, "department assigned");
        Ok(updated)
    }

    /// Sets role and department in one write.
    pub async fn promote_to_department_head(
        &self,
        uid: &str,
        department: &str,
    ) -> Result<User, DomainError> {
        let department = required_department(department)?;
        let user = self.load_user(uid).await?;
        if user.role.is_admin() {
            return Err(DomainError::Forbidden(
                "administrators cannot be made department heads".to_string(),
            ));
        }
        let updated = self
            .user_repository
            .set_role_and_department(uid, Role::DeptHead, department)
            .await?;
        info!(uid = %uid, department = %department, "promoted to department head");
        Ok(updated)
    }

    pub async fn set_locked(&self, uid: &str, locked: bool) -> Result<User, DomainError> {
        self.load_user(uid).await?;
        let updated = self.user_repository.set_locked(uid, locked).await?;
        info!(uid = %uid, locked, "account lock changed");
        Ok(updated)
    }

    /// Distinct department names from the course catalog, sorted.
    pub async fn all_departments(&self) -> Result<Vec<String>, DomainError> {
        let departments: BTreeSet<String> = self
            .course_repository
            .find_all()
            .await?
            .into_iter()
            .map(|c| c.dept_name)
            .filter(|d| !d.trim().is_empty())
            .collect();
        Ok(departments.into_iter().collect())
    }

    pub async fn add_course(&self, name: &str, dept_name: &str) -> Result<Course, DomainError> {
        let (name, dept_name) = (name.trim(), dept_name.trim());
        if name.is_empty() || dept_name.is_empty() {
            return Err(DomainError::ValidationError(
                "Course and department names are required".to_string(),
            ));
        }
        let course = Course {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            dept_name: dept_name.to_string(),
        };
        self.course_repository.save(&course).await
    }

    pub async fn analytics_summary(&self) -> Result<AnalyticsSummary, DomainError> {
        let total_users = self.user_repository.count_all().await?;
        let approved = self.user_repository.count_by_status(ApprovalStatus::Approved).await?;
        let approval_rate = if total_users == 0 {
            0
        } else {
            (approved as f64 / total_users as f64 * 100.0).round() as u32
        };
        Ok(AnalyticsSummary {
            total_users,
            pending: self.user_repository.count_by_status(ApprovalStatus::Pending).await?,
            approved,
            rejected: self.user_repository.count_by_status(ApprovalStatus::Rejected).await?,
            alumni: self.user_repository.count_by_role(Role::Alumni).await?,
            department_heads: self.user_repository.count_by_role(Role::DeptHead).await?,
            approval_rate,
        })
    }

    /// Users per department, largest first. Ties break on name.
    pub async fn department_summary(&self) -> Result<Vec<DepartmentCount>, DomainError> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for user in self.user_repository.find_all().await? {
            if let Some(dept) = user.department() {
                *counts.entry(dept.to_string()).or_default() += 1;
            }
        }
        let mut summary: Vec<DepartmentCount> = counts
            .into_iter()
            .map(|(department, users)| DepartmentCount { department, users })
            .collect();
        summary.sort_by(|a, b| b.users.cmp(&a.users).then_with(|| a.department.cmp(&b.department)));
        Ok(summary)
    }

    pub async fn list_id_requests(&self, status: ApprovalStatus) -> Result<Vec<IdRequest>, DomainError> {
        self.id_request_repository.find_by_status(status).await
    }

    pub async fn approve_id_request(&self, uid: &str) -> Result<IdRequest, DomainError> {
        self.decide_id_request(uid, ApprovalStatus::Approved).await
    }

    pub async fn reject_id_request(&self, uid: &str) -> Result<IdRequest, DomainError> {
        self.decide_id_request(uid, ApprovalStatus::Rejected).await
    }

    async fn decide_id_request(
        &self,
        uid: &str,
        status: ApprovalStatus,
    ) -> Result<IdRequest, DomainError> {
        let request = self.id_request_repository.set_status(uid, status).await?;
        self.user_repository.set_digital_id_status(uid, status).await?;
        info!(uid = %uid, status = %status, "digital ID request decided");

        if status == ApprovalStatus::Approved {
            if let Err(e) = self
                .notifications
                .notify_approval(
                    uid,
                    "Digital ID approved",
                    "Your digital alumni ID is ready.",
                    "digital_id",
                )
                .await
            {
                warn!(uid = %uid, error = %e, "ID approval notification failed");
            }
        }
        Ok(request)
    }

    async fn load_user(&self, uid: &str) -> Result<User, DomainError> {
        self.user_repository
            .find_by_id(uid)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(uid.to_string()))
    }
}

fn required_department(department: &str) -> Result<&str, DomainError> {
    let department = department.trim();
    if department.is_empty() {
        return Err(DomainError::ValidationError("Department is required".to_string()));
    }
    Ok(department)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Course, NotificationType};
    use crate::repositories::NotificationRepository;
    use crate::test_support::*;
    use serde_json::json;

    fn service(store: &Arc<InMemoryStore>, email: Arc<RecordingEmailNotifier>) -> ApprovalService {
        ApprovalService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            email,
            notification_service(store),
        )
    }

    #[tokio::test]
    async fn approve_moves_pending_to_approved_and_emails() {
        let store = InMemoryStore::new();
        seed(&store, &[member("x", Role::Alumni, ApprovalStatus::Pending)]).await;
        let email = RecordingEmailNotifier::new();
        let service = service(&store, email.clone());

        let user = service.approve("x").await.unwrap();
        assert_eq!(user.status, ApprovalStatus::Approved);
        assert!(service.list_pending().await.unwrap().is_empty());
        assert_eq!(service.list_approved().await.unwrap().len(), 1);

        let sent = email.approvals.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].email, "x@example.com");
        assert_eq!(sent[0].first_name, "X");

        let inbox = NotificationRepository::find_by_user(store.as_ref(), "x").await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationType::Approval);
    }

    #[tokio::test]
    async fn approving_twice_stays_approved() {
        let store = InMemoryStore::new();
        seed(&store, &[member("x", Role::Alumni, ApprovalStatus::Pending)]).await;
        let service = service(&store, RecordingEmailNotifier::new());

        service.approve("x").await.unwrap();
        let user = service.approve("x").await.unwrap();
        assert_eq!(user.status, ApprovalStatus::Approved);
    }

    #[tokio::test]
    async fn email_failure_does_not_block_approval() {
        let store = InMemoryStore::new();
        seed(&store, &[member("x", Role::Alumni, ApprovalStatus::Pending)]).await;
        let email = RecordingEmailNotifier::failing();
        let service = service(&store, email.clone());

        let user = service.approve("x").await.unwrap();
        assert_eq!(user.status, ApprovalStatus::Approved);
        assert_eq!(email.approvals.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reject_passes_reason_through() {
        let store = InMemoryStore::new();
        seed(&store, &[member("x", Role::Alumni, ApprovalStatus::Pending)]).await;
        let email = RecordingEmailNotifier::new();
        let service = service(&store, email.clone());

        let user = service.reject("x", Some("Not a graduate".into())).await.unwrap();
        assert_eq!(user.status, ApprovalStatus::Rejected);
        let sent = email.rejections.lock().unwrap().clone();
        assert_eq!(sent[0].reason.as_deref(), Some("Not a graduate"));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let store = InMemoryStore::new();
        let email = RecordingEmailNotifier::new();
        let service = service(&store, email.clone());
        let err = service.approve("ghost").await.unwrap_err();
        assert!(matches!(err, DomainError::UserNotFound(_)));
        assert!(email.approvals.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn dept_head_role_requires_a_department() {
        let store = InMemoryStore::new();
        seed(&store, &[member("x", Role::Alumni, ApprovalStatus::Approved)]).await;
        let service = service(&store, RecordingEmailNotifier::new());

        let err = service.change_role("x", AssignableRole::DeptHead).await.unwrap_err();
        assert!(matches!(err, DomainError::ValidationError(_)));

        service.assign_department("x", "Nursing").await.unwrap();
        let user = service.change_role("x", AssignableRole::DeptHead).await.unwrap();
        assert_eq!(user.role, Role::DeptHead);
        assert_eq!(user.department(), Some("Nursing"));
    }

    #[tokio::test]
    async fn promotion_sets_role_and_department_together() {
        let store = InMemoryStore::new();
        seed(&store, &[member("x", Role::Alumni, ApprovalStatus::Approved)]).await;
        let service = service(&store, RecordingEmailNotifier::new());

        let user = service.promote_to_department_head("x", " Business ").await.unwrap();
        assert_eq!(user.role, Role::DeptHead);
        assert_eq!(user.department(), Some("Business"));
        assert_eq!(service.list_department_heads().await.unwrap().len(), 1);

        let err = service.promote_to_department_head("x", "  ").await.unwrap_err();
        assert!(matches!(err, DomainError::ValidationError(_)));
    }

    #[tokio::test]
    async fn admin_roles_are_not_reassignable() {
        let store = InMemoryStore::new();
        seed(&store, &[member("a", Role::SuperAdmin, ApprovalStatus::Approved)]).await;
        let service = service(&store, RecordingEmailNotifier::new());
        let err = service.change_role("a", AssignableRole::Alumni).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn analytics_rounds_approval_rate() {
        let store = InMemoryStore::new();
        seed(
            &store,
            &[
                member("a", Role::Alumni, ApprovalStatus::Approved),
                member("b", Role::Alumni, ApprovalStatus::Approved),
                member("c", Role::Alumni, ApprovalStatus::Pending),
            ],
        )
        .await;
        let service = service(&store, RecordingEmailNotifier::new());

        let summary = service.analytics_summary().await.unwrap();
        assert_eq!(summary.total_users, 3);
        assert_eq!(summary.approved, 2);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.approval_rate, 67);
    }

    #[tokio::test]
    async fn analytics_on_empty_store() {
        let service = service(&InMemoryStore::new(), RecordingEmailNotifier::new());
        assert_eq!(service.analytics_summary().await.unwrap().approval_rate, 0);
    }

    #[tokio::test]
    async fn department_summary_sorted_by_size() {
        let store = InMemoryStore::new();
        let mut users = Vec::new();
        for (uid, dept) in [("a", "Arts"), ("b", "Nursing"), ("c", "Nursing"), ("d", "")] {
            let mut u = member(uid, Role::Alumni, ApprovalStatus::Approved);
            u.school_department = Some(dept.to_string());
            users.push(u);
        }
        seed(&store, &users).await;
        let service = service(&store, RecordingEmailNotifier::new());

        let summary = service.department_summary().await.unwrap();
        assert_eq!(
            summary,
            vec![
                DepartmentCount { department: "Nursing".into(), users: 2 },
                DepartmentCount { department: "Arts".into(), users: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn departments_come_from_courses() {
        let store = InMemoryStore::new();
        for (name, dept) in [("BSN", "Nursing"), ("BSCS", "Engineering"), ("BSIT", "Engineering")] {
            CourseRepository::save(
                store.as_ref(),
                &Course { id: name.into(), name: name.into(), dept_name: dept.into() },
            )
            .await
            .unwrap();
        }
        let service = service(&store, RecordingEmailNotifier::new());
        assert_eq!(service.all_departments().await.unwrap(), vec!["Engineering", "Nursing"]);
    }

    #[tokio::test]
    async fn added_courses_feed_the_department_list() {
        let store = InMemoryStore::new();
        let service = service(&store, RecordingEmailNotifier::new());
        service.add_course(" BSN ", "Nursing").await.unwrap();
        assert!(service.add_course("BSCS", "  ").await.is_err());
        assert_eq!(service.all_departments().await.unwrap(), vec!["Nursing"]);
    }

    #[tokio::test]
    async fn id_request_decision_updates_user() {
        let store = InMemoryStore::new();
        seed(&store, &[member("x", Role::Alumni, ApprovalStatus::Approved)]).await;
        IdRequestRepository::upsert(store.as_ref(), &IdRequest::new("x".into(), json!({})))
            .await
            .unwrap();
        let service = service(&store, RecordingEmailNotifier::new());

        assert_eq!(service.list_id_requests(ApprovalStatus::Pending).await.unwrap().len(), 1);
        let request = service.approve_id_request("x").await.unwrap();
        assert_eq!(request.status, ApprovalStatus::Approved);
        assert!(request.decided_at.is_some());

        let user = UserRepository::find_by_id(store.as_ref(), "x").await.unwrap().unwrap();
        assert_eq!(user.digital_id_status, Some(ApprovalStatus::Approved));
    }

    #[tokio::test]
    async fn lock_and_unlock() {
        let store = InMemoryStore::new();
        seed(&store, &[member("x", Role::Alumni, ApprovalStatus::Approved)]).await;
        let service = service(&store, RecordingEmailNotifier::new());
        assert!(service.set_locked("x", true).await.unwrap().is_locked);
        assert!(!service.set_locked("x", false).await.unwrap().is_locked);
    }
}
