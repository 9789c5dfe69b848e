use crate::entities::{ApprovalStatus, User};
use crate::errors::DomainError;
use crate::repositories::UserRepository;
use std::sync::Arc;

/// Alumni directory over approved members.
pub struct DirectoryService {
    user_repository: Arc<dyn UserRepository>,
}

impl DirectoryService {
    pub fn new(user_repository: Arc<dyn UserRepository>) -> Self {
        Self { user_repository }
    }

    /// `department` must match exactly; `query` is a case-insensitive
    /// substring of first name, last name, email or course.
    pub async fn search_alumni(
        &self,
        department: Option<&str>,
        query: Option<&str>,
    ) -> Result<Vec<User>, DomainError> {
        let department = department.map(str::trim).filter(|d| !d.is_empty());
        let query = query
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());

        let approved = self
            .user_repository
            .find_by_status(ApprovalStatus::Approved)
            .await?;
        Ok(approved
            .into_iter()
            .filter(|u| !u.is_locked)
            .filter(|u| department.map_or(true, |d| u.department() == Some(d)))
            .filter(|u| query.as_deref().map_or(true, |q| matches_query(u, q)))
            .collect())
    }
}

fn matches_query(user: &User, needle: &str) -> bool {
    [
        Some(user.first_name.as_str()),
        Some(user.last_name.as_str()),
        Some(user.email.as_str()),
        user.course.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Role;
    use crate::test_support::*;

    async fn service() -> DirectoryService {
        let store = InMemoryStore::new();
        let mut ana = member("ana", Role::Alumni, ApprovalStatus::Approved);
        ana.school_department = Some("Nursing".into());
        ana.course = Some("BS Nursing".into());
        let mut ben = member("ben", Role::Alumni, ApprovalStatus::Approved);
        ben.school_department = Some("Engineering".into());
        ben.course = Some("BS Computer Science".into());
        let pending = member("cara", Role::Alumni, ApprovalStatus::Pending);
        seed(&store, &[ana, ben, pending]).await;
        DirectoryService::new(store)
    }

    fn uids(users: Vec<User>) -> Vec<String> {
        users.into_iter().map(|u| u.uid).collect()
    }

    #[tokio::test]
    async fn only_approved_members_are_listed() {
        let service = service().await;
        assert_eq!(uids(service.search_alumni(None, None).await.unwrap()), vec!["ana", "ben"]);
    }

    #[tokio::test]
    async fn department_and_query_filters_combine() {
        let service = service().await;
        assert_eq!(
            uids(service.search_alumni(Some("Nursing"), None).await.unwrap()),
            vec!["ana"]
        );
        assert_eq!(
            uids(service.search_alumni(None, Some("computer")).await.unwrap()),
            vec!["ben"]
        );
        assert_eq!(
            uids(service.search_alumni(None, Some("BEN@EXAMPLE")).await.unwrap()),
            vec!["ben"]
        );
        assert!(service
            .search_alumni(Some("Nursing"), Some("computer"))
            .await
            .unwrap()
            .is_empty());
    }
}
