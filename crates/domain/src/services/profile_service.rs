use crate::entities::{
    group_experiences, Accomplishment, ApprovalStatus, CompanyGroup, Experience, IdRequest,
    ProfileItem, ProfileItemKind, ProfileUpdate, Role, Skill, User,
};
use crate::errors::DomainError;
use crate::repositories::{IdRequestRepository, UserRepository};
use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Member self-service: profile fields, nested lists, connections, ID card.
pub struct ProfileService {
    user_repository: Arc<dyn UserRepository>,
    id_request_repository: Arc<dyn IdRequestRepository>,
}

impl ProfileService {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        id_request_repository: Arc<dyn IdRequestRepository>,
    ) -> Self {
        Self {
            user_repository,
            id_request_repository,
        }
    }

    pub async fn get_profile(&self, uid: &str) -> Result<User, DomainError> {
        self.user_repository
            .find_by_id(uid)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(uid.to_string()))
    }

    /// Applies the fields that were supplied. Role and status are never
    /// touched from here, and a department head's department only moves
    /// through the admin routes.
    pub async fn update_profile(&self, uid: &str, update: ProfileUpdate) -> Result<User, DomainError> {
        let mut user = self.get_profile(uid).await?;
        if update.is_empty() {
            return Ok(user);
        }
        if user.role == Role::DeptHead {
            if let Some(requested) = update.school_department.as_deref() {
                if Some(requested.trim()) != user.department() {
                    warn!(uid = %uid, "department head tried to change their own department");
                    return Err(DomainError::Forbidden(
                        "department heads cannot change their department".to_string(),
                    ));
                }
            }
        }
        update.apply_to(&mut user);
        user.validate()?;
        let saved = self.user_repository.update_profile(&user).await?;
        debug!(uid = %uid, "profile updated");
        Ok(saved)
    }

    pub async fn add_experience(&self, uid: &str, experience: Experience) -> Result<ProfileItem, DomainError> {
        self.add_item(uid, ProfileItem::Experience(experience)).await
    }

    pub async fn add_skill(&self, uid: &str, skill: Skill) -> Result<ProfileItem, DomainError> {
        self.add_item(uid, ProfileItem::Skill(skill)).await
    }

    pub async fn add_accomplishment(
        &self,
        uid: &str,
        accomplishment: Accomplishment,
    ) -> Result<ProfileItem, DomainError> {
        self.add_item(uid, ProfileItem::Accomplishment(accomplishment)).await
    }

    /// Appends one entry. A missing id is generated.
    pub async fn add_item(&self, uid: &str, mut item: ProfileItem) -> Result<ProfileItem, DomainError> {
        item.validate()?;
        if item.id().trim().is_empty() {
            item.set_id(uuid::Uuid::new_v4().to_string());
        }
        self.get_profile(uid).await?;
        self.user_repository.add_profile_item(uid, &item).await?;
        debug!(uid = %uid, kind = %item.kind(), id = item.id(), "profile item added");
        Ok(item)
    }

    pub async fn remove_experience(&self, uid: &str, id: &str) -> Result<(), DomainError> {
        self.remove_item(uid, ProfileItemKind::Experience, id).await
    }

    pub async fn remove_skill(&self, uid: &str, id: &str) -> Result<(), DomainError> {
        self.remove_item(uid, ProfileItemKind::Skill, id).await
    }

    pub async fn remove_accomplishment(&self, uid: &str, id: &str) -> Result<(), DomainError> {
        self.remove_item(uid, ProfileItemKind::Accomplishment, id).await
    }

    /// Removing an entry that is already gone is not an error.
    pub async fn remove_item(&self, uid: &str, kind: ProfileItemKind, id: &str) -> Result<(), DomainError> {
        let removed = self.user_repository.remove_profile_item(uid, kind, id).await?;
        debug!(uid = %uid, kind = %kind, id = %id, removed, "profile item removal");
        Ok(())
    }

    pub async fn grouped_experiences(&self, uid: &str, today: NaiveDate) -> Result<Vec<CompanyGroup>, DomainError> {
        let user = self.get_profile(uid).await?;
        Ok(group_experiences(&user.experiences, today))
    }

    /// Connects two members both ways.
    pub async fn connect(&self, uid: &str, other_uid: &str) -> Result<(), DomainError> {
        if uid == other_uid {
            return Err(DomainError::ValidationError(
                "You cannot connect with yourself".to_string(),
            ));
        }
        self.get_profile(uid).await?;
        self.get_profile(other_uid).await?;
        self.user_repository.add_connection(uid, other_uid).await?;
        info!(uid = %uid, other = %other_uid, "members connected");
        Ok(())
    }

    /// Files or refiles the member's digital ID request. An approved
    /// request stays approved.
    pub async fn submit_id_request(&self, uid: &str, details: Value) -> Result<IdRequest, DomainError> {
        self.get_profile(uid).await?;
        if let Some(existing) = self.id_request_repository.find_by_user(uid).await? {
            if existing.status == ApprovalStatus::Approved {
                return Err(DomainError::ValidationError(
                    "Your digital ID has already been approved".to_string(),
                ));
            }
        }
        let request = self
            .id_request_repository
            .upsert(&IdRequest::new(uid.to_string(), details))
            .await?;
        self.user_repository
            .set_digital_id_status(uid, ApprovalStatus::Pending)
            .await?;
        info!(uid = %uid, "digital ID requested");
        Ok(request)
    }
}
