//! In-memory doubles for the repository and gateway ports.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::entities::*;
use crate::errors::DomainError;
use crate::gateways::*;
use crate::repositories::*;
use crate::services::*;

#[derive(Default)]
pub struct InMemoryStore {
    users: Mutex<HashMap<String, User>>,
    posts: Mutex<Vec<Post>>,
    events: Mutex<Vec<Event>>,
    announcements: Mutex<Vec<Announcement>>,
    notifications: Mutex<Vec<Notification>>,
    id_requests: Mutex<HashMap<String, IdRequest>>,
    courses: Mutex<Vec<Course>>,
    /// When set, every user lookup fails.
    pub fail_user_reads: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn with_user<F>(&self, uid: &str, f: F) -> Result<User, DomainError>
    where
        F: FnOnce(&mut User),
    {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(uid)
            .ok_or_else(|| DomainError::UserNotFound(uid.to_string()))?;
        f(user);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    fn check_reads(&self) -> Result<(), DomainError> {
        if self.fail_user_reads.load(Ordering::SeqCst) {
            return Err(DomainError::RepositoryError("store unavailable".into()));
        }
        Ok(())
    }

    fn users_where<F: Fn(&User) -> bool>(&self, f: F) -> Result<Vec<User>, DomainError> {
        self.check_reads()?;
        let mut found: Vec<User> = self.users.lock().unwrap().values().filter(|u| f(u)).cloned().collect();
        found.sort_by(|a, b| a.uid.cmp(&b.uid));
        Ok(found)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, uid: &str) -> Result<Option<User>, DomainError> {
        self.check_reads()?;
        Ok(self.users.lock().unwrap().get(uid).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        Ok(self.users_where(|u| u.email == email)?.into_iter().next())
    }

    async fn find_all(&self) -> Result<Vec<User>, DomainError> {
        self.users_where(|_| true)
    }

    async fn find_by_status(&self, status: ApprovalStatus) -> Result<Vec<User>, DomainError> {
        self.users_where(|u| u.status == status)
    }

    async fn find_by_role(&self, role: Role) -> Result<Vec<User>, DomainError> {
        self.users_where(|u| u.role == role)
    }

    async fn find_by_department(&self, department: &str) -> Result<Vec<User>, DomainError> {
        self.users_where(|u| u.school_department.as_deref() == Some(department))
    }

    async fn count_all(&self) -> Result<usize, DomainError> {
        Ok(self.users_where(|_| true)?.len())
    }

    async fn count_by_status(&self, status: ApprovalStatus) -> Result<usize, DomainError> {
        Ok(self.users_where(|u| u.status == status)?.len())
    }

    async fn count_by_role(&self, role: Role) -> Result<usize, DomainError> {
        Ok(self.users_where(|u| u.role == role)?.len())
    }

    async fn save(&self, user: &User) -> Result<User, DomainError> {
        self.users.lock().unwrap().insert(user.uid.clone(), user.clone());
        Ok(user.clone())
    }

    async fn update_profile(&self, user: &User) -> Result<User, DomainError> {
        let updated = user.clone();
        self.with_user(&user.uid, move |stored| {
            let role = stored.role;
            let status = stored.status;
            *stored = User { role, status, ..updated };
        })
    }

    async fn set_status(&self, uid: &str, status: ApprovalStatus) -> Result<User, DomainError> {
        self.with_user(uid, |u| u.status = status)
    }

    async fn set_role(&self, uid: &str, role: Role) -> Result<User, DomainError> {
        self.with_user(uid, |u| u.role = role)
    }

    async fn set_department(&self, uid: &str, department: &str) -> Result<User, DomainError> {
        self.with_user(uid, |u| u.school_department = Some(department.to_string()))
    }

    async fn set_role_and_department(
        &self,
        uid: &str,
        role: Role,
        department: &str,
    ) -> Result<User, DomainError> {
        self.with_user(uid, |u| {
            u.role = role;
            u.school_department = Some(department.to_string());
        })
    }

    async fn set_locked(&self, uid: &str, locked: bool) -> Result<User, DomainError> {
        self.with_user(uid, |u| u.is_locked = locked)
    }

    async fn set_digital_id_status(
        &self,
        uid: &str,
        status: ApprovalStatus,
    ) -> Result<User, DomainError> {
        self.with_user(uid, |u| u.digital_id_status = Some(status))
    }

    async fn add_profile_item(&self, uid: &str, item: &ProfileItem) -> Result<(), DomainError> {
        let item = item.clone();
        self.with_user(uid, move |u| match item {
            ProfileItem::Experience(e) => u.experiences.push(e),
            ProfileItem::Skill(s) => u.skills.push(s),
            ProfileItem::Accomplishment(a) => u.accomplishments.push(a),
        })?;
        Ok(())
    }

    async fn remove_profile_item(
        &self,
        uid: &str,
        kind: ProfileItemKind,
        item_id: &str,
    ) -> Result<bool, DomainError> {
        let mut removed = false;
        self.with_user(uid, |u| {
            let before = u.experiences.len() + u.skills.len() + u.accomplishments.len();
            match kind {
                ProfileItemKind::Experience => u.experiences.retain(|e| e.id != item_id),
                ProfileItemKind::Skill => u.skills.retain(|s| s.id != item_id),
                ProfileItemKind::Accomplishment => u.accomplishments.retain(|a| a.id != item_id),
            }
            removed = before != u.experiences.len() + u.skills.len() + u.accomplishments.len();
        })?;
        Ok(removed)
    }

    async fn add_connection(&self, uid: &str, other_uid: &str) -> Result<(), DomainError> {
        let mut users = self.users.lock().unwrap();
        for (a, b) in [(uid, other_uid), (other_uid, uid)] {
            let user = users
                .get_mut(a)
                .ok_or_else(|| DomainError::UserNotFound(a.to_string()))?;
            user.connections.insert(b.to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Post>, DomainError> {
        Ok(self.posts.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Post>, DomainError> {
        let mut posts = self.posts.lock().unwrap().clone();
        posts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(posts)
    }

    async fn find_by_user(&self, uid: &str) -> Result<Vec<Post>, DomainError> {
        let all = PostRepository::find_all(self).await?;
        Ok(all.into_iter().filter(|p| p.user_id == uid).collect())
    }

    async fn save(&self, post: &Post) -> Result<Post, DomainError> {
        self.posts.lock().unwrap().push(post.clone());
        Ok(post.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), DomainError> {
        self.posts.lock().unwrap().retain(|p| p.id != id);
        Ok(())
    }

    async fn add_like(&self, post_id: &str, uid: &str) -> Result<bool, DomainError> {
        let mut posts = self.posts.lock().unwrap();
        let post = posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(|| DomainError::PostNotFound(post_id.to_string()))?;
        Ok(post.liked_by.insert(uid.to_string()))
    }

    async fn remove_like(&self, post_id: &str, uid: &str) -> Result<bool, DomainError> {
        let mut posts = self.posts.lock().unwrap();
        let post = posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(|| DomainError::PostNotFound(post_id.to_string()))?;
        Ok(post.liked_by.remove(uid))
    }

    async fn add_comment(&self, post_id: &str, comment: &Comment) -> Result<(), DomainError> {
        let mut posts = self.posts.lock().unwrap();
        let post = posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(|| DomainError::PostNotFound(post_id.to_string()))?;
        post.comments.push(comment.clone());
        Ok(())
    }

    async fn remove_comment(&self, post_id: &str, comment_id: &str) -> Result<bool, DomainError> {
        let mut posts = self.posts.lock().unwrap();
        let post = posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(|| DomainError::PostNotFound(post_id.to_string()))?;
        let before = post.comments.len();
        post.comments.retain(|c| c.id != comment_id);
        Ok(before != post.comments.len())
    }
}

#[async_trait]
impl EventRepository for InMemoryStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Event>, DomainError> {
        Ok(self.events.lock().unwrap().iter().find(|e| e.id == id).cloned())
    }

    async fn find_global(&self) -> Result<Vec<Event>, DomainError> {
        let mut events: Vec<Event> = self.events.lock().unwrap().iter().filter(|e| e.is_global()).cloned().collect();
        events.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(events)
    }

    async fn find_by_department(&self, department: &str) -> Result<Vec<Event>, DomainError> {
        let mut events: Vec<Event> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.scope.department() == Some(department))
            .cloned()
            .collect();
        events.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(events)
    }

    async fn save(&self, event: &Event) -> Result<Event, DomainError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(event.clone())
    }

    async fn add_attendee(&self, event_id: &str, uid: &str) -> Result<bool, DomainError> {
        let mut events = self.events.lock().unwrap();
        let event = events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or_else(|| DomainError::EventNotFound(event_id.to_string()))?;
        if event.attendees.contains(uid) {
            return Ok(false);
        }
        if event.is_full() {
            return Err(DomainError::EventFull(event_id.to_string()));
        }
        Ok(event.attendees.insert(uid.to_string()))
    }

    async fn remove_attendee(&self, event_id: &str, uid: &str) -> Result<bool, DomainError> {
        let mut events = self.events.lock().unwrap();
        let event = events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or_else(|| DomainError::EventNotFound(event_id.to_string()))?;
        Ok(event.attendees.remove(uid))
    }
}

#[async_trait]
impl AnnouncementRepository for InMemoryStore {
    async fn save(&self, announcement: &Announcement) -> Result<Announcement, DomainError> {
        self.announcements.lock().unwrap().push(announcement.clone());
        Ok(announcement.clone())
    }

    async fn find_all(&self) -> Result<Vec<Announcement>, DomainError> {
        let mut all = self.announcements.lock().unwrap().clone();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }
}

#[async_trait]
impl NotificationRepository for InMemoryStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Notification>, DomainError> {
        Ok(self.notifications.lock().unwrap().iter().find(|n| n.id == id).cloned())
    }

    async fn find_by_user(&self, uid: &str) -> Result<Vec<Notification>, DomainError> {
        let mut found: Vec<Notification> = self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.user_id == uid)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(found)
    }

    async fn save(&self, notification: &Notification) -> Result<Notification, DomainError> {
        self.notifications.lock().unwrap().push(notification.clone());
        Ok(notification.clone())
    }

    async fn save_batch(&self, notifications: &[Notification]) -> Result<(), DomainError> {
        self.notifications.lock().unwrap().extend_from_slice(notifications);
        Ok(())
    }

    async fn mark_read(&self, id: &str) -> Result<(), DomainError> {
        let mut all = self.notifications.lock().unwrap();
        let n = all
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| DomainError::NotificationNotFound(id.to_string()))?;
        n.read = true;
        Ok(())
    }

    async fn mark_all_read(&self, uid: &str) -> Result<usize, DomainError> {
        let mut changed = 0;
        for n in self.notifications.lock().unwrap().iter_mut() {
            if n.user_id == uid && !n.read {
                n.read = true;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn delete(&self, id: &str) -> Result<(), DomainError> {
        self.notifications.lock().unwrap().retain(|n| n.id != id);
        Ok(())
    }

    async fn count_unread(&self, uid: &str) -> Result<usize, DomainError> {
        Ok(self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.user_id == uid && !n.read)
            .count())
    }
}

#[async_trait]
impl IdRequestRepository for InMemoryStore {
    async fn find_by_user(&self, uid: &str) -> Result<Option<IdRequest>, DomainError> {
        Ok(self.id_requests.lock().unwrap().get(uid).cloned())
    }

    async fn find_by_status(&self, status: ApprovalStatus) -> Result<Vec<IdRequest>, DomainError> {
        Ok(self
            .id_requests
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect())
    }

    async fn upsert(&self, request: &IdRequest) -> Result<IdRequest, DomainError> {
        self.id_requests
            .lock()
            .unwrap()
            .insert(request.user_id.clone(), request.clone());
        Ok(request.clone())
    }

    async fn set_status(
        &self,
        uid: &str,
        status: ApprovalStatus,
    ) -> Result<IdRequest, DomainError> {
        let mut all = self.id_requests.lock().unwrap();
        let request = all
            .get_mut(uid)
            .ok_or_else(|| DomainError::IdRequestNotFound(uid.to_string()))?;
        request.status = status;
        request.decided_at = Some(Utc::now());
        Ok(request.clone())
    }
}

#[async_trait]
impl CourseRepository for InMemoryStore {
    async fn find_all(&self) -> Result<Vec<Course>, DomainError> {
        Ok(self.courses.lock().unwrap().clone())
    }

    async fn save(&self, course: &Course) -> Result<Course, DomainError> {
        self.courses.lock().unwrap().push(course.clone());
        Ok(course.clone())
    }
}

/// Identity double: passwords are stored in clear, tokens are counters.
#[derive(Default)]
pub struct FakeIdentityProvider {
    accounts: Mutex<HashMap<String, (String, AuthIdentity)>>,
    sessions: Mutex<HashMap<String, AuthIdentity>>,
    next_token: AtomicUsize,
}

impl FakeIdentityProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<AuthIdentity, DomainError> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(email) {
            return Err(DomainError::EmailAlreadyExists(email.to_string()));
        }
        let identity = AuthIdentity {
            uid: format!("uid-{}", accounts.len() + 1),
            email: email.to_string(),
            display_name: display_name.to_string(),
        };
        accounts.insert(email.to_string(), (password.to_string(), identity.clone()));
        Ok(identity)
    }

    async fn verify_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<AuthIdentity>, DomainError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .get(email)
            .filter(|(stored, _)| stored == password)
            .map(|(_, identity)| identity.clone()))
    }

    async fn issue_session(&self, identity: &AuthIdentity) -> Result<String, DomainError> {
        let token = format!("token-{}", self.next_token.fetch_add(1, Ordering::SeqCst));
        self.sessions
            .lock()
            .unwrap()
            .insert(token.clone(), identity.clone());
        Ok(token)
    }

    async fn resolve_session(&self, token: &str) -> Result<Option<AuthIdentity>, DomainError> {
        Ok(self.sessions.lock().unwrap().get(token).cloned())
    }

    async fn revoke_session(&self, token: &str) -> Result<(), DomainError> {
        self.sessions.lock().unwrap().remove(token);
        Ok(())
    }
}

/// Records every email request; optionally fails them all.
#[derive(Default)]
pub struct RecordingEmailNotifier {
    pub approvals: Mutex<Vec<ApprovalEmail>>,
    pub rejections: Mutex<Vec<RejectionEmail>>,
    pub fail: AtomicBool,
}

impl RecordingEmailNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let notifier = Self::default();
        notifier.fail.store(true, Ordering::SeqCst);
        Arc::new(notifier)
    }

    fn outcome(&self) -> Result<EmailReceipt, DomainError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DomainError::EmailDeliveryError("smtp unreachable".into()));
        }
        Ok(EmailReceipt {
            success: true,
            message: "sent".into(),
        })
    }
}

#[async_trait]
impl EmailNotifier for RecordingEmailNotifier {
    async fn send_approval_email(
        &self,
        email: &ApprovalEmail,
    ) -> Result<EmailReceipt, DomainError> {
        self.approvals.lock().unwrap().push(email.clone());
        self.outcome()
    }

    async fn send_rejection_email(
        &self,
        email: &RejectionEmail,
    ) -> Result<EmailReceipt, DomainError> {
        self.rejections.lock().unwrap().push(email.clone());
        self.outcome()
    }
}

pub fn member(uid: &str, role: Role, status: ApprovalStatus) -> User {
    let mut user = User::new_registration(
        uid.to_string(),
        format!("{}@example.com", uid),
        RegistrationDetails {
            first_name: uid.to_uppercase(),
            last_name: "Tester".to_string(),
            ..RegistrationDetails::default()
        },
    );
    user.role = role;
    user.status = status;
    if role == Role::DeptHead {
        user.school_department = Some("Engineering".to_string());
    }
    user
}

pub async fn seed(store: &InMemoryStore, users: &[User]) {
    for user in users {
        UserRepository::save(store, user).await.unwrap();
    }
}

pub fn notification_service(store: &Arc<InMemoryStore>) -> Arc<NotificationService> {
    Arc::new(NotificationService::new(store.clone()))
}
