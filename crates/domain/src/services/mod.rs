pub mod announcement_service;
pub mod approval_service;
pub mod auth_service;
pub mod directory_service;
pub mod event_service;
pub mod feed_service;
pub mod notification_service;
pub mod profile_service;
pub mod route_guard;

pub use announcement_service::AnnouncementService;
pub use approval_service::{AnalyticsSummary, ApprovalService, DepartmentCount};
pub use auth_service::{AuthService, LoginThrottle, MIN_PASSWORD_LEN};
pub use directory_service::DirectoryService;
pub use event_service::EventService;
pub use feed_service::{filter_visible, is_visible_to, FeedService, NewPost};
pub use notification_service::NotificationService;
pub use profile_service::ProfileService;
pub use route_guard::{GuardDecision, GuardPolicy, RouteGuard};
