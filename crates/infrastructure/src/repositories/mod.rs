pub mod sqlite_announcement_repository;
pub mod sqlite_course_repository;
pub mod sqlite_event_repository;
pub mod sqlite_id_request_repository;
pub mod sqlite_notification_repository;
pub mod sqlite_post_repository;
pub mod sqlite_user_repository;

pub use sqlite_announcement_repository::SqliteAnnouncementRepository;
pub use sqlite_course_repository::SqliteCourseRepository;
pub use sqlite_event_repository::SqliteEventRepository;
pub use sqlite_id_request_repository::SqliteIdRequestRepository;
pub use sqlite_notification_repository::SqliteNotificationRepository;
pub use sqlite_post_repository::SqlitePostRepository;
pub use sqlite_user_repository::SqliteUserRepository;
