pub mod announcement_repository;
pub mod course_repository;
pub mod event_repository;
pub mod id_request_repository;
pub mod notification_repository;
pub mod post_repository;
pub mod user_repository;

pub use announcement_repository::AnnouncementRepository;
pub use course_repository::CourseRepository;
pub use event_repository::EventRepository;
pub use id_request_repository::IdRequestRepository;
pub use notification_repository::NotificationRepository;
pub use post_repository::PostRepository;
pub use user_repository::UserRepository;
