use crate::entities::Course;
use crate::errors::DomainError;
use async_trait::async_trait;

#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Course>, DomainError>;
    async fn save(&self, course: &Course) -> Result<Course, DomainError>;
}
