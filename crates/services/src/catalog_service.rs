use std::sync::Arc;

use course_core::model::{Course, CourseId};
use storage::repository::CourseRepository;

use crate::error::CatalogError;

/// Read-only access to the public course catalog.
#[derive(Clone)]
pub struct CatalogService {
    courses: Arc<dyn CourseRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(courses: Arc<dyn CourseRepository>) -> Self {
        Self { courses }
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if the catalog cannot be read.
    pub async fn list_courses(&self) -> Result<Vec<Course>, CatalogError> {
        Ok(self.courses.list_courses().await?)
    }

    /// Fetch a course by ID.
    ///
    /// Returns `Ok(None)` when the course does not exist.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if repository access fails.
    pub async fn get_course(&self, id: &CourseId) -> Result<Option<Course>, CatalogError> {
        Ok(self.courses.get_course(id).await?)
    }
}
