use std::sync::Arc;

use course_core::model::{
    AssignmentRecord, Batch, BatchDraft, Course, CourseDraft, CourseId, Enrollment,
    EnrollmentStat, SessionContext,
};
use storage::repository::{
    BatchRepository, CourseRepository, EnrollmentRepository, SubmissionRepository,
};
use tracing::info;

use crate::error::AdminError;

/// Back-office operations. Every call requires an admin session.
#[derive(Clone)]
pub struct AdminService {
    session: SessionContext,
    courses: Arc<dyn CourseRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    submissions: Arc<dyn SubmissionRepository>,
    batches: Arc<dyn BatchRepository>,
}

impl AdminService {
    #[must_use]
    pub fn new(
        session: SessionContext,
        courses: Arc<dyn CourseRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        submissions: Arc<dyn SubmissionRepository>,
        batches: Arc<dyn BatchRepository>,
    ) -> Self {
        Self {
            session,
            courses,
            enrollments,
            submissions,
            batches,
        }
    }

    fn authorize(&self) -> Result<&SessionContext, AdminError> {
        if self.session.is_admin() {
            Ok(&self.session)
        } else {
            Err(AdminError::Forbidden)
        }
    }

    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` for non-admins or `AdminError::Storage`.
    pub async fn list_courses(&self) -> Result<Vec<Course>, AdminError> {
        self.authorize()?;
        Ok(self.courses.list_courses().await?)
    }

    /// Validate and create a course.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Forbidden`, `AdminError::Course` for an invalid
    /// draft, or `AdminError::Storage`.
    pub async fn create_course(&self, draft: CourseDraft) -> Result<Course, AdminError> {
        let session = self.authorize()?;
        let draft = draft.validate()?;
        let course = self.courses.create_course(session, &draft).await?;
        info!(course = %course.id(), title = course.title(), "course created");
        Ok(course)
    }

    /// # Errors
    ///
    /// Returns `AdminError::Forbidden`, `AdminError::Course` for an invalid
    /// draft, or `AdminError::Storage` (including `NotFound`).
    pub async fn update_course(
        &self,
        id: &CourseId,
        draft: CourseDraft,
    ) -> Result<Course, AdminError> {
        let session = self.authorize()?;
        let draft = draft.validate()?;
        let course = self.courses.update_course(session, id, &draft).await?;
        info!(course = %id, "course updated");
        Ok(course)
    }

    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` or `AdminError::Storage`.
    pub async fn delete_course(&self, id: &CourseId) -> Result<(), AdminError> {
        let session = self.authorize()?;
        self.courses.delete_course(session, id).await?;
        info!(course = %id, "course deleted");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` or `AdminError::Storage`.
    pub async fn course_enrollments(&self, id: &CourseId) -> Result<Vec<Enrollment>, AdminError> {
        let session = self.authorize()?;
        Ok(self.enrollments.list_course_enrollments(session, id).await?)
    }

    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` or `AdminError::Storage`.
    pub async fn course_assignments(
        &self,
        id: &CourseId,
    ) -> Result<Vec<AssignmentRecord>, AdminError> {
        let session = self.authorize()?;
        Ok(self.submissions.list_assignments(session, id).await?)
    }

    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` or `AdminError::Storage`.
    pub async fn list_batches(&self, id: &CourseId) -> Result<Vec<Batch>, AdminError> {
        let session = self.authorize()?;
        Ok(self.batches.list_batches(session, id).await?)
    }

    /// # Errors
    ///
    /// Returns `AdminError::Forbidden`, `AdminError::Batch` for an invalid
    /// draft, or `AdminError::Storage`.
    pub async fn create_batch(&self, id: &CourseId, draft: BatchDraft) -> Result<Batch, AdminError> {
        let session = self.authorize()?;
        let draft = draft.validate()?;
        let batch = self.batches.create_batch(session, id, &draft).await?;
        info!(course = %id, batch = %batch.id, "batch created");
        Ok(batch)
    }

    /// # Errors
    ///
    /// Returns `AdminError::Forbidden` or `AdminError::Storage`.
    pub async fn enrollment_stats(&self) -> Result<Vec<EnrollmentStat>, AdminError> {
        let session = self.authorize()?;
        Ok(self.enrollments.enrollment_stats(session).await?)
    }
}
