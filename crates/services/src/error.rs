//! Shared error types for the services crate.

use thiserror::Error;

use course_core::model::{BatchError, CourseError, CourseId, QuizError, SubmissionError};
use course_core::progress::PolicyViolation;
use storage::http::HttpInitError;
use storage::repository::StorageError;

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error(transparent)]
    PolicyViolation(#[from] PolicyViolation),
    /// The write was not acknowledged; local state is unconfirmed.
    #[error("progress could not be saved: {0}")]
    Persistence(#[source] StorageError),
    /// The enrollment changed since it was read; re-fetch before retrying.
    #[error("enrollment was updated concurrently")]
    Conflict,
    #[error("course {0} not found")]
    CourseNotFound(CourseId),
    #[error("not enrolled in course {0}")]
    NotEnrolled(CourseId),
    #[error("lesson {lesson} does not exist (course has {count} lessons)")]
    LessonOutOfRange { lesson: usize, count: usize },
}

impl From<StorageError> for ProgressError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict => ProgressError::Conflict,
            other => ProgressError::Persistence(other),
        }
    }
}

/// Errors emitted by `SubmissionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubmissionServiceError {
    #[error(transparent)]
    Invalid(#[from] SubmissionError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    /// The submission itself was rejected; no token was recorded.
    #[error("submission could not be sent: {0}")]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `DashboardService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DashboardError {
    #[error("could not load enrollments: {0}")]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AdminService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AdminError {
    #[error("admin role required")]
    Forbidden,
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    Batch(#[from] BatchError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Http(#[from] HttpInitError),
    #[error("missing session: set {0}")]
    MissingSession(&'static str),
}
