use chrono::NaiveDate;

use crate::model::ids::{CourseId, EnrollmentId, UserId};
use crate::progress::CompletionSet;

/// One student's enrollment in one course.
///
/// `version` is the backend's concurrency tag (ETag) when it provides one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrollment {
    id: EnrollmentId,
    course_id: CourseId,
    user_id: Option<UserId>,
    progress: u8,
    completed: CompletionSet,
    version: Option<String>,
}

impl Enrollment {
    /// A fresh enrollment with no completed tasks.
    #[must_use]
    pub fn new(id: EnrollmentId, course_id: CourseId) -> Self {
        Self {
            id,
            course_id,
            user_id: None,
            progress: 0,
            completed: CompletionSet::new(),
            version: None,
        }
    }

    /// Rehydrate from a backend record; progress above 100 is capped.
    #[must_use]
    pub fn from_persisted(
        id: EnrollmentId,
        course_id: CourseId,
        user_id: Option<UserId>,
        progress: u8,
        completed: CompletionSet,
        version: Option<String>,
    ) -> Self {
        Self {
            id,
            course_id,
            user_id,
            progress: progress.min(100),
            completed,
            version,
        }
    }

    /// Same enrollment with new completion state, as acknowledged by the backend.
    #[must_use]
    pub fn with_progress(
        &self,
        completed: CompletionSet,
        progress: u8,
        version: Option<String>,
    ) -> Self {
        Self {
            completed,
            progress: progress.min(100),
            version,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    #[must_use]
    pub fn id(&self) -> &EnrollmentId {
        &self.id
    }

    #[must_use]
    pub fn course_id(&self) -> &CourseId {
        &self.course_id
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    #[must_use]
    pub fn progress(&self) -> u8 {
        self.progress
    }

    #[must_use]
    pub fn completed(&self) -> &CompletionSet {
        &self.completed
    }

    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.progress == 100
    }
}

/// Number of enrollments created in one reporting period (a day).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrollmentStat {
    pub period: NaiveDate,
    pub count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{CompletionToken, Task};

    #[test]
    fn new_enrollment_is_empty() {
        let enrollment = Enrollment::new(EnrollmentId::new("e1"), CourseId::new("c1"));
        assert_eq!(enrollment.progress(), 0);
        assert!(enrollment.completed().is_empty());
        assert!(!enrollment.is_complete());
    }

    #[test]
    fn persisted_progress_is_capped() {
        let enrollment = Enrollment::from_persisted(
            EnrollmentId::new("e1"),
            CourseId::new("c1"),
            None,
            250,
            CompletionSet::new(),
            None,
        );
        assert_eq!(enrollment.progress(), 100);
    }

    #[test]
    fn with_progress_keeps_identity() {
        let enrollment = Enrollment::new(EnrollmentId::new("e1"), CourseId::new("c1"))
            .with_user(UserId::new("u1"));
        let updated = enrollment.with_progress(
            CompletionSet::new().with(CompletionToken::new(0, Task::Video)),
            33,
            Some("v2".into()),
        );
        assert_eq!(updated.id(), enrollment.id());
        assert_eq!(updated.user_id(), Some(&UserId::new("u1")));
        assert_eq!(updated.progress(), 33);
        assert_eq!(updated.version(), Some("v2"));
    }
}
