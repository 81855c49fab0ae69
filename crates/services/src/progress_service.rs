use std::sync::Arc;

use course_core::model::{Course, CourseId, Enrollment, SessionContext};
use course_core::progress::{
    self, CompletionSet, CompletionToken, NextAction, Permission, Task, compute_progress,
};
use storage::repository::{CourseRepository, EnrollmentRepository, ProgressUpdate};
use tracing::{debug, info, warn};

use crate::error::ProgressError;

/// Result of recording a task completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The token was new and the backend acknowledged the write.
    Recorded(Enrollment),
    /// The token was already present; nothing was written.
    AlreadyCompleted(Enrollment),
}

impl CompletionOutcome {
    #[must_use]
    pub fn enrollment(&self) -> &Enrollment {
        match self {
            CompletionOutcome::Recorded(e) | CompletionOutcome::AlreadyCompleted(e) => e,
        }
    }

    #[must_use]
    pub fn was_recorded(&self) -> bool {
        matches!(self, CompletionOutcome::Recorded(_))
    }
}

/// Single authority for lesson unlocking and enrollment progress writes.
///
/// Every mutating call performs at most one write, as its last await. Dropping
/// the future before that write resolves leaves nothing committed locally; the
/// next read reconciles with whatever the backend stored.
#[derive(Clone)]
pub struct ProgressService {
    session: SessionContext,
    courses: Arc<dyn CourseRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    max_conflict_retries: u32,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        session: SessionContext,
        courses: Arc<dyn CourseRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
    ) -> Self {
        Self {
            session,
            courses,
            enrollments,
            max_conflict_retries: 1,
        }
    }

    #[must_use]
    pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    #[must_use]
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Fetch the course and the signed-in user's enrollment in it.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::CourseNotFound` / `NotEnrolled` when either is
    /// missing, or `ProgressError::Persistence` if the backend cannot be read.
    pub async fn load(&self, course_id: &CourseId) -> Result<(Course, Enrollment), ProgressError> {
        let course = self
            .courses
            .get_course(course_id)
            .await?
            .ok_or_else(|| ProgressError::CourseNotFound(course_id.clone()))?;
        let enrollment = self
            .enrollments
            .get_enrollment(&self.session, course_id)
            .await?
            .ok_or_else(|| ProgressError::NotEnrolled(course_id.clone()))?;
        Ok((course, enrollment))
    }

    /// The task the student should do next in `course_id`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the course or enrollment cannot be loaded.
    pub async fn next_action(&self, course_id: &CourseId) -> Result<NextAction, ProgressError> {
        let (course, enrollment) = self.load(course_id).await?;
        Ok(progress::next_action(&course, enrollment.completed()))
    }

    /// Validate an attempted task without writing anything.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::LessonOutOfRange` for an unknown lesson or
    /// `ProgressError::PolicyViolation` when the prerequisite is missing.
    pub fn check(
        &self,
        enrollment: &Enrollment,
        course: &Course,
        lesson: usize,
        task: Task,
    ) -> Result<Permission, ProgressError> {
        let count = course.lesson_count();
        if lesson >= count {
            return Err(ProgressError::LessonOutOfRange { lesson, count });
        }
        Ok(progress::check(task, lesson, enrollment.completed())?)
    }

    /// Record `task` on `lesson`, recompute progress, and persist both.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::PolicyViolation` (no write issued),
    /// `ProgressError::Conflict` if the enrollment changed since it was read,
    /// or `ProgressError::Persistence` if the write failed.
    pub async fn record_completion(
        &self,
        enrollment: &Enrollment,
        course: &Course,
        lesson: usize,
        task: Task,
    ) -> Result<CompletionOutcome, ProgressError> {
        if self.check(enrollment, course, lesson, task)? == Permission::AlreadyCompleted {
            debug!(course = %course.id(), lesson, %task, "task already completed, skipping write");
            return Ok(CompletionOutcome::AlreadyCompleted(enrollment.clone()));
        }

        let completed = enrollment
            .completed()
            .clone()
            .with(CompletionToken::new(lesson, task));
        let saved = self.persist(enrollment, course, completed).await?;
        info!(
            course = %course.id(),
            lesson,
            %task,
            progress = saved.progress(),
            "recorded task completion"
        );
        Ok(CompletionOutcome::Recorded(saved))
    }

    /// Load, record, and on a concurrent update re-fetch and recompute.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Conflict` once retries are exhausted, plus every
    /// error of [`Self::load`] and [`Self::record_completion`].
    pub async fn record_for_course(
        &self,
        course_id: &CourseId,
        lesson: usize,
        task: Task,
    ) -> Result<CompletionOutcome, ProgressError> {
        let (course, enrollment) = self.load(course_id).await?;
        self.record_with_retry(course, enrollment, lesson, task).await
    }

    /// Like [`Self::record_for_course`], starting from already loaded state.
    pub(crate) async fn record_with_retry(
        &self,
        mut course: Course,
        mut enrollment: Enrollment,
        lesson: usize,
        task: Task,
    ) -> Result<CompletionOutcome, ProgressError> {
        let mut attempt = 0;
        loop {
            match self
                .record_completion(&enrollment, &course, lesson, task)
                .await
            {
                Err(ProgressError::Conflict) if attempt < self.max_conflict_retries => {
                    attempt += 1;
                    warn!(
                        course = %course.id(),
                        lesson,
                        %task,
                        attempt,
                        "enrollment changed concurrently, retrying"
                    );
                    let course_id = course.id().clone();
                    (course, enrollment) = self.load(&course_id).await?;
                }
                other => return other,
            }
        }
    }

    /// Mark every lesson × task complete in one write, forcing 100%.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if loading or the write fails.
    pub async fn force_complete_all(
        &self,
        course_id: &CourseId,
    ) -> Result<Enrollment, ProgressError> {
        let (course, enrollment) = self.load(course_id).await?;
        let all = progress::force_complete_all(&course);
        if enrollment.completed().is_superset(&all) && enrollment.is_complete() {
            debug!(%course_id, "enrollment already complete, skipping write");
            return Ok(enrollment);
        }

        let completed: CompletionSet = enrollment.completed().iter().chain(all.iter()).collect();
        let saved = self.persist(&enrollment, &course, completed).await?;
        info!(%course_id, tokens = saved.completed().len(), "forced enrollment to complete");
        Ok(saved)
    }

    async fn persist(
        &self,
        enrollment: &Enrollment,
        course: &Course,
        completed: CompletionSet,
    ) -> Result<Enrollment, ProgressError> {
        let update = ProgressUpdate {
            progress: compute_progress(&completed, course),
            completed,
            expected_version: enrollment.version().map(str::to_owned),
        };
        self.enrollments
            .update_progress(&self.session, course.id(), &update)
            .await
            .map_err(|e| {
                warn!(course = %course.id(), error = %e, "progress write failed");
                ProgressError::from(e)
            })
    }
}
