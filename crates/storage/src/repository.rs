use async_trait::async_trait;
use course_core::model::{
    AssignmentRecord, AssignmentSubmission, Batch, BatchDraft, BatchId, Course, CourseDraft,
    CourseId, Enrollment, EnrollmentId, EnrollmentStat, LessonOutline, QuizSubmission,
    SessionContext, UserId,
};
use course_core::progress::CompletionSet;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("unauthorized")]
    Unauthorized,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("backend responded with status {0}")]
    Status(u16),
}

/// Full replacement of an enrollment's completion state.
///
/// The backend stores exactly what is sent; there is no delta form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub progress: u8,
    pub completed: CompletionSet,
    /// Version the update was computed from; `None` means last write wins.
    pub expected_version: Option<String>,
}

/// Read access to the catalog plus admin edits.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// List every published course.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the catalog cannot be read.
    async fn list_courses(&self) -> Result<Vec<Course>, StorageError>;

    /// Fetch a course by ID. Returns `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for transport or decoding failures.
    async fn get_course(&self, id: &CourseId) -> Result<Option<Course>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the course cannot be stored.
    async fn create_course(
        &self,
        session: &SessionContext,
        draft: &CourseDraft,
    ) -> Result<Course, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn update_course(
        &self,
        session: &SessionContext,
        id: &CourseId,
        draft: &CourseDraft,
    ) -> Result<Course, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn delete_course(&self, session: &SessionContext, id: &CourseId)
    -> Result<(), StorageError>;
}

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// Enrollments of the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the enrollments cannot be read.
    async fn list_enrollments(
        &self,
        session: &SessionContext,
    ) -> Result<Vec<Enrollment>, StorageError>;

    /// The signed-in user's enrollment in `course_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the enrollments cannot be read.
    async fn get_enrollment(
        &self,
        session: &SessionContext,
        course_id: &CourseId,
    ) -> Result<Option<Enrollment>, StorageError> {
        let enrollments = self.list_enrollments(session).await?;
        Ok(enrollments
            .into_iter()
            .find(|e| e.course_id() == course_id))
    }

    /// Replace the completion state of the user's enrollment in `course_id`.
    ///
    /// Returns the enrollment as acknowledged by the backend.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if `expected_version` is stale,
    /// `StorageError::NotFound` if the user is not enrolled, or other storage errors.
    async fn update_progress(
        &self,
        session: &SessionContext,
        course_id: &CourseId,
        update: &ProgressUpdate,
    ) -> Result<Enrollment, StorageError>;

    /// All enrollments of a course (admin).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the enrollments cannot be read.
    async fn list_course_enrollments(
        &self,
        session: &SessionContext,
        course_id: &CourseId,
    ) -> Result<Vec<Enrollment>, StorageError>;

    /// New enrollments per day (admin).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the stats cannot be read.
    async fn enrollment_stats(
        &self,
        session: &SessionContext,
    ) -> Result<Vec<EnrollmentStat>, StorageError>;
}

#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the submission is not accepted.
    async fn submit_assignment(
        &self,
        session: &SessionContext,
        submission: &AssignmentSubmission,
    ) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the submission is not accepted.
    async fn submit_quiz(
        &self,
        session: &SessionContext,
        submission: &QuizSubmission,
    ) -> Result<(), StorageError>;

    /// Assignments submitted for a course (admin).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the assignments cannot be read.
    async fn list_assignments(
        &self,
        session: &SessionContext,
        course_id: &CourseId,
    ) -> Result<Vec<AssignmentRecord>, StorageError>;
}

#[async_trait]
pub trait BatchRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the batches cannot be read.
    async fn list_batches(
        &self,
        session: &SessionContext,
        course_id: &CourseId,
    ) -> Result<Vec<Batch>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the batch cannot be stored.
    async fn create_batch(
        &self,
        session: &SessionContext,
        course_id: &CourseId,
        draft: &BatchDraft,
    ) -> Result<Batch, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone)]
struct StoredEnrollment {
    enrollment: Enrollment,
    revision: u64,
}

/// Simple in-memory backend for testing and prototyping.
///
/// Every progress write bumps a revision that is exposed as the enrollment
/// version, so stale `expected_version`s are rejected like a real `If-Match`.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    courses: Arc<Mutex<BTreeMap<CourseId, Course>>>,
    enrollments: Arc<Mutex<HashMap<(UserId, CourseId), StoredEnrollment>>>,
    assignments: Arc<Mutex<Vec<(UserId, AssignmentSubmission)>>>,
    quizzes: Arc<Mutex<Vec<(UserId, QuizSubmission)>>>,
    batches: Arc<Mutex<Vec<Batch>>>,
    stats: Arc<Mutex<Vec<EnrollmentStat>>>,
    next_id: Arc<AtomicU64>,
    progress_writes: Arc<AtomicUsize>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|e| StorageError::Connection(e.to_string()))
}

fn version_tag(revision: u64) -> String {
    format!("r{revision}")
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Add or replace a catalog course.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the store is poisoned.
    pub fn insert_course(&self, course: Course) -> Result<(), StorageError> {
        lock(&self.courses)?.insert(course.id().clone(), course);
        Ok(())
    }

    /// Enroll `user` in `course_id` with an empty token set.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the store is poisoned.
    pub fn enroll(&self, user: &UserId, course_id: &CourseId) -> Result<Enrollment, StorageError> {
        let id = EnrollmentId::new(format!("enr-{}", self.allocate_id()));
        let enrollment = Enrollment::new(id, course_id.clone()).with_user(user.clone());
        self.put_enrollment(user, enrollment)
    }

    /// Store an enrollment as-is, resetting its revision.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the store is poisoned.
    pub fn put_enrollment(
        &self,
        user: &UserId,
        enrollment: Enrollment,
    ) -> Result<Enrollment, StorageError> {
        let enrollment = enrollment.with_progress(
            enrollment.completed().clone(),
            enrollment.progress(),
            Some(version_tag(0)),
        );
        lock(&self.enrollments)?.insert(
            (user.clone(), enrollment.course_id().clone()),
            StoredEnrollment {
                enrollment: enrollment.clone(),
                revision: 0,
            },
        );
        Ok(enrollment)
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the store is poisoned.
    pub fn set_enrollment_stats(&self, stats: Vec<EnrollmentStat>) -> Result<(), StorageError> {
        *lock(&self.stats)? = stats;
        Ok(())
    }

    /// Number of acknowledged progress writes.
    #[must_use]
    pub fn progress_writes(&self) -> usize {
        self.progress_writes.load(Ordering::Relaxed)
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the store is poisoned.
    pub fn submitted_assignments(&self) -> Result<Vec<AssignmentSubmission>, StorageError> {
        Ok(lock(&self.assignments)?
            .iter()
            .map(|(_, s)| s.clone())
            .collect())
    }

    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the store is poisoned.
    pub fn submitted_quizzes(&self) -> Result<Vec<QuizSubmission>, StorageError> {
        Ok(lock(&self.quizzes)?.iter().map(|(_, s)| s.clone()).collect())
    }

    fn course_from_draft(id: CourseId, draft: &CourseDraft) -> Course {
        Course::from_persisted(
            id,
            draft.title.clone(),
            draft.description.clone(),
            draft.instructor.clone(),
            draft.price,
            &LessonOutline::from_syllabus(draft.syllabus.iter().cloned()),
        )
    }
}

#[async_trait]
impl CourseRepository for InMemoryRepository {
    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        Ok(lock(&self.courses)?.values().cloned().collect())
    }

    async fn get_course(&self, id: &CourseId) -> Result<Option<Course>, StorageError> {
        Ok(lock(&self.courses)?.get(id).cloned())
    }

    async fn create_course(
        &self,
        _session: &SessionContext,
        draft: &CourseDraft,
    ) -> Result<Course, StorageError> {
        let id = CourseId::new(format!("course-{}", self.allocate_id()));
        let course = Self::course_from_draft(id, draft);
        self.insert_course(course.clone())?;
        Ok(course)
    }

    async fn update_course(
        &self,
        _session: &SessionContext,
        id: &CourseId,
        draft: &CourseDraft,
    ) -> Result<Course, StorageError> {
        let mut guard = lock(&self.courses)?;
        let slot = guard.get_mut(id).ok_or(StorageError::NotFound)?;
        *slot = Self::course_from_draft(id.clone(), draft);
        Ok(slot.clone())
    }

    async fn delete_course(
        &self,
        _session: &SessionContext,
        id: &CourseId,
    ) -> Result<(), StorageError> {
        lock(&self.courses)?
            .remove(id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl EnrollmentRepository for InMemoryRepository {
    async fn list_enrollments(
        &self,
        session: &SessionContext,
    ) -> Result<Vec<Enrollment>, StorageError> {
        let guard = lock(&self.enrollments)?;
        let mut found: Vec<Enrollment> = guard
            .iter()
            .filter(|((user, _), _)| user == session.user_id())
            .map(|(_, stored)| stored.enrollment.clone())
            .collect();
        found.sort_by(|a, b| a.course_id().cmp(b.course_id()));
        Ok(found)
    }

    async fn update_progress(
        &self,
        session: &SessionContext,
        course_id: &CourseId,
        update: &ProgressUpdate,
    ) -> Result<Enrollment, StorageError> {
        let mut guard = lock(&self.enrollments)?;
        let stored = guard
            .get_mut(&(session.user_id().clone(), course_id.clone()))
            .ok_or(StorageError::NotFound)?;

        if let Some(expected) = update.expected_version.as_deref() {
            if expected != version_tag(stored.revision) {
                return Err(StorageError::Conflict);
            }
        }

        stored.revision += 1;
        stored.enrollment = stored.enrollment.with_progress(
            update.completed.clone(),
            update.progress,
            Some(version_tag(stored.revision)),
        );
        self.progress_writes.fetch_add(1, Ordering::Relaxed);
        Ok(stored.enrollment.clone())
    }

    async fn list_course_enrollments(
        &self,
        _session: &SessionContext,
        course_id: &CourseId,
    ) -> Result<Vec<Enrollment>, StorageError> {
        let guard = lock(&self.enrollments)?;
        let mut found: Vec<Enrollment> = guard
            .values()
            .filter(|stored| stored.enrollment.course_id() == course_id)
            .map(|stored| stored.enrollment.clone())
            .collect();
        found.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(found)
    }

    async fn enrollment_stats(
        &self,
        _session: &SessionContext,
    ) -> Result<Vec<EnrollmentStat>, StorageError> {
        Ok(lock(&self.stats)?.clone())
    }
}

#[async_trait]
impl SubmissionRepository for InMemoryRepository {
    async fn submit_assignment(
        &self,
        session: &SessionContext,
        submission: &AssignmentSubmission,
    ) -> Result<(), StorageError> {
        lock(&self.assignments)?.push((session.user_id().clone(), submission.clone()));
        Ok(())
    }

    async fn submit_quiz(
        &self,
        session: &SessionContext,
        submission: &QuizSubmission,
    ) -> Result<(), StorageError> {
        lock(&self.quizzes)?.push((session.user_id().clone(), submission.clone()));
        Ok(())
    }

    async fn list_assignments(
        &self,
        _session: &SessionContext,
        course_id: &CourseId,
    ) -> Result<Vec<AssignmentRecord>, StorageError> {
        Ok(lock(&self.assignments)?
            .iter()
            .filter(|(_, s)| s.course_id() == course_id)
            .map(|(user, s)| AssignmentRecord {
                student: Some(user.clone()),
                lesson_index: s.lesson_index(),
                content: s.content().to_owned(),
                submitted_at: Some(s.submitted_at()),
            })
            .collect())
    }
}

#[async_trait]
impl BatchRepository for InMemoryRepository {
    async fn list_batches(
        &self,
        _session: &SessionContext,
        course_id: &CourseId,
    ) -> Result<Vec<Batch>, StorageError> {
        // newest first, like the back-office list
        Ok(lock(&self.batches)?
            .iter()
            .rev()
            .filter(|b| &b.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn create_batch(
        &self,
        _session: &SessionContext,
        course_id: &CourseId,
        draft: &BatchDraft,
    ) -> Result<Batch, StorageError> {
        let batch = Batch {
            id: BatchId::new(format!("batch-{}", self.allocate_id())),
            course_id: course_id.clone(),
            name: draft.name.clone(),
            start_date: draft.start_date,
            end_date: draft.end_date,
        };
        lock(&self.batches)?.push(batch.clone());
        Ok(batch)
    }
}

/// Aggregates the backend ports behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub courses: Arc<dyn CourseRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub submissions: Arc<dyn SubmissionRepository>,
    pub batches: Arc<dyn BatchRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_in_memory(&InMemoryRepository::new())
    }

    /// Share one in-memory repository across every port.
    #[must_use]
    pub fn from_in_memory(repo: &InMemoryRepository) -> Self {
        Self {
            courses: Arc::new(repo.clone()),
            enrollments: Arc::new(repo.clone()),
            submissions: Arc::new(repo.clone()),
            batches: Arc::new(repo.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_core::model::Role;
    use course_core::progress::{CompletionToken, Task};

    fn session(user: &str) -> SessionContext {
        SessionContext::new(UserId::new(user), Role::Student, "token")
    }

    fn seeded() -> (InMemoryRepository, CourseId) {
        let repo = InMemoryRepository::new();
        let course = Course::new(
            CourseId::new("react"),
            "React for Beginners",
            &LessonOutline::from_syllabus(["Intro", "Components"]),
        )
        .unwrap();
        let id = course.id().clone();
        repo.insert_course(course).unwrap();
        (repo, id)
    }

    #[tokio::test]
    async fn enrollments_are_scoped_to_session_user() {
        let (repo, course_id) = seeded();
        repo.enroll(&UserId::new("alice"), &course_id).unwrap();

        assert_eq!(repo.list_enrollments(&session("alice")).await.unwrap().len(), 1);
        assert!(repo.list_enrollments(&session("bob")).await.unwrap().is_empty());
        assert!(
            repo.get_enrollment(&session("alice"), &course_id)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn update_progress_bumps_version_and_rejects_stale_writes() {
        let (repo, course_id) = seeded();
        let enrollment = repo.enroll(&UserId::new("alice"), &course_id).unwrap();
        let alice = session("alice");

        let update = ProgressUpdate {
            progress: 17,
            completed: CompletionSet::new().with(CompletionToken::new(0, Task::Video)),
            expected_version: enrollment.version().map(str::to_owned),
        };
        let saved = repo.update_progress(&alice, &course_id, &update).await.unwrap();
        assert_eq!(saved.progress(), 17);
        assert_ne!(saved.version(), enrollment.version());

        let err = repo
            .update_progress(&alice, &course_id, &update)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
        assert_eq!(repo.progress_writes(), 1);
    }

    #[tokio::test]
    async fn update_progress_without_enrollment_is_not_found() {
        let (repo, course_id) = seeded();
        let update = ProgressUpdate {
            progress: 0,
            completed: CompletionSet::new(),
            expected_version: None,
        };
        let err = repo
            .update_progress(&session("carol"), &course_id, &update)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn course_crud_round_trip() {
        let repo = InMemoryRepository::new();
        let admin = SessionContext::new(UserId::new("root"), Role::Admin, "t");
        let draft = CourseDraft {
            title: "Data Science Basics".into(),
            syllabus: vec!["Python".into(), "Pandas".into(), "ML Basics".into()],
            ..CourseDraft::default()
        };

        let created = repo.create_course(&admin, &draft).await.unwrap();
        assert_eq!(created.lesson_count(), 3);

        let renamed = CourseDraft {
            title: "Data Science".into(),
            ..draft
        };
        let updated = repo
            .update_course(&admin, created.id(), &renamed)
            .await
            .unwrap();
        assert_eq!(updated.title(), "Data Science");

        repo.delete_course(&admin, created.id()).await.unwrap();
        assert!(repo.get_course(created.id()).await.unwrap().is_none());
        assert!(matches!(
            repo.delete_course(&admin, created.id()).await,
            Err(StorageError::NotFound)
        ));
    }
}
