use std::collections::HashMap;
use std::sync::Arc;

use course_core::model::{AssignmentSubmission, CourseId, Quiz, QuizScore, QuizSubmission};
use course_core::progress::Task;
use storage::repository::SubmissionRepository;
use tracing::debug;

use crate::Clock;
use crate::error::SubmissionServiceError;
use crate::progress_service::{CompletionOutcome, ProgressService};

/// Result of a graded quiz attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizOutcome {
    pub score: QuizScore,
    pub completion: CompletionOutcome,
}

/// Sends assignment and quiz submissions, then records the matching task.
///
/// The unlock policy is checked before anything is sent. A rejected submission
/// records nothing; a resubmission of a completed task is sent but writes no
/// progress.
#[derive(Clone)]
pub struct SubmissionService {
    clock: Clock,
    progress: ProgressService,
    submissions: Arc<dyn SubmissionRepository>,
}

impl SubmissionService {
    #[must_use]
    pub fn new(
        clock: Clock,
        progress: ProgressService,
        submissions: Arc<dyn SubmissionRepository>,
    ) -> Self {
        Self {
            clock,
            progress,
            submissions,
        }
    }

    /// Submit an assignment answer (a link or free text) for `lesson`.
    ///
    /// # Errors
    ///
    /// Returns `SubmissionServiceError::Invalid` for blank content,
    /// `SubmissionServiceError::Progress` if the task is locked or the token
    /// cannot be saved, or `SubmissionServiceError::Storage` if the backend
    /// rejects the submission.
    pub async fn submit_assignment(
        &self,
        course_id: &CourseId,
        lesson: usize,
        content: &str,
    ) -> Result<CompletionOutcome, SubmissionServiceError> {
        let submission =
            AssignmentSubmission::new(course_id.clone(), lesson, content, self.clock.now())?;
        let (course, enrollment) = self.progress.load(course_id).await?;
        self.progress
            .check(&enrollment, &course, lesson, Task::Assignment)?;

        self.submissions
            .submit_assignment(self.progress.session(), &submission)
            .await?;
        debug!(%course_id, lesson, "assignment submitted");

        Ok(self
            .progress
            .record_with_retry(course, enrollment, lesson, Task::Assignment)
            .await?)
    }

    /// Grade `answers` against `quiz`, submit the score, and record the quiz task.
    ///
    /// # Errors
    ///
    /// Same as [`Self::submit_quiz_score`].
    pub async fn submit_quiz(
        &self,
        course_id: &CourseId,
        lesson: usize,
        quiz: &Quiz,
        answers: &HashMap<String, usize>,
    ) -> Result<QuizOutcome, SubmissionServiceError> {
        let score = quiz.grade(answers);
        let completion = self
            .submit_quiz_score(course_id, lesson, score.correct, score.total)
            .await?;
        Ok(QuizOutcome { score, completion })
    }

    /// Submit an already computed quiz score.
    ///
    /// # Errors
    ///
    /// Returns `SubmissionServiceError::Invalid` for an impossible score,
    /// `SubmissionServiceError::Progress` if the quiz is locked or the token
    /// cannot be saved, or `SubmissionServiceError::Storage` if the backend
    /// rejects the submission.
    pub async fn submit_quiz_score(
        &self,
        course_id: &CourseId,
        lesson: usize,
        score: u32,
        total: u32,
    ) -> Result<CompletionOutcome, SubmissionServiceError> {
        let submission =
            QuizSubmission::new(course_id.clone(), lesson, score, total, self.clock.now())?;
        let (course, enrollment) = self.progress.load(course_id).await?;
        self.progress.check(&enrollment, &course, lesson, Task::Quiz)?;

        self.submissions
            .submit_quiz(self.progress.session(), &submission)
            .await?;
        debug!(%course_id, lesson, score, total, "quiz submitted");

        Ok(self
            .progress
            .record_with_retry(course, enrollment, lesson, Task::Quiz)
            .await?)
    }
}
