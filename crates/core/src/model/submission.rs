use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{CourseId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubmissionError {
    #[error("assignment answer cannot be empty")]
    EmptyAssignment,

    #[error("quiz has no questions to score")]
    EmptyQuiz,

    #[error("quiz score {score} exceeds total {total}")]
    ScoreExceedsTotal { score: u32, total: u32 },
}

/// An assignment answer for one lesson: a shared-drive link or free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentSubmission {
    course_id: CourseId,
    lesson_index: usize,
    content: String,
    submitted_at: DateTime<Utc>,
}

impl AssignmentSubmission {
    /// # Errors
    ///
    /// Returns `SubmissionError::EmptyAssignment` if the answer is blank.
    pub fn new(
        course_id: CourseId,
        lesson_index: usize,
        content: &str,
        submitted_at: DateTime<Utc>,
    ) -> Result<Self, SubmissionError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(SubmissionError::EmptyAssignment);
        }
        Ok(Self {
            course_id,
            lesson_index,
            content: content.to_owned(),
            submitted_at,
        })
    }

    #[must_use]
    pub fn course_id(&self) -> &CourseId {
        &self.course_id
    }

    #[must_use]
    pub fn lesson_index(&self) -> usize {
        self.lesson_index
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }
}

/// A scored quiz attempt for one lesson.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSubmission {
    course_id: CourseId,
    lesson_index: usize,
    score: u32,
    total: u32,
    submitted_at: DateTime<Utc>,
}

impl QuizSubmission {
    /// # Errors
    ///
    /// Returns `SubmissionError` if `total` is zero or `score` exceeds it.
    pub fn new(
        course_id: CourseId,
        lesson_index: usize,
        score: u32,
        total: u32,
        submitted_at: DateTime<Utc>,
    ) -> Result<Self, SubmissionError> {
        if total == 0 {
            return Err(SubmissionError::EmptyQuiz);
        }
        if score > total {
            return Err(SubmissionError::ScoreExceedsTotal { score, total });
        }
        Ok(Self {
            course_id,
            lesson_index,
            score,
            total,
            submitted_at,
        })
    }

    #[must_use]
    pub fn course_id(&self) -> &CourseId {
        &self.course_id
    }

    #[must_use]
    pub fn lesson_index(&self) -> usize {
        self.lesson_index
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }
}

/// An assignment as listed in the admin back-office.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentRecord {
    pub student: Option<UserId>,
    pub lesson_index: usize,
    pub content: String,
    pub submitted_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn assignment_content_is_trimmed() {
        let submission =
            AssignmentSubmission::new(CourseId::new("c"), 0, "  https://drive/x  ", fixed_now())
                .unwrap();
        assert_eq!(submission.content(), "https://drive/x");
    }

    #[test]
    fn blank_assignment_rejected() {
        let err = AssignmentSubmission::new(CourseId::new("c"), 0, " \n", fixed_now()).unwrap_err();
        assert_eq!(err, SubmissionError::EmptyAssignment);
    }

    #[test]
    fn quiz_score_bounds() {
        assert!(QuizSubmission::new(CourseId::new("c"), 0, 2, 2, fixed_now()).is_ok());
        assert_eq!(
            QuizSubmission::new(CourseId::new("c"), 0, 0, 0, fixed_now()).unwrap_err(),
            SubmissionError::EmptyQuiz
        );
        assert_eq!(
            QuizSubmission::new(CourseId::new("c"), 0, 3, 2, fixed_now()).unwrap_err(),
            SubmissionError::ScoreExceedsTotal { score: 3, total: 2 }
        );
    }
}
