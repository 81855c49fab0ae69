use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz has no questions")]
    Empty,

    #[error("question {id:?} needs at least two options")]
    TooFewOptions { id: String },

    #[error("question {id:?} answer index {answer} is out of range")]
    AnswerOutOfRange { id: String, answer: usize },
}

/// Multiple-choice question; `answer` indexes into `options`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    id: String,
    prompt: String,
    options: Vec<String>,
    answer: usize,
}

impl QuizQuestion {
    /// # Errors
    ///
    /// Returns `QuizError` if fewer than two options are given or the answer
    /// index does not point at one of them.
    pub fn new(
        id: impl Into<String>,
        prompt: impl Into<String>,
        options: Vec<String>,
        answer: usize,
    ) -> Result<Self, QuizError> {
        let id = id.into();
        if options.len() < 2 {
            return Err(QuizError::TooFewOptions { id });
        }
        if answer >= options.len() {
            return Err(QuizError::AnswerOutOfRange { id, answer });
        }
        Ok(Self {
            id,
            prompt: prompt.into(),
            options,
            answer,
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }
}

/// Correct answers out of questions asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizScore {
    pub correct: u32,
    pub total: u32,
}

/// A lesson quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    questions: Vec<QuizQuestion>,
}

impl Quiz {
    /// # Errors
    ///
    /// Returns `QuizError::Empty` for a quiz without questions.
    pub fn new(questions: Vec<QuizQuestion>) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::Empty);
        }
        Ok(Self { questions })
    }

    #[must_use]
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    /// Score selected option indices keyed by question id. Unanswered questions count as wrong.
    #[must_use]
    pub fn grade(&self, answers: &HashMap<String, usize>) -> QuizScore {
        let correct = self
            .questions
            .iter()
            .filter(|q| answers.get(&q.id) == Some(&q.answer))
            .count();
        QuizScore {
            correct: u32::try_from(correct).unwrap_or(u32::MAX),
            total: u32::try_from(self.questions.len()).unwrap_or(u32::MAX),
        }
    }
}
