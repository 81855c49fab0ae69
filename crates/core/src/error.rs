use thiserror::Error;

use crate::model::{BatchError, CourseError, QuizError, SubmissionError};
use crate::progress::{PolicyViolation, TokenParseError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    Token(#[from] TokenParseError),
    #[error(transparent)]
    Policy(#[from] PolicyViolation),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Batch(#[from] BatchError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{CompletionSet, Task, check};

    fn quiz_first() -> Result<(), Error> {
        check(Task::Quiz, 0, &CompletionSet::new())?;
        Ok(())
    }

    #[test]
    fn policy_violation_converts() {
        let err = quiz_first().unwrap_err();
        assert!(matches!(err, Error::Policy(_)));
        assert_eq!(
            err.to_string(),
            "lesson 0: complete the assignment task before the quiz task"
        );
    }

    #[test]
    fn token_error_converts() {
        let err: Error = CompletionSet::from_wire(["l:x:v"]).unwrap_err().into();
        assert!(matches!(err, Error::Token(_)));
    }
}
