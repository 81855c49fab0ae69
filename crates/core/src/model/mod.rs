mod batch;
mod course;
mod enrollment;
mod ids;
mod quiz;
mod session;
mod submission;

pub use ids::{BatchId, CourseId, EnrollmentId, ParseIdError, UserId};

pub use batch::{Batch, BatchDraft, BatchError};
pub use course::{Course, CourseDraft, CourseError, Lesson, LessonDraft, LessonOutline, UNTITLED_COURSE};
pub use enrollment::{Enrollment, EnrollmentStat};
pub use quiz::{Quiz, QuizError, QuizQuestion, QuizScore};
pub use session::{Role, SessionContext};
pub use submission::{AssignmentRecord, AssignmentSubmission, QuizSubmission, SubmissionError};
