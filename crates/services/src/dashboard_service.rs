use std::sync::Arc;

use course_core::model::{Course, Enrollment, SessionContext};
use course_core::progress::{NextAction, TaskTally, next_action};
use storage::repository::{CourseRepository, EnrollmentRepository};
use tracing::warn;

use crate::error::DashboardError;

/// One enrolled course as shown on the student dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardItem {
    pub course: Course,
    pub enrollment: Enrollment,
    pub tally: TaskTally,
    pub next: NextAction,
}

impl DashboardItem {
    fn new(course: Course, enrollment: Enrollment) -> Self {
        let tally = TaskTally::from_set(enrollment.completed(), course.lesson_count());
        let next = next_action(&course, enrollment.completed());
        Self {
            course,
            enrollment,
            tally,
            next,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.enrollment.is_complete()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dashboard {
    pub items: Vec<DashboardItem>,
    /// Mean enrollment progress, rounded; 0 without enrollments.
    pub average_progress: u8,
}

impl Dashboard {
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_complete()).count()
    }
}

#[must_use]
pub fn average_progress(enrollments: &[Enrollment]) -> u8 {
    if enrollments.is_empty() {
        return 0;
    }
    let n = enrollments.len();
    let sum: usize = enrollments.iter().map(|e| usize::from(e.progress())).sum();
    u8::try_from((2 * sum + n) / (2 * n)).unwrap_or(100)
}

#[derive(Clone)]
pub struct DashboardService {
    session: SessionContext,
    courses: Arc<dyn CourseRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
}

impl DashboardService {
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
        }
    }

    /// Load the signed-in student's enrollments with their courses.
    ///
    /// A course that cannot be fetched is shown as a placeholder instead of
    /// failing the whole dashboard.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::Storage` if the enrollments cannot be listed.
    pub async fn load(&self) -> Result<Dashboard, DashboardError> {
        let enrollments = self.enrollments.list_enrollments(&self.session).await?;
        let average_progress = average_progress(&enrollments);

        let mut items = Vec::with_capacity(enrollments.len());
        for enrollment in enrollments {
            let course = match self.courses.get_course(enrollment.course_id()).await {
                Ok(Some(course)) => course,
                Ok(None) => {
                    warn!(course = %enrollment.course_id(), "enrolled course missing from catalog");
                    Course::placeholder(enrollment.course_id().clone())
                }
                Err(e) => {
                    warn!(course = %enrollment.course_id(), error = %e, "failed to load enrolled course");
                    Course::placeholder(enrollment.course_id().clone())
                }
            };
            items.push(DashboardItem::new(course, enrollment));
        }

        Ok(Dashboard {
            items,
            average_progress,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_core::model::{CourseId, EnrollmentId, LessonOutline, Role, UserId};
    use course_core::progress::{CompletionSet, Task};
    use storage::repository::InMemoryRepository;

    fn enrollment(course: &str, progress: u8) -> Enrollment {
        Enrollment::from_persisted(
            EnrollmentId::new(format!("e-{course}")),
            CourseId::new(course),
            None,
            progress,
            CompletionSet::new(),
            None,
        )
    }

    #[test]
    fn average_progress_rounds_and_handles_empty() {
        assert_eq!(average_progress(&[]), 0);
        assert_eq!(
            average_progress(&[enrollment("a", 17), enrollment("b", 50)]),
            34
        );
        assert_eq!(
            average_progress(&[enrollment("a", 100), enrollment("b", 100)]),
            100
        );
    }

    #[tokio::test]
    async fn dashboard_attaches_courses_and_falls_back_to_placeholder() {
        let repo = InMemoryRepository::new();
        let course = Course::new(
            CourseId::new("react"),
            "React for Beginners",
            &LessonOutline::from_syllabus(["Intro", "Components"]),
        )
        .unwrap();
        repo.insert_course(course).unwrap();

        let alice = UserId::new("alice");
        let watched = enrollment("react", 17).with_progress(
            CompletionSet::from_wire(["l:0:v"]).unwrap(),
            17,
            None,
        );
        repo.put_enrollment(&alice, watched).unwrap();
        repo.enroll(&alice, &CourseId::new("retired")).unwrap();

        let service = DashboardService::new(
            SessionContext::new(alice, Role::Student, "tok"),
            Arc::new(repo.clone()),
            Arc::new(repo),
        );
        let dashboard = service.load().await.unwrap();

        assert_eq!(dashboard.items.len(), 2);
        assert_eq!(dashboard.average_progress, 9);
        assert_eq!(dashboard.completed_count(), 0);

        let react = &dashboard.items[0];
        assert_eq!(react.course.title(), "React for Beginners");
        assert_eq!(react.tally.video, 1);
        assert_eq!(react.tally.lessons, 2);
        assert_eq!(
            react.next,
            NextAction::Perform {
                lesson: 0,
                task: Task::Assignment
            }
        );

        let retired = &dashboard.items[1];
        assert_eq!(retired.course.title(), "Untitled course");
        assert_eq!(retired.course.lesson_count(), 1);
    }
}
