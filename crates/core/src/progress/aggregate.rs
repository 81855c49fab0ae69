use crate::model::Course;
use crate::progress::token::{CompletionSet, CompletionToken, Task};

/// Tasks each lesson contributes to the denominator.
pub const TASKS_PER_LESSON: usize = 3;

/// Task slots for a course with `lesson_count` lessons, never below one lesson's worth.
#[must_use]
pub fn task_slots_for(lesson_count: usize) -> usize {
    lesson_count
        .saturating_mul(TASKS_PER_LESSON)
        .max(TASKS_PER_LESSON)
}

#[must_use]
pub fn total_task_slots(course: &Course) -> usize {
    task_slots_for(course.lesson_count())
}

/// Percentage of task slots completed, rounded half up and capped at 100.
///
/// Every stored token counts, including tokens for lessons the course no
/// longer has. After a course shrinks the result can reach 100 while
/// [`next_action`](crate::progress::next_action) still points at an open lesson.
#[must_use]
pub fn compute_progress(completed: &CompletionSet, course: &Course) -> u8 {
    progress_for(completed.len(), course.lesson_count())
}

#[must_use]
pub fn progress_for(completed: usize, lesson_count: usize) -> u8 {
    let slots = task_slots_for(lesson_count);
    let done = completed.min(slots);
    // round(100 * done / slots) without floats
    let percent = (200 * done + slots) / (2 * slots);
    u8::try_from(percent.min(100)).unwrap_or(100)
}

/// Every lesson × task token for `course`.
#[must_use]
pub fn force_complete_all(course: &Course) -> CompletionSet {
    (0..course.lesson_count())
        .flat_map(|lesson| {
            Task::ALL
                .into_iter()
                .map(move |task| CompletionToken::new(lesson, task))
        })
        .collect()
}

/// Per-task completion counts, as shown next to a course's progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskTally {
    pub lessons: usize,
    pub video: usize,
    pub assignment: usize,
    pub quiz: usize,
}

impl TaskTally {
    #[must_use]
    pub fn from_set(completed: &CompletionSet, lesson_count: usize) -> Self {
        completed.iter().fold(
            Self {
                lessons: lesson_count,
                ..Self::default()
            },
            |mut tally, token| {
                match token.task() {
                    Task::Video => tally.video += 1,
                    Task::Assignment => tally.assignment += 1,
                    Task::Quiz => tally.quiz += 1,
                }
                tally
            },
        )
    }
}
