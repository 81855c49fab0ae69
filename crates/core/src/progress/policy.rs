//! Unlock rules for the watch → assignment → quiz progression.

use thiserror::Error;

use crate::model::Course;
use crate::progress::token::{CompletionSet, Task};

/// A task was attempted before its prerequisite on the same lesson.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("lesson {lesson}: complete the {missing} task before the {task} task")]
pub struct PolicyViolation {
    pub lesson: usize,
    pub task: Task,
    pub missing: Task,
}

/// Where a single lesson sits in its three-step progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonState {
    /// The named task is the next one still open.
    Awaiting(Task),
    Complete,
}

/// The one task a student should do next for a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    Perform { lesson: usize, task: Task },
    Done,
}

/// Outcome of checking an attempted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Allowed,
    /// The token is already present; callers should skip the write.
    AlreadyCompleted,
}

#[must_use]
pub fn lesson_state(lesson: usize, completed: &CompletionSet) -> LessonState {
    Task::ALL
        .into_iter()
        .find(|task| !completed.contains(lesson, *task))
        .map_or(LessonState::Complete, LessonState::Awaiting)
}

/// First open task scanning lessons left to right.
#[must_use]
pub fn next_action(course: &Course, completed: &CompletionSet) -> NextAction {
    next_action_for(course.lesson_count(), completed)
}

#[must_use]
pub fn next_action_for(lesson_count: usize, completed: &CompletionSet) -> NextAction {
    (0..lesson_count)
        .find_map(|lesson| match lesson_state(lesson, completed) {
            LessonState::Awaiting(task) => Some(NextAction::Perform { lesson, task }),
            LessonState::Complete => None,
        })
        .unwrap_or(NextAction::Done)
}

/// Whether `task` on `lesson` has its prerequisite in place.
///
/// Watching is always allowed. Only the same lesson's previous task is checked.
#[must_use]
pub fn can_perform(task: Task, lesson: usize, completed: &CompletionSet) -> bool {
    task.prerequisite()
        .is_none_or(|required| completed.contains(lesson, required))
}

/// Check an attempted task, short-circuiting tasks that are already done.
///
/// # Errors
///
/// Returns `PolicyViolation` naming the missing prerequisite.
pub fn check(
    task: Task,
    lesson: usize,
    completed: &CompletionSet,
) -> Result<Permission, PolicyViolation> {
    if completed.contains(lesson, task) {
        return Ok(Permission::AlreadyCompleted);
    }
    match task.prerequisite() {
        Some(missing) if !completed.contains(lesson, missing) => Err(PolicyViolation {
            lesson,
            task,
            missing,
        }),
        _ => Ok(Permission::Allowed),
    }
}
