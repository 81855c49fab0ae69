//! Lesson progression: completion tokens, unlock policy, and progress aggregation.

mod aggregate;
mod display;
mod policy;
mod token;

pub use aggregate::{
    TASKS_PER_LESSON, TaskTally, compute_progress, force_complete_all, progress_for,
    task_slots_for, total_task_slots,
};
pub use display::DisplayOverlay;
pub use policy::{
    LessonState, NextAction, Permission, PolicyViolation, can_perform, check, lesson_state,
    next_action, next_action_for,
};
pub use token::{CompletionSet, CompletionToken, Task, TokenParseError, has_token, make_token};
