use std::collections::BTreeSet;

use crate::progress::policy::{LessonState, lesson_state};
use crate::progress::token::CompletionSet;

/// Local-only "done" markers for the lesson list.
///
/// Toggling here never creates completion tokens and is never sent to the
/// backend, so it can disagree with the persisted enrollment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayOverlay {
    marked: BTreeSet<usize>,
}

impl DisplayOverlay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the local marker for `lesson`; returns the new marker value.
    pub fn toggle_local_display_only(&mut self, lesson: usize) -> bool {
        if self.marked.remove(&lesson) {
            false
        } else {
            self.marked.insert(lesson);
            true
        }
    }

    #[must_use]
    pub fn is_marked(&self, lesson: usize) -> bool {
        self.marked.contains(&lesson)
    }

    /// Whether the lesson should render as done: persisted completion or a local marker.
    #[must_use]
    pub fn shows_done(&self, lesson: usize, completed: &CompletionSet) -> bool {
        self.is_marked(lesson) || lesson_state(lesson, completed) == LessonState::Complete
    }
}
