use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── TASK ──────────────────────────────────────────────────────────────────────
//

/// One of the three ordered tasks every lesson requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Task {
    /// Watch the lesson video.
    Video,
    /// Submit the lesson assignment.
    Assignment,
    /// Submit the lesson quiz.
    Quiz,
}

impl Task {
    /// All tasks in unlock order.
    pub const ALL: [Task; 3] = [Task::Video, Task::Assignment, Task::Quiz];

    /// Single-letter code used in the wire token.
    #[must_use]
    pub fn code(self) -> char {
        match self {
            Task::Video => 'v',
            Task::Assignment => 'a',
            Task::Quiz => 'q',
        }
    }

    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "v" => Some(Task::Video),
            "a" => Some(Task::Assignment),
            "q" => Some(Task::Quiz),
            _ => None,
        }
    }

    /// The task that must be completed for the same lesson first.
    #[must_use]
    pub fn prerequisite(self) -> Option<Task> {
        match self {
            Task::Video => None,
            Task::Assignment => Some(Task::Video),
            Task::Quiz => Some(Task::Assignment),
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Task::Video => "watch",
            Task::Assignment => "assignment",
            Task::Quiz => "quiz",
        })
    }
}

//
// ─── TOKEN ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("malformed completion token: {raw:?}")]
pub struct TokenParseError {
    raw: String,
}

impl TokenParseError {
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// Record that one task of one lesson was completed.
///
/// Serialized as `l:<lesson>:<code>` only at the persistence boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompletionToken {
    lesson: usize,
    task: Task,
}

impl CompletionToken {
    #[must_use]
    pub fn new(lesson: usize, task: Task) -> Self {
        Self { lesson, task }
    }

    #[must_use]
    pub fn lesson(self) -> usize {
        self.lesson
    }

    #[must_use]
    pub fn task(self) -> Task {
        self.task
    }
}

impl fmt::Display for CompletionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "l:{}:{}", self.lesson, self.task.code())
    }
}

impl FromStr for CompletionToken {
    type Err = TokenParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || TokenParseError { raw: s.to_owned() };
        let mut parts = s.split(':');
        let (Some("l"), Some(lesson), Some(code), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(err());
        };
        // `usize::from_str` accepts a leading '+', which the encoding never produces.
        if lesson.is_empty() || !lesson.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        let lesson = lesson.parse::<usize>().map_err(|_| err())?;
        let task = Task::from_code(code).ok_or_else(err)?;
        Ok(Self::new(lesson, task))
    }
}

/// Encode a completion token for `task` on `lesson`.
#[must_use]
pub fn make_token(lesson: usize, task: Task) -> String {
    CompletionToken::new(lesson, task).to_string()
}

/// Exact membership test against a set of wire tokens.
#[must_use]
pub fn has_token<S: AsRef<str>>(tokens: &[S], lesson: usize, task: Task) -> bool {
    let wanted = make_token(lesson, task);
    tokens.iter().any(|t| t.as_ref() == wanted)
}

//
// ─── SET ───────────────────────────────────────────────────────────────────────
//

/// The completed tokens of one enrollment. Duplicates collapse on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct CompletionSet(BTreeSet<CompletionToken>);

impl CompletionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse wire tokens, failing on the first malformed entry.
    ///
    /// # Errors
    ///
    /// Returns `TokenParseError` naming the malformed token.
    pub fn from_wire<I, S>(tokens: I) -> Result<Self, TokenParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        tokens
            .into_iter()
            .map(|t| t.as_ref().parse::<CompletionToken>())
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }

    /// Parse wire tokens, returning the malformed entries separately.
    pub fn from_wire_lossy<I, S>(tokens: I) -> (Self, Vec<TokenParseError>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        let mut rejected = Vec::new();
        for raw in tokens {
            match raw.as_ref().parse::<CompletionToken>() {
                Ok(token) => {
                    set.insert(token);
                }
                Err(e) => rejected.push(e),
            }
        }
        (Self(set), rejected)
    }

    /// Wire form, ordered by lesson then task.
    #[must_use]
    pub fn to_wire(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }

    /// Insert a token; returns `false` if it was already present.
    pub fn insert(&mut self, token: CompletionToken) -> bool {
        self.0.insert(token)
    }

    #[must_use]
    pub fn with(mut self, token: CompletionToken) -> Self {
        self.0.insert(token);
        self
    }

    #[must_use]
    pub fn contains(&self, lesson: usize, task: Task) -> bool {
        self.0.contains(&CompletionToken::new(lesson, task))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = CompletionToken> + '_ {
        self.0.iter().copied()
    }

    #[must_use]
    pub fn is_superset(&self, other: &CompletionSet) -> bool {
        self.0.is_superset(&other.0)
    }
}

impl FromIterator<CompletionToken> for CompletionSet {
    fn from_iter<T: IntoIterator<Item = CompletionToken>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl TryFrom<Vec<String>> for CompletionSet {
    type Error = TokenParseError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_wire(value)
    }
}

impl From<CompletionSet> for Vec<String> {
    fn from(value: CompletionSet) -> Self {
        value.to_wire()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_token_uses_task_codes() {
        assert_eq!(make_token(0, Task::Video), "l:0:v");
        assert_eq!(make_token(3, Task::Assignment), "l:3:a");
        assert_eq!(make_token(12, Task::Quiz), "l:12:q");
    }

    #[test]
    fn has_token_is_exact_match() {
        let tokens = ["l:1:v", "l:10:a"];
        assert!(has_token(&tokens, 1, Task::Video));
        assert!(!has_token(&tokens, 0, Task::Video));
        assert!(!has_token(&tokens, 1, Task::Assignment));
        assert!(has_token(&tokens, 10, Task::Assignment));
    }

    #[test]
    fn token_parse_round_trips_display() {
        let token: CompletionToken = "l:7:q".parse().unwrap();
        assert_eq!(token, CompletionToken::new(7, Task::Quiz));
        assert_eq!(token.to_string(), "l:7:q");
    }

    #[test]
    fn token_parse_rejects_malformed_input() {
        for raw in ["", "l:1", "l:x:v", "l:1:z", "x:1:v", "l:1:v:extra", "l:+1:v", "l:-1:v"] {
            let err = raw.parse::<CompletionToken>().unwrap_err();
            assert_eq!(err.raw(), raw);
        }
    }

    #[test]
    fn set_collapses_duplicates() {
        let set = CompletionSet::from_wire(["l:0:v", "l:0:v", "l:0:a"]).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains(0, Task::Video));
        assert!(set.contains(0, Task::Assignment));
        assert!(!set.contains(0, Task::Quiz));
    }

    #[test]
    fn insert_reports_novelty() {
        let mut set = CompletionSet::new();
        assert!(set.insert(CompletionToken::new(0, Task::Video)));
        assert!(!set.insert(CompletionToken::new(0, Task::Video)));
    }

    #[test]
    fn lossy_parse_keeps_valid_tokens() {
        let (set, rejected) = CompletionSet::from_wire_lossy(["l:0:v", "lesson-1", "l:1:q"]);
        assert_eq!(set.len(), 2);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].raw(), "lesson-1");
    }

    #[test]
    fn wire_order_is_lesson_then_task() {
        let set: CompletionSet = [
            CompletionToken::new(1, Task::Video),
            CompletionToken::new(0, Task::Quiz),
            CompletionToken::new(0, Task::Video),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.to_wire(), ["l:0:v", "l:0:q", "l:1:v"]);
    }

    #[test]
    fn prerequisites_follow_unlock_order() {
        assert_eq!(Task::Video.prerequisite(), None);
        assert_eq!(Task::Assignment.prerequisite(), Some(Task::Video));
        assert_eq!(Task::Quiz.prerequisite(), Some(Task::Assignment));
    }
}
