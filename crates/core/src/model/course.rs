use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::model::ids::CourseId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course title cannot be empty")]
    EmptyTitle,

    #[error("course price must be a non-negative number, got {0}")]
    InvalidPrice(f64),
}

/// Title shown for courses whose record could not be loaded.
pub const UNTITLED_COURSE: &str = "Untitled course";

//
// ─── LESSONS ───────────────────────────────────────────────────────────────────
//

/// One playable lesson with a stable 0-based index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    index: usize,
    title: String,
    video: Option<Url>,
}

impl Lesson {
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn video(&self) -> Option<&Url> {
        self.video.as_ref()
    }
}

/// A lesson entry as listed in a course's `metadata.lessons`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonDraft {
    pub title: Option<String>,
    pub video: Option<Url>,
}

/// The raw lesson sources a course record may carry.
///
/// `metadata_lessons` wins when non-empty, then `syllabus`; a course with
/// neither has a single lesson named after the course.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonOutline {
    pub metadata_lessons: Vec<LessonDraft>,
    pub syllabus: Vec<String>,
}

impl LessonOutline {
    #[must_use]
    pub fn from_syllabus<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            metadata_lessons: Vec::new(),
            syllabus: titles.into_iter().map(Into::into).collect(),
        }
    }

    /// Resolve the ordered lesson list for a course titled `course_title`.
    #[must_use]
    pub fn derive(&self, course_title: &str) -> Vec<Lesson> {
        if !self.metadata_lessons.is_empty() {
            return self
                .metadata_lessons
                .iter()
                .enumerate()
                .map(|(index, draft)| Lesson {
                    index,
                    title: draft
                        .title
                        .as_deref()
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map_or_else(|| format!("Lesson {}", index + 1), str::to_owned),
                    video: draft.video.clone(),
                })
                .collect();
        }

        if !self.syllabus.is_empty() {
            return self
                .syllabus
                .iter()
                .enumerate()
                .map(|(index, title)| Lesson {
                    index,
                    title: title.trim().to_owned(),
                    video: None,
                })
                .collect();
        }

        vec![Lesson {
            index: 0,
            title: course_title.to_owned(),
            video: None,
        }]
    }
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// A catalog course with its resolved lessons.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    id: CourseId,
    title: String,
    description: Option<String>,
    instructor: Option<String>,
    price: Option<f64>,
    lessons: Vec<Lesson>,
}

impl Course {
    /// Build a course, rejecting a blank title.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyTitle` if the title is blank.
    pub fn new(
        id: CourseId,
        title: impl Into<String>,
        outline: &LessonOutline,
    ) -> Result<Self, CourseError> {
        let title = title.into().trim().to_owned();
        if title.is_empty() {
            return Err(CourseError::EmptyTitle);
        }
        Ok(Self::from_persisted(id, title, None, None, None, outline))
    }

    /// Rehydrate a course from a backend record.
    ///
    /// A blank title is replaced with [`UNTITLED_COURSE`] rather than rejected.
    #[must_use]
    pub fn from_persisted(
        id: CourseId,
        title: String,
        description: Option<String>,
        instructor: Option<String>,
        price: Option<f64>,
        outline: &LessonOutline,
    ) -> Self {
        let title = if title.trim().is_empty() {
            UNTITLED_COURSE.to_owned()
        } else {
            title.trim().to_owned()
        };
        let lessons = outline.derive(&title);
        Self {
            id,
            title,
            description,
            instructor,
            price,
            lessons,
        }
    }

    /// Stand-in used when a course record cannot be fetched.
    #[must_use]
    pub fn placeholder(id: CourseId) -> Self {
        Self::from_persisted(
            id,
            UNTITLED_COURSE.to_owned(),
            None,
            None,
            None,
            &LessonOutline::default(),
        )
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> &CourseId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn instructor(&self) -> Option<&str> {
        self.instructor.as_deref()
    }

    #[must_use]
    pub fn price(&self) -> Option<f64> {
        self.price
    }

    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    #[must_use]
    pub fn lesson(&self, index: usize) -> Option<&Lesson> {
        self.lessons.get(index)
    }

    #[must_use]
    pub fn lesson_count(&self) -> usize {
        self.lessons.len()
    }
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Admin-editable course fields, sent to the backend on create/update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CourseDraft {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub syllabus: Vec<String>,
}

impl CourseDraft {
    /// Normalize and validate the draft.
    ///
    /// # Errors
    ///
    /// Returns `CourseError` for a blank title or a negative/non-finite price.
    pub fn validate(self) -> Result<Self, CourseError> {
        let title = self.title.trim().to_owned();
        if title.is_empty() {
            return Err(CourseError::EmptyTitle);
        }
        if let Some(price) = self.price.filter(|p| !p.is_finite() || *p < 0.0) {
            return Err(CourseError::InvalidPrice(price));
        }

        Ok(Self {
            title,
            description: normalize(self.description),
            instructor: normalize(self.instructor),
            price: self.price,
            syllabus: self
                .syllabus
                .into_iter()
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
                .collect(),
        })
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(url: &str) -> Option<Url> {
        Some(Url::parse(url).unwrap())
    }

    #[test]
    fn metadata_lessons_take_priority_over_syllabus() {
        let outline = LessonOutline {
            metadata_lessons: vec![
                LessonDraft {
                    title: Some("Intro to React".into()),
                    video: video("https://www.youtube.com/embed/dGcsHMXbSOA"),
                },
                LessonDraft {
                    title: None,
                    video: None,
                },
            ],
            syllabus: vec!["ignored".into()],
        };

        let course = Course::new(CourseId::new("1"), "React", &outline).unwrap();
        assert_eq!(course.lesson_count(), 2);
        assert_eq!(course.lessons()[0].title(), "Intro to React");
        assert!(course.lessons()[0].video().is_some());
        assert_eq!(course.lessons()[1].title(), "Lesson 2");
        assert_eq!(course.lessons()[1].index(), 1);
    }

    #[test]
    fn syllabus_used_when_metadata_empty() {
        let outline = LessonOutline::from_syllabus(["Streams", "Clustering", "Performance"]);
        let course = Course::new(CourseId::new("2"), "Advanced Node.js", &outline).unwrap();
        let titles: Vec<_> = course.lessons().iter().map(Lesson::title).collect();
        assert_eq!(titles, ["Streams", "Clustering", "Performance"]);
    }

    #[test]
    fn course_without_lessons_has_single_lesson_named_after_course() {
        let course =
            Course::new(CourseId::new("3"), "UI/UX Design", &LessonOutline::default()).unwrap();
        assert_eq!(course.lesson_count(), 1);
        assert_eq!(course.lesson(0).unwrap().title(), "UI/UX Design");
        assert!(course.lesson(1).is_none());
    }

    #[test]
    fn blank_title_rejected_on_new_but_defaulted_when_persisted() {
        let err = Course::new(CourseId::new("x"), "  ", &LessonOutline::default()).unwrap_err();
        assert_eq!(err, CourseError::EmptyTitle);

        let placeholder = Course::placeholder(CourseId::new("x"));
        assert_eq!(placeholder.title(), UNTITLED_COURSE);
        assert_eq!(placeholder.lesson_count(), 1);
    }

    #[test]
    fn draft_validation_normalizes_fields() {
        let draft = CourseDraft {
            title: "  Python for Everyone ".into(),
            description: Some("   ".into()),
            instructor: Some(" Robert King ".into()),
            price: Some(55.0),
            syllabus: vec!["Syntax".into(), " ".into(), "OOP".into()],
        }
        .validate()
        .unwrap();

        assert_eq!(draft.title, "Python for Everyone");
        assert_eq!(draft.description, None);
        assert_eq!(draft.instructor.as_deref(), Some("Robert King"));
        assert_eq!(draft.syllabus, ["Syntax", "OOP"]);
    }

    #[test]
    fn draft_rejects_negative_price() {
        let draft = CourseDraft {
            title: "Marketing".into(),
            price: Some(-1.0),
            ..CourseDraft::default()
        };
        assert_eq!(draft.validate().unwrap_err(), CourseError::InvalidPrice(-1.0));
    }
}
