//! JSON shapes exchanged with the REST backend and their domain mapping.

use chrono::{DateTime, NaiveDate, Utc};
use course_core::model::{
    AssignmentRecord, AssignmentSubmission, Batch, BatchId, Course, CourseId, Enrollment,
    EnrollmentId, EnrollmentStat, LessonDraft, LessonOutline, QuizSubmission, UserId,
};
use course_core::progress::CompletionSet;
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

/// Document ids arrive as strings from the API and as numbers from seed data.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawId {
    Text(String),
    Number(i64),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

//
// ─── COURSES ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct CourseDocument {
    #[serde(rename = "_id", alias = "id")]
    id: RawId,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    instructor: Option<String>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    syllabus: Option<Vec<String>>,
    #[serde(default)]
    metadata: Option<CourseMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct CourseMetadata {
    #[serde(default)]
    lessons: Option<Vec<LessonDocument>>,
}

#[derive(Debug, Deserialize)]
struct LessonDocument {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    video: Option<String>,
}

impl CourseDocument {
    pub(crate) fn into_course(self) -> Course {
        let id = CourseId::new(self.id.into_string());
        let metadata_lessons = self
            .metadata
            .and_then(|m| m.lessons)
            .unwrap_or_default()
            .into_iter()
            .map(|lesson| LessonDraft {
                title: lesson.title,
                video: lesson.video.and_then(|raw| parse_video(&id, &raw)),
            })
            .collect();
        let outline = LessonOutline {
            metadata_lessons,
            syllabus: self.syllabus.unwrap_or_default(),
        };
        Course::from_persisted(
            id,
            self.title,
            self.description,
            self.instructor,
            self.price,
            &outline,
        )
    }
}

fn parse_video(course_id: &CourseId, raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match Url::parse(raw) {
        Ok(url) => Some(url),
        Err(e) => {
            warn!(%course_id, video = raw, error = %e, "dropping unparsable lesson video url");
            None
        }
    }
}

//
// ─── ENROLLMENTS ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EnrollmentDocument {
    #[serde(rename = "_id", alias = "id")]
    id: RawId,
    course_id: RawId,
    #[serde(default, alias = "user", alias = "studentId")]
    user_id: Option<RawId>,
    #[serde(default)]
    progress: Option<f64>,
    #[serde(default)]
    lessons_completed: Vec<String>,
    #[serde(default, alias = "__v")]
    version: Option<RawId>,
}

impl EnrollmentDocument {
    /// Map to the domain, preferring `etag` over the body's version field.
    ///
    /// Malformed completion tokens are dropped with a warning.
    pub(crate) fn into_enrollment(self, etag: Option<String>) -> Enrollment {
        let id = EnrollmentId::new(self.id.into_string());
        let (completed, rejected) = CompletionSet::from_wire_lossy(&self.lessons_completed);
        for bad in &rejected {
            warn!(enrollment = %id, token = bad.raw(), "dropping malformed completion token");
        }
        Enrollment::from_persisted(
            id,
            CourseId::new(self.course_id.into_string()),
            self.user_id.map(|u| UserId::new(u.into_string())),
            clamp_progress(self.progress.unwrap_or(0.0)),
            completed,
            etag.or_else(|| self.version.map(RawId::into_string)),
        )
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_progress(raw: f64) -> u8 {
    if raw.is_finite() {
        raw.round().clamp(0.0, 100.0) as u8
    } else {
        0
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProgressPatch {
    pub progress: u8,
    pub lessons_completed: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatDocument {
    period: NaiveDate,
    count: u32,
}

impl From<StatDocument> for EnrollmentStat {
    fn from(doc: StatDocument) -> Self {
        EnrollmentStat {
            period: doc.period,
            count: doc.count,
        }
    }
}

//
// ─── SUBMISSIONS ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AssignmentBody<'a> {
    course_id: &'a str,
    lesson_id: usize,
    content: &'a str,
    submitted_at: DateTime<Utc>,
}

impl<'a> From<&'a AssignmentSubmission> for AssignmentBody<'a> {
    fn from(s: &'a AssignmentSubmission) -> Self {
        Self {
            course_id: s.course_id().as_str(),
            lesson_id: s.lesson_index(),
            content: s.content(),
            submitted_at: s.submitted_at(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuizBody<'a> {
    course_id: &'a str,
    lesson_id: usize,
    score: u32,
    total: u32,
    submitted_at: DateTime<Utc>,
}

impl<'a> From<&'a QuizSubmission> for QuizBody<'a> {
    fn from(s: &'a QuizSubmission) -> Self {
        Self {
            course_id: s.course_id().as_str(),
            lesson_id: s.lesson_index(),
            score: s.score(),
            total: s.total(),
            submitted_at: s.submitted_at(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AssignmentDocument {
    #[serde(default, alias = "userId", alias = "studentId")]
    student: Option<RawId>,
    #[serde(default)]
    lesson_id: usize,
    #[serde(default, alias = "value")]
    content: String,
    #[serde(default)]
    submitted_at: Option<DateTime<Utc>>,
}

impl From<AssignmentDocument> for AssignmentRecord {
    fn from(doc: AssignmentDocument) -> Self {
        AssignmentRecord {
            student: doc.student.map(|s| UserId::new(s.into_string())),
            lesson_index: doc.lesson_id,
            content: doc.content,
            submitted_at: doc.submitted_at,
        }
    }
}

//
// ─── BATCHES ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BatchDocument {
    #[serde(rename = "_id", alias = "id")]
    id: RawId,
    name: String,
    start_date: NaiveDate,
    #[serde(default)]
    end_date: Option<NaiveDate>,
}

impl BatchDocument {
    pub(crate) fn into_batch(self, course_id: &CourseId) -> Batch {
        Batch {
            id: BatchId::new(self.id.into_string()),
            course_id: course_id.clone(),
            name: self.name,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}
