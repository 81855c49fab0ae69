//! REST adapter for the course backend.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use course_core::model::{
    AssignmentRecord, AssignmentSubmission, Batch, BatchDraft, Course, CourseDraft, CourseId,
    Enrollment, EnrollmentStat, QuizSubmission, SessionContext,
};
use reqwest::header::{ETAG, IF_MATCH};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::repository::{
    BatchRepository, CourseRepository, EnrollmentRepository, ProgressUpdate, Storage,
    StorageError, SubmissionRepository,
};

mod wire;

use wire::{
    AssignmentBody, AssignmentDocument, BatchDocument, CourseDocument, EnrollmentDocument,
    ProgressPatch, QuizBody, StatDocument,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HttpInitError {
    #[error(transparent)]
    Client(#[from] reqwest::Error),
}

/// Where the backend lives and how long to wait for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl BackendConfig {
    /// Read `COURSEWORK_API_URL` and `COURSEWORK_HTTP_TIMEOUT_SECS`, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = env::var("COURSEWORK_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let timeout = env::var("COURSEWORK_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Self {
            base_url,
            timeout: Duration::from_secs(timeout),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// `reqwest`-backed implementation of every storage port.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// # Errors
    ///
    /// Returns `HttpInitError` if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, HttpInitError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        session: Option<&SessionContext>,
    ) -> RequestBuilder {
        debug!(method = method.as_str(), path, "backend request");
        let builder = self
            .client
            .request(method, format!("{}{path}", self.base_url));
        match session {
            Some(session) => builder.bearer_auth(session.access_token()),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, StorageError> {
        let response = builder
            .send()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            debug!(%status, url = %response.url(), "backend rejected request");
            Err(status_error(status))
        }
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, StorageError> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        session: Option<&SessionContext>,
    ) -> Result<T, StorageError> {
        let response = self.send(self.request(Method::GET, path, session)).await?;
        Self::read_json(response).await
    }

    async fn send_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        session: &SessionContext,
        body: &B,
    ) -> Result<T, StorageError> {
        let response = self
            .send(self.request(method, path, Some(session)).json(body))
            .await?;
        Self::read_json(response).await
    }
}

fn status_error(status: StatusCode) -> StorageError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StorageError::Unauthorized,
        StatusCode::NOT_FOUND => StorageError::NotFound,
        StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => StorageError::Conflict,
        other => StorageError::Status(other.as_u16()),
    }
}

#[async_trait]
impl CourseRepository for HttpBackend {
    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        let docs: Vec<CourseDocument> = self.get_json("/courses", None).await?;
        Ok(docs.into_iter().map(CourseDocument::into_course).collect())
    }

    async fn get_course(&self, id: &CourseId) -> Result<Option<Course>, StorageError> {
        match self
            .get_json::<CourseDocument>(&format!("/courses/{id}"), None)
            .await
        {
            Ok(doc) => Ok(Some(doc.into_course())),
            Err(StorageError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_course(
        &self,
        session: &SessionContext,
        draft: &CourseDraft,
    ) -> Result<Course, StorageError> {
        let doc: CourseDocument = self
            .send_json(Method::POST, "/admin/courses", session, draft)
            .await?;
        Ok(doc.into_course())
    }

    async fn update_course(
        &self,
        session: &SessionContext,
        id: &CourseId,
        draft: &CourseDraft,
    ) -> Result<Course, StorageError> {
        let doc: CourseDocument = self
            .send_json(Method::PATCH, &format!("/admin/courses/{id}"), session, draft)
            .await?;
        Ok(doc.into_course())
    }

    async fn delete_course(
        &self,
        session: &SessionContext,
        id: &CourseId,
    ) -> Result<(), StorageError> {
        self.send(self.request(Method::DELETE, &format!("/admin/courses/{id}"), Some(session)))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl EnrollmentRepository for HttpBackend {
    async fn list_enrollments(
        &self,
        session: &SessionContext,
    ) -> Result<Vec<Enrollment>, StorageError> {
        let docs: Vec<EnrollmentDocument> =
            self.get_json("/student/enrollments", Some(session)).await?;
        Ok(docs
            .into_iter()
            .map(|doc| doc.into_enrollment(None))
            .collect())
    }

    async fn update_progress(
        &self,
        session: &SessionContext,
        course_id: &CourseId,
        update: &ProgressUpdate,
    ) -> Result<Enrollment, StorageError> {
        let patch = ProgressPatch {
            progress: update.progress,
            lessons_completed: update.completed.to_wire(),
        };
        let mut builder = self
            .request(
                Method::PATCH,
                &format!("/student/enrollments/{course_id}/progress"),
                Some(session),
            )
            .json(&patch);
        if let Some(version) = update.expected_version.as_deref() {
            builder = builder.header(IF_MATCH, version);
        }

        let response = self.send(builder).await?;
        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        match Self::read_json::<EnrollmentDocument>(response).await {
            Ok(doc) => Ok(doc.into_enrollment(etag)),
            // Acknowledged without a usable body: read back what the backend stored.
            Err(StorageError::Serialization(reason)) => {
                debug!(%course_id, %reason, "progress ack had no enrollment body, re-reading");
                self.get_enrollment(session, course_id)
                    .await?
                    .ok_or(StorageError::NotFound)
            }
            Err(e) => Err(e),
        }
    }

    async fn list_course_enrollments(
        &self,
        session: &SessionContext,
        course_id: &CourseId,
    ) -> Result<Vec<Enrollment>, StorageError> {
        let docs: Vec<EnrollmentDocument> = self
            .get_json(
                &format!("/admin/courses/{course_id}/enrollments"),
                Some(session),
            )
            .await?;
        Ok(docs
            .into_iter()
            .map(|doc| doc.into_enrollment(None))
            .collect())
    }

    async fn enrollment_stats(
        &self,
        session: &SessionContext,
    ) -> Result<Vec<EnrollmentStat>, StorageError> {
        let docs: Vec<StatDocument> = self
            .get_json("/admin/enrollments/stats", Some(session))
            .await?;
        Ok(docs.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl SubmissionRepository for HttpBackend {
    async fn submit_assignment(
        &self,
        session: &SessionContext,
        submission: &AssignmentSubmission,
    ) -> Result<(), StorageError> {
        let body = AssignmentBody::from(submission);
        self.send(
            self.request(Method::POST, "/student/assignments", Some(session))
                .json(&body),
        )
        .await?;
        Ok(())
    }

    async fn submit_quiz(
        &self,
        session: &SessionContext,
        submission: &QuizSubmission,
    ) -> Result<(), StorageError> {
        let body = QuizBody::from(submission);
        self.send(
            self.request(Method::POST, "/student/quizzes", Some(session))
                .json(&body),
        )
        .await?;
        Ok(())
    }

    async fn list_assignments(
        &self,
        session: &SessionContext,
        course_id: &CourseId,
    ) -> Result<Vec<AssignmentRecord>, StorageError> {
        let docs: Vec<AssignmentDocument> = self
            .get_json(
                &format!("/admin/courses/{course_id}/assignments"),
                Some(session),
            )
            .await?;
        Ok(docs.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl BatchRepository for HttpBackend {
    async fn list_batches(
        &self,
        session: &SessionContext,
        course_id: &CourseId,
    ) -> Result<Vec<Batch>, StorageError> {
        let docs: Vec<BatchDocument> = self
            .get_json(&format!("/admin/courses/{course_id}/batches"), Some(session))
            .await?;
        Ok(docs
            .into_iter()
            .map(|doc| doc.into_batch(course_id))
            .collect())
    }

    async fn create_batch(
        &self,
        session: &SessionContext,
        course_id: &CourseId,
        draft: &BatchDraft,
    ) -> Result<Batch, StorageError> {
        let doc: BatchDocument = self
            .send_json(
                Method::POST,
                &format!("/admin/courses/{course_id}/batches"),
                session,
                draft,
            )
            .await?;
        Ok(doc.into_batch(course_id))
    }
}

impl Storage {
    /// Build a `Storage` backed by the REST backend.
    ///
    /// # Errors
    ///
    /// Returns `HttpInitError` if the HTTP client cannot be built.
    pub fn http(config: &BackendConfig) -> Result<Self, HttpInitError> {
        let backend = HttpBackend::new(config)?;
        Ok(Self {
            courses: Arc::new(backend.clone()),
            enrollments: Arc::new(backend.clone()),
            submissions: Arc::new(backend.clone()),
            batches: Arc::new(backend),
        })
    }
}
