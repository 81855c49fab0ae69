use chrono::NaiveDate;
use course_core::model::{
    BatchDraft, CourseDraft, CourseId, QuizSubmission, Role, SessionContext, UserId,
};
use course_core::progress::{CompletionSet, Task};
use course_core::time::fixed_now;
use serde_json::json;
use storage::http::{BackendConfig, HttpBackend};
use storage::repository::{
    BatchRepository, CourseRepository, EnrollmentRepository, ProgressUpdate, StorageError,
    SubmissionRepository,
};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(server: &MockServer) -> HttpBackend {
    HttpBackend::new(&BackendConfig::default().with_base_url(server.uri())).expect("client")
}

fn student() -> SessionContext {
    SessionContext::new(UserId::new("u1"), Role::Student, "tok-123")
}

#[tokio::test]
async fn get_course_resolves_lessons_and_maps_404_to_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/courses/c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "c1",
            "title": "Advanced Node.js",
            "syllabus": ["Streams", "Clustering", "Performance"]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/courses/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let backend = backend(&server);
    let course = backend
        .get_course(&CourseId::new("c1"))
        .await
        .unwrap()
        .expect("course");
    assert_eq!(course.title(), "Advanced Node.js");
    assert_eq!(course.lesson_count(), 3);

    assert!(
        backend
            .get_course(&CourseId::new("missing"))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn list_enrollments_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/student/enrollments"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "_id": "e1", "courseId": "c1", "progress": 17, "lessonsCompleted": ["l:0:v"] },
            { "_id": "e2", "courseId": "c2" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let enrollments = backend(&server).list_enrollments(&student()).await.unwrap();
    assert_eq!(enrollments.len(), 2);
    assert!(enrollments[0].completed().contains(0, Task::Video));
    assert_eq!(enrollments[1].progress(), 0);
}

#[tokio::test]
async fn update_progress_sends_full_state_with_precondition() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/student/enrollments/c1/progress"))
        .and(header("if-match", "r1"))
        .and(body_json(json!({
            "progress": 33,
            "lessonsCompleted": ["l:0:v", "l:0:a"]
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", "r2")
                .set_body_json(json!({
                    "_id": "e1",
                    "courseId": "c1",
                    "progress": 33,
                    "lessonsCompleted": ["l:0:v", "l:0:a"]
                })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let update = ProgressUpdate {
        progress: 33,
        completed: CompletionSet::from_wire(["l:0:a", "l:0:v"]).unwrap(),
        expected_version: Some("r1".into()),
    };
    let saved = backend(&server)
        .update_progress(&student(), &CourseId::new("c1"), &update)
        .await
        .unwrap();
    assert_eq!(saved.progress(), 33);
    assert_eq!(saved.version(), Some("r2"));
}

#[tokio::test]
async fn update_progress_without_body_reads_back_enrollment() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/student/enrollments/c1/progress"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/student/enrollments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "_id": "e1", "courseId": "c1", "progress": 17, "lessonsCompleted": ["l:0:v"] }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let update = ProgressUpdate {
        progress: 17,
        completed: CompletionSet::from_wire(["l:0:v"]).unwrap(),
        expected_version: None,
    };
    let saved = backend(&server)
        .update_progress(&student(), &CourseId::new("c1"), &update)
        .await
        .unwrap();
    assert_eq!(saved.progress(), 17);
}

#[tokio::test]
async fn stale_precondition_maps_to_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/student/enrollments/c1/progress"))
        .respond_with(ResponseTemplate::new(412))
        .mount(&server)
        .await;

    let update = ProgressUpdate {
        progress: 17,
        completed: CompletionSet::from_wire(["l:0:v"]).unwrap(),
        expected_version: Some("old".into()),
    };
    let err = backend(&server)
        .update_progress(&student(), &CourseId::new("c1"), &update)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict));
}

#[tokio::test]
async fn quiz_submission_failure_surfaces_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/student/quizzes"))
        .and(body_json(json!({
            "courseId": "c1",
            "lessonId": 0,
            "score": 2,
            "total": 2,
            "submittedAt": "2023-11-14T22:13:20Z"
        })))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let submission = QuizSubmission::new(CourseId::new("c1"), 0, 2, 2, fixed_now()).unwrap();
    let err = backend(&server)
        .submit_quiz(&student(), &submission)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Status(500)));
}

#[tokio::test]
async fn unreachable_backend_is_connection_error() {
    let backend =
        HttpBackend::new(&BackendConfig::default().with_base_url("http://127.0.0.1:9")).unwrap();
    let err = backend.list_courses().await.unwrap_err();
    assert!(matches!(err, StorageError::Connection(_)));
}

#[tokio::test]
async fn create_batch_posts_form_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/courses/c1/batches"))
        .and(body_json(json!({
            "name": "Spring",
            "startDate": "2024-03-01",
            "endDate": "2024-05-31"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "_id": "b1",
            "name": "Spring",
            "startDate": "2024-03-01",
            "endDate": "2024-05-31"
        })))
        .mount(&server)
        .await;

    let admin = SessionContext::new(UserId::new("root"), Role::Admin, "tok");
    let draft = BatchDraft {
        name: "Spring".into(),
        start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2024, 5, 31),
    };
    let batch = backend(&server)
        .create_batch(&admin, &CourseId::new("c1"), &draft)
        .await
        .unwrap();
    assert_eq!(batch.id.as_str(), "b1");
    assert_eq!(batch.course_id, CourseId::new("c1"));
}

#[tokio::test]
async fn list_batches_accepts_ongoing_batch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/courses/c1/batches"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"_id": "b1", "name": "Ongoing", "startDate": "2024-03-01"},
            {"_id": "b2", "name": "Spring", "startDate": "2024-03-01", "endDate": "2024-05-31"}
        ])))
        .mount(&server)
        .await;

    let admin = SessionContext::new(UserId::new("root"), Role::Admin, "tok");
    let batches = backend(&server)
        .list_batches(&admin, &CourseId::new("c1"))
        .await
        .unwrap();
    assert_eq!(batches.len(), 2);
    let ongoing = batches.iter().find(|b| b.id.as_str() == "b1").unwrap();
    assert_eq!(ongoing.name, "Ongoing");
    assert!(ongoing.end_date.is_none());
    let spring = batches.iter().find(|b| b.id.as_str() == "b2").unwrap();
    assert_eq!(spring.end_date, NaiveDate::from_ymd_opt(2024, 5, 31));
}

#[tokio::test]
async fn update_course_uses_patch() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/admin/courses/c1"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "c1",
            "title": "Advanced Node.js",
            "syllabus": ["Streams", "Clustering"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let admin = SessionContext::new(UserId::new("root"), Role::Admin, "tok");
    let draft = CourseDraft {
        title: "Advanced Node.js".into(),
        syllabus: vec!["Streams".into(), "Clustering".into()],
        ..CourseDraft::default()
    };
    let course = backend(&server)
        .update_course(&admin, &CourseId::new("c1"), &draft)
        .await
        .unwrap();
    assert_eq!(course.title(), "Advanced Node.js");
    assert_eq!(course.lesson_count(), 2);
}
