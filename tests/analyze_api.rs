//! HTTP-level tests for POST /api/analyze.

use std::{
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use axum::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::util::ServiceExt;

use lenscritic::{
    app::build_app,
    config::{AppConfig, RetentionPolicy, ScorerCommand},
    scoring::{Aggregator, FeedbackResult, ScoreResult, ScoringFailure, ScoringJob},
    state::AppState,
    storage::{LocalStaging, StagingStore},
};

const BOUNDARY: &str = "lenscritic-test-boundary";

fn multipart_request(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/analyze")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

fn sh(script: &str) -> ScorerCommand {
    ScorerCommand::new("sh", &["-c", script, "scorer"])
}

const GOOD_FEEDBACK: &str =
    r#"printf '%s' '{"feedback":["Good composition"],"suggestion":"Try a wider aperture"}'"#;

fn process_app(upload_dir: &Path, aesthetic: &str, feedback: &str, retention: RetentionPolicy) -> Router {
    let mut config = AppConfig::local(upload_dir, sh(aesthetic), sh(feedback));
    config.retention = retention;
    build_app(AppState::from_config(config)).unwrap()
}

/// Counts invocations and returns a fixed result.
struct Spy<T> {
    calls: AtomicUsize,
    result: T,
}

#[async_trait]
impl<T: Clone + Send + Sync> ScoringJob for Spy<T> {
    type Output = T;

    async fn run(&self, _image: &Path) -> Result<T, ScoringFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.result.clone())
    }
}

struct SpiedApp {
    app: Router,
    aesthetic: Arc<Spy<ScoreResult>>,
    feedback: Arc<Spy<FeedbackResult>>,
}

impl SpiedApp {
    fn new(upload_dir: &Path) -> Self {
        let aesthetic = Arc::new(Spy {
            calls: AtomicUsize::new(0),
            result: ScoreResult { score: 4 },
        });
        let feedback = Arc::new(Spy {
            calls: AtomicUsize::new(0),
            result: FeedbackResult {
                feedback: vec![],
                suggestion: "Crop tighter".into(),
            },
        });
        let config = AppConfig::local(upload_dir, sh("true"), sh("true"));
        let staging = Arc::new(LocalStaging::new(upload_dir)) as Arc<dyn StagingStore>;
        let state = AppState::from_parts(
            Arc::new(config),
            staging,
            Aggregator::new(aesthetic.clone(), feedback.clone()),
        );
        Self {
            app: build_app(state).unwrap(),
            aesthetic,
            feedback,
        }
    }

    fn calls(&self) -> (usize, usize) {
        (
            self.aesthetic.calls.load(Ordering::SeqCst),
            self.feedback.calls.load(Ordering::SeqCst),
        )
    }
}

fn staged_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

#[cfg(unix)]
#[tokio::test]
async fn photo_is_scored_and_merged() {
    let tmp = tempfile::tempdir().unwrap();
    let uploads = tmp.path().join("uploads");
    let app = process_app(&uploads, "echo 7", GOOD_FEEDBACK, RetentionPolicy::Delete);

    let photo = vec![0xABu8; 2 * 1024 * 1024];
    let response = app
        .oneshot(multipart_request("image", "photo.jpg", "image/jpeg", &photo))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(
        body,
        json!({"score": 7, "feedback": ["Good composition"], "improvement": "Try a wider aperture"})
    );
    assert_eq!(staged_files(&uploads), 0, "staged upload should be cleaned up");
}

#[cfg(unix)]
#[tokio::test]
async fn retained_uploads_stay_on_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let uploads = tmp.path().join("uploads");
    let app = process_app(&uploads, "echo 3", "echo '{}'", RetentionPolicy::Retain);

    let response = app
        .oneshot(multipart_request("image", "shot.png", "image/png", b"png-bytes"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["score"], 3);
    assert_eq!(body["feedback"], json!([]));
    assert_eq!(body["improvement"], "No specific improvements suggested.");

    let names: Vec<String> = std::fs::read_dir(&uploads)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 1);
    assert!(names[0].ends_with(".png"));
}

#[cfg(unix)]
#[tokio::test]
async fn failing_aesthetic_scorer_yields_generic_500() {
    let tmp = tempfile::tempdir().unwrap();
    let app = process_app(tmp.path(), "echo boom >&2; exit 1", GOOD_FEEDBACK, RetentionPolicy::Delete);

    let response = app
        .oneshot(multipart_request("image", "photo.jpg", "image/jpeg", b"jpeg"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body, json!({"error": "Failed to analyze image"}));
}

#[cfg(unix)]
#[tokio::test]
async fn unparseable_feedback_yields_generic_500() {
    let tmp = tempfile::tempdir().unwrap();
    let app = process_app(tmp.path(), "echo 7", "echo 'not json'", RetentionPolicy::Delete);

    let response = app
        .oneshot(multipart_request("image", "photo.jpg", "image/jpeg", b"jpeg"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Failed to analyze image");
}

#[tokio::test]
async fn pdf_is_rejected_without_scoring() {
    let tmp = tempfile::tempdir().unwrap();
    let spied = SpiedApp::new(tmp.path());

    let response = spied
        .app
        .clone()
        .oneshot(multipart_request("image", "doc.pdf", "application/pdf", b"%PDF-1.4"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body, json!({"error": "Only JPG and PNG image files are allowed"}));
    assert_eq!(spied.calls(), (0, 0));
    assert_eq!(staged_files(tmp.path()), 0);
}

#[tokio::test]
async fn oversized_upload_is_rejected_without_scoring() {
    let tmp = tempfile::tempdir().unwrap();
    let spied = SpiedApp::new(tmp.path());

    let big = vec![0u8; 10 * 1024 * 1024 + 1];
    let response = spied
        .app
        .clone()
        .oneshot(multipart_request("image", "huge.jpg", "image/jpeg", &big))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "File too large (max 10 MiB)");
    assert_eq!(spied.calls(), (0, 0));
}

#[tokio::test]
async fn missing_image_field_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let spied = SpiedApp::new(tmp.path());

    let response = spied
        .app
        .clone()
        .oneshot(multipart_request("photo", "photo.jpg", "image/jpeg", b"jpeg"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "No image file uploaded");
    assert_eq!(spied.calls(), (0, 0));
}

#[tokio::test]
async fn non_multipart_body_gets_json_error() {
    let tmp = tempfile::tempdir().unwrap();
    let spied = SpiedApp::new(tmp.path());

    let response = spied
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/analyze")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "No image file uploaded");
    assert_eq!(spied.calls(), (0, 0));
}

#[tokio::test]
async fn exactly_ten_mib_is_accepted_and_both_jobs_run_once() {
    let tmp = tempfile::tempdir().unwrap();
    let spied = SpiedApp::new(tmp.path());

    let max = vec![0u8; 10 * 1024 * 1024];
    let response = spied
        .app
        .clone()
        .oneshot(multipart_request("image", "max.jpg", "image/jpg", &max))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body, json!({"score": 4, "feedback": [], "improvement": "Crop tighter"}));
    assert_eq!(spied.calls(), (1, 1));
}

#[tokio::test]
async fn health_endpoint() {
    let tmp = tempfile::tempdir().unwrap();
    let spied = SpiedApp::new(tmp.path());

    let response = spied
        .app
        .clone()
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}
