//! End-to-end tests over the router with a fake recognizer.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use mt_config::config::{
    AppConfig, ContentConfig, DownloadConfig, ServerConfig, SttConfig, StorageConfig,
};
use mt_config::prompts::PromptCatalog;
use mt_content::service::ContentService;
use mt_models::job::{JobSource, JobStatus, RecognitionParams};
use mt_models::store::{ArchiveStore, JobStore, ResultStore};
use mt_models::transcript::Transcript;
use mt_stt::SpeechBackend;
use mt_stt::storage::SelfTestReport;
use mtd::api::router;
use mtd::state::ApiState;
use mtd::worker::TranscriptionQueue;
use serde_json::{Value, json};
use serial_test::serial;
use tempfile::TempDir;
use tower::ServiceExt;

/// Recognizer returning a canned transcript, or an empty one.
struct FakeRecognizer {
    transcript: Transcript,
}

impl FakeRecognizer {
    fn saying(text: &str) -> Self {
        Self {
            transcript: Transcript {
                transcript: text.to_string(),
                ..Transcript::default()
            },
        }
    }

    fn silent() -> Self {
        Self {
            transcript: Transcript::default(),
        }
    }
}

impl SpeechBackend for FakeRecognizer {
    async fn transcribe_file(
        &self,
        path: &Path,
        _params: &RecognitionParams,
    ) -> mt_stt::prelude::Result<Transcript> {
        if !path.is_file() {
            return Err(mt_stt::error::Error::AudioNotFound(
                path.display().to_string(),
            ));
        }
        Ok(self.transcript.clone())
    }

    async fn transcribe_uri(
        &self,
        _uri: &str,
        _params: &RecognitionParams,
    ) -> mt_stt::prelude::Result<Transcript> {
        Ok(self.transcript.clone())
    }

    async fn store_audio(&self, path: &Path) -> mt_stt::prelude::Result<String> {
        Ok(format!("gs://fake/{}", path.display()))
    }

    async fn self_test(&self) -> SelfTestReport {
        SelfTestReport {
            ok: true,
            bucket: "fake".to_string(),
            prefix: "stt_uploads".to_string(),
            test_blob: None,
            roundtrip_ms: Some(1),
            error: None,
        }
    }
}

fn test_config(data_dir: PathBuf) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            url_prefix: String::new(),
            max_upload_bytes: 10 * 1024 * 1024,
        },
        storage: StorageConfig { data_dir },
        stt: SttConfig {
            api_key: None,
            bucket: None,
            object_prefix: "stt_uploads".to_string(),
            inline_max_bytes: 10 * 1024 * 1024,
            default_language: "pl-PL".to_string(),
            lang_fallbacks: vec![],
        },
        content: ContentConfig {
            openai_api_key: None,
            model_version: "gpt-4o-mini".to_string(),
            tts_voice: "pl-PL-Wavenet-B".to_string(),
            tts_speaking_rate: 1.0,
        },
        download: DownloadConfig {
            cookies_file: None,
            cookies_from_browser: None,
        },
    }
}

struct TestApp {
    state: ApiState<FakeRecognizer>,
    _dir: TempDir,
}

fn build_app(backend: FakeRecognizer) -> TestApp {
    unsafe { std::env::set_var("JWT_SECRET", "test-secret") };

    let dir = TempDir::new().unwrap();
    let config = Arc::new(test_config(dir.path().to_path_buf()));
    let uploads_dir = config.storage.uploads_dir();
    std::fs::create_dir_all(&uploads_dir).unwrap();

    let jobs = JobStore::new(config.storage.jobs_dir()).unwrap();
    let results = ResultStore::new(config.storage.results_dir()).unwrap();
    let archive = ArchiveStore::new(config.storage.output_dir()).unwrap();
    let backend = Arc::new(backend);
    let (queue, _worker) = TranscriptionQueue::start(
        backend.clone(),
        jobs,
        results.clone(),
        uploads_dir.clone(),
        config.download.clone(),
    );

    let state = ApiState {
        config: config.clone(),
        users: Arc::new(mt_auth::users::UserRegistry::from_env()),
        catalog: Arc::new(PromptCatalog::default()),
        queue,
        backend,
        results,
        archive,
        content: Arc::new(ContentService::new(&config.content, None)),
        uploads_dir,
    };
    TestApp { state, _dir: dir }
}

fn app_router(app: &TestApp) -> Router {
    router(app.state.clone())
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn login(router: &Router) -> String {
    let response = router
        .clone()
        .oneshot(
            Request::post("/v1/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "username": "test", "password": "test" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    body["access_token"].as_str().unwrap().to_string()
}

fn authed(token: &str, builder: axum::http::request::Builder) -> axum::http::request::Builder {
    builder.header(header::AUTHORIZATION, format!("Bearer {token}"))
}

#[tokio::test]
#[serial]
async fn login_rejects_wrong_password() {
    let app = build_app(FakeRecognizer::saying("dzień dobry"));
    let router = app_router(&app);

    let response = router
        .oneshot(
            Request::post("/v1/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "username": "test", "password": "wrong" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[serial]
async fn protected_routes_require_a_session() {
    let app = build_app(FakeRecognizer::saying("dzień dobry"));
    let router = app_router(&app);

    let response = router
        .oneshot(
            Request::get("/v1/audiototext/results")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[serial]
async fn prompts_are_listed_for_logged_in_users() {
    let app = build_app(FakeRecognizer::saying("dzień dobry"));
    let router = app_router(&app);
    let token = login(&router).await;

    let response = router
        .oneshot(
            authed(&token, Request::get("/v1/content/prompts"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ok"], json!(true));
    assert!(!body["prompts"].as_array().unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn youtube_start_requires_a_youtube_url() {
    let app = build_app(FakeRecognizer::saying("dzień dobry"));
    let router = app_router(&app);
    let token = login(&router).await;

    let missing = router
        .clone()
        .oneshot(
            authed(&token, Request::post("/v1/audiototext/youtube/start"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "youtube_url": "" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let wrong_host = router
        .oneshot(
            authed(&token, Request::post("/v1/audiototext/youtube/start"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "youtube_url": "https://vimeo.com/123" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(wrong_host.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[serial]
async fn unknown_job_is_a_404() {
    let app = build_app(FakeRecognizer::saying("dzień dobry"));
    let router = app_router(&app);
    let token = login(&router).await;

    let response = router
        .oneshot(
            authed(
                &token,
                Request::get(format!(
                    "/v1/audiototext/jobs/{}",
                    uuid::Uuid::new_v4()
                )),
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[serial]
async fn archive_starts_empty() {
    let app = build_app(FakeRecognizer::saying("dzień dobry"));
    let router = app_router(&app);
    let token = login(&router).await;

    let response = router
        .oneshot(
            authed(&token, Request::get("/v1/content/archive"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["entries"], json!([]));
}

async fn wait_for_terminal(queue: &TranscriptionQueue, job_id: &uuid::Uuid) -> JobStatus {
    for _ in 0..100 {
        if let Some(job) = queue.get(job_id).await {
            match job.status {
                JobStatus::Done | JobStatus::Error => return job.status,
                _ => {}
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("job {job_id} never finished");
}

#[tokio::test]
#[serial]
async fn worker_transcribes_a_local_file() {
    let app = build_app(FakeRecognizer::saying("dzień dobry"));

    let audio = app.state.uploads_dir.join("sample.wav");
    std::fs::write(&audio, b"RIFF").unwrap();

    let job = app
        .state
        .queue
        .create(
            JobSource::LocalFile { path: audio },
            RecognitionParams::default(),
        )
        .await
        .unwrap();

    let status = wait_for_terminal(&app.state.queue, &job.id).await;
    assert_eq!(status, JobStatus::Done);

    let filename = app.state.results.exists_for(&job.id).unwrap();
    let path = app.state.results.path_for(&filename).unwrap();
    let record: Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(record["result"]["transcript"], json!("dzień dobry"));
}

#[tokio::test]
#[serial]
async fn empty_transcripts_fail_the_job() {
    let app = build_app(FakeRecognizer::silent());

    let audio = app.state.uploads_dir.join("silence.wav");
    std::fs::write(&audio, b"RIFF").unwrap();

    let job = app
        .state
        .queue
        .create(
            JobSource::LocalFile { path: audio },
            RecognitionParams::default(),
        )
        .await
        .unwrap();

    let status = wait_for_terminal(&app.state.queue, &job.id).await;
    assert_eq!(status, JobStatus::Error);

    let stored = app.state.queue.get(&job.id).await.unwrap();
    assert!(stored.error.unwrap().contains("Empty transcription result"));
}

const MULTIPART_BOUNDARY: &str = "toolkit-test-boundary";

fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Body {
    let mut body = Vec::new();
    for (name, filename, data) in parts {
        body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}\r\n").as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    Body::from(body)
}

#[tokio::test]
#[serial]
async fn upload_queues_a_transcription_job() {
    let app = build_app(FakeRecognizer::saying("dzień dobry"));
    let router = app_router(&app);
    let token = login(&router).await;

    let body = multipart_body(&[
        ("audio_file", Some("nagranie urywek.wav"), b"RIFFdata"),
        ("language_code", None, b"pl-PL"),
    ]);
    let response = router
        .oneshot(
            authed(&token, Request::post("/v1/audiototext/upload"))
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
                )
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    let job_id: uuid::Uuid = body["job_id"].as_str().unwrap().parse().unwrap();
    assert_eq!(
        body["status_url"],
        json!(format!("/v1/audiototext/jobs/{job_id}"))
    );

    // the saved upload keeps a sanitized basename
    let saved: Vec<_> = std::fs::read_dir(&app.state.uploads_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    assert!(saved.iter().any(|name| name.ends_with("_nagranie_urywek.wav")));

    let status = wait_for_terminal(&app.state.queue, &job_id).await;
    assert_eq!(status, JobStatus::Done);
    assert!(app.state.results.exists_for(&job_id).is_some());
}

#[tokio::test]
#[serial]
async fn upload_without_a_file_is_rejected() {
    let app = build_app(FakeRecognizer::saying("dzień dobry"));
    let router = app_router(&app);
    let token = login(&router).await;

    let body = multipart_body(&[("language_code", None, b"pl-PL")]);
    let response = router
        .oneshot(
            authed(&token, Request::post("/v1/audiototext/upload"))
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
                )
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[serial]
async fn transcribe_returns_the_result_synchronously() {
    let app = build_app(FakeRecognizer::saying("dzień dobry"));
    let router = app_router(&app);
    let token = login(&router).await;

    let audio = app.state.uploads_dir.join("sample.wav");
    std::fs::write(&audio, b"RIFF").unwrap();

    let response = router
        .oneshot(
            authed(&token, Request::post("/v1/audiototext/transcribe"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "file_path": audio, "language_code": "pl-PL" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["result"]["transcript"], json!("dzień dobry"));
}

#[tokio::test]
#[serial]
async fn transcribe_missing_file_is_a_404() {
    let app = build_app(FakeRecognizer::saying("dzień dobry"));
    let router = app_router(&app);
    let token = login(&router).await;

    let response = router
        .oneshot(
            authed(&token, Request::post("/v1/audiototext/transcribe"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "file_path": "/nie/ma/takiego.wav" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[serial]
async fn transcribe_requires_a_source() {
    let app = build_app(FakeRecognizer::saying("dzień dobry"));
    let router = app_router(&app);
    let token = login(&router).await;

    let response = router
        .oneshot(
            authed(&token, Request::post("/v1/audiototext/transcribe"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[serial]
async fn job_status_reports_a_finished_job() {
    let app = build_app(FakeRecognizer::saying("dzień dobry"));
    let router = app_router(&app);
    let token = login(&router).await;

    let audio = app.state.uploads_dir.join("sample.wav");
    std::fs::write(&audio, b"RIFF").unwrap();
    let job = app
        .state
        .queue
        .create(
            JobSource::LocalFile { path: audio },
            RecognitionParams::default(),
        )
        .await
        .unwrap();
    wait_for_terminal(&app.state.queue, &job.id).await;

    let response = router
        .oneshot(
            authed(
                &token,
                Request::get(format!("/v1/audiototext/jobs/{}", job.id)),
            )
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], json!("done"));
    assert!(
        body["result_download"]
            .as_str()
            .unwrap()
            .starts_with("/v1/audiototext/results/")
    );
}
