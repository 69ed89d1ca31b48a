//! Transcription endpoints: uploads, direct recognition, jobs and results.

use std::collections::HashMap;
use std::path::PathBuf;

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use mt_models::job::{JobSource, JobStatus, RecognitionParams, result_filename};
use mt_stt::SpeechBackend;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::prelude::*;
use crate::state::ApiState;
use crate::worker::is_youtube_url;

/// Strips an uploaded filename down to a safe basename.
fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches(['.', '_']).is_empty() {
        "upload.bin".to_string()
    } else {
        cleaned
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "on" | "true" | "1" | "yes")
}

/// Accepts a multipart upload and queues a transcription job for it.
pub async fn upload<B: SpeechBackend>(
    State(state): State<ApiState<B>>,
    mut multipart: Multipart,
) -> Result<Response> {
    let mut saved: Option<PathBuf> = None;
    let mut params = RecognitionParams::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::BadRequest(e.to_string()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "audio_file" => {
                let filename = field
                    .file_name()
                    .map(sanitize_filename)
                    .filter(|n| !n.is_empty())
                    .ok_or_else(|| Error::BadRequest("No file selected".to_string()))?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::BadRequest(e.to_string()))?;
                let dest = state
                    .uploads_dir
                    .join(format!("{}_{filename}", Uuid::new_v4().simple()));
                tokio::fs::write(&dest, &bytes).await?;
                saved = Some(dest);
            }
            "language_code" => {
                let value = field.text().await.unwrap_or_default();
                if !value.trim().is_empty() {
                    params.language_code = value.trim().to_string();
                }
            }
            "diarization_speaker_count" => {
                let value = field.text().await.unwrap_or_default();
                params.diarization_speaker_count =
                    value.trim().parse::<u32>().ok().filter(|n| *n > 0);
            }
            "enable_word_time_offsets" => {
                let value = field.text().await.unwrap_or_default();
                params.enable_word_time_offsets = parse_flag(value.trim());
            }
            _ => {}
        }
    }

    let path = saved.ok_or_else(|| {
        Error::BadRequest("No file in field 'audio_file'".to_string())
    })?;

    let job = state
        .queue
        .create(JobSource::LocalFile { path }, params.normalized())
        .await?;
    tracing::info!(job_id = %job.id, "upload queued");

    let body = json!({
        "ok": true,
        "job_id": job.id,
        "status_url": state.with_prefix(&format!("/v1/audiototext/jobs/{}", job.id)),
    });
    Ok((StatusCode::ACCEPTED, Json(body)).into_response())
}

#[derive(Debug, Deserialize)]
pub struct TranscribeRequest {
    #[serde(flatten)]
    pub params: RecognitionParams,
    pub file_path: Option<PathBuf>,
    pub gcs_uri: Option<String>,
}

/// Runs recognition synchronously for a server-side file or a bucket object.
pub async fn transcribe<B: SpeechBackend>(
    State(state): State<ApiState<B>>,
    Json(req): Json<TranscribeRequest>,
) -> Result<Json<serde_json::Value>> {
    let params = req.params.normalized();
    let transcript = if let Some(path) = req.file_path {
        state.backend.transcribe_file(&path, &params).await?
    } else if let Some(uri) = req.gcs_uri {
        state.backend.transcribe_uri(&uri, &params).await?
    } else {
        return Err(Error::BadRequest(
            "Provide 'file_path' or 'gcs_uri'".to_string(),
        ));
    };

    Ok(Json(json!({ "ok": true, "result": transcript })))
}

#[derive(Debug, Deserialize)]
pub struct YoutubeStartRequest {
    #[serde(default)]
    pub youtube_url: String,
    #[serde(flatten)]
    pub params: RecognitionParams,
}

/// Queues a job that downloads a video's audio track and transcribes it.
pub async fn youtube_start<B: SpeechBackend>(
    State(state): State<ApiState<B>>,
    Json(req): Json<YoutubeStartRequest>,
) -> Result<Response> {
    let url = req.youtube_url.trim().to_string();
    if url.is_empty() {
        return Err(Error::BadRequest("Missing 'youtube_url'".to_string()));
    }
    if !is_youtube_url(&url) {
        return Err(Error::BadRequest(
            "Only YouTube URLs are supported".to_string(),
        ));
    }

    let job = state
        .queue
        .create(JobSource::VideoUrl { url }, req.params.normalized())
        .await?;
    tracing::info!(job_id = %job.id, "youtube job queued");

    let body = json!({
        "ok": true,
        "job_id": job.id,
        "status_url": state.with_prefix(&format!("/v1/audiototext/jobs/{}", job.id)),
    });
    Ok((StatusCode::ACCEPTED, Json(body)).into_response())
}

fn status_body<B: SpeechBackend>(
    state: &ApiState<B>,
    job: &mt_models::job::Job,
) -> serde_json::Value {
    match job.status {
        JobStatus::Done => {
            let filename = result_filename(&job.id);
            json!({
                "ok": true,
                "status": "done",
                "result_download": state.with_prefix(&format!(
                    "/v1/audiototext/results/{filename}"
                )),
            })
        }
        JobStatus::Error => json!({
            "ok": true,
            "status": "error",
            "error": job.error.as_deref().unwrap_or("unknown"),
        }),
        status => json!({ "ok": true, "status": status.as_str() }),
    }
}

/// Reports a job's state, consulting memory, the job store and the results.
pub async fn job_status<B: SpeechBackend>(
    State(state): State<ApiState<B>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let job_id = Uuid::parse_str(&id).map_err(|_| Error::JobNotFound)?;

    if let Some(job) = state.queue.get(&job_id).await {
        return Ok(Json(status_body(&state, &job)));
    }
    if let Some(job) = state.queue.load(&job_id) {
        return Ok(Json(status_body(&state, &job)));
    }
    if let Some(filename) = state.results.exists_for(&job_id) {
        return Ok(Json(json!({
            "ok": true,
            "status": "done",
            "result_download": state.with_prefix(&format!(
                "/v1/audiototext/results/{filename}"
            )),
        })));
    }

    Err(Error::JobNotFound)
}

/// Lists stored transcription results, newest first.
pub async fn results_list<B: SpeechBackend>(
    State(state): State<ApiState<B>>,
) -> Result<Json<serde_json::Value>> {
    let items = state.results.list()?;
    Ok(Json(json!({ "ok": true, "items": items })))
}

/// Serves a stored result file, as an attachment unless `raw` is requested.
pub async fn download_result<B: SpeechBackend>(
    State(state): State<ApiState<B>>,
    Path(filename): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response> {
    let path = state.results.path_for(&filename)?;
    let bytes = tokio::fs::read(&path).await?;

    let mut response =
        ([(header::CONTENT_TYPE, "application/json")], bytes).into_response();
    if !query.contains_key("raw") {
        // path_for only accepts a safe filename alphabet
        if let Ok(value) =
            header::HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        {
            response
                .headers_mut()
                .insert(header::CONTENT_DISPOSITION, value);
        }
    }
    Ok(response)
}

/// Round-trips a test object through the speech bucket.
pub async fn selftest<B: SpeechBackend>(
    State(state): State<ApiState<B>>,
) -> Result<Response> {
    let report = state.backend.self_test().await;
    let status = if report.ok {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok((status, Json(report)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(sanitize_filename("nagranie.mp3"), "nagranie.mp3");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("spacja w nazwie.wav"), "spacja_w_nazwie.wav");
        assert_eq!(sanitize_filename("..."), "upload.bin");
    }

    #[test]
    fn flags_accept_form_values() {
        assert!(parse_flag("on"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("off"));
        assert!(!parse_flag(""));
    }
}
