//! Content panel endpoints: scraping, prompt application and the archive.

use axum::{
    Json,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use mt_stt::SpeechBackend;
use mt_web::ctx::Ctx;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::prelude::*;
use crate::state::ApiState;

/// Lists the prompt templates available to the panel.
pub async fn prompts_list<B: SpeechBackend>(
    State(state): State<ApiState<B>>,
) -> Result<Json<Value>> {
    let prompts: Vec<Value> = state
        .catalog
        .prompts
        .iter()
        .map(|p| json!({ "id": p.id, "label": p.label }))
        .collect();
    Ok(Json(json!({ "ok": true, "prompts": prompts })))
}

#[derive(Debug, Deserialize)]
pub struct ScrapRequest {
    #[serde(default)]
    pub url: String,
}

/// Scrapes an article page into a title, summary text and media list.
pub async fn scrap_url<B: SpeechBackend>(
    State(state): State<ApiState<B>>,
    Json(req): Json<ScrapRequest>,
) -> Result<Json<Value>> {
    let url = req.url.trim();
    if url.is_empty() {
        return Err(Error::BadRequest("Missing 'url'".to_string()));
    }

    let payload = state.content.scrap_page(url, "pl").await?;
    Ok(Json(json!({ "ok": true, "payload": payload })))
}

#[derive(Debug, Deserialize)]
pub struct ApplyPromptRequest {
    pub prompt_id: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub text_to_speech: bool,
}

/// Runs a prompt template over scraped data and archives the result.
pub async fn apply_prompt<B: SpeechBackend>(
    State(state): State<ApiState<B>>,
    ctx: Ctx,
    Json(req): Json<ApplyPromptRequest>,
) -> Result<Json<Value>> {
    let prompt = state
        .catalog
        .get(&req.prompt_id)
        .ok_or(Error::PromptNotFound)?;

    let result_text = state.content.apply_prompt(prompt, &req.data).await?;

    let mut audio: Option<Vec<u8>> = None;
    let mut audio_error: Option<String> = None;
    if req.text_to_speech && !result_text.trim().is_empty() {
        match state.content.synthesize(&result_text).await {
            Ok(bytes) => audio = Some(bytes),
            Err(e) => {
                tracing::warn!("speech synthesis failed: {e}");
                audio_error = Some(e.to_string());
            }
        }
    }

    let title = req.data["title"].as_str().unwrap_or_default().to_string();
    let source_url = req.data["source_url"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    let entry = state.archive.save(
        &ctx.user,
        &req.prompt_id,
        title,
        source_url,
        result_text.clone(),
        audio.as_deref(),
    )?;
    tracing::info!(user = %ctx.user, entry_id = %entry.id, "prompt result archived");

    let mut body = json!({
        "ok": true,
        "result_text": result_text,
        "entry_id": entry.id,
        "text_url": state.with_prefix(&format!("/v1/content/archive/{}/text", entry.id)),
    });
    if let Some(bytes) = audio {
        body["audio_url"] =
            json!(state.with_prefix(&format!("/v1/content/archive/{}/audio", entry.id)));
        body["audio_base64"] = json!(BASE64.encode(&bytes));
    }
    if let Some(err) = audio_error {
        body["audio_error"] = json!(err);
    }
    Ok(Json(body))
}

/// Lists the calling user's archived entries, newest first.
pub async fn archive_list<B: SpeechBackend>(
    State(state): State<ApiState<B>>,
    ctx: Ctx,
) -> Result<Json<Value>> {
    let entries: Vec<Value> = state
        .archive
        .list(&ctx.user)?
        .iter()
        .map(|entry| {
            let mut item = json!({
                "id": entry.id,
                "prompt_id": entry.prompt_id,
                "title": entry.title,
                "created_at": entry.created_at,
                "text_url": state.with_prefix(&format!("/v1/content/archive/{}/text", entry.id)),
            });
            if entry.audio_filename.is_some() {
                item["audio_url"] = json!(
                    state.with_prefix(&format!("/v1/content/archive/{}/audio", entry.id))
                );
            }
            item
        })
        .collect();
    Ok(Json(json!({ "ok": true, "entries": entries })))
}

/// Returns a single archived entry's text and metadata.
pub async fn archive_text<B: SpeechBackend>(
    State(state): State<ApiState<B>>,
    ctx: Ctx,
    Path(entry_id): Path<String>,
) -> Result<Json<Value>> {
    let entry = state.archive.load(&ctx.user, &entry_id)?;
    let mut body = json!({
        "ok": true,
        "id": entry.id,
        "prompt_id": entry.prompt_id,
        "title": entry.title,
        "text": entry.text,
        "created_at": entry.created_at,
    });
    if entry.audio_filename.is_some() {
        body["audio_url"] =
            json!(state.with_prefix(&format!("/v1/content/archive/{}/audio", entry.id)));
    }
    Ok(Json(body))
}

fn audio_content_type(filename: &str) -> &'static str {
    if filename.ends_with(".ogg") {
        "audio/ogg"
    } else if filename.ends_with(".wav") {
        "audio/wav"
    } else {
        "audio/mpeg"
    }
}

/// Streams the synthesized audio stored with an archived entry.
pub async fn archive_audio<B: SpeechBackend>(
    State(state): State<ApiState<B>>,
    ctx: Ctx,
    Path(entry_id): Path<String>,
) -> Result<Response> {
    let entry = state.archive.load(&ctx.user, &entry_id)?;
    let path = state.archive.audio_path(&ctx.user, &entry)?;
    let bytes = tokio::fs::read(&path).await?;

    let content_type = entry
        .audio_filename
        .as_deref()
        .map(audio_content_type)
        .unwrap_or("audio/mpeg");
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_content_types() {
        assert_eq!(audio_content_type("entry.mp3"), "audio/mpeg");
        assert_eq!(audio_content_type("entry.ogg"), "audio/ogg");
        assert_eq!(audio_content_type("entry.wav"), "audio/wav");
    }
}
