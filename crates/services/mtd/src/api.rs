//! HTTP API surface of the toolkit.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    middleware,
    routing::{get, post},
};
use mt_auth::{auth_body::AuthBody, users::Role};
use mt_stt::SpeechBackend;
use mt_web::{
    auth_token::LoginRequest,
    ctx::resolver::{login_user, logout_user, mw_ctx_resolver},
    mw_auth::mw_require_auth,
    require_role,
};
use serde_json::json;
use tokio::task::JoinHandle;
use tower_cookies::{CookieManagerLayer, Cookies};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::audiototext;
use crate::content;
use crate::prelude::*;
use crate::state::ApiState;

/// Every toolkit role may use the panel routes.
pub const ALL_ROLES: &[Role] = &[Role::Admin, Role::Redakcja, Role::Moderator, Role::Tester];

pub fn v1(path: &str) -> String {
    format!("/v1/{path}")
}

/// Builds the full application router over the given state.
pub fn router<B: SpeechBackend>(state: ApiState<B>) -> Router {
    let session_routes = Router::new()
        .route(&v1("login"), post(login::<B>))
        .route(&v1("logout"), post(logout));

    let audiototext_routes = Router::new()
        .route(&v1("audiototext/upload"), post(audiototext::upload::<B>))
        .route(
            &v1("audiototext/transcribe"),
            post(audiototext::transcribe::<B>),
        )
        .route(
            &v1("audiototext/youtube/start"),
            post(audiototext::youtube_start::<B>),
        )
        .route(&v1("audiototext/jobs/{id}"), get(audiototext::job_status::<B>))
        .route(&v1("audiototext/results"), get(audiototext::results_list::<B>))
        .route(
            &v1("audiototext/results/{filename}"),
            get(audiototext::download_result::<B>),
        )
        .route(&v1("audiototext/selftest"), get(audiototext::selftest::<B>))
        .route_layer(require_role!(ALL_ROLES))
        .route_layer(middleware::from_fn(mw_require_auth));

    let content_routes = Router::new()
        .route(&v1("content/prompts"), get(content::prompts_list::<B>))
        .route(&v1("content/scrap"), post(content::scrap_url::<B>))
        .route(&v1("content/apply-prompt"), post(content::apply_prompt::<B>))
        .route(&v1("content/archive"), get(content::archive_list::<B>))
        .route(
            &v1("content/archive/{entry_id}/text"),
            get(content::archive_text::<B>),
        )
        .route(
            &v1("content/archive/{entry_id}/audio"),
            get(content::archive_audio::<B>),
        )
        .route_layer(require_role!(ALL_ROLES))
        .route_layer(middleware::from_fn(mw_require_auth));

    let max_upload = state.config.server.max_upload_bytes;
    Router::new()
        .merge(session_routes)
        .merge(audiototext_routes)
        .merge(content_routes)
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(mw_ctx_resolver))
        .layer(CookieManagerLayer::new())
        .with_state(state)
}

/// Binds the listener and serves the API in a background task.
pub async fn setup_api<B: SpeechBackend>(state: ApiState<B>) -> Result<JoinHandle<Result<()>>> {
    let addr = format!(
        "{}:{}",
        state.config.server.host, state.config.server.port
    );
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::debug!("listening on {addr}");
    let handle = tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
        )
        .await?;
        Ok(())
    });

    Ok(handle)
}

async fn login<B: SpeechBackend>(
    State(state): State<ApiState<B>>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthBody>> {
    let body = login_user(&state.users, &payload, &cookies).map_err(Error::Web)?;
    tracing::info!("user {} logged in", payload.username);
    Ok(Json(body))
}

async fn logout(cookies: Cookies) -> Json<serde_json::Value> {
    logout_user(&cookies);
    Json(json!({ "ok": true }))
}
