//! Media Toolkit daemon entry point.
//!
//! Initializes logging, loads the dotenv file and configuration, wires the
//! speech backend, content service and stores together, then runs the
//! transcription worker and the API server until shutdown.

use std::path::Path;
use std::sync::Arc;

use mt_config::{AppConfig, env_file::env_file_path, load_env_file, prompts::load_catalog};
use mt_content::service::ContentService;
use mt_models::store::{ArchiveStore, JobStore, ResultStore};
use mt_stt::GoogleSpeech;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mtd::api::setup_api;
use mtd::prelude::*;
use mtd::state::ApiState;
use mtd::worker::TranscriptionQueue;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}=debug,tower_http=debug", env!("CARGO_CRATE_NAME")).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    load_env_file();
    let config = Arc::new(AppConfig::from_env());
    let users = Arc::new(mt_auth::users::UserRegistry::from_env());

    let settings_dir = env_file_path();
    let settings_dir = settings_dir.parent().unwrap_or(Path::new("."));
    let catalog = Arc::new(load_catalog(settings_dir));

    let uploads_dir = config.storage.uploads_dir();
    std::fs::create_dir_all(&uploads_dir)?;
    let jobs = JobStore::new(config.storage.jobs_dir())?;
    let results = ResultStore::new(config.storage.results_dir())?;
    let archive = ArchiveStore::new(config.storage.output_dir())?;

    let backend = Arc::new(GoogleSpeech::from_config(&config.stt)?);
    let content = Arc::new(ContentService::new(
        &config.content,
        config.stt.api_key.as_deref(),
    ));

    let (queue, worker_handle) = TranscriptionQueue::start(
        backend.clone(),
        jobs,
        results.clone(),
        uploads_dir.clone(),
        config.download.clone(),
    );

    let state = ApiState {
        config,
        users,
        catalog,
        queue,
        backend,
        results,
        archive,
        content,
        uploads_dir,
    };
    let api_handle = setup_api(state).await?;

    tokio::select! {
        result = worker_handle => {
            tracing::error!("Transcription worker stopped: {:?}", result);
        }
        result = api_handle => {
            tracing::error!("API server stopped: {:?}", result);
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
        }
    }

    Ok(())
}
