//! Shared state behind the API routes.

use std::path::PathBuf;
use std::sync::Arc;

use mt_auth::users::UserRegistry;
use mt_config::{AppConfig, PromptCatalog};
use mt_content::ContentService;
use mt_models::store::{ArchiveStore, ResultStore};
use mt_stt::SpeechBackend;

use crate::worker::TranscriptionQueue;

/// Everything the handlers need. Generic over the speech backend so tests
/// can run against a fake recognizer.
pub struct ApiState<B: SpeechBackend> {
    pub config: Arc<AppConfig>,
    pub users: Arc<UserRegistry>,
    pub catalog: Arc<PromptCatalog>,
    pub queue: TranscriptionQueue,
    pub backend: Arc<B>,
    pub results: ResultStore,
    pub archive: ArchiveStore,
    pub content: Arc<ContentService>,
    pub uploads_dir: PathBuf,
}

// Derived Clone would require B: Clone; the backend is always shared through
// the Arc.
impl<B: SpeechBackend> Clone for ApiState<B> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            users: self.users.clone(),
            catalog: self.catalog.clone(),
            queue: self.queue.clone(),
            backend: self.backend.clone(),
            results: self.results.clone(),
            archive: self.archive.clone(),
            content: self.content.clone(),
            uploads_dir: self.uploads_dir.clone(),
        }
    }
}

impl<B: SpeechBackend> ApiState<B> {
    /// Prepends the public URL prefix when the service sits behind a proxy.
    pub fn with_prefix(&self, path: &str) -> String {
        let prefix = &self.config.server.url_prefix;
        if prefix.is_empty() || !path.starts_with('/') {
            path.to_string()
        } else {
            format!("{prefix}{path}")
        }
    }
}
