//! Dotenv file loading.

use std::path::{Path, PathBuf};

use tracing::debug;

/// Default environment file, relative to the working directory.
const DEFAULT_ENV_FILE: &str = "data_settings/.env";

/// Resolves the environment file path.
///
/// `MEDIA_TOOLKIT_ENV_FILE` overrides the default location.
pub fn env_file_path() -> PathBuf {
    std::env::var("MEDIA_TOOLKIT_ENV_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_ENV_FILE))
}

/// Loads the environment file if it exists.
///
/// Variables already present in the process environment win over file
/// entries. A missing file is not an error; the deployment may configure
/// everything through the service manager instead.
pub fn load_env_file() {
    let path = env_file_path();
    load_env_file_from(&path);
}

pub fn load_env_file_from(path: &Path) {
    if !path.is_file() {
        debug!("no environment file at {}", path.display());
        return;
    }
    match dotenv::from_path(path) {
        Ok(()) => debug!("loaded environment from {}", path.display()),
        Err(err) => debug!("skipping environment file {}: {err}", path.display()),
    }
}
