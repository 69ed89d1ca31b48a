//! Background transcription queue and worker.
//!
//! Jobs are created by the routes, queued over a channel, and processed one
//! at a time. Every state transition is mirrored to the job store so status
//! queries survive a restart.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use mt_config::config::DownloadConfig;
use mt_io::tools::{DownloadCookies, download_video_audio};
use mt_models::job::{Job, JobSource, JobStatus, RecognitionParams};
use mt_models::store::{JobStore, ResultStore};
use mt_models::transcript::ResultRecord;
use mt_stt::SpeechBackend;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::prelude::*;

const QUEUE_CAPACITY: usize = 64;

/// Handle used by the routes to enqueue jobs and query their state.
#[derive(Clone)]
pub struct TranscriptionQueue {
    jobs: Arc<Mutex<HashMap<Uuid, Job>>>,
    tx: mpsc::Sender<Job>,
    store: JobStore,
}

impl TranscriptionQueue {
    /// Builds the queue and spawns its worker task.
    pub fn start<B: SpeechBackend>(
        backend: Arc<B>,
        store: JobStore,
        results: ResultStore,
        uploads_dir: PathBuf,
        download: DownloadConfig,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let queue = Self {
            jobs: Arc::new(Mutex::new(HashMap::new())),
            tx,
            store,
        };
        let worker = Worker {
            backend,
            results,
            queue: queue.clone(),
            uploads_dir,
            cookies: DownloadCookies {
                cookies_file: download.cookies_file,
                from_browser: download.cookies_from_browser,
            },
        };
        let handle = tokio::spawn(worker.run(rx));
        (queue, handle)
    }

    /// Creates a job, persists it, and hands it to the worker.
    pub async fn create(&self, source: JobSource, params: RecognitionParams) -> Result<Job> {
        let job = Job::new(source, params);
        self.remember(&job).await;
        self.tx
            .send(job.clone())
            .await
            .map_err(|_| Error::QueueClosed)?;
        info!("job {} queued", job.id);
        Ok(job)
    }

    /// In-memory state of a job, when this process created it.
    pub async fn get(&self, job_id: &Uuid) -> Option<Job> {
        self.jobs.lock().await.get(job_id).cloned()
    }

    /// Persisted state of a job, surviving restarts.
    pub fn load(&self, job_id: &Uuid) -> Option<Job> {
        self.store.load(job_id)
    }

    async fn remember(&self, job: &Job) {
        self.jobs.lock().await.insert(job.id, job.clone());
        if let Err(err) = self.store.save(job) {
            warn!("could not persist job {}: {err}", job.id);
        }
    }
}

struct Worker<B: SpeechBackend> {
    backend: Arc<B>,
    results: ResultStore,
    queue: TranscriptionQueue,
    uploads_dir: PathBuf,
    cookies: DownloadCookies,
}

impl<B: SpeechBackend> Worker<B> {
    async fn run(self, mut rx: mpsc::Receiver<Job>) {
        while let Some(mut job) = rx.recv().await {
            job.status = JobStatus::Processing;
            job.touch();
            self.queue.remember(&job).await;
            info!("job {} processing", job.id);

            match self.process(&mut job).await {
                Ok(result_path) => {
                    job.result_path = Some(result_path);
                    job.status = JobStatus::Done;
                    info!("job {} done", job.id);
                }
                Err(err) => {
                    error!("job {} failed: {err}", job.id);
                    job.status = JobStatus::Error;
                    job.error = Some(err.to_string());
                }
            }
            job.touch();
            self.queue.remember(&job).await;
        }
        info!("transcription queue closed, worker exiting");
    }

    async fn process(&self, job: &mut Job) -> Result<PathBuf> {
        let transcript = match job.source.clone() {
            JobSource::VideoUrl { url } => {
                if !is_youtube_url(&url) {
                    return Err(Error::Download("URL does not look like YouTube".to_string()));
                }
                info!("job {}: downloading audio from {url}", job.id);
                let out_dir = self.uploads_dir.clone();
                let cookies = self.cookies.clone();
                let target = url.clone();
                let audio =
                    tokio::task::spawn_blocking(move || {
                        download_video_audio(&target, &out_dir, &cookies)
                    })
                    .await
                    .map_err(|err| Error::Download(err.to_string()))??;
                job.audio_path = Some(audio.clone());
                job.touch();
                self.queue.remember(job).await;

                let uri = self.backend.store_audio(&audio).await?;
                job.bucket_uri = Some(uri.clone());
                job.touch();
                self.queue.remember(job).await;

                self.backend.transcribe_uri(&uri, &job.params).await?
            }
            JobSource::BucketUri { uri } => {
                job.bucket_uri = Some(uri.clone());
                self.backend.transcribe_uri(&uri, &job.params).await?
            }
            JobSource::LocalFile { path } => self.backend.transcribe_file(&path, &job.params).await?,
        };

        if transcript.is_empty() {
            return Err(Error::EmptyTranscript);
        }

        let record = ResultRecord {
            job_id: job.id,
            source_file: job
                .audio_path
                .as_ref()
                .map(|path| path.display().to_string())
                .or_else(|| job.bucket_uri.clone()),
            source_url: match &job.source {
                JobSource::VideoUrl { url } => Some(url.clone()),
                _ => None,
            },
            created_at: Utc::now().timestamp(),
            params: job.params.clone(),
            result: transcript,
        };
        Ok(self.results.write(&record)?)
    }
}

/// Only YouTube page URLs are accepted for the download flow.
pub fn is_youtube_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    let Some(rest) = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
    else {
        return false;
    };
    let rest = rest.strip_prefix("www.").unwrap_or(rest);
    rest.starts_with("youtube.com/") || rest.starts_with("youtu.be/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn youtube_url_validation() {
        assert!(is_youtube_url("https://www.youtube.com/watch?v=abc123"));
        assert!(is_youtube_url("https://youtu.be/abc123"));
        assert!(is_youtube_url("HTTP://YOUTUBE.COM/watch?v=abc"));
        assert!(!is_youtube_url("https://example.com/watch?v=abc"));
        assert!(!is_youtube_url("ftp://youtube.com/abc"));
        assert!(!is_youtube_url("youtube.com/watch?v=abc"));
    }
}
