//! File-backed stores.
//!
//! Every store is a directory of JSON files. Writes go through a temp file
//! in the same directory followed by a rename, so readers never observe a
//! partial document.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use chrono::Utc;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tempfile::NamedTempFile;
use tracing::warn;
use uuid::Uuid;

use crate::archive::{ArchiveEntry, entry_id_base, is_valid_entry_id};
use crate::job::{Job, result_filename};
use crate::prelude::*;
use crate::transcript::ResultRecord;

/// Serializes `value` to `path` atomically.
pub fn atomic_write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = path.parent().ok_or(Error::InvalidFileName)?;
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, value)?;
    tmp.write_all(b"\n")?;
    tmp.persist(path)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let contents = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&contents) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("unreadable state file {}: {err}", path.display());
            None
        }
    }
}

/// Rejects names that could escape the store directory.
fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Job state files, one per job.
#[derive(Debug, Clone)]
pub struct JobStore {
    dir: PathBuf,
}

impl JobStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, job_id: &Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", job_id.simple()))
    }

    pub fn save(&self, job: &Job) -> Result<()> {
        atomic_write_json(&self.path_for(&job.id), job)
    }

    /// Loads persisted state; unreadable files count as absent, matching how
    /// the status endpoint degrades to probing the result file.
    pub fn load(&self, job_id: &Uuid) -> Option<Job> {
        let path = self.path_for(job_id);
        if !path.is_file() {
            return None;
        }
        read_json(&path)
    }
}

/// Metadata returned by the results listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultSummary {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtime: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    pub has_diarization: bool,
    pub words_count: usize,
    pub transcript_chars: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Finished transcription results.
#[derive(Debug, Clone)]
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Writes the result file for a job and returns its path.
    pub fn write(&self, record: &ResultRecord) -> Result<PathBuf> {
        let path = self.dir.join(result_filename(&record.job_id));
        atomic_write_json(&path, record)?;
        Ok(path)
    }

    /// Resolves a client-supplied file name inside the store.
    pub fn path_for(&self, filename: &str) -> Result<PathBuf> {
        if !is_safe_filename(filename) || !filename.ends_with(".json") {
            return Err(Error::InvalidFileName);
        }
        let path = self.dir.join(filename);
        if !path.is_file() {
            return Err(Error::EntryNotFound);
        }
        Ok(path)
    }

    /// Whether a result file for the job exists (used as the last status
    /// fallback when both memory and the job file are gone).
    pub fn exists_for(&self, job_id: &Uuid) -> Option<String> {
        let name = result_filename(job_id);
        self.dir.join(&name).is_file().then_some(name)
    }

    /// Lists result files, newest first, with best-effort metadata. A file
    /// that cannot be parsed still shows up, with the error noted.
    pub fn list(&self) -> Result<Vec<ResultSummary>> {
        let mut names: Vec<(PathBuf, i64)> = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let mtime = entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0);
            names.push((path, mtime));
        }
        names.sort_by(|a, b| b.1.cmp(&a.1));

        let mut items = Vec::with_capacity(names.len());
        for (path, mtime) in names {
            let filename = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            let mut summary = ResultSummary {
                filename,
                mtime: Some(mtime),
                size_bytes: fs::metadata(&path).ok().map(|m| m.len()),
                ..Default::default()
            };
            match fs::read_to_string(&path)
                .map_err(Error::from)
                .and_then(|s| serde_json::from_str::<ResultRecord>(&s).map_err(Error::from))
            {
                Ok(record) => {
                    summary.job_id = Some(record.job_id);
                    summary.created_at = Some(record.created_at);
                    summary.source_file = record.source_file;
                    summary.language_code = Some(record.params.language_code);
                    summary.transcript_chars = record.result.transcript.chars().count();
                    summary.words_count = record.result.diarization_words.len();
                    summary.has_diarization = !record.result.diarization_words.is_empty();
                }
                Err(err) => summary.error = Some(err.to_string()),
            }
            items.push(summary);
        }
        Ok(items)
    }
}

/// Per-user archive of prompt results (and optional synthesized audio).
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    root: PathBuf,
}

impl ArchiveStore {
    pub fn new(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn user_dir(&self, username: &str) -> PathBuf {
        self.root.join(username)
    }

    /// Stores a new entry, assigning a collision-free id, and returns it.
    pub fn save(
        &self,
        username: &str,
        prompt_id: &str,
        title: String,
        source_url: String,
        text: String,
        audio: Option<&[u8]>,
    ) -> Result<ArchiveEntry> {
        let dir = self.user_dir(username);
        fs::create_dir_all(&dir)?;

        let base = entry_id_base(prompt_id, Utc::now());
        let mut entry_id = base.clone();
        let mut counter = 1;
        while dir.join(format!("{entry_id}.json")).exists() {
            entry_id = format!("{base}_{counter}");
            counter += 1;
        }

        let audio_filename = match audio {
            Some(bytes) => {
                let name = format!("{entry_id}.mp3");
                fs::write(dir.join(&name), bytes)?;
                Some(name)
            }
            None => None,
        };

        let entry = ArchiveEntry {
            id: entry_id.clone(),
            prompt_id: prompt_id.to_string(),
            title,
            source_url,
            text,
            created_at: Utc::now().to_rfc3339(),
            audio_filename,
        };
        atomic_write_json(&dir.join(format!("{entry_id}.json")), &entry)?;
        Ok(entry)
    }

    /// Loads one entry, validating the id before touching the filesystem.
    pub fn load(&self, username: &str, entry_id: &str) -> Result<ArchiveEntry> {
        if !is_valid_entry_id(entry_id) {
            return Err(Error::InvalidEntryId);
        }
        let path = self.user_dir(username).join(format!("{entry_id}.json"));
        if !path.is_file() {
            return Err(Error::EntryNotFound);
        }
        read_json(&path).ok_or(Error::EntryNotFound)
    }

    /// Resolves the audio file recorded in an entry.
    pub fn audio_path(&self, username: &str, entry: &ArchiveEntry) -> Result<PathBuf> {
        let name = entry
            .audio_filename
            .as_deref()
            .ok_or(Error::EntryNotFound)?;
        if !is_safe_filename(name) {
            return Err(Error::InvalidFileName);
        }
        let path = self.user_dir(username).join(name);
        if !path.is_file() {
            return Err(Error::EntryNotFound);
        }
        Ok(path)
    }

    /// The user's entries, newest first by id (ids sort chronologically).
    pub fn list(&self, username: &str) -> Result<Vec<ArchiveEntry>> {
        let dir = self.user_dir(username);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut entries: Vec<ArchiveEntry> = Vec::new();
        for item in fs::read_dir(&dir)? {
            let path = item?.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            if let Some(entry) = read_json::<ArchiveEntry>(&path) {
                entries.push(entry);
            }
        }
        entries.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{JobSource, JobStatus, RecognitionParams};
    use crate::transcript::{Transcript, TranscriptAlternative};

    fn temp_store_dir() -> tempfile::TempDir {
        tempfile::tempdir().expect("tempdir")
    }

    #[test]
    fn job_store_roundtrip() -> Result<()> {
        let dir = temp_store_dir();
        let store = JobStore::new(dir.path().join("jobs"))?;

        let mut job = Job::new(
            JobSource::VideoUrl {
                url: "https://youtu.be/abc".into(),
            },
            RecognitionParams::default(),
        );
        store.save(&job)?;

        let loaded = store.load(&job.id).expect("job on disk");
        assert_eq!(loaded.status, JobStatus::Queued);
        assert_eq!(loaded.source, job.source);

        job.status = JobStatus::Error;
        job.error = Some("boom".into());
        store.save(&job)?;
        let loaded = store.load(&job.id).expect("job on disk");
        assert_eq!(loaded.status, JobStatus::Error);
        assert_eq!(loaded.error.as_deref(), Some("boom"));

        assert!(store.load(&Uuid::new_v4()).is_none());
        Ok(())
    }

    #[test]
    fn result_store_lists_metadata() -> Result<()> {
        let dir = temp_store_dir();
        let store = ResultStore::new(dir.path().join("results"))?;

        let record = ResultRecord {
            job_id: Uuid::new_v4(),
            source_file: Some("/tmp/audio.wav".into()),
            source_url: None,
            created_at: 1_700_000_000,
            params: RecognitionParams::default(),
            result: Transcript {
                transcript: "dzień dobry państwu".into(),
                alternatives: vec![TranscriptAlternative {
                    transcript: "dzień dobry państwu".into(),
                    confidence: 0.93,
                }],
                ..Default::default()
            },
        };
        let path = store.write(&record)?;
        assert!(path.is_file());

        let items = store.list()?;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].job_id, Some(record.job_id));
        assert_eq!(items[0].language_code.as_deref(), Some("pl-PL"));
        assert_eq!(items[0].transcript_chars, 19);
        assert!(!items[0].has_diarization);

        assert!(store.exists_for(&record.job_id).is_some());
        assert!(store.path_for(&result_filename(&record.job_id)).is_ok());
        assert!(matches!(
            store.path_for("../escape.json"),
            Err(Error::InvalidFileName)
        ));
        assert!(matches!(
            store.path_for("missing.json"),
            Err(Error::EntryNotFound)
        ));
        Ok(())
    }

    #[test]
    fn archive_store_assigns_unique_ids() -> Result<()> {
        let dir = temp_store_dir();
        let store = ArchiveStore::new(dir.path().join("output"))?;

        let first = store.save(
            "redakcja",
            "summary_pl",
            "Tytuł".into(),
            "https://example.pl/a".into(),
            "Streszczenie.".into(),
            None,
        )?;
        let second = store.save(
            "redakcja",
            "summary_pl",
            "Tytuł 2".into(),
            "https://example.pl/b".into(),
            "Inne streszczenie.".into(),
            Some(b"ID3 fake mp3"),
        )?;
        assert_ne!(first.id, second.id);
        assert!(second.audio_filename.is_some());

        let listed = store.list("redakcja")?;
        assert_eq!(listed.len(), 2);

        let loaded = store.load("redakcja", &second.id)?;
        assert_eq!(loaded.title, "Tytuł 2");
        let audio = store.audio_path("redakcja", &loaded)?;
        assert!(audio.is_file());

        assert!(matches!(
            store.load("redakcja", "../sneaky"),
            Err(Error::InvalidEntryId)
        ));
        assert!(store.list("nobody")?.is_empty());
        Ok(())
    }
}
