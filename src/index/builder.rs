//! Fallback session index.
//!
//! For a project directory without `sessions-index.json`, every log is
//! scanned once and summarized as a [`SessionMeta`]. The result is cached
//! in [`CACHE_FILE_NAME`] next to the logs and served again as long as the
//! cache file is at least as new as the newest log.
//!
//! The cache is an optimization only. Read failures are cache misses and
//! write failures are logged and ignored; its content can always be
//! derived again from the logs.

use crate::model::error::CacheError;
use crate::model::stats::is_countable_user_turn;
use crate::model::text::truncate_chars;
use crate::model::{ContentBlock, MessageContent, Record, RecordType, SessionMeta};
use crate::parser::RecordFilter;
use crate::resolve::{decode_project_dir_name, session_files};
use crate::source::file::RecordStream;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// Cache file written into each project directory.
pub const CACHE_FILE_NAME: &str = ".echo-sleuth-index.json";

/// Characters of the first prompt kept.
pub const FIRST_PROMPT_MAX: usize = 180;

/// Prompts shorter than this are not worth showing.
const FIRST_PROMPT_MIN: usize = 3;

// ===== SessionDigest =====

/// Per-file accumulator behind one [`SessionMeta`].
///
/// Uses the same countable-turn rules as the session statistics, without
/// token or tool accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionDigest {
    first_ts: String,
    last_ts: String,
    message_count: u64,
    git_branch: String,
    summary: String,
    first_prompt: String,
}

impl SessionDigest {
    /// Empty digest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one record.
    pub fn record(&mut self, record: &Record) {
        let ts = record.timestamp();
        if !ts.is_empty() {
            if self.first_ts.is_empty() || ts < self.first_ts.as_str() {
                self.first_ts = ts.to_string();
            }
            if ts > self.last_ts.as_str() {
                self.last_ts = ts.to_string();
            }
        }
        if self.git_branch.is_empty() {
            self.git_branch = record.git_branch().to_string();
        }

        match record.kind() {
            RecordType::User => self.record_user(record),
            RecordType::Assistant => {
                if !record.has_malformed_message() && !record.is_synthetic() {
                    self.message_count += 1;
                }
            }
            RecordType::Summary => self.summary = record.summary().to_string(),
            _ => {}
        }
    }

    fn record_user(&mut self, record: &Record) {
        if record.is_meta_user() || record.is_compact_summary() || record.has_malformed_message() {
            return;
        }
        if !is_countable_user_turn(record) {
            return;
        }
        self.message_count += 1;
        if self.first_prompt.is_empty() {
            if let Some(prompt) = prompt_candidate(record) {
                self.first_prompt = prompt;
            }
        }
    }

    /// Countable turns seen so far.
    pub fn message_count(&self) -> u64 {
        self.message_count
    }

    /// First prompt accepted so far (empty if none).
    pub fn first_prompt(&self) -> &str {
        &self.first_prompt
    }

    /// Finish into metadata for the file at `full_path`.
    pub fn into_meta(self, session_id: String, full_path: String, project_path: String) -> SessionMeta {
        SessionMeta {
            session_id,
            full_path,
            created: self.first_ts,
            modified: self.last_ts,
            message_count: self.message_count,
            git_branch: self.git_branch,
            summary: self.summary,
            first_prompt: self.first_prompt,
            project_path,
        }
    }
}

/// The prompt text of a user record, if it qualifies as a first prompt.
///
/// Text blocks are joined with spaces. Injected markup (leading `<`) and
/// very short prompts are rejected.
fn prompt_candidate(record: &Record) -> Option<String> {
    let joined;
    let text = match record.content() {
        MessageContent::Text(s) => s.trim(),
        content @ MessageContent::Blocks(_) => {
            joined = content
                .blocks()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } if !text.is_empty() => Some(text),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(" ");
            joined.trim()
        }
        MessageContent::Empty => return None,
    };
    if text.starts_with('<') || text.chars().count() < FIRST_PROMPT_MIN {
        return None;
    }
    Some(truncate_chars(text, FIRST_PROMPT_MAX).to_string())
}

// ===== Building =====

/// Summarize one log file, or `None` if it cannot be opened.
pub fn digest_session(path: &Path, project_path: &str) -> Option<SessionMeta> {
    let stream = match RecordStream::open(path, RecordFilter::new()) {
        Ok(stream) => stream,
        Err(error) => {
            debug!(path = %path.display(), %error, "Skipping unreadable log");
            return None;
        }
    };
    let mut digest = SessionDigest::new();
    for record in stream {
        digest.record(&record);
    }
    let session_id = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    Some(digest.into_meta(
        session_id,
        path.display().to_string(),
        project_path.to_string(),
    ))
}

/// Derive (or load from cache) the metadata of every session in `project_dir`.
///
/// Logs are visited in name order. Files under a `subagents` directory are
/// skipped. A directory without logs yields an empty list and writes no
/// cache.
pub fn build_fallback_index(project_dir: impl AsRef<Path>) -> Vec<SessionMeta> {
    let project_dir = project_dir.as_ref();
    let files = session_files(project_dir);
    if files.is_empty() {
        return Vec::new();
    }

    let cache_path = project_dir.join(CACHE_FILE_NAME);
    let newest = newest_mtime(&files);
    if is_fresh(&cache_path, newest) {
        match read_cache(&cache_path) {
            Ok(entries) => {
                debug!(path = %cache_path.display(), entries = entries.len(), "Index cache hit");
                return entries;
            }
            Err(error) => debug!(%error, "Index cache unusable, rebuilding"),
        }
    } else {
        debug!(dir = %project_dir.display(), "Index cache missing or stale");
    }

    let dir_name = project_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let project_path = decode_project_dir_name(&dir_name);

    let entries: Vec<SessionMeta> = files
        .iter()
        .filter_map(|path| digest_session(path, &project_path))
        .collect();

    if let Err(error) = write_cache(&cache_path, &entries) {
        warn!(%error, "Failed to write index cache");
    }
    entries
}

/// Latest modification time among `files`; unreadable times are ignored.
fn newest_mtime(files: &[PathBuf]) -> Option<SystemTime> {
    files
        .iter()
        .filter_map(|path| fs::metadata(path).and_then(|m| m.modified()).ok())
        .max()
}

fn is_fresh(cache_path: &Path, newest: Option<SystemTime>) -> bool {
    let Ok(cache_mtime) = fs::metadata(cache_path).and_then(|m| m.modified()) else {
        return false;
    };
    newest.map_or(true, |newest| cache_mtime >= newest)
}

fn read_cache(cache_path: &Path) -> Result<Vec<SessionMeta>, CacheError> {
    let raw = fs::read_to_string(cache_path).map_err(|source| CacheError::Io {
        path: cache_path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CacheError::Corrupt {
        path: cache_path.to_path_buf(),
        source,
    })
}

fn write_cache(cache_path: &Path, entries: &[SessionMeta]) -> Result<(), CacheError> {
    let encoded = serde_json::to_vec(entries).map_err(|source| CacheError::Encode {
        path: cache_path.to_path_buf(),
        source,
    })?;
    fs::write(cache_path, encoded).map_err(|source| CacheError::Io {
        path: cache_path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
