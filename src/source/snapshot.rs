//! Locating the last file-history snapshot in a log.
//!
//! Logs only ever grow, and the snapshot that matters is the most recent
//! one. Small files are scanned forward; large files are read backwards in
//! fixed-size chunks so only the tail is touched.

use crate::model::error::InputError;
use crate::parser::{decode_line, SNAPSHOT_MARKER};
use crate::source::file::open_lines;
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, trace};

/// Files at or above this size are scanned in reverse.
pub const DEFAULT_FORWARD_THRESHOLD: u64 = 50_000_000;

/// Reverse scan block size.
pub const DEFAULT_CHUNK_SIZE: usize = 1_048_576;

/// Scan strategy knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Files smaller than this are scanned forward.
    pub forward_threshold: u64,
    /// Bytes read per step of the reverse scan.
    pub chunk_size: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            forward_threshold: DEFAULT_FORWARD_THRESHOLD,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// One file tracked by the last snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditedFile {
    /// Path as recorded in the snapshot.
    pub path: String,
    /// Backup version counter, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

// ===== Line search =====

/// Last line containing `needle`, scanning forward. Returned trimmed.
///
/// # Errors
///
/// Returns `InputError` if the file cannot be opened.
pub fn forward_find(path: &Path, needle: &str) -> Result<Option<String>, InputError> {
    let mut last = None;
    for line in open_lines(path)? {
        if line.text.contains(needle) {
            last = Some(line.text);
        }
    }
    Ok(last.map(|l| l.trim().to_string()))
}

/// Last line containing `needle`, reading `chunk_size` bytes at a time from
/// the end. Returned trimmed.
///
/// Lines that straddle a block boundary are carried over to the next
/// (earlier) block, so the result is always the same as [`forward_find`].
///
/// # Errors
///
/// Returns `InputError` if the file cannot be opened, sought or read.
pub fn reverse_find(
    path: &Path,
    needle: &str,
    chunk_size: usize,
) -> Result<Option<String>, InputError> {
    let io_err = |e| InputError::from_io(path, e);
    let mut file = File::open(path).map_err(io_err)?;
    let mut pos = file.metadata().map_err(io_err)?.len();
    let chunk = chunk_size.max(1) as u64;
    let needle = needle.as_bytes();
    let mut remainder: Vec<u8> = Vec::new();

    while pos > 0 {
        let read_size = chunk.min(pos);
        pos -= read_size;
        file.seek(SeekFrom::Start(pos)).map_err(io_err)?;
        let mut block = vec![0u8; read_size as usize];
        file.read_exact(&mut block).map_err(io_err)?;
        block.extend_from_slice(&remainder);

        let mut segments: Vec<&[u8]> = block.split(|b| *b == b'\n').collect();
        // The first segment may continue into the previous block.
        let head = segments.remove(0);
        if let Some(found) = segments.iter().rev().find(|line| contains(line, needle)) {
            return Ok(Some(decode(found)));
        }
        remainder = head.to_vec();
    }

    Ok(contains(&remainder, needle).then(|| decode(&remainder)))
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}

fn decode(line: &[u8]) -> String {
    String::from_utf8_lossy(line).trim().to_string()
}

/// Last line containing `needle`, picking the scan direction by file size.
///
/// Unreadable files yield `None`.
pub fn find_last_line(path: &Path, needle: &str, opts: &ScanOptions) -> Option<String> {
    let size = match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(error) => {
            debug!(path = %path.display(), %error, "Cannot stat log");
            return None;
        }
    };
    let result = if size < opts.forward_threshold {
        trace!(path = %path.display(), size, "Forward snapshot scan");
        forward_find(path, needle)
    } else {
        debug!(path = %path.display(), size, chunk = opts.chunk_size, "Reverse snapshot scan");
        reverse_find(path, needle, opts.chunk_size)
    };
    result.unwrap_or_else(|error| {
        debug!(path = %path.display(), %error, "Snapshot scan failed");
        None
    })
}

// ===== Files changed =====

/// Files tracked by the last snapshot in the log, sorted by path.
///
/// With `with_versions`, each entry carries the backup's `version`
/// (1 when absent). A missing file, a log without snapshots or a snapshot
/// line that fails to decode all yield an empty list.
pub fn files_changed(path: &Path, with_versions: bool, opts: &ScanOptions) -> Vec<EditedFile> {
    let Some(line) = find_last_line(path, SNAPSHOT_MARKER, opts) else {
        return Vec::new();
    };
    let Some(record) = decode_line(&line) else {
        debug!(path = %path.display(), "Last snapshot line does not decode");
        return Vec::new();
    };
    let Some(backups) = record.tracked_file_backups() else {
        return Vec::new();
    };

    let mut paths: Vec<&String> = backups.keys().collect();
    paths.sort();
    paths
        .into_iter()
        .map(|file| EditedFile {
            path: file.clone(),
            version: with_versions.then(|| {
                backups
                    .get(file)
                    .and_then(|info| info.get("version"))
                    .and_then(Value::as_u64)
                    .unwrap_or(1)
            }),
        })
        .collect()
}
