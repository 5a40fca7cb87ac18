//! Mapping project paths to log directories.
//!
//! Claude Code stores each project's logs in a directory named after the
//! project path with every `/` replaced by `-`. The encoding is lossy (a
//! literal `-` in a path segment is indistinguishable from a separator), so
//! resolution falls back through four tiers:
//!
//! 1. Exact encoding of the path
//! 2. Exact encoding of the path with trailing separators stripped
//! 3. A directory whose `sessions-index.json` names the path as `originalPath`
//! 4. Fuzzy: the path's components appear contiguously in a directory name's
//!    `-`-separated components
//!
//! Directory listings are sorted by name, so "first match" is deterministic.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the externally produced per-project index.
pub const INDEX_FILE_NAME: &str = "sessions-index.json";

/// Directory that holds a session's subagent transcripts.
pub const SUBAGENTS_DIR_NAME: &str = "subagents";

// ===== Encoding =====

/// Encode a project path as a log directory name.
///
/// `/Users/me/proj` becomes `-Users-me-proj`. The result always starts
/// with `-`.
pub fn encode_project_path(project_path: &str) -> String {
    let encoded = project_path.replace('/', "-");
    if encoded.starts_with('-') {
        encoded
    } else {
        format!("-{encoded}")
    }
}

/// Best-effort inverse of [`encode_project_path`].
///
/// Every `-` becomes `/`, so `-home-me-my-proj` decodes to
/// `/home/me/my/proj`. Names without a leading `-` are returned unchanged.
pub fn decode_project_dir_name(dir_name: &str) -> String {
    match dir_name.strip_prefix('-') {
        Some(_) => format!("/{}", dir_name.trim_start_matches('-').replace('-', "/")),
        None => dir_name.to_string(),
    }
}

/// True when `needle` occurs as a contiguous run inside `haystack`.
pub fn contiguous_match<T: PartialEq>(needle: &[T], haystack: &[T]) -> bool {
    if needle.is_empty() {
        return true;
    }
    needle.len() <= haystack.len() && haystack.windows(needle.len()).any(|w| w == needle)
}

// ===== Resolution =====

/// How a project path was matched to a log directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Tier 1 or 2: the encoded path names an existing directory.
    Exact(PathBuf),
    /// Tier 3: a directory's index file claims the path.
    Indexed(PathBuf),
    /// Tier 4: contiguous component match.
    Fuzzy(PathBuf),
    /// No directory matched.
    Unresolved,
}

impl Resolution {
    /// The matched directory, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Resolution::Exact(p) | Resolution::Indexed(p) | Resolution::Fuzzy(p) => Some(p),
            Resolution::Unresolved => None,
        }
    }

    /// Consume into the matched directory, if any.
    pub fn into_path(self) -> Option<PathBuf> {
        match self {
            Resolution::Exact(p) | Resolution::Indexed(p) | Resolution::Fuzzy(p) => Some(p),
            Resolution::Unresolved => None,
        }
    }

    /// True unless [`Resolution::Unresolved`].
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Resolution::Unresolved)
    }
}

/// Only the field of `sessions-index.json` the resolver needs.
#[derive(Debug, Deserialize)]
struct OriginalPathProbe {
    #[serde(rename = "originalPath", default)]
    original_path: Option<String>,
}

/// Resolves project paths against one projects directory.
#[derive(Debug, Clone)]
pub struct ProjectResolver {
    projects_dir: PathBuf,
}

impl ProjectResolver {
    /// Resolver rooted at `projects_dir` (normally `~/.claude/projects`).
    pub fn new(projects_dir: impl Into<PathBuf>) -> Self {
        Self {
            projects_dir: projects_dir.into(),
        }
    }

    /// The root this resolver searches.
    pub fn projects_dir(&self) -> &Path {
        &self.projects_dir
    }

    /// Every log directory under the root, sorted by name.
    pub fn project_dirs(&self) -> Vec<PathBuf> {
        all_project_dirs(&self.projects_dir)
    }

    /// Map a project path to its log directory. First matching tier wins.
    pub fn resolve(&self, target: &str) -> Resolution {
        if !self.projects_dir.is_dir() {
            debug!(dir = %self.projects_dir.display(), "Projects directory missing");
            return Resolution::Unresolved;
        }

        let exact = self.projects_dir.join(encode_project_path(target));
        if exact.is_dir() {
            debug!(project = target, dir = %exact.display(), "Resolved by exact encoding");
            return Resolution::Exact(exact);
        }

        let stripped = target.trim_end_matches('/');
        let exact = self.projects_dir.join(encode_project_path(stripped));
        if exact.is_dir() {
            debug!(project = target, dir = %exact.display(), "Resolved by stripped encoding");
            return Resolution::Exact(exact);
        }

        let dirs = self.project_dirs();

        if let Some(dir) = dirs
            .iter()
            .find(|dir| index_claims(dir, target, stripped))
        {
            debug!(project = target, dir = %dir.display(), "Resolved by index originalPath");
            return Resolution::Indexed(dir.clone());
        }

        let target_parts: Vec<&str> = stripped.trim_matches('/').split('/').collect();
        let fuzzy = dirs.into_iter().find(|dir| {
            let Some(name) = dir.file_name().and_then(|n| n.to_str()) else {
                return false;
            };
            let dir_parts: Vec<&str> = name.trim_start_matches('-').split('-').collect();
            contiguous_match(&target_parts, &dir_parts)
        });
        match fuzzy {
            Some(dir) => {
                debug!(project = target, dir = %dir.display(), "Resolved by fuzzy component match");
                Resolution::Fuzzy(dir)
            }
            None => {
                debug!(project = target, "No log directory matches");
                Resolution::Unresolved
            }
        }
    }
}

/// True when `dir/sessions-index.json` has an `originalPath` equal to
/// `target` or `stripped`.
fn index_claims(dir: &Path, target: &str, stripped: &str) -> bool {
    let Ok(raw) = fs::read_to_string(dir.join(INDEX_FILE_NAME)) else {
        return false;
    };
    match serde_json::from_str::<OriginalPathProbe>(&raw) {
        Ok(OriginalPathProbe {
            original_path: Some(orig),
        }) => !orig.is_empty() && (orig == target || orig == stripped),
        _ => false,
    }
}

// ===== Enumeration =====

/// Entries of `dir` accepted by `keep`, sorted by path. Unreadable entries are skipped.
fn sorted_entries(dir: &Path, keep: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
    let Ok(read) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = read
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| keep(path))
        .collect();
    paths.sort();
    paths
}

/// Every log directory directly under `projects_dir`, sorted by name.
///
/// A missing root yields an empty list.
pub fn all_project_dirs(projects_dir: &Path) -> Vec<PathBuf> {
    sorted_entries(projects_dir, Path::is_dir)
}

/// `*.jsonl` files directly inside `dir`, sorted by name.
///
/// Only direct children are listed, so subagent transcripts under
/// `<id>/subagents/` are never included.
pub fn session_files(dir: &Path) -> Vec<PathBuf> {
    sorted_entries(dir, |path| {
        path.is_file() && path.extension().is_some_and(|ext| ext == "jsonl")
    })
}

/// Subagent transcripts of a session, sorted by name.
///
/// For `<dir>/<id>.jsonl` these are the `agent-*.jsonl` files in
/// `<dir>/<id>/subagents/`.
pub fn find_subagent_files(session_file: &Path) -> Vec<PathBuf> {
    let (Some(parent), Some(stem)) = (session_file.parent(), session_file.file_stem()) else {
        return Vec::new();
    };
    let subagent_dir = parent.join(stem).join(SUBAGENTS_DIR_NAME);
    sorted_entries(&subagent_dir, |path| {
        path.is_file()
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name.starts_with("agent-") && name.ends_with(".jsonl"))
    })
}

#[cfg(test)]
#[path = "resolve_tests.rs"]
mod tests;
