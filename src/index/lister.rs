//! Listing sessions across projects.

use crate::index::builder::build_fallback_index;
use crate::index::load_index;
use crate::model::text::truncate_chars;
use crate::model::SessionMeta;
use crate::resolve::{ProjectResolver, INDEX_FILE_NAME};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Which projects a listing covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Scope {
    /// The project of the working directory.
    #[default]
    Current,
    /// Every project under the projects directory.
    All,
    /// The project at an explicit path.
    Path(String),
}

/// A session listing request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Projects to cover.
    pub scope: Scope,
    /// Drop sessions created before this day.
    pub since: Option<NaiveDate>,
    /// Case-insensitive substring over summary and first prompt.
    pub grep: Option<String>,
    /// Maximum entries (0 = no cap).
    pub limit: usize,
}

/// Sessions of one project directory.
///
/// Reads `sessions-index.json` when present, otherwise the fallback index.
pub fn sessions_for_dir(project_dir: &Path) -> Vec<SessionMeta> {
    let index_path = project_dir.join(INDEX_FILE_NAME);
    if index_path.exists() {
        load_index(&index_path)
    } else {
        build_fallback_index(project_dir)
    }
}

/// Apply the `since` and `grep` filters, sort newest first, cap.
///
/// Sorting compares `created` as text and is stable, so entries with equal
/// timestamps keep their input order.
pub fn filter_and_sort(entries: Vec<SessionMeta>, query: &ListQuery) -> Vec<SessionMeta> {
    let since = query.since.map(|day| day.format("%Y-%m-%d").to_string());
    let needle = query
        .grep
        .as_deref()
        .filter(|g| !g.is_empty())
        .map(str::to_lowercase);

    let mut kept: Vec<SessionMeta> = entries
        .into_iter()
        .filter(|meta| {
            since
                .as_deref()
                .map_or(true, |since| truncate_chars(&meta.created, 10) >= since)
        })
        .filter(|meta| {
            needle
                .as_deref()
                .map_or(true, |needle| meta.search_haystack().contains(needle))
        })
        .collect();

    kept.sort_by(|a, b| b.created.cmp(&a.created));
    if query.limit > 0 {
        kept.truncate(query.limit);
    }
    kept
}

/// Answers session listings against one projects directory.
#[derive(Debug, Clone)]
pub struct SessionLister {
    resolver: ProjectResolver,
    working_dir: Option<PathBuf>,
}

impl SessionLister {
    /// Lister rooted at `projects_dir`.
    pub fn new(projects_dir: impl Into<PathBuf>) -> Self {
        Self {
            resolver: ProjectResolver::new(projects_dir),
            working_dir: None,
        }
    }

    /// Use `dir` instead of the process working directory for [`Scope::Current`].
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Sessions matching `query`, newest first.
    ///
    /// An unresolvable project yields an empty list.
    pub fn list(&self, query: &ListQuery) -> Vec<SessionMeta> {
        let entries = match &query.scope {
            Scope::All => self
                .resolver
                .project_dirs()
                .iter()
                .flat_map(|dir| sessions_for_dir(dir))
                .collect(),
            Scope::Current => match self.current_dir() {
                Some(cwd) => self.sessions_for_project(&cwd.to_string_lossy()),
                None => Vec::new(),
            },
            Scope::Path(target) => self.sessions_for_project(target),
        };
        filter_and_sort(entries, query)
    }

    fn sessions_for_project(&self, target: &str) -> Vec<SessionMeta> {
        match self.resolver.resolve(target).into_path() {
            Some(dir) => sessions_for_dir(&dir),
            None => {
                debug!(project = target, "No sessions: project unresolved");
                Vec::new()
            }
        }
    }

    fn current_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.working_dir {
            return Some(dir.clone());
        }
        match std::env::current_dir() {
            Ok(dir) => Some(dir),
            Err(error) => {
                warn!(%error, "Cannot determine working directory");
                None
            }
        }
    }
}
