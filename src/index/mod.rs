//! Session indexes.
//!
//! A project's sessions are summarized either by an externally produced
//! `sessions-index.json` or, when that is absent, by the fallback builder,
//! which derives the same metadata from the logs and caches it next to
//! them. [`SessionLister`] sits on top and answers "which sessions match".

pub mod builder;
pub mod lister;

pub use builder::{build_fallback_index, SessionDigest, CACHE_FILE_NAME, FIRST_PROMPT_MAX};
pub use lister::{filter_and_sort, sessions_for_dir, ListQuery, Scope, SessionLister};

use crate::model::{SessionMeta, SessionsIndex};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Entries of a precomputed `sessions-index.json`.
///
/// An unreadable or malformed file yields an empty list.
pub fn load_index(index_path: impl AsRef<Path>) -> Vec<SessionMeta> {
    let index_path = index_path.as_ref();
    let raw = match fs::read_to_string(index_path) {
        Ok(raw) => raw,
        Err(error) => {
            debug!(path = %index_path.display(), %error, "Session index unreadable");
            return Vec::new();
        }
    };
    match serde_json::from_str::<SessionsIndex>(&raw) {
        Ok(index) => index.entries.into_iter().map(SessionMeta::from).collect(),
        Err(error) => {
            debug!(path = %index_path.display(), %error, "Session index malformed");
            Vec::new()
        }
    }
}
