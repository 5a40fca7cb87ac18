//! Session metadata as listed by the session index.
//!
//! [`SessionMeta`] comes from one of two places: an externally produced
//! `sessions-index.json` (camelCase entries, see [`IndexEntry`]), or the
//! fallback builder that derives it from the logs and caches it as a
//! snake_case JSON array.

use crate::model::text::sanitize_tsv;
use serde::{Deserialize, Serialize};

/// Summary length in a TSV row.
pub const TSV_SUMMARY_MAX: usize = 80;
/// First-prompt length in a TSV row.
pub const TSV_PROMPT_MAX: usize = 100;

// ===== SessionMeta =====

/// Lightweight per-session summary.
///
/// Immutable once built. Serialized verbatim (snake_case) to the fallback
/// cache file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionMeta {
    /// Session id (the log file stem).
    pub session_id: String,
    /// Absolute path of the log file.
    pub full_path: String,
    /// Earliest timestamp in the log.
    pub created: String,
    /// Latest timestamp in the log.
    pub modified: String,
    /// Countable user and assistant turns.
    pub message_count: u64,
    /// First non-empty git branch.
    pub git_branch: String,
    /// Latest summary text.
    pub summary: String,
    /// First human prompt, truncated.
    pub first_prompt: String,
    /// Project directory this session belongs to (best-effort when derived).
    pub project_path: String,
}

impl SessionMeta {
    /// One tab-separated row.
    ///
    /// Column order: id, created, modified, count, branch, summary, first
    /// prompt, project path, full path. Summary and prompt are cleaned with
    /// [`sanitize_tsv`] and capped; other columns are emitted as-is.
    pub fn to_tsv(&self) -> String {
        [
            self.session_id.clone(),
            self.created.clone(),
            self.modified.clone(),
            self.message_count.to_string(),
            self.git_branch.clone(),
            sanitize_tsv(&self.summary, TSV_SUMMARY_MAX),
            sanitize_tsv(&self.first_prompt, TSV_PROMPT_MAX),
            self.project_path.clone(),
            self.full_path.clone(),
        ]
        .join("\t")
    }

    /// Lowercased `summary + " " + first_prompt`, the text grep filters run over.
    pub fn search_haystack(&self) -> String {
        format!("{} {}", self.summary, self.first_prompt).to_lowercase()
    }
}

// ===== Precomputed index =====

/// Top-level shape of `sessions-index.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionsIndex {
    /// One entry per session.
    pub entries: Vec<IndexEntry>,
    /// The project directory the index describes.
    pub original_path: Option<String>,
}

/// One entry of `sessions-index.json`.
///
/// Every field is optional; nulls and absences read as empty. Fields
/// mirror [`SessionMeta`].
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexEntry {
    pub session_id: Option<String>,
    pub full_path: Option<String>,
    pub created: Option<String>,
    pub modified: Option<String>,
    pub message_count: Option<u64>,
    pub git_branch: Option<String>,
    pub summary: Option<String>,
    pub first_prompt: Option<String>,
    pub project_path: Option<String>,
}

impl From<IndexEntry> for SessionMeta {
    fn from(entry: IndexEntry) -> Self {
        Self {
            session_id: entry.session_id.unwrap_or_default(),
            full_path: entry.full_path.unwrap_or_default(),
            created: entry.created.unwrap_or_default(),
            modified: entry.modified.unwrap_or_default(),
            message_count: entry.message_count.unwrap_or_default(),
            git_branch: entry.git_branch.unwrap_or_default(),
            summary: entry.summary.unwrap_or_default(),
            first_prompt: entry.first_prompt.unwrap_or_default(),
            project_path: entry.project_path.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SessionMeta {
        SessionMeta {
            session_id: "abc".to_string(),
            full_path: "/p/abc.jsonl".to_string(),
            created: "2025-01-02T03:04:05Z".to_string(),
            modified: "2025-01-02T04:00:00Z".to_string(),
            message_count: 7,
            git_branch: "main".to_string(),
            summary: "Fix\tthe\nparser".to_string(),
            first_prompt: "please".to_string(),
            project_path: "/home/me/proj".to_string(),
        }
    }

    #[test]
    fn to_tsv_has_nine_columns_in_order() {
        let row = sample().to_tsv();
        let cols: Vec<&str> = row.split('\t').collect();
        assert_eq!(
            cols,
            vec![
                "abc",
                "2025-01-02T03:04:05Z",
                "2025-01-02T04:00:00Z",
                "7",
                "main",
                "Fix the parser",
                "please",
                "/home/me/proj",
                "/p/abc.jsonl",
            ]
        );
    }

    #[test]
    fn to_tsv_caps_summary_and_prompt() {
        let mut meta = sample();
        meta.summary = "s".repeat(200);
        meta.first_prompt = "p".repeat(200);
        let row = meta.to_tsv();
        let cols: Vec<&str> = row.split('\t').collect();
        assert_eq!(cols[5].chars().count(), TSV_SUMMARY_MAX);
        assert!(cols[5].ends_with("..."));
        assert_eq!(cols[6].chars().count(), TSV_PROMPT_MAX);
    }

    #[test]
    fn cache_form_is_snake_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("session_id").is_some());
        assert!(json.get("first_prompt").is_some());
        assert_eq!(json["message_count"], 7);
    }

    #[test]
    fn index_entry_reads_camel_case_with_nulls() {
        let raw = r#"{
            "entries": [
                {"sessionId": "s1", "fullPath": "/x/s1.jsonl", "messageCount": 4,
                 "gitBranch": null, "summary": "Did things", "extra": true}
            ],
            "originalPath": "/x"
        }"#;
        let index: SessionsIndex = serde_json::from_str(raw).unwrap();
        assert_eq!(index.original_path.as_deref(), Some("/x"));
        let meta: SessionMeta = index.entries.into_iter().next().unwrap().into();
        assert_eq!(meta.session_id, "s1");
        assert_eq!(meta.message_count, 4);
        assert_eq!(meta.git_branch, "");
        assert_eq!(meta.created, "");
    }

    #[test]
    fn search_haystack_is_lowercased_summary_and_prompt() {
        let meta = sample();
        assert_eq!(meta.search_haystack(), "fix\tthe\nparser please");
    }
}
