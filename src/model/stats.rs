//! Session statistics.
//!
//! [`SessionStats`] is a fold over the lines of one log file. Each line is
//! fed through [`SessionStats::record_line`]; the accumulator never needs to
//! look back at earlier lines, so the update rules can be tested one record
//! at a time.

use crate::model::message::{ContentBlock, MessageContent};
use crate::model::record::{Record, RecordType};
use crate::model::usage::TokenUsage;
use crate::parser::decode_line;
use serde::Serialize;

/// Raw markers of a failed tool result. Checked before decoding.
pub const ERROR_MARKERS: [&str; 2] = ["\"is_error\": true", "\"is_error\":true"];

/// System subtypes that mark a context compaction.
pub const COMPACTION_SUBTYPES: [&str; 2] = ["compact_boundary", "microcompact_boundary"];

// ===== SessionStats =====

/// Aggregate counters for one session log.
///
/// # Invariants
///
/// - `total_tokens == input_tokens + output_tokens` after every update
/// - Token sums cover every non-synthetic assistant record, not just the first
/// - `files_edited` is the largest tracked-file count seen in any snapshot
/// - `errors` is a raw-text lower bound and may count lines that fail to decode
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// First non-empty `slug`.
    pub slug: String,
    /// First non-empty model name of a non-synthetic assistant record.
    pub model: String,
    /// First non-empty `gitBranch`.
    pub branch: String,
    /// Earliest timestamp.
    pub started: String,
    /// Latest timestamp.
    pub ended: String,
    /// Human prose turns.
    pub user_messages: u64,
    /// Non-synthetic assistant turns.
    pub assistant_messages: u64,
    /// `tool_use` blocks across all assistant turns.
    pub tool_calls: u64,
    /// Peak number of tracked files in any snapshot.
    pub files_edited: u64,
    /// Lines carrying an error-result marker.
    pub errors: u64,
    /// Summed uncached input tokens.
    pub input_tokens: u64,
    /// Summed output tokens.
    pub output_tokens: u64,
    /// Summed cache-read tokens.
    pub cache_read_tokens: u64,
    /// Summed cache-creation tokens.
    pub cache_create_tokens: u64,
    /// `input_tokens + output_tokens`.
    pub total_tokens: u64,
    /// Compaction boundaries (ordinary and micro).
    pub compactions: u64,
    /// Latest `summary` text.
    pub summary: String,
}

impl SessionStats {
    /// Fold a sequence of raw lines.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut stats = Self::default();
        for line in lines {
            stats.record_line(line.as_ref());
        }
        stats
    }

    /// Account for one raw line.
    ///
    /// The error marker check runs on the raw text first, so a line that
    /// fails to decode may still raise the error count. It contributes
    /// nothing else.
    pub fn record_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        if ERROR_MARKERS.iter().any(|marker| line.contains(marker)) {
            self.errors += 1;
        }
        if let Some(record) = decode_line(line) {
            self.record(&record);
        }
    }

    /// Account for one decoded record. Does not touch `errors`.
    pub fn record(&mut self, record: &Record) {
        let ts = record.timestamp();
        if !ts.is_empty() {
            if self.started.is_empty() || ts < self.started.as_str() {
                self.started = ts.to_string();
            }
            if ts > self.ended.as_str() {
                self.ended = ts.to_string();
            }
        }
        if self.branch.is_empty() {
            self.branch = record.git_branch().to_string();
        }
        if self.slug.is_empty() {
            self.slug = record.slug().to_string();
        }

        match record.kind() {
            RecordType::User => self.record_user(record),
            RecordType::Assistant => self.record_assistant(record),
            RecordType::Summary => self.summary = record.summary().to_string(),
            RecordType::FileHistorySnapshot => {
                let tracked = record.tracked_file_backups().map_or(0, |m| m.len() as u64);
                self.files_edited = self.files_edited.max(tracked);
            }
            RecordType::System => {
                if COMPACTION_SUBTYPES.contains(&record.subtype()) {
                    self.compactions += 1;
                }
            }
            _ => {}
        }
    }

    fn record_user(&mut self, record: &Record) {
        if record.has_malformed_message() || record.is_meta_user() || record.is_compact_summary() {
            return;
        }
        if is_countable_user_turn(record) {
            self.user_messages += 1;
        }
    }

    fn record_assistant(&mut self, record: &Record) {
        if record.has_malformed_message() || record.is_synthetic() {
            return;
        }
        self.assistant_messages += 1;
        if self.model.is_empty() {
            self.model = record.model().to_string();
        }

        let usage = record.usage();
        self.input_tokens = self.input_tokens.saturating_add(usage.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(usage.output_tokens);
        self.cache_read_tokens = self.cache_read_tokens.saturating_add(usage.cache_read_input_tokens);
        self.cache_create_tokens = self
            .cache_create_tokens
            .saturating_add(usage.cache_creation_input_tokens);
        self.total_tokens = self.input_tokens.saturating_add(self.output_tokens);

        self.tool_calls += record
            .content()
            .blocks()
            .filter(|b| matches!(b, ContentBlock::ToolUse { .. }))
            .count() as u64;
    }

    /// The summed usage as a [`TokenUsage`].
    pub fn usage(&self) -> TokenUsage {
        TokenUsage {
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
            cache_read_input_tokens: self.cache_read_tokens,
            cache_creation_input_tokens: self.cache_create_tokens,
        }
    }
}

/// True when a (non-meta) user record is human prose.
///
/// Plain non-blank strings count. A block list counts when it holds a
/// `text` block and no `tool_result` block.
pub fn is_countable_user_turn(record: &Record) -> bool {
    match record.content() {
        MessageContent::Text(s) => !s.trim().is_empty(),
        content @ MessageContent::Blocks(_) => {
            !content.has_tool_result() && content.has_text_block()
        }
        MessageContent::Empty => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fold(lines: &[&str]) -> SessionStats {
        SessionStats::from_lines(lines.iter().copied())
    }

    #[test]
    fn counts_plain_user_and_assistant_turns() {
        let stats = fold(&[
            r#"{"type":"user","message":{"role":"user","content":"hello"}}"#,
            r#"{"type":"assistant","message":{"model":"claude-sonnet-4","content":[{"type":"text","text":"hi"}],"usage":{"input_tokens":5,"output_tokens":3}}}"#,
        ]);
        assert_eq!(stats.user_messages, 1);
        assert_eq!(stats.assistant_messages, 1);
        assert_eq!(stats.input_tokens, 5);
        assert_eq!(stats.output_tokens, 3);
        assert_eq!(stats.total_tokens, 8);
        assert_eq!(stats.model, "claude-sonnet-4");
    }

    #[test]
    fn tool_result_turn_is_not_a_user_message_even_with_text() {
        let stats = fold(&[
            r#"{"type":"user","message":{"content":[{"type":"tool_result","tool_use_id":"t1","content":"ok"},{"type":"text","text":"also this"}]}}"#,
        ]);
        assert_eq!(stats.user_messages, 0);
    }

    #[test]
    fn meta_compact_and_blank_user_turns_are_skipped() {
        let stats = fold(&[
            r#"{"type":"user","isMeta":true,"message":{"content":"context"}}"#,
            r#"{"type":"user","isCompactSummary":true,"message":{"content":"summary"}}"#,
            r#"{"type":"user","message":{"content":"   "}}"#,
            r#"{"type":"user","message":{"content":[{"type":"image"}]}}"#,
            r#"{"type":"user","message":"not an object"}"#,
        ]);
        assert_eq!(stats.user_messages, 0);
    }

    #[test]
    fn block_list_with_empty_text_block_counts() {
        let stats = fold(&[r#"{"type":"user","message":{"content":[{"type":"text","text":""}]}}"#]);
        assert_eq!(stats.user_messages, 1);
    }

    #[test]
    fn synthetic_assistant_is_ignored_entirely() {
        let stats = fold(&[
            r#"{"type":"assistant","message":{"model":"<synthetic>","content":[{"type":"tool_use","id":"x","name":"Bash"}],"usage":{"input_tokens":100}}}"#,
        ]);
        assert_eq!(stats.assistant_messages, 0);
        assert_eq!(stats.input_tokens, 0);
        assert_eq!(stats.tool_calls, 0);
        assert_eq!(stats.model, "");
    }

    #[test]
    fn usage_is_summed_across_assistant_turns_and_model_is_sticky() {
        let stats = fold(&[
            r#"{"type":"assistant","message":{"model":"","usage":{"input_tokens":1}}}"#,
            r#"{"type":"assistant","message":{"model":"m-first","usage":{"input_tokens":2,"output_tokens":4,"cache_read_input_tokens":10,"cache_creation_input_tokens":20}}}"#,
            r#"{"type":"assistant","message":{"model":"m-second","usage":{"input_tokens":3,"output_tokens":5,"cache_read_input_tokens":1}}}"#,
        ]);
        assert_eq!(stats.assistant_messages, 3);
        assert_eq!(stats.model, "m-first");
        assert_eq!(stats.input_tokens, 6);
        assert_eq!(stats.output_tokens, 9);
        assert_eq!(stats.cache_read_tokens, 11);
        assert_eq!(stats.cache_create_tokens, 20);
        assert_eq!(stats.total_tokens, 15);
        assert_eq!(stats.usage().total(), stats.total_tokens);
    }

    #[test]
    fn assistant_without_message_still_counts() {
        let stats = fold(&[
            r#"{"type":"assistant","timestamp":"2025-01-01T00:00:00Z"}"#,
            r#"{"type":"assistant","message":"not an object"}"#,
            r#"{"type":"assistant","message":null}"#,
        ]);
        assert_eq!(stats.assistant_messages, 1);
        assert_eq!(stats.model, "");
        assert_eq!(stats.total_tokens, 0);
    }

    #[test]
    fn huge_usage_values_saturate() {
        let stats = fold(&[
            r#"{"type":"assistant","message":{"usage":{"input_tokens":18446744073709551615,"output_tokens":1,"cache_read_input_tokens":18446744073709551615}}}"#,
            r#"{"type":"assistant","message":{"usage":{"input_tokens":7,"cache_read_input_tokens":2}}}"#,
        ]);
        assert_eq!(stats.assistant_messages, 2);
        assert_eq!(stats.input_tokens, u64::MAX);
        assert_eq!(stats.output_tokens, 1);
        assert_eq!(stats.cache_read_tokens, u64::MAX);
        assert_eq!(stats.total_tokens, u64::MAX);
        assert_eq!(stats.usage().total(), stats.total_tokens);
    }

    #[test]
    fn tool_use_blocks_are_counted() {
        let stats = fold(&[
            r#"{"type":"assistant","message":{"content":[{"type":"tool_use","id":"a","name":"Read"},{"type":"text","text":"x"},{"type":"tool_use","id":"b","name":"Bash"}]}}"#,
        ]);
        assert_eq!(stats.tool_calls, 2);
    }

    #[test]
    fn error_marker_counts_even_when_line_is_malformed() {
        let stats = fold(&[
            r#"{"type":"user","message":{"content":[{"type":"tool_result","is_error": true}]}}"#,
            r#"{"broken": "is_error":true"#,
            r#"{"type":"user","message":{"content":[{"type":"tool_result","is_error":false}]}}"#,
        ]);
        assert_eq!(stats.errors, 2);
        assert_eq!(stats.user_messages, 0);
    }

    #[test]
    fn summary_last_wins_and_compactions_count_both_kinds() {
        let stats = fold(&[
            r#"{"type":"summary","summary":"first"}"#,
            r#"{"type":"system","subtype":"compact_boundary"}"#,
            r#"{"type":"system","subtype":"microcompact_boundary"}"#,
            r#"{"type":"system","subtype":"informational"}"#,
            r#"{"type":"summary","summary":"second"}"#,
        ]);
        assert_eq!(stats.summary, "second");
        assert_eq!(stats.compactions, 2);
    }

    #[test]
    fn files_edited_is_a_high_water_mark() {
        let stats = fold(&[
            r#"{"type":"file-history-snapshot","snapshot":{"trackedFileBackups":{"a":{},"b":{},"c":{}}}}"#,
            r#"{"type":"file-history-snapshot","snapshot":{"trackedFileBackups":{"a":{}}}}"#,
        ]);
        assert_eq!(stats.files_edited, 3);
    }

    #[test]
    fn timestamps_branch_and_slug() {
        let stats = fold(&[
            r#"{"type":"progress","timestamp":"2025-01-01T00:00:05Z","gitBranch":""}"#,
            r#"{"type":"user","timestamp":"2025-01-01T00:00:01Z","gitBranch":"feat","slug":"calm-fox","message":{"content":"x"}}"#,
            r#"{"type":"user","timestamp":"2025-01-01T00:00:09Z","gitBranch":"main","slug":"other","message":{"content":"y"}}"#,
        ]);
        assert_eq!(stats.started, "2025-01-01T00:00:01Z");
        assert_eq!(stats.ended, "2025-01-01T00:00:09Z");
        assert_eq!(stats.branch, "feat");
        assert_eq!(stats.slug, "calm-fox");
    }

    #[test]
    fn malformed_lines_do_not_disturb_counts() {
        let stats = fold(&[
            r#"{"type":"user","message":{"content":"one"}}"#,
            r#"{"type":"user","message":{"content":"#,
            "",
            r#"[1,2,3]"#,
            r#"{"type":"user","message":{"content":"two"}}"#,
        ]);
        assert_eq!(stats.user_messages, 2);
    }

    #[test]
    fn serializes_with_flat_field_names() {
        let json = serde_json::to_value(SessionStats::default()).unwrap();
        for key in [
            "slug",
            "model",
            "branch",
            "started",
            "ended",
            "user_messages",
            "assistant_messages",
            "tool_calls",
            "files_edited",
            "errors",
            "input_tokens",
            "output_tokens",
            "cache_read_tokens",
            "cache_create_tokens",
            "total_tokens",
            "compactions",
            "summary",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }
}
