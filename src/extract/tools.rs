//! Tool call traces.
//!
//! Calls (`tool_use` blocks in assistant records) and results
//! (`tool_result` blocks in user records) are collected into two maps keyed
//! by call id during one scan, then joined in call order. Results without a
//! call are never emitted.

use crate::model::message::{ContentBlock, MessageContent, ToolName};
use crate::model::record::{Record, RecordType};
use crate::model::text::truncate_chars;
use crate::parser::RecordFilter;
use crate::source::file::read_records;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Characters of a call timestamp kept (second precision).
pub const TIMESTAMP_CHARS: usize = 19;
/// Characters kept from each sub-block of a list result.
pub const BLOCK_PREVIEW_CHARS: usize = 100;
/// Characters kept from a string result.
pub const TEXT_PREVIEW_CHARS: usize = 150;
/// Preview of a call that never got a result.
pub const NO_RESULT_PREVIEW: &str = "(no result captured)";

/// Outcome of a tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    /// Succeeded, or no result was captured.
    Ok,
    /// The result was flagged `is_error`.
    Error,
}

/// Options for [`extract_tools`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOptions {
    /// Keep only calls to this tool (exact name). Empty means any tool.
    pub name: Option<String>,
    /// Keep only failed calls.
    pub errors_only: bool,
    /// Maximum traces (0 = no cap).
    pub limit: usize,
}

/// One call joined with its result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolTrace {
    /// Call timestamp, second precision.
    pub timestamp: String,
    /// Tool name.
    pub name: String,
    /// Result status.
    pub status: ToolStatus,
    /// Salient input field (see [`ToolName::key_input`]).
    pub key_input: String,
    /// Short preview of the result content.
    pub result_preview: String,
}

#[derive(Debug, Clone)]
struct PendingCall {
    timestamp: String,
    name: String,
    key_input: String,
}

#[derive(Debug, Clone)]
struct Outcome {
    status: ToolStatus,
    preview: String,
}

// ===== ToolJoin =====

/// Call and result maps for one file.
///
/// Calls keep first-seen order; a repeated id keeps its original position
/// and takes the latest payload. Results are last-wins.
#[derive(Debug, Default)]
pub struct ToolJoin {
    order: Vec<String>,
    calls: HashMap<String, PendingCall>,
    results: HashMap<String, Outcome>,
}

impl ToolJoin {
    /// Empty join.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the calls or results a record carries.
    ///
    /// Calls whose name differs from `name_filter` are ignored.
    pub fn record(&mut self, record: &Record, name_filter: Option<&str>) {
        let content = record.content();
        if !matches!(content, MessageContent::Blocks(_)) {
            return;
        }
        match record.kind() {
            RecordType::Assistant => {
                let timestamp = truncate_chars(record.timestamp(), TIMESTAMP_CHARS);
                for block in content.blocks() {
                    let ContentBlock::ToolUse { id, name, input } = block else {
                        continue;
                    };
                    if name_filter.is_some_and(|wanted| wanted != name) {
                        continue;
                    }
                    let call = PendingCall {
                        timestamp: timestamp.to_string(),
                        name: name.to_string(),
                        key_input: ToolName::parse(name).key_input(input).to_string(),
                    };
                    if self.calls.insert(id.to_string(), call).is_none() {
                        self.order.push(id.to_string());
                    }
                }
            }
            RecordType::User => {
                for block in content.blocks() {
                    let ContentBlock::ToolResult {
                        tool_use_id,
                        is_error,
                        content,
                    } = block
                    else {
                        continue;
                    };
                    let outcome = Outcome {
                        status: if is_error {
                            ToolStatus::Error
                        } else {
                            ToolStatus::Ok
                        },
                        preview: result_preview(content),
                    };
                    self.results.insert(tool_use_id.to_string(), outcome);
                }
            }
            _ => {}
        }
    }

    /// Join calls to results in call order.
    pub fn finish(mut self) -> impl Iterator<Item = ToolTrace> {
        self.order.into_iter().filter_map(move |id| {
            let call = self.calls.remove(&id)?;
            let (status, preview) = match self.results.remove(&id) {
                Some(outcome) => (outcome.status, outcome.preview),
                None => (ToolStatus::Ok, NO_RESULT_PREVIEW.to_string()),
            };
            Some(ToolTrace {
                timestamp: call.timestamp,
                name: call.name,
                status,
                key_input: call.key_input,
                result_preview: preview,
            })
        })
    }
}

/// Short preview of a `tool_result` content value.
///
/// A list of sub-blocks previews each object's `text` (capped) joined by
/// spaces; a string is capped with newlines and tabs flattened; anything
/// else previews as empty.
pub fn result_preview(content: Option<&Value>) -> String {
    match content {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_object)
            .map(|block| {
                let text = block.get("text").and_then(Value::as_str).unwrap_or("");
                truncate_chars(text, BLOCK_PREVIEW_CHARS)
            })
            .collect::<Vec<_>>()
            .join(" "),
        Some(Value::String(s)) => truncate_chars(s, TEXT_PREVIEW_CHARS)
            .chars()
            .map(|c| if c == '\n' || c == '\t' { ' ' } else { c })
            .collect(),
        _ => String::new(),
    }
}

/// Tool traces of a log file, in call order.
///
/// A missing or unreadable file yields an empty list.
pub fn extract_tools(path: impl AsRef<Path>, opts: &ToolOptions) -> Vec<ToolTrace> {
    let filter = RecordFilter::new().with_types([RecordType::User, RecordType::Assistant]);
    let mut join = ToolJoin::new();
    let name_filter = opts.name.as_deref().filter(|n| !n.is_empty());
    for record in read_records(path, filter) {
        join.record(&record, name_filter);
    }
    let cap = if opts.limit == 0 { usize::MAX } else { opts.limit };
    join.finish()
        .filter(|trace| !opts.errors_only || trace.status == ToolStatus::Error)
        .take(cap)
        .collect()
}
