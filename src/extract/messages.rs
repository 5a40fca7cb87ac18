//! Conversation turns.
//!
//! Projects user and assistant records into readable turns. User turns
//! carry the operator's prose; assistant turns render text, thinking and
//! tool-use summaries in block order.

use crate::model::message::{ContentBlock, MessageContent, Role, ToolName};
use crate::model::record::{Record, RecordType};
use crate::model::text::truncate_chars;
use crate::parser::RecordFilter;
use crate::source::file::read_records;
use serde::Serialize;
use std::path::Path;

/// User text starting with any of these is injected by the client, not typed.
pub const RESERVED_USER_PREFIXES: [&str; 2] = ["<system-reminder>", "[Request interrupted"];

/// Prefix of a rendered thinking block.
pub const THINKING_PREFIX: &str = "[THINKING] ";

/// Which side of the conversation to keep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoleFilter {
    /// User turns only.
    User,
    /// Assistant turns only.
    Assistant,
    /// Both sides.
    #[default]
    Both,
}

impl RoleFilter {
    fn allows(self, kind: &RecordType) -> bool {
        match self {
            RoleFilter::User => *kind == RecordType::User,
            RoleFilter::Assistant => *kind == RecordType::Assistant,
            RoleFilter::Both => true,
        }
    }
}

/// How thinking blocks are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThinkingMode {
    /// Whole block.
    #[default]
    Full,
    /// At most this many characters.
    Truncate(usize),
    /// Left out entirely.
    Hidden,
}

impl ThinkingMode {
    /// Map a numeric limit: `0` is full, negative hides, positive truncates.
    pub fn from_limit(limit: i64) -> Self {
        match limit {
            0 => ThinkingMode::Full,
            n if n < 0 => ThinkingMode::Hidden,
            n => ThinkingMode::Truncate(usize::try_from(n).unwrap_or(usize::MAX)),
        }
    }
}

/// Options for [`extract_messages`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageOptions {
    /// Roles to keep.
    pub role: RoleFilter,
    /// Render `[TOOL: name] key` summaries in assistant turns.
    pub include_tools: bool,
    /// Maximum turns (0 = no cap).
    pub limit: usize,
    /// Thinking block rendering.
    pub thinking: ThinkingMode,
}

impl Default for MessageOptions {
    fn default() -> Self {
        Self {
            role: RoleFilter::Both,
            include_tools: true,
            limit: 0,
            thinking: ThinkingMode::Full,
        }
    }
}

/// One readable turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    /// `USER` or `ASSISTANT`.
    pub role: Role,
    /// Record timestamp as logged.
    pub timestamp: String,
    /// Rendered text.
    pub text: String,
}

/// Render one record as a turn, or `None` when it has nothing to show.
pub fn turn_from_record(record: &Record, opts: &MessageOptions) -> Option<Turn> {
    if !opts.role.allows(record.kind()) {
        return None;
    }
    let (role, text) = match record.kind() {
        RecordType::User => (Role::User, user_text(record)?),
        RecordType::Assistant => (Role::Assistant, assistant_text(record, opts)?),
        _ => return None,
    };
    Some(Turn {
        role,
        timestamp: record.timestamp().to_string(),
        text,
    })
}

fn user_text(record: &Record) -> Option<String> {
    if record.is_meta_user() || record.is_compact_summary() || record.is_tool_result_message() {
        return None;
    }
    let text = record.text_content();
    if text.is_empty() || RESERVED_USER_PREFIXES.iter().any(|p| text.starts_with(p)) {
        return None;
    }
    Some(text)
}

fn assistant_text(record: &Record, opts: &MessageOptions) -> Option<String> {
    if record.is_synthetic() {
        return None;
    }
    let content = record.content();
    if !matches!(content, MessageContent::Blocks(_)) {
        return None;
    }

    let mut parts: Vec<String> = Vec::new();
    for block in content.blocks() {
        match block {
            ContentBlock::Text { text } => {
                let t = text.trim();
                if !t.is_empty() {
                    parts.push(t.to_string());
                }
            }
            ContentBlock::Thinking { thinking } => {
                let t = thinking.trim();
                if t.is_empty() {
                    continue;
                }
                match opts.thinking {
                    ThinkingMode::Hidden => {}
                    ThinkingMode::Full => parts.push(format!("{THINKING_PREFIX}{t}")),
                    ThinkingMode::Truncate(n) => {
                        parts.push(format!("{THINKING_PREFIX}{}", truncate_chars(t, n)))
                    }
                }
            }
            ContentBlock::ToolUse { name, input, .. } if opts.include_tools => {
                parts.push(tool_summary(name, input));
            }
            _ => {}
        }
    }

    (!parts.is_empty()).then(|| parts.join("\n"))
}

/// `[TOOL: name] key`, or `[TOOL: name]` when the tool has no key input.
pub fn tool_summary(name: &str, input: Option<&serde_json::Map<String, serde_json::Value>>) -> String {
    let name = if name.is_empty() { "?" } else { name };
    let key = ToolName::parse(name).key_input(input);
    if key.is_empty() {
        format!("[TOOL: {name}]")
    } else {
        format!("[TOOL: {name}] {key}")
    }
}

/// Readable turns of a log file, in order.
///
/// A missing or unreadable file yields nothing.
pub fn extract_messages(path: impl AsRef<Path>, opts: MessageOptions) -> impl Iterator<Item = Turn> {
    let filter = RecordFilter::new().with_types([RecordType::User, RecordType::Assistant]);
    let cap = if opts.limit == 0 { usize::MAX } else { opts.limit };
    read_records(path, filter)
        .filter_map(move |record| turn_from_record(&record, &opts))
        .take(cap)
}
