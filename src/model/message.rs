//! Message content views for Claude Code transcript records.
//!
//! Content is borrowed straight out of the decoded JSON. Nothing here
//! allocates or fails: an absent or oddly-shaped field reads as empty.

use crate::model::text::truncate_chars;
use serde::Serialize;
use serde_json::{Map, Value};

// ===== Role =====

/// Conversation side that authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// The human operator.
    User,
    /// The assistant model.
    Assistant,
}

// ===== MessageContent =====

/// The `message.content` field of a user or assistant record.
///
/// Either a plain string or an ordered list of typed blocks. Anything else
/// (missing, null, a number) reads as [`MessageContent::Empty`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MessageContent<'a> {
    /// Plain text content (typical for typed user prompts).
    Text(&'a str),
    /// Structured content blocks, in log order.
    Blocks(&'a [Value]),
    /// No usable content.
    Empty,
}

impl<'a> MessageContent<'a> {
    /// Interpret a raw `content` value.
    pub fn from_json(value: Option<&'a Value>) -> Self {
        match value {
            Some(Value::String(s)) => MessageContent::Text(s),
            Some(Value::Array(items)) => MessageContent::Blocks(items),
            _ => MessageContent::Empty,
        }
    }

    /// Typed views of the blocks. Empty for string content.
    pub fn blocks(&self) -> impl Iterator<Item = ContentBlock<'a>> + 'a {
        let items: &'a [Value] = match *self {
            MessageContent::Blocks(items) => items,
            _ => &[],
        };
        items.iter().map(ContentBlock::from_json)
    }

    /// True if at least one block is a `tool_result`.
    pub fn has_tool_result(&self) -> bool {
        self.blocks()
            .any(|b| matches!(b, ContentBlock::ToolResult { .. }))
    }

    /// True if at least one block is a `text` block (even an empty one).
    pub fn has_text_block(&self) -> bool {
        self.blocks().any(|b| matches!(b, ContentBlock::Text { .. }))
    }
}

// ===== ContentBlock =====

/// One entry of a block-list `content`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContentBlock<'a> {
    /// Visible prose.
    Text {
        /// Block text, untrimmed.
        text: &'a str,
    },
    /// Extended reasoning.
    Thinking {
        /// Reasoning text, untrimmed.
        thinking: &'a str,
    },
    /// Tool invocation by the assistant.
    ToolUse {
        /// Call id, referenced by the matching result.
        id: &'a str,
        /// Tool name as logged.
        name: &'a str,
        /// Input mapping, if it is an object.
        input: Option<&'a Map<String, Value>>,
    },
    /// Tool output delivered back in a user record.
    ToolResult {
        /// Id of the originating `tool_use` block (same file only).
        tool_use_id: &'a str,
        /// Whether the tool reported failure.
        is_error: bool,
        /// Raw result content: a string, a list of sub-blocks, or absent.
        content: Option<&'a Value>,
    },
    /// Any other block type (images, unknown future types, non-objects).
    Other,
}

impl<'a> ContentBlock<'a> {
    /// Classify a raw block by its `type` field.
    pub fn from_json(value: &'a Value) -> Self {
        let Value::Object(block) = value else {
            return ContentBlock::Other;
        };
        let text_field = |key: &str| block.get(key).and_then(Value::as_str).unwrap_or("");
        match block.get("type").and_then(Value::as_str) {
            Some("text") => ContentBlock::Text {
                text: text_field("text"),
            },
            Some("thinking") => ContentBlock::Thinking {
                thinking: text_field("thinking"),
            },
            Some("tool_use") => ContentBlock::ToolUse {
                id: text_field("id"),
                name: text_field("name"),
                input: block.get("input").and_then(Value::as_object),
            },
            Some("tool_result") => ContentBlock::ToolResult {
                tool_use_id: text_field("tool_use_id"),
                is_error: block
                    .get("is_error")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
                content: block.get("content"),
            },
            _ => ContentBlock::Other,
        }
    }
}

// ===== ToolName =====

/// Tool names recognized in Claude Code logs.
///
/// Known tools get a salient-input projection (see [`ToolName::key_input`]);
/// everything else is carried as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ToolName {
    /// Read files from filesystem
    Read,
    /// Write files to filesystem
    Write,
    /// Edit existing files (string replacement)
    Edit,
    /// Apply multiple edits atomically
    MultiEdit,
    /// Execute bash commands
    Bash,
    /// Search file contents with regex
    Grep,
    /// Find files by glob pattern
    Glob,
    /// Create or manage subagent tasks
    Task,
    /// Search the web
    WebSearch,
    /// Fetch web resources
    WebFetch,
    /// Unknown or custom tool
    Other(String),
}

/// Shell commands are capped to this many characters in summaries.
pub const BASH_KEY_MAX_CHARS: usize = 80;

impl ToolName {
    /// Parse a tool name from the JSONL log.
    pub fn parse(name: &str) -> Self {
        match name {
            "Read" => Self::Read,
            "Write" => Self::Write,
            "Edit" => Self::Edit,
            "MultiEdit" => Self::MultiEdit,
            "Bash" => Self::Bash,
            "Grep" => Self::Grep,
            "Glob" => Self::Glob,
            "Task" => Self::Task,
            "WebSearch" => Self::WebSearch,
            "WebFetch" => Self::WebFetch,
            other => Self::Other(other.to_string()),
        }
    }

    /// Get the canonical string representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Read => "Read",
            Self::Write => "Write",
            Self::Edit => "Edit",
            Self::MultiEdit => "MultiEdit",
            Self::Bash => "Bash",
            Self::Grep => "Grep",
            Self::Glob => "Glob",
            Self::Task => "Task",
            Self::WebSearch => "WebSearch",
            Self::WebFetch => "WebFetch",
            Self::Other(s) => s,
        }
    }

    /// The most informative input field for this tool, or `""`.
    ///
    /// File tools report `file_path`, `Bash` its command (capped at
    /// [`BASH_KEY_MAX_CHARS`]), search tools their pattern, `Task` its
    /// description, web tools their query or URL.
    pub fn key_input<'a>(&self, input: Option<&'a Map<String, Value>>) -> &'a str {
        let field = |key: &str| -> &'a str {
            input
                .and_then(|m| m.get(key))
                .and_then(Value::as_str)
                .unwrap_or("")
        };
        match self {
            Self::Read | Self::Write | Self::Edit | Self::MultiEdit => field("file_path"),
            Self::Bash => truncate_chars(field("command"), BASH_KEY_MAX_CHARS),
            Self::Grep | Self::Glob => field("pattern"),
            Self::Task => field("description"),
            Self::WebSearch => field("query"),
            Self::WebFetch => field("url"),
            Self::Other(_) => "",
        }
    }
}
