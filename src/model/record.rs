//! Decoded transcript records.
//!
//! A [`Record`] is one JSON object from a log line, tagged by its `type`
//! discriminator. The object is kept as decoded and fields are read lazily
//! through accessors that return an empty value when a field is absent or
//! has an unexpected shape. Accessors never fabricate content: a present
//! string field is returned exactly as logged.

use crate::model::message::{ContentBlock, MessageContent};
use crate::model::usage::TokenUsage;
use serde_json::{Map, Value};

/// Model tag written on locally generated assistant messages.
pub const SYNTHETIC_MODEL: &str = "<synthetic>";

// ===== RecordType =====

/// The `type` discriminator of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// Human turn, or a turn carrying tool results.
    User,
    /// Model turn.
    Assistant,
    /// System notice (compaction boundaries and similar).
    System,
    /// Conversation summary.
    Summary,
    /// Streaming progress notice (noise).
    Progress,
    /// Input queue bookkeeping (noise).
    QueueOperation,
    /// Snapshot of all tracked file backups.
    FileHistorySnapshot,
    /// Pull request link notice.
    PrLink,
    /// Any other value, including the empty string for a missing `type`.
    Unknown(String),
}

impl RecordType {
    /// Parse a discriminator string.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "user" => Self::User,
            "assistant" => Self::Assistant,
            "system" => Self::System,
            "summary" => Self::Summary,
            "progress" => Self::Progress,
            "queue-operation" => Self::QueueOperation,
            "file-history-snapshot" => Self::FileHistorySnapshot,
            "pr-link" => Self::PrLink,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// The discriminator as it appears in the log.
    pub fn as_str(&self) -> &str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
            Self::Summary => "summary",
            Self::Progress => "progress",
            Self::QueueOperation => "queue-operation",
            Self::FileHistorySnapshot => "file-history-snapshot",
            Self::PrLink => "pr-link",
            Self::Unknown(s) => s,
        }
    }

    /// True for every variant except [`RecordType::Unknown`].
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// Progress and queue-operation records carry nothing worth extracting.
    pub fn is_noise(&self) -> bool {
        matches!(self, Self::Progress | Self::QueueOperation)
    }
}

// ===== Record =====

/// One decoded log line.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    kind: RecordType,
    fields: Map<String, Value>,
}

impl Record {
    /// Wrap a decoded JSON value. Returns `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self::from_map(fields)),
            _ => None,
        }
    }

    /// Wrap a decoded JSON object.
    pub fn from_map(fields: Map<String, Value>) -> Self {
        let kind = RecordType::parse(fields.get("type").and_then(Value::as_str).unwrap_or(""));
        Self { kind, fields }
    }

    /// The record's discriminator.
    pub fn kind(&self) -> &RecordType {
        &self.kind
    }

    /// True if the object has a string `type` field.
    pub fn has_type(&self) -> bool {
        matches!(self.fields.get("type"), Some(Value::String(_)))
    }

    /// The whole decoded object.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Top-level field names, sorted.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Raw access to any top-level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    fn str_field(&self, key: &str) -> &str {
        self.fields.get(key).and_then(Value::as_str).unwrap_or("")
    }

    /// ISO-8601 timestamp string, or `""`.
    pub fn timestamp(&self) -> &str {
        self.str_field("timestamp")
    }

    /// Record uuid, or `""`.
    pub fn uuid(&self) -> &str {
        self.str_field("uuid")
    }

    /// `sessionId`, or `""`.
    pub fn session_id(&self) -> &str {
        self.str_field("sessionId")
    }

    /// `gitBranch`, or `""`.
    pub fn git_branch(&self) -> &str {
        self.str_field("gitBranch")
    }

    /// `slug`, or `""`.
    pub fn slug(&self) -> &str {
        self.str_field("slug")
    }

    /// Client `version`, or `""`.
    pub fn version(&self) -> &str {
        self.str_field("version")
    }

    /// `subtype` (set on system records), or `""`.
    pub fn subtype(&self) -> &str {
        self.str_field("subtype")
    }

    /// `summary` text (set on summary records), or `""`.
    pub fn summary(&self) -> &str {
        self.str_field("summary")
    }

    /// The nested `message` object, if present and an object.
    pub fn message(&self) -> Option<&Map<String, Value>> {
        self.fields.get("message").and_then(Value::as_object)
    }

    /// `message` is present but is not an object.
    ///
    /// A missing `message` is not malformed; it reads as an empty one.
    pub fn has_malformed_message(&self) -> bool {
        self.fields.get("message").is_some_and(|m| !m.is_object())
    }

    /// `message.content`.
    pub fn content(&self) -> MessageContent<'_> {
        MessageContent::from_json(self.message().and_then(|m| m.get("content")))
    }

    /// `message.model`, or `""`.
    pub fn model(&self) -> &str {
        self.message()
            .and_then(|m| m.get("model"))
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// `message.usage`, zero when absent.
    pub fn usage(&self) -> TokenUsage {
        TokenUsage::from_json(self.message().and_then(|m| m.get("usage")))
    }

    /// `snapshot.trackedFileBackups` of a file-history-snapshot record.
    pub fn tracked_file_backups(&self) -> Option<&Map<String, Value>> {
        self.fields
            .get("snapshot")
            .and_then(|s| s.get("trackedFileBackups"))
            .and_then(Value::as_object)
    }

    /// True for progress and queue-operation records.
    pub fn is_noise(&self) -> bool {
        self.kind.is_noise()
    }

    /// `isMeta` is set (injected context, not typed by the operator).
    pub fn is_meta_user(&self) -> bool {
        self.fields.get("isMeta").is_some_and(is_truthy)
    }

    /// `isCompactSummary` is set (the summary injected after compaction).
    pub fn is_compact_summary(&self) -> bool {
        self.fields.get("isCompactSummary").is_some_and(is_truthy)
    }

    /// Assistant message generated locally rather than by a model.
    pub fn is_synthetic(&self) -> bool {
        self.model() == SYNTHETIC_MODEL
    }

    /// A user record whose content list holds at least one `tool_result`.
    ///
    /// Such turns deliver tool output and are never counted as human prose,
    /// even when a text block rides along.
    pub fn is_tool_result_message(&self) -> bool {
        self.kind == RecordType::User && self.content().has_tool_result()
    }

    /// Human-readable text of the content, trimmed.
    ///
    /// String content is trimmed as a whole. For block content each
    /// non-blank `text` block is trimmed and the results joined by newlines.
    pub fn text_content(&self) -> String {
        match self.content() {
            MessageContent::Text(s) => s.trim().to_string(),
            content @ MessageContent::Blocks(_) => content
                .blocks()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } => {
                        let t = text.trim();
                        (!t.is_empty()).then_some(t)
                    }
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
            MessageContent::Empty => String::new(),
        }
    }
}

/// JSON truthiness as the log producer uses it for flags.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
