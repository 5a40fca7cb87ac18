//! JSONL line decoding for Claude Code transcripts.
//!
//! This module provides pure functions for turning one raw line into a
//! [`Record`], plus the cheap pre-decode filters the streaming reader uses
//! to avoid paying for a full decode on noise lines.
//!
//! # Pre-filter soundness
//!
//! A substring such as `"progress"` can appear anywhere in a line (inside a
//! prompt, a tool result, a file path). Finding it only *triggers* a cheap
//! borrowed decode of the top-level `type` field; a line is rejected only
//! when that probe confirms an excluded type. If the probe fails for any
//! reason the line falls through to the full decode, so the filters can
//! never drop a line the post-decode check would keep.

use crate::model::{ParseError, Record, RecordType};
use serde::Deserialize;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashSet;

/// Raw substrings that may indicate a noise record.
pub const NOISE_MARKERS: [&str; 2] = ["\"queue-operation\"", "\"progress\""];

/// Raw substring that may indicate a file-history snapshot.
pub const SNAPSHOT_MARKER: &str = "\"file-history-snapshot\"";

// ===== Decoding =====

/// Parse one line into a [`Record`].
///
/// # Errors
///
/// Returns `ParseError` if the line is not JSON or not a JSON object.
pub fn parse_record(raw: &str) -> Result<Record, ParseError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| ParseError::InvalidJson {
        message: e.to_string(),
    })?;
    match value {
        Value::Object(map) => Ok(Record::from_map(map)),
        other => Err(ParseError::NotAnObject {
            found: json_kind(&other),
        }),
    }
}

/// Decode one line, or `None` for a blank or malformed line.
///
/// Surrounding whitespace (including a stray `\r`) is ignored.
pub fn decode_line(raw: &str) -> Option<Record> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    parse_record(trimmed).ok()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ===== Type probe =====

/// Borrowed view of just the top-level `type` field.
#[derive(Debug, Deserialize)]
struct TypeProbe<'a> {
    #[serde(rename = "type", borrow, default)]
    kind: Option<Cow<'a, str>>,
}

/// Read only the `type` discriminator of a line.
///
/// Cheaper than a full decode: no map is built and string values are
/// skipped rather than copied. Returns `None` when the line does not
/// decode this way (malformed JSON, a non-string `type`, duplicate keys);
/// callers must then fall back to a full decode.
pub fn probe_type(raw: &str) -> Option<RecordType> {
    let probe: TypeProbe<'_> = serde_json::from_str(raw).ok()?;
    Some(RecordType::parse(probe.kind.as_deref().unwrap_or("")))
}

// ===== RecordFilter =====

/// Which records a stream yields.
///
/// `limit == 0` means unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFilter {
    /// Allowed types; `None` allows every type.
    pub types: Option<HashSet<RecordType>>,
    /// Drop progress and queue-operation records.
    pub skip_noise: bool,
    /// Stop after this many records (0 = no cap).
    pub limit: usize,
}

impl Default for RecordFilter {
    fn default() -> Self {
        Self {
            types: None,
            skip_noise: true,
            limit: 0,
        }
    }
}

impl RecordFilter {
    /// Default filter: every non-noise record, no cap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to the given types.
    pub fn with_types(mut self, types: impl IntoIterator<Item = RecordType>) -> Self {
        self.types = Some(types.into_iter().collect());
        self
    }

    /// Keep noise records.
    pub fn include_noise(mut self) -> Self {
        self.skip_noise = false;
        self
    }

    /// Cap the number of yielded records (0 = no cap).
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// The post-decode check.
    pub fn accepts(&self, kind: &RecordType) -> bool {
        if self.skip_noise && kind.is_noise() {
            return false;
        }
        match &self.types {
            Some(types) => types.contains(kind),
            None => true,
        }
    }

    /// Cheap pre-decode check. `true` only when the line is certainly rejected.
    pub fn prefilter_rejects(&self, line: &str) -> bool {
        let noise_hint = self.skip_noise && NOISE_MARKERS.iter().any(|m| line.contains(m));
        let snapshot_hint = self.types.is_some() && line.contains(SNAPSHOT_MARKER);
        if !noise_hint && !snapshot_hint {
            return false;
        }
        match probe_type(line) {
            Some(kind) => !self.accepts(&kind),
            None => false,
        }
    }
}
