//! Structural schema report for one log file.
//!
//! [`SchemaProbe`] is fed every raw line in file order and produces a
//! [`SchemaReport`]: a histogram of record types, a sampled field inventory
//! per type, timestamp bounds and the distinct versions and models seen.

use crate::model::record::Record;
use crate::parser::decode_line;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Records of each type whose field names feed the inventory.
pub const FIELD_SAMPLE_LIMIT: u64 = 5;

/// Lines without this substring cannot carry a `type` field and are skipped.
const TYPE_KEY_MARKER: &str = "\"type\"";

/// Histogram bucket for one record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeSummary {
    /// The `type` value.
    pub record_type: String,
    /// Exhaustive count of records of this type.
    pub count: u64,
    /// Union of top-level field names over the first few records, sorted.
    pub fields: Vec<String>,
}

/// Output of a schema probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaReport {
    /// Path of the probed file.
    pub file: String,
    /// Physical lines, blank ones included.
    pub lines: u64,
    /// Bytes read.
    pub bytes: u64,
    /// Earliest timestamp.
    pub first_timestamp: String,
    /// Latest timestamp.
    pub last_timestamp: String,
    /// Distinct non-empty client versions, sorted.
    pub versions: Vec<String>,
    /// Distinct non-synthetic model names, sorted.
    pub models: Vec<String>,
    /// Type values outside the known set, sorted.
    pub unknown_types: Vec<String>,
    /// Buckets ordered by count, descending; ties keep first-seen order.
    pub record_types: Vec<TypeSummary>,
}

#[derive(Debug, Default)]
struct Bucket {
    count: u64,
    fields: BTreeSet<String>,
}

// ===== SchemaProbe =====

/// Accumulator behind [`SchemaReport`].
#[derive(Debug, Default)]
pub struct SchemaProbe {
    lines: u64,
    bytes: u64,
    first_timestamp: String,
    last_timestamp: String,
    versions: BTreeSet<String>,
    models: BTreeSet<String>,
    unknown_types: BTreeSet<String>,
    order: Vec<String>,
    buckets: HashMap<String, Bucket>,
}

impl SchemaProbe {
    /// Empty probe.
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one physical line of `raw_bytes` bytes (terminator included).
    pub fn record_line(&mut self, line: &str, raw_bytes: u64) {
        self.lines += 1;
        self.bytes += raw_bytes;

        let line = line.trim();
        if line.is_empty() || !line.contains(TYPE_KEY_MARKER) {
            return;
        }
        if let Some(record) = decode_line(line) {
            self.record(&record);
        }
    }

    /// Account for one decoded record. Records without a string `type` are ignored.
    pub fn record(&mut self, record: &Record) {
        if !record.has_type() {
            return;
        }
        let kind = record.kind();
        let name = kind.as_str();

        if !kind.is_known() {
            self.unknown_types.insert(name.to_string());
        }

        if !self.buckets.contains_key(name) {
            self.order.push(name.to_string());
        }
        let bucket = self.buckets.entry(name.to_string()).or_default();
        bucket.count += 1;
        if bucket.count <= FIELD_SAMPLE_LIMIT {
            bucket
                .fields
                .extend(record.field_names().map(str::to_string));
        }

        let version = record.version();
        if !version.is_empty() {
            self.versions.insert(version.to_string());
        }

        let model = record.model();
        if !model.is_empty() && !record.is_synthetic() {
            self.models.insert(model.to_string());
        }

        let ts = record.timestamp();
        if !ts.is_empty() {
            if self.first_timestamp.is_empty() || ts < self.first_timestamp.as_str() {
                self.first_timestamp = ts.to_string();
            }
            if ts > self.last_timestamp.as_str() {
                self.last_timestamp = ts.to_string();
            }
        }
    }

    /// Consume the probe into a report for `file`.
    pub fn finish(mut self, file: impl Into<String>) -> SchemaReport {
        let mut record_types: Vec<TypeSummary> = self
            .order
            .iter()
            .filter_map(|name| {
                self.buckets.remove(name).map(|bucket| TypeSummary {
                    record_type: name.clone(),
                    count: bucket.count,
                    fields: bucket.fields.into_iter().collect(),
                })
            })
            .collect();
        // Stable sort keeps first-seen order among equal counts.
        record_types.sort_by(|a, b| b.count.cmp(&a.count));

        SchemaReport {
            file: file.into(),
            lines: self.lines,
            bytes: self.bytes,
            first_timestamp: self.first_timestamp,
            last_timestamp: self.last_timestamp,
            versions: self.versions.into_iter().collect(),
            models: self.models.into_iter().collect(),
            unknown_types: self.unknown_types.into_iter().collect(),
            record_types,
        }
    }
}
