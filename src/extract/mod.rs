//! Single-file passes over a session log.
//!
//! Each function here is a pure function of a file path and options. A
//! missing or unreadable file produces an empty result, never an error.

pub mod messages;
pub mod tools;

pub use messages::{extract_messages, MessageOptions, RoleFilter, ThinkingMode, Turn};
pub use tools::{extract_tools, ToolOptions, ToolStatus, ToolTrace};

use crate::model::{SchemaProbe, SchemaReport, SessionStats};
use crate::source::file::lines_or_empty;
use std::path::Path;

/// Session statistics of one log file, in a single forward pass.
pub fn session_stats(path: impl AsRef<Path>) -> SessionStats {
    SessionStats::from_lines(lines_or_empty(path).map(|line| line.text))
}

/// Structural report of one log file, in a single forward pass.
pub fn detect_schema(path: impl AsRef<Path>) -> SchemaReport {
    let path = path.as_ref();
    let mut probe = SchemaProbe::new();
    for line in lines_or_empty(path) {
        probe.record_line(&line.text, line.bytes);
    }
    probe.finish(path.display().to_string())
}
