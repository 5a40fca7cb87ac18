//! Log input sources.
//!
//! This module provides readers over JSONL transcript files:
//! - Streaming, filtered record iteration (`file`)
//! - Last-snapshot lookup with a reverse chunked scan for large files (`snapshot`)

pub mod file;
pub mod snapshot;

pub use file::{lines_or_empty, open_lines, read_records, LineReader, RawLine, RecordStream};
pub use snapshot::{files_changed, find_last_line, EditedFile, ScanOptions};
