//! echo-sleuth
//!
//! Read-only inspection of Claude Code JSONL session transcripts: session
//! statistics, conversation turns, tool-call traces, edited files, project
//! directory resolution and a searchable cross-project session index.
//!
//! Every query is a function of a file or directory path plus options. A
//! missing file or a malformed line degrades to an empty or partial result;
//! nothing in the core aborts on bad input.

pub mod config;
pub mod extract;
pub mod index;
pub mod logging;
pub mod model;
pub mod parser;
pub mod resolve;
pub mod source;

pub use extract::{
    detect_schema, extract_messages, extract_tools, session_stats, MessageOptions, RoleFilter,
    ThinkingMode, ToolOptions, ToolStatus, ToolTrace, Turn,
};
pub use index::{build_fallback_index, load_index, ListQuery, Scope, SessionLister};
pub use model::{Record, RecordType, SchemaReport, SessionMeta, SessionStats};
pub use parser::{decode_line, RecordFilter};
pub use resolve::{find_subagent_files, ProjectResolver, Resolution};
pub use source::{files_changed, read_records, EditedFile, ScanOptions};
