//! Domain model types.
//!
//! Typed views over decoded records plus the accumulators and summaries
//! derived from them. Nothing in here touches the filesystem.

pub mod error;
pub mod message;
pub mod record;
pub mod schema;
pub mod session;
pub mod stats;
pub mod text;
pub mod usage;

// Re-export for convenience
pub use error::{CacheError, InputError, ParseError};
pub use message::{ContentBlock, MessageContent, Role, ToolName};
pub use record::{Record, RecordType};
pub use schema::{SchemaProbe, SchemaReport, TypeSummary};
pub use session::{IndexEntry, SessionMeta, SessionsIndex};
pub use stats::SessionStats;
pub use text::{sanitize_tsv, truncate_chars};
pub use usage::TokenUsage;
