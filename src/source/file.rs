//! File-based record streaming.
//!
//! [`LineReader`] yields raw lines with lossy UTF-8 decoding; [`RecordStream`]
//! layers pre-filtering, decoding, type filtering and the result cap on top.
//! Both are lazy: a consumer that stops pulling stops the read.

use crate::model::error::InputError;
use crate::model::Record;
use crate::parser::{decode_line, RecordFilter};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

// ===== LineReader =====

/// One physical line of a log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    /// Line text without the trailing `\n`. Invalid UTF-8 is replaced.
    pub text: String,
    /// Bytes the line occupied on disk, terminator included.
    pub bytes: u64,
}

/// Iterator over the raw lines of a reader.
///
/// A read error ends the iteration early (logged at debug level): a
/// partially readable file yields everything before the failure.
#[derive(Debug)]
pub struct LineReader<R> {
    reader: R,
    path: PathBuf,
    buf: Vec<u8>,
    done: bool,
}

impl<R: BufRead> LineReader<R> {
    /// Wrap a buffered reader. `path` is used for diagnostics only.
    pub fn new(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            path: path.into(),
            buf: Vec::new(),
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for LineReader<R> {
    type Item = RawLine;

    fn next(&mut self) -> Option<RawLine> {
        if self.done {
            return None;
        }
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(n) => {
                let body = self.buf.strip_suffix(b"\n").unwrap_or(&self.buf[..]);
                Some(RawLine {
                    text: String::from_utf8_lossy(body).into_owned(),
                    bytes: n as u64,
                })
            }
            Err(error) => {
                debug!(path = %self.path.display(), %error, "Read failed, stopping early");
                self.done = true;
                None
            }
        }
    }
}

/// Open a file for line-by-line reading.
///
/// # Errors
///
/// Returns `InputError::FileNotFound` if the file does not exist.
/// Returns `InputError::Io` for other I/O errors.
pub fn open_lines(path: impl AsRef<Path>) -> Result<LineReader<BufReader<File>>, InputError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| InputError::from_io(path, e))?;
    Ok(LineReader::new(BufReader::new(file), path))
}

/// Raw lines of a file, or an empty iterator if it cannot be opened.
pub fn lines_or_empty(path: impl AsRef<Path>) -> impl Iterator<Item = RawLine> {
    let path = path.as_ref();
    match open_lines(path) {
        Ok(lines) => Some(lines),
        Err(error) => {
            debug!(path = %path.display(), %error, "Treating unreadable log as empty");
            None
        }
    }
    .into_iter()
    .flatten()
}

// ===== RecordStream =====

/// Lazy, filtered sequence of decoded records in file order.
///
/// Blank and malformed lines are skipped silently. Stops once
/// `filter.limit` records have been produced (0 = no cap).
#[derive(Debug)]
pub struct RecordStream<R = BufReader<File>> {
    lines: Option<LineReader<R>>,
    filter: RecordFilter,
    yielded: usize,
}

impl<R: BufRead> RecordStream<R> {
    /// Stream records from an already-open reader.
    pub fn from_reader(reader: R, filter: RecordFilter) -> Self {
        Self {
            lines: Some(LineReader::new(reader, "<reader>")),
            filter,
            yielded: 0,
        }
    }

    fn from_lines(lines: Option<LineReader<R>>, filter: RecordFilter) -> Self {
        Self {
            lines,
            filter,
            yielded: 0,
        }
    }
}

impl<R: BufRead> Iterator for RecordStream<R> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        if self.filter.limit > 0 && self.yielded >= self.filter.limit {
            return None;
        }
        let lines = self.lines.as_mut()?;
        for raw in lines.by_ref() {
            let line = raw.text.trim();
            if line.is_empty() || self.filter.prefilter_rejects(line) {
                continue;
            }
            let Some(record) = decode_line(line) else {
                continue;
            };
            if !self.filter.accepts(record.kind()) {
                continue;
            }
            self.yielded += 1;
            return Some(record);
        }
        None
    }
}

impl RecordStream {
    /// Open a log file for streaming.
    ///
    /// # Errors
    ///
    /// Returns `InputError` if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>, filter: RecordFilter) -> Result<Self, InputError> {
        Ok(Self::from_lines(Some(open_lines(path)?), filter))
    }
}

/// Stream the records of a log file.
///
/// A missing or unreadable file yields an empty stream; the cause is
/// logged at debug level.
pub fn read_records(path: impl AsRef<Path>, filter: RecordFilter) -> RecordStream {
    let path = path.as_ref();
    match RecordStream::open(path, filter.clone()) {
        Ok(stream) => stream,
        Err(error) => {
            debug!(path = %path.display(), %error, "Treating unreadable log as empty");
            RecordStream::from_lines(None, filter)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordType;
    use std::fs;
    use std::io::{Cursor, Write};
    use tempfile::TempDir;

    fn stream(content: &str, filter: RecordFilter) -> Vec<Record> {
        RecordStream::from_reader(Cursor::new(content.as_bytes().to_vec()), filter).collect()
    }

    #[test]
    fn line_reader_strips_newline_and_counts_bytes() {
        let lines: Vec<RawLine> = LineReader::new(Cursor::new(b"ab\n\ncd".to_vec()), "t").collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], RawLine { text: "ab".into(), bytes: 3 });
        assert_eq!(lines[1], RawLine { text: "".into(), bytes: 1 });
        assert_eq!(lines[2], RawLine { text: "cd".into(), bytes: 2 });
    }

    #[test]
    fn line_reader_replaces_invalid_utf8() {
        let lines: Vec<RawLine> =
            LineReader::new(Cursor::new(b"a\xffb\n".to_vec()), "t").collect();
        assert_eq!(lines[0].text, "a\u{FFFD}b");
        assert_eq!(lines[0].bytes, 4);
    }

    #[test]
    fn stream_skips_noise_blank_and_malformed_lines() {
        let content = concat!(
            r#"{"type":"user","message":{"content":"a"}}"#,
            "\n\n",
            r#"{"type":"progress","data":{}}"#,
            "\n",
            r#"{"type":"assistant","message":{"#,
            "\n",
            r#"{"type":"queue-operation"}"#,
            "\n",
            r#"{"type":"assistant","message":{"content":[]}}"#,
            "\n",
        );
        let kinds: Vec<RecordType> = stream(content, RecordFilter::default())
            .iter()
            .map(|r| r.kind().clone())
            .collect();
        assert_eq!(kinds, vec![RecordType::User, RecordType::Assistant]);
    }

    #[test]
    fn stream_keeps_noise_when_asked() {
        let content = "{\"type\":\"progress\"}\n{\"type\":\"user\"}\n";
        assert_eq!(stream(content, RecordFilter::new().include_noise()).len(), 2);
    }

    #[test]
    fn stream_applies_type_set() {
        let content = concat!(
            "{\"type\":\"summary\",\"summary\":\"s\"}\n",
            "{\"type\":\"file-history-snapshot\",\"snapshot\":{}}\n",
            "{\"type\":\"user\"}\n",
        );
        let records = stream(content, RecordFilter::new().with_types([RecordType::Summary]));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].summary(), "s");
    }

    #[test]
    fn stream_stops_at_limit() {
        let content = "{\"type\":\"user\"}\n".repeat(10);
        assert_eq!(stream(&content, RecordFilter::new().with_limit(3)).len(), 3);
        assert_eq!(stream(&content, RecordFilter::new().with_limit(0)).len(), 10);
    }

    #[test]
    fn stream_yields_records_before_a_torn_tail() {
        let content = "{\"type\":\"user\"}\n{\"type\":\"assistant\",\"mess";
        let records = stream(content, RecordFilter::default());
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn read_records_on_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let records: Vec<Record> =
            read_records(dir.path().join("missing.jsonl"), RecordFilter::default()).collect();
        assert!(records.is_empty());
    }

    #[test]
    fn read_records_reads_file_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("s.jsonl");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, r#"{{"type":"user","uuid":"1"}}"#).unwrap();
        writeln!(file, r#"{{"type":"assistant","uuid":"2"}}"#).unwrap();
        drop(file);

        let uuids: Vec<String> = read_records(&path, RecordFilter::default())
            .map(|r| r.uuid().to_string())
            .collect();
        assert_eq!(uuids, vec!["1", "2"]);
    }

    #[test]
    fn open_lines_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = open_lines(dir.path().join("nope.jsonl"));
        assert!(matches!(result, Err(InputError::FileNotFound { .. })));
    }
}
