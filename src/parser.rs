//! Access-log line parsing and streaming
//!
//! [`LineParser`] turns one raw line into a [`LogRecord`]. Lines are
//! whitespace-delimited with six fields whose order is described by a
//! [`LineFormat`]; the default order is `timestamp ip method path status bytes`.
//!
//! Parsing never panics. A malformed line is an expected outcome reported as
//! a [`ParseError`], which the streaming layer hands to the active
//! [`RecordProcessor`] instead of aborting.

use crate::errors::{AnalyzerError, Result};
use crate::models::LogRecord;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub const FIELD_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Timestamp,
    Ip,
    Method,
    Path,
    Status,
    Bytes,
}

impl Field {
    pub const ALL: [Field; FIELD_COUNT] = [
        Field::Timestamp,
        Field::Ip,
        Field::Method,
        Field::Path,
        Field::Status,
        Field::Bytes,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Field::Timestamp => "timestamp",
            Field::Ip => "ip",
            Field::Method => "method",
            Field::Path => "path",
            Field::Status => "status",
            Field::Bytes => "bytes",
        }
    }

    const fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = AnalyzerError;

    fn from_str(s: &str) -> Result<Self> {
        Field::ALL
            .into_iter()
            .find(|field| field.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AnalyzerError::config(format!("unknown log field: {s:?}")))
    }
}

/// Column order of the six log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineFormat {
    order: [Field; FIELD_COUNT],
}

impl Default for LineFormat {
    fn default() -> Self {
        Self { order: Field::ALL }
    }
}

impl LineFormat {
    /// Build a format from field names; each of the six fields must appear exactly once.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        if names.len() != FIELD_COUNT {
            return Err(AnalyzerError::config(format!(
                "log format needs exactly {FIELD_COUNT} fields, got {}",
                names.len()
            )));
        }

        let mut order = Field::ALL;
        let mut seen = [false; FIELD_COUNT];
        for (position, name) in names.iter().enumerate() {
            let field: Field = name.as_ref().parse()?;
            if std::mem::replace(&mut seen[field.slot()], true) {
                return Err(AnalyzerError::config(format!(
                    "log field {field} listed more than once"
                )));
            }
            order[position] = field;
        }

        Ok(Self { order })
    }

    pub fn fields(&self) -> &[Field; FIELD_COUNT] {
        &self.order
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected 6 fields, found {found}")]
    FieldCount { found: usize },

    #[error("{field} is not a valid integer: {value:?}")]
    NotAnInteger { field: Field, value: String },

    #[error("status {0} outside 100-599")]
    StatusOutOfRange(i64),

    #[error("line is not valid UTF-8")]
    InvalidUtf8,
}

#[derive(Debug, Clone, Default)]
pub struct LineParser {
    format: LineFormat,
}

impl LineParser {
    pub fn new(format: LineFormat) -> Self {
        Self { format }
    }

    pub fn parse(&self, line: &str) -> std::result::Result<LogRecord, ParseError> {
        let mut columns = [""; FIELD_COUNT];
        let mut found = 0;
        for token in line.split_whitespace() {
            if found < FIELD_COUNT {
                columns[found] = token;
            }
            found += 1;
        }
        if found != FIELD_COUNT {
            return Err(ParseError::FieldCount { found });
        }

        // Reorder columns into canonical field slots.
        let mut values = [""; FIELD_COUNT];
        for (column, field) in columns.iter().zip(self.format.order) {
            values[field.slot()] = *column;
        }
        let value = |field: Field| values[field.slot()];

        let timestamp: i64 = parse_int(Field::Timestamp, value(Field::Timestamp))?;
        let status: i64 = parse_int(Field::Status, value(Field::Status))?;
        if !(100..=599).contains(&status) {
            return Err(ParseError::StatusOutOfRange(status));
        }
        let bytes_sent: u64 = parse_int(Field::Bytes, value(Field::Bytes))?;

        Ok(LogRecord {
            ip: value(Field::Ip).to_string(),
            timestamp,
            method: value(Field::Method).to_ascii_uppercase(),
            path: value(Field::Path).to_string(),
            status: status as u16,
            bytes_sent,
        })
    }
}

fn parse_int<T: FromStr>(field: Field, raw: &str) -> std::result::Result<T, ParseError> {
    raw.parse().map_err(|_| ParseError::NotAnInteger {
        field,
        value: raw.to_string(),
    })
}

/// A line source that can be opened more than once.
///
/// The pipeline reads its input twice, so sources must hand out a fresh
/// reader positioned at the start on every call.
pub trait LogSource {
    fn open(&self) -> std::io::Result<Box<dyn BufRead + '_>>;

    /// Name used in diagnostics and error messages.
    fn name(&self) -> &Path;
}

#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LogSource for FileSource {
    fn open(&self) -> std::io::Result<Box<dyn BufRead + '_>> {
        let file = File::open(&self.path)?;
        if file.metadata()?.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "path is a directory",
            ));
        }
        Ok(Box::new(BufReader::new(file)))
    }

    fn name(&self) -> &Path {
        &self.path
    }
}

/// In-memory source, mostly for tests and benchmarks.
#[derive(Debug, Clone)]
pub struct MemorySource {
    content: Vec<u8>,
    name: PathBuf,
}

impl MemorySource {
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
            name: PathBuf::from("<memory>"),
        }
    }
}

impl LogSource for MemorySource {
    fn open(&self) -> std::io::Result<Box<dyn BufRead + '_>> {
        Ok(Box::new(Cursor::new(self.content.as_slice())))
    }

    fn name(&self) -> &Path {
        &self.name
    }
}

// Trait for consuming a stream of parsed lines
pub trait RecordProcessor {
    type Output;

    fn process_record(&mut self, record: LogRecord, line_number: usize);

    fn process_invalid(&mut self, _error: ParseError, _line_number: usize) {}

    fn finalize(self) -> Self::Output;
}

/// Stream every line of `reader` through `parser` into `processor`.
///
/// Only I/O failures are returned as errors; malformed lines are passed to
/// [`RecordProcessor::process_invalid`].
pub fn process_lines<R, P>(
    mut reader: R,
    parser: &LineParser,
    mut processor: P,
    source_name: &Path,
) -> Result<P::Output>
where
    R: BufRead,
    P: RecordProcessor,
{
    let mut buf = Vec::new();
    let mut line_number = 0;

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|source| AnalyzerError::Read {
                path: source_name.to_path_buf(),
                line: line_number + 1,
                source,
            })?;
        if read == 0 {
            break;
        }
        line_number += 1;

        let parsed = match std::str::from_utf8(&buf) {
            Ok(line) => parser.parse(line),
            Err(_) => Err(ParseError::InvalidUtf8),
        };
        match parsed {
            Ok(record) => processor.process_record(record, line_number),
            Err(error) => processor.process_invalid(error, line_number),
        }
    }

    Ok(processor.finalize())
}
