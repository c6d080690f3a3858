//! Last-24-hour window resolution
//!
//! The window is anchored on the largest timestamp found by the first pass:
//! `cutoff = max - 86400`. Records at or after the cutoff fall into one of 24
//! hour buckets counted from the cutoff.

use crate::models::LogRecord;
use crate::parser::{ParseError, RecordProcessor};
use chrono::DateTime;
use tracing::debug;

pub const WINDOW_SECONDS: i64 = 86_400;
pub const BUCKET_SECONDS: i64 = 3_600;
pub const BUCKET_COUNT: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    cutoff: i64,
}

impl TimeWindow {
    /// Resolve the window from the first-pass maximum, if any valid line was seen.
    pub fn resolve(max_timestamp: Option<i64>) -> Option<Self> {
        max_timestamp.map(|max| Self {
            cutoff: max.saturating_sub(WINDOW_SECONDS),
        })
    }

    pub fn cutoff(&self) -> i64 {
        self.cutoff
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        timestamp >= self.cutoff
    }

    /// Hour bucket for `timestamp`, or `None` when it precedes the cutoff.
    ///
    /// The maximum timestamp itself sits exactly 24h after the cutoff and is
    /// folded into the last bucket.
    pub fn bucket(&self, timestamp: i64) -> Option<usize> {
        if !self.contains(timestamp) {
            return None;
        }
        let offset = (timestamp - self.cutoff) / BUCKET_SECONDS;
        Some((offset as usize).min(BUCKET_COUNT - 1))
    }

    pub fn bucket_start(&self, bucket: usize) -> i64 {
        self.cutoff + bucket as i64 * BUCKET_SECONDS
    }

    /// UTC label for a bucket, truncated to the hour.
    pub fn bucket_label(&self, bucket: usize) -> String {
        let start = self.bucket_start(bucket);
        match DateTime::from_timestamp(start - start.rem_euclid(BUCKET_SECONDS), 0) {
            Some(dt) => dt.format("%Y-%m-%dT%H:%MZ").to_string(),
            None => start.to_string(),
        }
    }
}

/// Outcome of the first pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaxTimestampScan {
    pub max_timestamp: Option<i64>,
    pub valid_lines: u64,
    pub invalid_lines: u64,
}

impl RecordProcessor for MaxTimestampScan {
    type Output = Self;

    fn process_record(&mut self, record: LogRecord, _line_number: usize) {
        self.valid_lines += 1;
        self.max_timestamp = Some(match self.max_timestamp {
            Some(max) => max.max(record.timestamp),
            None => record.timestamp,
        });
    }

    fn process_invalid(&mut self, _error: ParseError, _line_number: usize) {
        self.invalid_lines += 1;
    }

    fn finalize(self) -> Self {
        debug!(
            max_timestamp = ?self.max_timestamp,
            valid_lines = self.valid_lines,
            invalid_lines = self.invalid_lines,
            "Max timestamp scan complete"
        );
        self
    }
}
