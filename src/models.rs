//! Core Data Models
//!
//! This module defines the data structures that flow through the traffic
//! analysis pipeline, from a single parsed log line to the final report.
//!
//! ## Data Flow
//!
//! 1. **Raw Data**: [`LogRecord`] - one successfully parsed access-log line
//! 2. **Selection**: [`FilterSpec`] - the method/status/time constraints a record must satisfy
//! 3. **Output**: [`Report`] - immutable snapshot built once after the second pass
//!
//! ## Report Types
//!
//! - [`RankedEntry`] - a key with its request count, used for top IPs and top URLs
//! - [`MethodShare`] - a method with its count and percentage of all requests
//! - [`StatusSummary`] - 2xx/4xx/5xx counters and the average 2xx response size
//! - [`RecentActivity`] - last-24h unique IPs and the per-hour histogram
//! - [`HourBucket`] - one hour of the recent histogram
//!
//! All report types derive `Serialize` so the CLI can emit them as JSON.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub ip: String,
    pub timestamp: i64,
    /// Upper-cased at parse time.
    pub method: String,
    pub path: String,
    pub status: u16,
    pub bytes_sent: u64,
}

impl LogRecord {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

/// Record selection constraints. Every `None` bound is inactive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub method: Option<String>,
    #[serde(rename = "statusLow")]
    pub status_low: Option<u16>,
    #[serde(rename = "statusHigh")]
    pub status_high: Option<u16>,
    #[serde(rename = "startTime")]
    pub start_time: Option<i64>,
    #[serde(rename = "endTime")]
    pub end_time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub key: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodShare {
    pub method: String,
    pub count: u64,
    /// Percentage of all matched requests, rounded to two decimals.
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSummary {
    #[serde(rename = "success2xx")]
    pub success_2xx: u64,
    #[serde(rename = "clientErrors4xx")]
    pub client_errors_4xx: u64,
    #[serde(rename = "serverErrors5xx")]
    pub server_errors_5xx: u64,
    /// `None` when there was no 2xx traffic.
    #[serde(rename = "average2xxBytes")]
    pub average_2xx_bytes: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourBucket {
    /// Offset from the cutoff, 0..=23.
    pub hour: u8,
    #[serde(rename = "startTimestamp")]
    pub start_timestamp: i64,
    /// UTC hour label, e.g. `2024-01-15T10:00Z`.
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecentActivity {
    /// Start of the last-24h window; `None` when the input had no valid lines.
    pub cutoff: Option<i64>,
    #[serde(rename = "uniqueIps")]
    pub unique_ips: usize,
    #[serde(rename = "totalRequests")]
    pub total_requests: u64,
    pub hourly: Vec<HourBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub filters: FilterSpec,
    #[serde(rename = "totalRequests")]
    pub total_requests: u64,
    #[serde(rename = "uniqueIps")]
    pub unique_ips: usize,
    #[serde(rename = "totalBytes")]
    pub total_bytes: u64,
    #[serde(rename = "invalidLines")]
    pub invalid_lines: u64,
    #[serde(rename = "topIpLimit")]
    pub top_ip_limit: usize,
    #[serde(rename = "topIps")]
    pub top_ips: Vec<RankedEntry>,
    #[serde(rename = "methodDistribution")]
    pub method_distribution: Vec<MethodShare>,
    #[serde(rename = "topUrlLimit")]
    pub top_url_limit: usize,
    #[serde(rename = "topUrls")]
    pub top_urls: Vec<RankedEntry>,
    pub status: StatusSummary,
    pub recent: RecentActivity,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.total_requests == 0
    }
}

/// Non-fatal conditions reported beside a valid [`Report`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Advisory {
    NoMatchingRecords,
}

impl std::fmt::Display for Advisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoMatchingRecords => write!(f, "No valid records matched the filters."),
        }
    }
}
