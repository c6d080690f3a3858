//! Running aggregates over accepted records
//!
//! [`AggregationState`] is owned by a single pipeline run. Each accepted record
//! is folded in once; derived figures (rankings, percentages, averages) are
//! only computed when [`AggregationState::snapshot`] materialises the
//! [`Report`].
//!
//! Memory is bounded by the number of distinct IPs, methods and paths, never by
//! the number of lines.

use crate::models::*;
use crate::time_window::{TimeWindow, BUCKET_COUNT};
use std::collections::{HashMap, HashSet};

/// Decimal places used for percentages and averages.
pub const PRECISION: i32 = 2;

/// Limits applied when building a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSettings {
    pub top_ips: usize,
    pub top_urls: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            top_ips: 3,
            top_urls: 5,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AggregationState {
    window: Option<TimeWindow>,
    total_requests: u64,
    total_bytes: u64,
    // Keys double as the set of unique IPs.
    ip_counts: HashMap<String, u64>,
    method_counts: HashMap<String, u64>,
    url_counts: HashMap<String, u64>,
    client_errors: u64,
    server_errors: u64,
    success_count: u64,
    success_bytes: u64,
    recent_ips: HashSet<String>,
    recent_by_hour: [u64; BUCKET_COUNT],
}

impl AggregationState {
    /// Recent-activity tracking is skipped entirely when `window` is `None`.
    pub fn new(window: Option<TimeWindow>) -> Self {
        Self {
            window,
            ..Self::default()
        }
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    pub fn unique_ips(&self) -> usize {
        self.ip_counts.len()
    }

    pub fn fold(&mut self, record: &LogRecord) {
        self.total_requests += 1;
        self.total_bytes = self.total_bytes.saturating_add(record.bytes_sent);
        bump(&mut self.ip_counts, &record.ip);
        bump(&mut self.method_counts, &record.method);
        bump(&mut self.url_counts, &record.path);

        if record.is_client_error() {
            self.client_errors += 1;
        } else if record.is_server_error() {
            self.server_errors += 1;
        }

        if record.is_success() {
            self.success_count += 1;
            self.success_bytes = self.success_bytes.saturating_add(record.bytes_sent);
        }

        if let Some(bucket) = self.window.and_then(|w| w.bucket(record.timestamp)) {
            if !self.recent_ips.contains(&record.ip) {
                self.recent_ips.insert(record.ip.clone());
            }
            self.recent_by_hour[bucket] += 1;
        }
    }

    pub fn snapshot(
        &self,
        filters: &FilterSpec,
        invalid_lines: u64,
        settings: &ReportSettings,
    ) -> Report {
        Report {
            filters: filters.clone(),
            total_requests: self.total_requests,
            unique_ips: self.unique_ips(),
            total_bytes: self.total_bytes,
            invalid_lines,
            top_ip_limit: settings.top_ips,
            top_ips: top_n(&self.ip_counts, settings.top_ips),
            method_distribution: self.method_distribution(),
            top_url_limit: settings.top_urls,
            top_urls: top_n(&self.url_counts, settings.top_urls),
            status: StatusSummary {
                success_2xx: self.success_count,
                client_errors_4xx: self.client_errors,
                server_errors_5xx: self.server_errors,
                average_2xx_bytes: (self.success_count > 0).then(|| {
                    round_to(self.success_bytes as f64 / self.success_count as f64, PRECISION)
                }),
            },
            recent: self.recent_activity(),
        }
    }

    fn method_distribution(&self) -> Vec<MethodShare> {
        if self.total_requests == 0 {
            return Vec::new();
        }
        ranked(&self.method_counts)
            .into_iter()
            .map(|entry| MethodShare {
                percent: round_to(
                    100.0 * entry.count as f64 / self.total_requests as f64,
                    PRECISION,
                ),
                method: entry.key,
                count: entry.count,
            })
            .collect()
    }

    fn recent_activity(&self) -> RecentActivity {
        let Some(window) = self.window else {
            return RecentActivity::default();
        };

        let hourly = self
            .recent_by_hour
            .iter()
            .enumerate()
            .map(|(hour, &count)| HourBucket {
                hour: hour as u8,
                start_timestamp: window.bucket_start(hour),
                label: window.bucket_label(hour),
                count,
            })
            .collect();

        RecentActivity {
            cutoff: Some(window.cutoff()),
            unique_ips: self.recent_ips.len(),
            total_requests: self.recent_by_hour.iter().sum(),
            hourly,
        }
    }
}

fn bump(counts: &mut HashMap<String, u64>, key: &str) {
    match counts.get_mut(key) {
        Some(count) => *count += 1,
        None => {
            counts.insert(key.to_string(), 1);
        }
    }
}

/// All entries by count descending, ties broken by key ascending.
fn ranked(counts: &HashMap<String, u64>) -> Vec<RankedEntry> {
    let mut entries: Vec<RankedEntry> = counts
        .iter()
        .map(|(key, &count)| RankedEntry {
            key: key.clone(),
            count,
        })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    entries
}

fn top_n(counts: &HashMap<String, u64>, n: usize) -> Vec<RankedEntry> {
    let mut entries = ranked(counts);
    entries.truncate(n);
    entries
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
