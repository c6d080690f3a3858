//! Output Formatting and Display Management
//!
//! Renders a [`Report`] either as a human-readable, optionally colored text
//! report or as JSON. Rendering never changes the report; every field the
//! report exposes appears in both formats.
//!
//! ## Text layout
//!
//! - Filter settings
//! - Basic statistics (requests, unique IPs, bytes, skipped lines)
//! - Request distribution by method
//! - Performance metrics (2xx/4xx/5xx, average 2xx size)
//! - Top N active IPs and top requested URLs
//! - Recent activity over the last 24 hours

use crate::models::*;
use colored::Colorize;
use std::fmt::Write;

const NO_DATA: &str = "(no data)";

pub struct DisplayManager {
    json_pretty: bool,
}

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new(true)
    }
}

impl DisplayManager {
    pub fn new(json_pretty: bool) -> Self {
        Self { json_pretty }
    }

    pub fn render_json(&self, report: &Report) -> serde_json::Result<String> {
        if self.json_pretty {
            serde_json::to_string_pretty(report)
        } else {
            serde_json::to_string(report)
        }
    }

    pub fn render_text(&self, report: &Report) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_text(&mut out, report);
        out
    }

    fn write_text(&self, out: &mut String, report: &Report) -> std::fmt::Result {
        writeln!(out, "{}", "====== TRAFFIC ANALYSIS REPORT ======".bold())?;
        writeln!(out)?;

        self.write_filters(out, &report.filters)?;

        writeln!(out, "{}", "Basic statistics:".cyan().bold())?;
        writeln!(out, "Total requests: {}", report.total_requests)?;
        writeln!(out, "Unique IPs: {}", report.unique_ips)?;
        writeln!(
            out,
            "Total data transferred: {} ({})",
            report.total_bytes,
            human_readable_bytes(report.total_bytes)
        )?;
        writeln!(out, "Invalid lines skipped: {}", report.invalid_lines)?;
        writeln!(out)?;

        writeln!(out, "{}", "Request distribution:".cyan().bold())?;
        if report.method_distribution.is_empty() {
            writeln!(out, "{NO_DATA}")?;
        }
        for share in &report.method_distribution {
            writeln!(out, "- {}: {:.2}%", share.method, share.percent)?;
        }
        writeln!(out)?;

        let status = &report.status;
        writeln!(out, "{}", "Performance metrics:".cyan().bold())?;
        writeln!(out, "- Successful requests (2xx): {}", status.success_2xx.to_string().green())?;
        writeln!(out, "- Client errors (4xx): {}", status.client_errors_4xx.to_string().yellow())?;
        writeln!(out, "- Server errors (5xx): {}", status.server_errors_5xx.to_string().red())?;
        match status.average_2xx_bytes {
            Some(avg) => writeln!(out, "- Average response size (2xx): {avg:.2} bytes")?,
            None => writeln!(out, "- Average response size (2xx): 0.00 bytes (no 2xx traffic)")?,
        }
        writeln!(out)?;

        let title = format!("Top {} active IPs:", report.top_ip_limit);
        writeln!(out, "{}", title.cyan().bold())?;
        self.write_ranked(out, &report.top_ips, " requests")?;
        writeln!(out)?;

        let title = format!("Top {} requested URLs:", report.top_url_limit);
        writeln!(out, "{}", title.cyan().bold())?;
        self.write_ranked(out, &report.top_urls, "")?;
        writeln!(out)?;

        self.write_recent(out, &report.recent)
    }

    fn write_filters(&self, out: &mut String, filters: &FilterSpec) -> std::fmt::Result {
        writeln!(out, "{}", "Filter settings:".cyan().bold())?;
        match (filters.start_time, filters.end_time) {
            (None, None) => writeln!(out, "- Time range: all time")?,
            (start, end) => writeln!(
                out,
                "- Time range: {} - {}",
                start.map_or_else(|| "none".to_string(), |t| t.to_string()),
                end.map_or_else(|| "none".to_string(), |t| t.to_string()),
            )?,
        }
        writeln!(
            out,
            "- Method filter: {}",
            filters.method.as_deref().unwrap_or("all methods")
        )?;
        match (filters.status_low, filters.status_high) {
            (Some(low), Some(high)) if low == high => writeln!(out, "- Status filter: {low}")?,
            (Some(low), Some(high)) => writeln!(out, "- Status filter: {low}-{high}")?,
            _ => writeln!(out, "- Status filter: all statuses")?,
        }
        writeln!(out)
    }

    fn write_ranked(
        &self,
        out: &mut String,
        entries: &[RankedEntry],
        suffix: &str,
    ) -> std::fmt::Result {
        if entries.is_empty() {
            return writeln!(out, "{NO_DATA}");
        }
        for (i, entry) in entries.iter().enumerate() {
            writeln!(out, "{}. {}: {}{}", i + 1, entry.key, entry.count, suffix)?;
        }
        Ok(())
    }

    fn write_recent(&self, out: &mut String, recent: &RecentActivity) -> std::fmt::Result {
        writeln!(out, "{}", "Recent activity (last 24h):".cyan().bold())?;
        writeln!(out, "- Unique IPs: {}", recent.unique_ips)?;
        writeln!(out, "- Total requests: {}", recent.total_requests)?;
        let hours: Vec<String> = recent
            .hourly
            .iter()
            .map(|bucket| format!("[{}: {}]", bucket.label, bucket.count))
            .collect();
        writeln!(out, "- Requests per hour (last 24h): [{}]", hours.join(", "))
    }
}

/// Format a byte count with binary units and two decimals.
pub fn human_readable_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}
