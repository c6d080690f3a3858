//! Record filtering
//!
//! A [`Filter`] wraps a validated [`FilterSpec`]. Validation happens once, when
//! the filter is built; per-record matching is a pure predicate that ANDs the
//! method, status and time constraints.

use crate::errors::{AnalyzerError, Result};
use crate::models::{FilterSpec, LogRecord};

pub const ALLOWED_METHODS: [&str; 7] = ["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

/// Parse a status filter: a single code (`404`) or an inclusive range (`400-499`).
pub fn parse_status_filter(raw: &str) -> Result<(u16, u16)> {
    let raw = raw.trim();
    match raw.split_once('-') {
        Some((low, high)) => {
            let bounds = low.trim().parse::<u16>().ok().zip(high.trim().parse::<u16>().ok());
            match bounds {
                Some((low, high)) if low <= high => Ok((low, high)),
                _ => Err(AnalyzerError::config(format!(
                    "invalid --status range {raw:?} (use 400-499)"
                ))),
            }
        }
        None => raw
            .parse::<u16>()
            .map(|code| (code, code))
            .map_err(|_| AnalyzerError::config(format!("invalid --status value {raw:?}"))),
    }
}

impl FilterSpec {
    /// Build a spec from raw caller options, normalising the method to upper case.
    pub fn from_options(
        method: Option<&str>,
        status: Option<&str>,
        start_time: Option<i64>,
        end_time: Option<i64>,
    ) -> Result<Self> {
        let method = match method {
            Some(m) => {
                let upper = m.trim().to_ascii_uppercase();
                if !ALLOWED_METHODS.contains(&upper.as_str()) {
                    return Err(AnalyzerError::config(format!(
                        "unsupported HTTP method: {upper}"
                    )));
                }
                Some(upper)
            }
            None => None,
        };

        let (status_low, status_high) = match status {
            Some(raw) => {
                let (low, high) = parse_status_filter(raw)?;
                (Some(low), Some(high))
            }
            None => (None, None),
        };

        let spec = Self {
            method,
            status_low,
            status_high,
            start_time,
            end_time,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<()> {
        if let (Some(low), Some(high)) = (self.status_low, self.status_high) {
            if low > high {
                return Err(AnalyzerError::config(format!(
                    "status range is inverted: {low} > {high}"
                )));
            }
        }
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if start > end {
                return Err(AnalyzerError::config("--start must be <= --end"));
            }
        }
        Ok(())
    }

    pub fn matches(&self, record: &LogRecord) -> bool {
        if let Some(method) = &self.method {
            if !record.method.eq_ignore_ascii_case(method) {
                return false;
            }
        }
        if self.status_low.is_some_and(|low| record.status < low) {
            return false;
        }
        if self.status_high.is_some_and(|high| record.status > high) {
            return false;
        }
        if self.start_time.is_some_and(|start| record.timestamp < start) {
            return false;
        }
        if self.end_time.is_some_and(|end| record.timestamp > end) {
            return false;
        }
        true
    }
}

/// A filter whose bounds have been checked.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    spec: FilterSpec,
}

impl Filter {
    pub fn new(spec: FilterSpec) -> Result<Self> {
        spec.validate()?;
        Ok(Self { spec })
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    pub fn matches(&self, record: &LogRecord) -> bool {
        self.spec.matches(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(method: &str, status: u16, timestamp: i64) -> LogRecord {
        LogRecord {
            ip: "10.0.0.1".to_string(),
            timestamp,
            method: method.to_string(),
            path: "/".to_string(),
            status,
            bytes_sent: 100,
        }
    }

    #[test]
    fn test_parse_status_single_and_range() {
        assert_eq!(parse_status_filter("404").unwrap(), (404, 404));
        assert_eq!(parse_status_filter("400-499").unwrap(), (400, 499));
        assert_eq!(parse_status_filter(" 500 - 599 ").unwrap(), (500, 599));
    }

    #[test]
    fn test_parse_status_rejects_malformed() {
        for raw in ["abc", "499-400", "400-", "-5", "4xx", "70000"] {
            assert!(parse_status_filter(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn test_from_options_normalises_method() {
        let spec = FilterSpec::from_options(Some("get"), None, None, None).unwrap();
        assert_eq!(spec.method.as_deref(), Some("GET"));
        assert!(FilterSpec::from_options(Some("BREW"), None, None, None).is_err());
    }

    #[test]
    fn test_from_options_rejects_inverted_time_window() {
        let err = FilterSpec::from_options(None, None, Some(200), Some(100)).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(FilterSpec::from_options(None, None, Some(100), Some(100)).is_ok());
    }

    #[test]
    fn test_filter_new_rejects_inverted_status() {
        let spec = FilterSpec {
            status_low: Some(500),
            status_high: Some(400),
            ..FilterSpec::default()
        };
        assert!(Filter::new(spec).is_err());
    }

    #[test]
    fn test_unrestricted_matches_everything() {
        let filter = Filter::default();
        assert_eq!(filter.spec(), &FilterSpec::default());
        assert!(filter.matches(&record("GET", 200, 0)));
        assert!(filter.matches(&record("BREW", 599, -10)));
    }

    #[test]
    fn test_method_is_case_insensitive() {
        let spec = FilterSpec {
            method: Some("post".to_string()),
            ..FilterSpec::default()
        };
        assert!(spec.matches(&record("POST", 200, 0)));
        assert!(!spec.matches(&record("GET", 200, 0)));
    }

    #[test]
    fn test_status_and_time_bounds_are_inclusive() {
        let spec = FilterSpec::from_options(None, Some("400-499"), Some(100), Some(200)).unwrap();
        assert!(spec.matches(&record("GET", 400, 100)));
        assert!(spec.matches(&record("GET", 499, 200)));
        assert!(!spec.matches(&record("GET", 500, 150)));
        assert!(!spec.matches(&record("GET", 404, 99)));
        assert!(!spec.matches(&record("GET", 404, 201)));
    }

    #[test]
    fn test_open_ended_time_bounds() {
        let after = FilterSpec {
            start_time: Some(1000),
            ..FilterSpec::default()
        };
        assert!(after.matches(&record("GET", 200, 1000)));
        assert!(!after.matches(&record("GET", 200, 999)));

        let before = FilterSpec {
            end_time: Some(0),
            ..FilterSpec::default()
        };
        assert!(before.matches(&record("GET", 200, 0)));
        assert!(!before.matches(&record("GET", 200, 1)));
    }
}
