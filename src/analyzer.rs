//! Traffic Analysis Engine
//!
//! This module orchestrates the two-pass analysis of an access log.
//!
//! ## Processing Pipeline
//!
//! The [`Pipeline`] walks three stages in strict order:
//!
//! 1. **ScanningMax**: stream the input once, parsing every line and tracking the
//!    largest timestamp. Malformed lines are only counted.
//! 2. **Aggregating**: resolve the last-24h [`TimeWindow`] from that maximum, re-open
//!    the input, and fold every record that passes the [`Filter`] into an
//!    [`AggregationState`]. Malformed lines are counted and logged with their
//!    line number.
//! 3. **Done**: snapshot the state into an immutable [`Report`].
//!
//! The input is opened before the first stage begins, so an unreadable file
//! fails fast with no partial report. A run that matches nothing still
//! produces a complete, zeroed report together with
//! [`Advisory::NoMatchingRecords`].
//!
//! ## Key Types
//!
//! - [`TrafficAnalyzer`] - configured entry point used by the CLI
//! - [`Pipeline`] - a single two-pass run over one [`LogSource`]
//! - [`PipelineOutput`] - the report plus any advisory
//!
//! ## Usage Example
//!
//! ```rust
//! use traffic_analyzer::analyzer::TrafficAnalyzer;
//! use traffic_analyzer::models::FilterSpec;
//! use traffic_analyzer::parser::MemorySource;
//!
//! # fn example() -> traffic_analyzer::errors::Result<()> {
//! let analyzer = TrafficAnalyzer::default();
//! let source = MemorySource::new("1700000000 10.0.0.1 GET / 200 512\n");
//! let output = analyzer.analyze(&source, FilterSpec::default())?;
//! assert_eq!(output.report.total_requests, 1);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use crate::aggregation::{AggregationState, ReportSettings};
use crate::config::Config;
use crate::errors::{AnalyzerError, Result};
use crate::filter::Filter;
use crate::logging::new_run_id;
use crate::models::*;
use crate::parser::{process_lines, FileSource, LineParser, LogSource, ParseError, RecordProcessor};
use crate::time_window::{MaxTimestampScan, TimeWindow};
use std::io::BufRead;
use std::path::Path;
use tracing::{debug, info, info_span, warn};

/// Result of a completed pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub report: Report,
    pub advisory: Option<Advisory>,
}

enum Stage<'r> {
    ScanningMax(Box<dyn BufRead + 'r>),
    Aggregating { window: Option<TimeWindow> },
    Done(Report),
}

pub struct Pipeline<'a> {
    source: &'a dyn LogSource,
    parser: &'a LineParser,
    filter: Filter,
    settings: ReportSettings,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        source: &'a dyn LogSource,
        parser: &'a LineParser,
        filter: Filter,
        settings: ReportSettings,
    ) -> Result<Self> {
        if settings.top_ips == 0 {
            return Err(AnalyzerError::config("--top must be positive"));
        }
        if settings.top_urls == 0 {
            return Err(AnalyzerError::config("top URL limit must be positive"));
        }
        Ok(Self {
            source,
            parser,
            filter,
            settings,
        })
    }

    fn open(&self) -> Result<Box<dyn BufRead + 'a>> {
        self.source.open().map_err(|source| AnalyzerError::Input {
            path: self.source.name().to_path_buf(),
            source,
        })
    }

    pub fn run(&self) -> Result<PipelineOutput> {
        let span = info_span!(
            "analysis",
            run_id = %new_run_id(),
            source = %self.source.name().display()
        );
        let _enter = span.enter();

        let mut stage = Stage::ScanningMax(self.open()?);
        loop {
            stage = match stage {
                Stage::ScanningMax(reader) => {
                    let scan = process_lines(
                        reader,
                        self.parser,
                        MaxTimestampScan::default(),
                        self.source.name(),
                    )?;
                    let window = TimeWindow::resolve(scan.max_timestamp);
                    info!(
                        valid_lines = scan.valid_lines,
                        invalid_lines = scan.invalid_lines,
                        cutoff = ?window.map(|w| w.cutoff()),
                        "First pass complete"
                    );
                    Stage::Aggregating { window }
                }
                Stage::Aggregating { window } => {
                    let fold = process_lines(
                        self.open()?,
                        self.parser,
                        FilteredFold::new(&self.filter, window),
                        self.source.name(),
                    )?;
                    info!(
                        matched = fold.state.total_requests(),
                        rejected = fold.rejected,
                        invalid_lines = fold.invalid_lines,
                        "Second pass complete"
                    );
                    Stage::Done(fold.state.snapshot(
                        self.filter.spec(),
                        fold.invalid_lines,
                        &self.settings,
                    ))
                }
                Stage::Done(report) => {
                    let advisory = report.is_empty().then_some(Advisory::NoMatchingRecords);
                    if let Some(advisory) = advisory {
                        warn!("{advisory}");
                    }
                    return Ok(PipelineOutput { report, advisory });
                }
            };
        }
    }
}

/// Second-pass processor: filter, then fold.
struct FilteredFold<'f> {
    filter: &'f Filter,
    state: AggregationState,
    rejected: u64,
    invalid_lines: u64,
}

impl<'f> FilteredFold<'f> {
    fn new(filter: &'f Filter, window: Option<TimeWindow>) -> Self {
        Self {
            filter,
            state: AggregationState::new(window),
            rejected: 0,
            invalid_lines: 0,
        }
    }
}

impl RecordProcessor for FilteredFold<'_> {
    type Output = Self;

    fn process_record(&mut self, record: LogRecord, _line_number: usize) {
        if self.filter.matches(&record) {
            self.state.fold(&record);
        } else {
            self.rejected += 1;
        }
    }

    fn process_invalid(&mut self, error: ParseError, line_number: usize) {
        self.invalid_lines += 1;
        warn!(line = line_number, %error, "Invalid format, skipping line");
    }

    fn finalize(self) -> Self {
        self
    }
}

/// Configured entry point shared by the CLI and library callers.
#[derive(Debug, Clone, Default)]
pub struct TrafficAnalyzer {
    parser: LineParser,
    settings: ReportSettings,
}

impl TrafficAnalyzer {
    pub fn new(parser: LineParser, settings: ReportSettings) -> Self {
        Self { parser, settings }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            LineParser::new(config.line_format()?),
            config.report_settings(),
        ))
    }

    pub fn with_top_ips(mut self, top_ips: usize) -> Self {
        self.settings.top_ips = top_ips;
        self
    }

    pub fn analyze(&self, source: &dyn LogSource, spec: FilterSpec) -> Result<PipelineOutput> {
        let filter = Filter::new(spec)?;
        debug!(filters = ?filter.spec(), settings = ?self.settings, "Starting analysis");
        Pipeline::new(source, &self.parser, filter, self.settings)?.run()
    }

    pub fn analyze_file(&self, path: &Path, spec: FilterSpec) -> Result<PipelineOutput> {
        self.analyze(&FileSource::new(path), spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::MemorySource;
    use std::io::{self, BufReader, Cursor, Read};
    use std::path::PathBuf;

    const LOG: &str = "\
1705320000 10.0.0.1 GET /index.html 200 1000
1705319000 10.0.0.2 POST /api/login 401 20
not a valid line
1705000000 10.0.0.1 GET /old 500 0
";

    #[test]
    fn test_pipeline_end_to_end() {
        let output = TrafficAnalyzer::default()
            .analyze(&MemorySource::new(LOG), FilterSpec::default())
            .unwrap();
        let report = output.report;

        assert_eq!(output.advisory, None);
        assert_eq!(report.total_requests, 3);
        assert_eq!(report.unique_ips, 2);
        assert_eq!(report.invalid_lines, 1);
        assert_eq!(report.status.client_errors_4xx, 1);
        assert_eq!(report.status.server_errors_5xx, 1);
        assert_eq!(report.recent.cutoff, Some(1_705_320_000 - 86_400));
        // The 1705000000 line is older than the window.
        assert_eq!(report.recent.total_requests, 2);
    }

    #[test]
    fn test_filter_rejections_keep_window_from_all_lines() {
        let spec = FilterSpec {
            method: Some("POST".to_string()),
            ..FilterSpec::default()
        };
        let report = TrafficAnalyzer::default()
            .analyze(&MemorySource::new(LOG), spec)
            .unwrap()
            .report;

        assert_eq!(report.total_requests, 1);
        assert_eq!(report.recent.cutoff, Some(1_705_320_000 - 86_400));
        assert_eq!(report.recent.unique_ips, 1);
    }

    #[test]
    fn test_zero_top_is_config_error() {
        let err = TrafficAnalyzer::default()
            .with_top_ips(0)
            .analyze(&MemorySource::new(LOG), FilterSpec::default())
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_missing_file_is_input_error() {
        let err = TrafficAnalyzer::default()
            .analyze_file(Path::new("/no/such/access.log"), FilterSpec::default())
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::Input { .. }));
    }

    #[test]
    fn test_invalid_filter_fails_before_reading() {
        let spec = FilterSpec {
            start_time: Some(10),
            end_time: Some(5),
            ..FilterSpec::default()
        };
        let err = TrafficAnalyzer::default()
            .analyze_file(Path::new("/no/such/access.log"), spec)
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::Config(_)));
    }

    /// Reader that fails every read, standing in for a disk that goes away.
    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk gone"))
        }
    }

    /// Yields one valid line, then an I/O error.
    struct TruncatedSource {
        name: PathBuf,
    }

    impl LogSource for TruncatedSource {
        fn open(&self) -> io::Result<Box<dyn BufRead + '_>> {
            let first = Cursor::new(b"1705320000 10.0.0.1 GET / 200 10\n".to_vec());
            Ok(Box::new(BufReader::new(first.chain(FailingReader))))
        }

        fn name(&self) -> &Path {
            &self.name
        }
    }

    #[test]
    fn test_read_failure_mid_stream_is_fatal() {
        let source = TruncatedSource {
            name: PathBuf::from("access.log"),
        };
        let err = TrafficAnalyzer::default()
            .analyze(&source, FilterSpec::default())
            .unwrap_err();

        match &err {
            AnalyzerError::Read { path, line, .. } => {
                assert_eq!(path, Path::new("access.log"));
                assert_eq!(*line, 2);
            }
            other => panic!("expected a read error, got {other:?}"),
        }
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("disk gone"));
    }
}
