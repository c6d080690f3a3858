//! Traffic Analyzer Library
//!
//! Streaming analysis of web-server access logs. Each line carries a Unix
//! timestamp, client IP, HTTP method, path, status code and byte count; the
//! library filters those records and folds them into an aggregate traffic
//! report.
//!
//! ## Core Features
//!
//! - **Two-pass pipeline**: a first pass finds the newest timestamp to anchor the
//!   last-24-hour window; a second pass filters and aggregates
//! - **Bounded memory**: state grows with distinct IPs, methods and paths, never
//!   with the number of lines
//! - **Tolerant parsing**: malformed lines are counted and skipped
//! - **Flexible output**: colored text or JSON
//!
//! ## Architecture Overview
//!
//! - [`parser`] - line parsing, line sources and streaming
//! - [`filter`] - method/status/time predicates
//! - [`time_window`] - last-24h cutoff and hour buckets
//! - [`aggregation`] - running aggregates and report snapshots
//! - [`analyzer`] - the pipeline that ties the passes together
//! - [`display`] - text and JSON rendering
//! - [`config`] - configuration with environment variable support
//! - [`logging`] - structured logging setup
//! - [`errors`] - fatal error taxonomy
//!
//! ## Main Entry Point
//!
//! ```rust,no_run
//! use traffic_analyzer::{FilterSpec, TrafficAnalyzer};
//! use std::path::Path;
//!
//! # fn example() -> traffic_analyzer::errors::Result<()> {
//! let analyzer = TrafficAnalyzer::default();
//! let spec = FilterSpec::from_options(Some("GET"), Some("200-299"), None, None)?;
//! let output = analyzer.analyze_file(Path::new("access.log"), spec)?;
//! println!("{} matching requests", output.report.total_requests);
//! # Ok(())
//! # }
//! ```

pub mod aggregation;
pub mod analyzer;
pub mod config;
pub mod display;
pub mod errors;
pub mod filter;
pub mod logging;
pub mod models;
pub mod parser;
pub mod time_window;

pub use analyzer::{PipelineOutput, TrafficAnalyzer};
pub use errors::AnalyzerError;
pub use models::*;
