use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing::error;

use traffic_analyzer::config::Config;
use traffic_analyzer::display::DisplayManager;
use traffic_analyzer::logging::init_logging;
use traffic_analyzer::{AnalyzerError, FilterSpec, TrafficAnalyzer};

#[derive(Parser)]
#[command(name = "traffic-analyzer")]
#[command(about = "Advanced web traffic analyzer for access logs")]
#[command(version)]
struct Cli {
    /// Path to access log file
    logfile: PathBuf,
    /// Filter by HTTP method
    #[arg(long)]
    method: Option<String>,
    /// Filter by status code or range (e.g. 404 or 400-499)
    #[arg(long)]
    status: Option<String>,
    /// Start timestamp (unix)
    #[arg(long, allow_negative_numbers = true)]
    start: Option<i64>,
    /// End timestamp (unix)
    #[arg(long, allow_negative_numbers = true)]
    end: Option<i64>,
    /// Top N active IPs (default from config, 3)
    #[arg(long, allow_negative_numbers = true)]
    top: Option<i64>,
    /// Output in JSON format
    #[arg(long)]
    json: bool,
    /// Disable colored output
    #[arg(long)]
    no_color: bool,
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(2);
        }
    };
    let _guard = init_logging(&config.logging, &config.paths.log_directory);

    if let Err(e) = run(cli, &config) {
        let code = e
            .downcast_ref::<AnalyzerError>()
            .map_or(1, AnalyzerError::exit_code);
        error!(error = %e, "Analysis failed");
        eprintln!("Error: {e}");
        process::exit(code);
    }
}

fn run(cli: Cli, config: &Config) -> Result<()> {
    let spec = FilterSpec::from_options(
        cli.method.as_deref(),
        cli.status.as_deref(),
        cli.start,
        cli.end,
    )?;

    let mut analyzer = TrafficAnalyzer::from_config(config)?;
    if let Some(top) = cli.top {
        let top = usize::try_from(top)
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| AnalyzerError::config("--top must be positive"))?;
        analyzer = analyzer.with_top_ips(top);
    }

    // A no-match advisory is logged by the pipeline; the report is still printed.
    let output = analyzer.analyze_file(&cli.logfile, spec)?;

    let display = DisplayManager::new(config.output.json_pretty);
    if cli.json {
        println!("{}", display.render_json(&output.report)?);
    } else {
        if cli.no_color || !config.output.color {
            colored::control::set_override(false);
        }
        print!("{}", display.render_text(&output.report));
    }

    Ok(())
}
