//! Cohort CLI - Command-line interface for Cohort Flux
//!
//! Commands:
//! - series: Compute window labels and chart series from a snapshot
//! - breakout: Print one window's author leaderboard
//! - export: Write cohort rows per (window, author), or raw content items, as CSV or JSON
//! - status: Report which channels contributed to a snapshot
//! - doctor: Diagnose configuration and environment

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cohort_flux::encoder::ReportEncoder;
use cohort_flux::export::{to_csv_string, to_json};
use cohort_flux::normalizer::ContentNormalizer;
use cohort_flux::pipeline::analyze;
use cohort_flux::types::{CohortRecord, PartitionStrategy};
use cohort_flux::{ComputeError, ContentSnapshot, EngineConfig, FLUX_VERSION, PRODUCER_NAME};

/// Cohort - Engagement-cohort analytics for group content streams
#[derive(Parser)]
#[command(name = "cohort")]
#[command(version = FLUX_VERSION)]
#[command(about = "Classify group authors into engagement cohorts", long_about = None)]
struct Cli {
    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that runs the engine
#[derive(clap::Args)]
struct EngineArgs {
    /// Snapshot file path (use - for stdin)
    #[arg(short, long)]
    input: PathBuf,

    /// Engine config file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Partition strategy; overrides the config file
    #[arg(long)]
    strategy: Option<StrategyArg>,

    /// Instant rolling windows are measured against (RFC 3339); defaults to now
    #[arg(long)]
    as_of: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute window labels and chart series
    Series {
        #[command(flatten)]
        engine: EngineArgs,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },

    /// Print the author leaderboard of one window
    Breakout {
        #[command(flatten)]
        engine: EngineArgs,

        /// Window index, oldest first
        #[arg(short, long)]
        window: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export cohort records or normalized content items
    Export {
        #[command(flatten)]
        engine: EngineArgs,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "csv")]
        format: ExportFormat,

        /// Which rows to export
        #[arg(long, default_value = "cohorts")]
        rows: ExportRows,
    },

    /// Report which channels contributed to a snapshot
    Status {
        /// Snapshot file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Check engine config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// Fixed-length windows counted back from the as-of instant
    Rolling,
    /// Monday-labelled calendar weeks
    Weekly,
}

impl From<StrategyArg> for PartitionStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Rolling => PartitionStrategy::Rolling,
            StrategyArg::Weekly => PartitionStrategy::CalendarWeek,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum ExportRows {
    /// One cohort record per (window, author)
    Cohorts,
    /// One normalized content item per post
    Items,
}

#[derive(Clone, ValueEnum)]
enum ExportFormat {
    /// Comma-separated values with a header row
    Csv,
    /// Pretty-printed JSON array
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string()));
            ExitCode::FAILURE
        }
    }
}

/// Install a stderr subscriber so stdout stays clean for command output
fn setup_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let layer = fmt::layer()
        .with_target(false)
        .with_writer(io::stderr);

    tracing_subscriber::registry().with(filter).with(layer).init();
}

fn run(cli: Cli) -> Result<(), CohortCliError> {
    match cli.command {
        Commands::Series { engine, output } => cmd_series(&engine, &output),

        Commands::Breakout {
            engine,
            window,
            json,
        } => cmd_breakout(&engine, window, json),

        Commands::Export {
            engine,
            output,
            format,
            rows,
        } => cmd_export(&engine, &output, format, rows),

        Commands::Status { input, json } => cmd_status(&input, json),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

fn read_input(input: &Path) -> Result<String, CohortCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output(output: &Path, data: &str) -> Result<(), CohortCliError> {
    if output.to_string_lossy() == "-" {
        print!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

fn load_snapshot(input: &Path) -> Result<ContentSnapshot, CohortCliError> {
    let snapshot = ContentSnapshot::from_json(&read_input(input)?)?;
    debug!(channels = snapshot.len(), "loaded snapshot");
    Ok(snapshot)
}

/// Config file first, then command-line overrides
fn load_config(args: &EngineArgs) -> Result<EngineConfig, CohortCliError> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json(&fs::read_to_string(path)?)?,
        None => EngineConfig::default(),
    };

    if let Some(strategy) = args.strategy {
        config.strategy = strategy.into();
    }
    if let Some(as_of) = &args.as_of {
        let parsed = DateTime::parse_from_rfc3339(as_of)
            .map_err(|e| CohortCliError::InvalidArgument(format!("--as-of {}: {}", as_of, e)))?;
        config = config.as_of(parsed.with_timezone(&Utc));
    }

    Ok(config)
}

fn cmd_series(args: &EngineArgs, output: &Path) -> Result<(), CohortCliError> {
    let snapshot = load_snapshot(&args.input)?;
    let config = load_config(args)?;

    let report = analyze(&snapshot, &config)?;
    let json = ReportEncoder::new().encode_to_json(&report)?;

    write_output(output, &format!("{}\n", json))
}

fn cmd_breakout(args: &EngineArgs, window: usize, json: bool) -> Result<(), CohortCliError> {
    let snapshot = load_snapshot(&args.input)?;
    let config = load_config(args)?;

    let report = analyze(&snapshot, &config)?;
    let records = report.breakout(window)?;

    if json {
        println!("{}", to_json(records)?);
        return Ok(());
    }

    println!("Window {} ({})", window, report.windows[window].label);
    println!("{:<24} {:>6} {:>6} {:>6}  cohort", "author", "cur", "prev", "past");
    for record in records {
        println!(
            "{:<24} {:>6} {:>6} {:>6}  {}",
            record.author,
            record.cur,
            record.prev,
            record.past,
            cohort_name(record)
        );
    }

    Ok(())
}

/// Name of the single cohort flag set on a record
fn cohort_name(record: &CohortRecord) -> &'static str {
    if record.is_new {
        "new"
    } else if record.is_retained {
        "retained"
    } else if record.is_expanded {
        "expanded"
    } else if record.is_resurrected {
        "resurrected"
    } else if record.is_contracted {
        "contracted"
    } else if record.is_churned {
        "churned"
    } else {
        "-"
    }
}

fn cmd_export(
    args: &EngineArgs,
    output: &Path,
    format: ExportFormat,
    rows: ExportRows,
) -> Result<(), CohortCliError> {
    let snapshot = load_snapshot(&args.input)?;

    let data = match rows {
        ExportRows::Cohorts => {
            let config = load_config(args)?;
            let records = analyze(&snapshot, &config)?.flat_records();
            match format {
                ExportFormat::Csv => to_csv_string(&records)?,
                ExportFormat::Json => format!("{}\n", to_json(&records)?),
            }
        }
        ExportRows::Items => {
            let items = ContentNormalizer::normalize(&snapshot);
            match format {
                ExportFormat::Csv => to_csv_string(&items)?,
                ExportFormat::Json => format!("{}\n", serde_json::to_string_pretty(&items)?),
            }
        }
    };

    write_output(output, &data)
}

fn cmd_status(input: &Path, json: bool) -> Result<(), CohortCliError> {
    let snapshot = load_snapshot(input)?;
    let completeness = snapshot.completeness();

    if json {
        println!("{}", serde_json::to_string_pretty(&completeness)?);
        return Ok(());
    }

    println!(
        "Loaded content from {} of {} channels",
        completeness.resolved, completeness.total
    );
    for channel in &completeness.pending {
        println!("  [PENDING] {}", channel);
    }
    for channel in &completeness.failed {
        println!("  [FAILED]  {}", channel);
    }

    Ok(())
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), CohortCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "flux_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Cohort Flux version {}", FLUX_VERSION),
    });

    // Check config file if provided
    if let Some(config_path) = config {
        if config_path.exists() {
            match fs::read_to_string(config_path) {
                Ok(content) => match EngineConfig::from_json(&content) {
                    Ok(parsed) => checks.push(DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Ok,
                        message: format!(
                            "Config valid (strategy {}, {} rolling windows of {} days)",
                            parsed.strategy.as_str(),
                            parsed.rolling_offsets_days.len(),
                            parsed.window_days
                        ),
                    }),
                    Err(e) => checks.push(DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Error,
                        message: format!("Invalid config: {}", e),
                    }),
                },
                Err(e) => checks.push(DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot read config file: {}", e),
                }),
            }
        } else {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "Config file does not exist".to_string(),
            });
        }
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (pass snapshots with --input <file>)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (--input - ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: FLUX_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Cohort Doctor Report");
        println!("====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(CohortCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Error types

#[derive(Debug)]
enum CohortCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    InvalidArgument(String),
    DoctorFailed,
}

impl From<io::Error> for CohortCliError {
    fn from(e: io::Error) -> Self {
        CohortCliError::Io(e)
    }
}

impl From<ComputeError> for CohortCliError {
    fn from(e: ComputeError) -> Self {
        CohortCliError::Compute(e)
    }
}

impl From<serde_json::Error> for CohortCliError {
    fn from(e: serde_json::Error) -> Self {
        CohortCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<CohortCliError> for CliError {
    fn from(e: CohortCliError) -> Self {
        match e {
            CohortCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            CohortCliError::Compute(ComputeError::WindowOutOfRange { index, len }) => CliError {
                code: "WINDOW_OUT_OF_RANGE".to_string(),
                message: format!("Window index {} out of range ({} windows)", index, len),
                hint: Some("Run 'cohort series' to list the windows".to_string()),
            },
            CohortCliError::Compute(ComputeError::InvalidConfig(msg)) => CliError {
                code: "INVALID_CONFIG".to_string(),
                message: msg,
                hint: Some("Run 'cohort doctor --config <file>' for details".to_string()),
            },
            CohortCliError::Compute(e) => CliError {
                code: "COMPUTE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure the snapshot has the form {\"channels\": {...}}".to_string()),
            },
            CohortCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            CohortCliError::InvalidArgument(msg) => CliError {
                code: "INVALID_ARGUMENT".to_string(),
                message: msg,
                hint: Some("Use an RFC 3339 instant such as 2024-06-01T00:00:00Z".to_string()),
            },
            CohortCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
