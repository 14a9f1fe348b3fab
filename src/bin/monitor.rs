//! Monitor CLI - replay and stream interaction records through the monitor
//!
//! Commands:
//! - replay: Ingest a recorded batch and export the text report
//! - run: Stream NDJSON interactions from stdin and print the live log
//! - validate: Check raw interaction records against the classifier
//! - config: Print the effective configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::cell::RefCell;
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;

use activity_monitor::report::{self, MonitorSnapshot};
use activity_monitor::schema::{InteractionClassifier, RawInteraction};
use activity_monitor::view::{self, LogView};
use activity_monitor::{
    ActivityLogger, InteractionEvent, LogEntry, MonitorConfig, MonitorError, MonitorObserver,
    WarningState, MONITOR_VERSION,
};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Monitor - interaction activity logging with suspicious activity detection
#[derive(Parser)]
#[command(name = "monitor")]
#[command(version = MONITOR_VERSION)]
#[command(about = "Log interactions and flag suspicious activity", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a recorded batch of interactions and export the report
    Replay {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Report output path (use - for stdout). Defaults to a timestamped file name.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the final snapshot as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Stream NDJSON interactions from stdin (live mode)
    Run {
        /// Configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the text report here on end of input
        #[arg(long)]
        report: Option<PathBuf>,

        /// Buffer output instead of flushing after each record
        #[arg(long)]
        no_flush: bool,
    },

    /// Validate raw interaction records
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config {
        /// Configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one interaction per line)
    Ndjson,
    /// JSON array of interactions
    Json,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), MonitorCliError> {
    match cli.command {
        Commands::Replay {
            input,
            output,
            input_format,
            config,
            json,
        } => cmd_replay(&input, output.as_deref(), input_format, config.as_deref(), json),

        Commands::Run {
            config,
            report,
            no_flush,
        } => cmd_run(config.as_deref(), report.as_deref(), !no_flush),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Config { config } => cmd_config(config.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> Result<MonitorConfig, MonitorCliError> {
    match path {
        Some(path) => {
            let json = fs::read_to_string(path)?;
            Ok(MonitorConfig::from_json(&json)?)
        }
        None => Ok(MonitorConfig::default()),
    }
}

fn read_input(input: &Path) -> Result<String, MonitorCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn parse_records(data: &str, format: &InputFormat) -> Result<Vec<RawInteraction>, MonitorCliError> {
    Ok(match format {
        InputFormat::Ndjson => InteractionClassifier::parse_ndjson(data)?,
        InputFormat::Json => InteractionClassifier::parse_array(data)?,
    })
}

fn cmd_replay(
    input: &Path,
    output: Option<&Path>,
    input_format: InputFormat,
    config: Option<&Path>,
    json: bool,
) -> Result<(), MonitorCliError> {
    let config = load_config(config)?;
    let offset = config.utc_offset();

    let records = parse_records(&read_input(input)?, &input_format)?;
    if records.is_empty() {
        return Err(MonitorCliError::NoEvents);
    }
    let events = InteractionClassifier::classify_all(&records)?;

    let warnings = Rc::new(RefCell::new(WarningCollector::default()));
    let mut logger = ActivityLogger::with_config(config);
    logger.subscribe(Box::new(Rc::clone(&warnings)));

    replay_into(&mut logger, events);

    let report_text = logger.export_report()?;
    let output = match output {
        Some(path) => path.to_path_buf(),
        None => {
            let last_ts = logger.log().last().map(|e| e.timestamp_ms).unwrap_or_default();
            PathBuf::from(report::report_file_name_at(last_ts, offset))
        }
    };

    if output.to_string_lossy() == "-" {
        println!("{}", report_text);
    } else {
        fs::write(&output, &report_text)?;
        debug!(path = %output.display(), "report written");
    }

    let snapshot = logger.snapshot();
    if json {
        println!("{}", snapshot.to_json_pretty()?);
    } else {
        print_summary(&snapshot, &warnings.borrow().raised);
    }

    Ok(())
}

/// Replay on the recording's own timeline, starting at its first event
fn replay_into(logger: &mut ActivityLogger, events: Vec<InteractionEvent>) {
    if let Some(first) = events.first() {
        logger.start_at(first.timestamp_ms);
    }
    for event in events {
        logger.ingest(event);
    }
}

fn print_summary(snapshot: &MonitorSnapshot, raised: &[String]) {
    // Keep stdout clean for the report when it went there
    let mut err = io::stderr();
    let stats = &snapshot.stats;
    let _ = writeln!(err, "Replay Summary");
    let _ = writeln!(err, "==============");
    let _ = writeln!(err, "Entries:        {}", snapshot.entries.len());
    let _ = writeln!(err, "Clicks:         {}", stats.clicks);
    let _ = writeln!(err, "Keys:           {}", stats.keys);
    let _ = writeln!(err, "Focus changes:  {}", stats.focus);
    let _ = writeln!(err, "Activity score: {}", stats.score);
    let _ = writeln!(err, "Warnings:       {}", raised.len());

    if !raised.is_empty() {
        let _ = writeln!(err, "\nWarnings raised:");
        for message in raised {
            let _ = writeln!(err, "  - {}", message);
        }
    }
}

fn cmd_run(
    config: Option<&Path>,
    report_path: Option<&Path>,
    flush: bool,
) -> Result<(), MonitorCliError> {
    let config = load_config(config)?;

    if atty::is(atty::Stream::Stdin) {
        eprintln!("Reading interactions from the terminal, one JSON object per line (Ctrl-D to end)");
    }

    let printer = Rc::new(RefCell::new(LivePrinter::new(flush, LogView::from_config(&config))));
    let mut logger = ActivityLogger::with_config(config);
    logger.subscribe(Box::new(Rc::clone(&printer)));
    let mut started = false;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        let raw = InteractionClassifier::parse_line(trimmed)
            .map_err(|e| MonitorCliError::ParseError(format!("Failed to parse interaction: {}", e)))?;

        let event = match InteractionClassifier::classify(&raw) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "skipping malformed interaction");
                continue;
            }
        };

        // Entries are stamped on the stream's own timeline
        if !started {
            logger.start_at(event.timestamp_ms);
            started = true;
        }
        logger.ingest(event);

        if let Some(e) = printer.borrow_mut().take_error() {
            return Err(MonitorCliError::Io(e));
        }
    }

    if let Some(path) = report_path {
        fs::write(path, logger.export_report()?)?;
    }

    Ok(())
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), MonitorCliError> {
    let records = parse_records(&read_input(input)?, &input_format)?;
    let results = InteractionClassifier::validate_records(&records);

    let report = ValidationReport {
        total_events: records.len(),
        valid_events: records.len() - results.len(),
        invalid_events: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                event_id: r.event_id.clone(),
                error: r.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total events:   {}", report.total_events);
        println!("Valid events:   {}", report.valid_events);
        println!("Invalid events: {}", report.invalid_events);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Event {} (index {}): {}",
                    err.event_id.as_deref().unwrap_or("unknown"),
                    err.index,
                    err.error
                );
            }
        }
    }

    if report.invalid_events > 0 {
        Err(MonitorCliError::ValidationFailed(report.invalid_events))
    } else {
        Ok(())
    }
}

fn cmd_config(config: Option<&Path>) -> Result<(), MonitorCliError> {
    let config = load_config(config)?;
    println!("{}", config.to_json()?);
    Ok(())
}

// Observers

/// Records every warning message raised during a replay
#[derive(Default)]
struct WarningCollector {
    raised: Vec<String>,
}

impl MonitorObserver for WarningCollector {
    fn on_warning_changed(&mut self, state: &WarningState) {
        if state.active {
            self.raised.push(state.message.clone());
        }
    }
}

/// Prints the live log and warnings as they happen
struct LivePrinter {
    view: LogView,
    flush: bool,
    error: Option<io::Error>,
}

impl LivePrinter {
    fn new(flush: bool, view: LogView) -> Self {
        Self {
            view,
            flush,
            error: None,
        }
    }

    fn emit(&mut self, line: &str) {
        if self.error.is_some() {
            return;
        }
        let mut stdout = io::stdout();
        let result = writeln!(stdout, "{}", line).and_then(|_| {
            if self.flush {
                stdout.flush()
            } else {
                Ok(())
            }
        });
        if let Err(e) = result {
            self.error = Some(e);
        }
    }

    fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }
}

impl MonitorObserver for LivePrinter {
    fn on_log_entry_added(&mut self, entry: &LogEntry) {
        self.view.on_log_entry_added(entry);
        self.emit(&view::render_entry(entry));
    }

    fn on_warning_changed(&mut self, state: &WarningState) {
        self.view.on_warning_changed(state);
        let line = self.view.warning().map(|message| format!("⚠️ {}", message));
        if let Some(line) = line {
            self.emit(&line);
        }
    }

    fn on_reset(&mut self) {
        self.view.on_reset();
    }
}

// Error types

#[derive(Debug)]
enum MonitorCliError {
    Io(io::Error),
    Monitor(MonitorError),
    Json(serde_json::Error),
    NoEvents,
    ValidationFailed(usize),
    ParseError(String),
}

impl From<io::Error> for MonitorCliError {
    fn from(e: io::Error) -> Self {
        MonitorCliError::Io(e)
    }
}

impl From<MonitorError> for MonitorCliError {
    fn from(e: MonitorError) -> Self {
        MonitorCliError::Monitor(e)
    }
}

impl From<serde_json::Error> for MonitorCliError {
    fn from(e: serde_json::Error) -> Self {
        MonitorCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<MonitorCliError> for CliError {
    fn from(e: MonitorCliError) -> Self {
        match e {
            MonitorCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            MonitorCliError::Monitor(MonitorError::EmptyLog) => CliError {
                code: "NO_DATA".to_string(),
                message: "No activity to export".to_string(),
                hint: Some("Ingest at least one interaction before exporting".to_string()),
            },
            MonitorCliError::Monitor(MonitorError::ConfigError(msg)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: msg,
                hint: Some("Run 'monitor config' to see the expected fields".to_string()),
            },
            MonitorCliError::Monitor(e @ MonitorError::Classify(_)) => CliError {
                code: "MALFORMED_EVENT".to_string(),
                message: e.to_string(),
                hint: Some("Run 'monitor validate' for details".to_string()),
            },
            MonitorCliError::Monitor(e) => CliError {
                code: "MONITOR_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'monitor validate' for details".to_string()),
            },
            MonitorCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            MonitorCliError::NoEvents => CliError {
                code: "NO_EVENTS".to_string(),
                message: "No interactions found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            MonitorCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} interactions failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            MonitorCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Check input format".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_events: usize,
    valid_events: usize,
    invalid_events: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    event_id: Option<String>,
    error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use activity_monitor::EventKind;
    use pretty_assertions::assert_eq;

    fn run_flush(args: &[&str]) -> bool {
        match Cli::try_parse_from(args).unwrap().command {
            Commands::Run { no_flush, .. } => !no_flush,
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_run_flush_can_be_disabled() {
        assert!(run_flush(&["monitor", "run"]));
        assert!(!run_flush(&["monitor", "run", "--no-flush"]));
    }

    #[test]
    fn test_replay_starts_at_first_event() {
        let mut logger = ActivityLogger::with_config(MonitorConfig::default());
        let events: Vec<InteractionEvent> = (0..30)
            .map(|i| InteractionEvent::click(1_000 + i * 1_000, ""))
            .collect();
        replay_into(&mut logger, events);

        let log = logger.log();
        assert_eq!(log.len(), 31);
        assert_eq!(log[0].kind, EventKind::System);
        assert_eq!(log[0].timestamp_ms, 1_000);
        assert_eq!(log[30].timestamp_ms, 30_000);
        assert_eq!(logger.window_count(), 6);
        assert!(!logger.warning().active);
    }
}
