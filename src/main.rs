/*!
 * Switchboard CLI - Command Line Interface
 */

use clap::{Parser, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;
use switchboard::{
    cli_progress::CliProgressRenderer,
    cli_style::{
        header_box, outcomes_table, print_error, print_success, print_warning, run_summary_table,
        section_header, Icons,
    },
    config::{LogLevel, OutputNaming, SplitConfig},
    core::{coordinator, discovery::discover_sources, progress::ProgressPublisher},
    error::{Result, SplitError, EXIT_SUCCESS},
    logging,
};
use tracing::info;

/// Events buffered between workers and the progress display
const PROGRESS_BUFFER: usize = 1024;

#[derive(Parser)]
#[command(name = "switchboard")]
#[command(version, about = "Split company registry extracts into per-region, per-carrier CSV files", long_about = None)]
struct Cli {
    /// Directory holding the input CSV extracts
    #[arg(short = 'i', long = "input", value_name = "DIR")]
    input: Option<PathBuf>,

    /// Directory receiving the output files
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    output: Option<PathBuf>,

    /// Files processed concurrently (0 = CPU count)
    #[arg(short = 'w', long = "workers", value_name = "N")]
    workers: Option<usize>,

    /// TOML configuration file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// `prefix;carrier` table for authoritative carrier names
    #[arg(long = "carrier-table", value_name = "FILE")]
    carrier_table: Option<PathBuf>,

    /// Skip the numbering plan and classify with the digit heuristic only
    #[arg(long)]
    no_numbering_plan: bool,

    /// Region code to select (repeatable; replaces the configured list)
    #[arg(short = 'r', long = "region", value_name = "UF")]
    regions: Vec<String>,

    /// Output file naming policy
    #[arg(long, value_enum)]
    output_naming: Option<OutputNamingArg>,

    /// Log file (default: <output>/processamento.log)
    #[arg(long = "log", value_name = "FILE")]
    log: Option<PathBuf>,

    /// Do not write a log file
    #[arg(long)]
    no_log_file: bool,

    /// Log level
    #[arg(long, value_enum)]
    log_level: Option<LogLevelArg>,

    /// Verbose output (debug logging and per-file progress details)
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Log progress every N rows
    #[arg(long, value_name = "N")]
    progress_interval: Option<u64>,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Disable the live progress line
    #[arg(long)]
    no_progress: bool,

    /// Write the effective configuration to FILE and exit
    #[arg(long = "write-config", value_name = "FILE")]
    write_config: Option<PathBuf>,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LogLevel {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputNamingArg {
    Region,
    RegionAndSource,
}

impl From<OutputNamingArg> for OutputNaming {
    fn from(arg: OutputNamingArg) -> Self {
        match arg {
            OutputNamingArg::Region => OutputNaming::Region,
            OutputNamingArg::RegionAndSource => OutputNaming::RegionAndSource,
        }
    }
}

impl Cli {
    /// Overlay command-line flags on the file/default configuration
    fn apply(&self, config: &mut SplitConfig) {
        if let Some(input) = &self.input {
            config.input_dir = input.clone();
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(table) = &self.carrier_table {
            config.carrier_table = Some(table.clone());
        }
        if self.no_numbering_plan {
            config.numbering_plan = false;
        }
        if !self.regions.is_empty() {
            config.regions = self.regions.clone();
        }
        if let Some(naming) = self.output_naming {
            config.output_naming = naming.into();
        }
        if let Some(log) = &self.log {
            config.log_file = Some(log.clone());
        }
        if self.no_log_file {
            config.log_to_file = false;
        }
        if let Some(level) = self.log_level {
            config.log_level = level.into();
        }
        if self.verbose {
            config.verbose = true;
        }
        if let Some(interval) = self.progress_interval {
            config.progress_interval = interval;
        }
        if self.json {
            config.log_to_stdout = false;
        }
    }
}

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(e) => {
            print_error(&e.to_string(), suggestion(&e));
            e.exit_code()
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SplitConfig::from_file(path)?,
        None => SplitConfig::default(),
    };
    cli.apply(&mut config);
    config.validate()?;

    if let Some(path) = &cli.write_config {
        config.to_file(path)?;
        print_success(&format!("Configuration written to {}", path.display()));
        return Ok(EXIT_SUCCESS);
    }

    if let Err(e) = logging::init_logging(&config) {
        print_warning(&format!("Failed to initialize logging: {}", e));
    }

    if !cli.json {
        header_box("Switchboard", Some(env!("CARGO_PKG_VERSION")));
    }

    info!(
        input = %config.input_dir.display(),
        output = %config.output_dir.display(),
        workers = config.effective_workers(),
        "Run started"
    );

    let sources = discover_sources(&config.input_dir, &config.normalized_regions())?;
    let classifier = coordinator::build_classifier(&config)?;

    let show_progress = !cli.json && !cli.no_progress && std::io::stderr().is_terminal();
    let (publisher, renderer) = if show_progress {
        let (publisher, subscriber) = ProgressPublisher::new(PROGRESS_BUFFER);
        let renderer = CliProgressRenderer::new(subscriber, config.verbose).spawn();
        (publisher, Some(renderer))
    } else {
        (ProgressPublisher::noop(), None)
    };

    // The renderer exits once the coordinator drops every publisher clone
    let result = coordinator::run(&config, &sources, classifier, publisher);
    if let Some(handle) = renderer {
        match handle.join() {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => print_warning(&format!("Progress display failed: {}", e)),
            Err(_) => print_warning("Progress display thread panicked"),
        }
    }
    let result = result?;

    if cli.json {
        match serde_json::to_string_pretty(&result.report) {
            Ok(json) => println!("{}", json),
            Err(e) => print_warning(&format!("Failed to serialize report: {}", e)),
        }
    } else {
        section_header(&format!("{} Files", Icons::FOLDER));
        println!("{}", outcomes_table(&result.outcomes));
        section_header(&format!("{} Report", Icons::STATS));
        println!("{}", run_summary_table(&result.report));
    }

    Ok(result.report.exit_code())
}

/// Hint printed under fatal errors
fn suggestion(error: &SplitError) -> Option<&'static str> {
    match error {
        SplitError::InputNotFound(_) => Some("Check --input or input_dir in the config file"),
        SplitError::NoSourceFiles(_) => {
            Some("Input names must end in .csv and carry a region code, e.g. al_ativos.csv")
        }
        SplitError::OutputNotWritable { .. } => Some("Check --output and its permissions"),
        SplitError::CarrierTable { .. } => Some("Each line must read `prefix;carrier`"),
        SplitError::Config(_) => Some("Run with --write-config FILE to see a valid configuration"),
        _ => None,
    }
}
