// crates/storage-diags-cli/src/main.rs
// ============================================================================
// Module: Storage Diags CLI Entry Point
// Description: Command dispatcher for diagnostic runs and offline evaluation.
// Purpose: Drive the diagnostic lifecycle against real devices from the shell.
// Dependencies: clap, storage-diags-core, storage-diags-config, storage-diags-devices
// ============================================================================

//! ## Overview
//! `storage-diags run` executes a playbook against a list of devices with the
//! generic nvme driver and the system command runner. `evaluate` judges a
//! stored measurement against a target descriptor without touching any
//! device. Exit codes: 0 passed, 1 fatal error, 2 performance targets failed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use serde_json::Value;
use storage_diags_config::HarnessConfig;
use storage_diags_config::ReportSinkKind;
use storage_diags_core::BenchmarkEvaluator;
use storage_diags_core::CommandRunner;
use storage_diags_core::DiagnosticOrchestrator;
use storage_diags_core::FileReportSink;
use storage_diags_core::Playbook;
use storage_diags_core::ReportSink;
use storage_diags_core::StderrReportSink;
use storage_diags_core::StdoutReportSink;
use storage_diags_core::TargetDescriptor;
use storage_diags_core::TestRunReporter;
use storage_diags_devices::GenericDeviceOperations;
use storage_diags_devices::SystemCommandRunner;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Exit code when performance targets were missed.
const EXIT_TARGETS_FAILED: u8 = 2;
/// Maximum measurement document size accepted by `evaluate`.
const MAX_MEASUREMENT_BYTES: u64 = 64 * 1024 * 1024;
/// Playbook used when `--playbook` is not given.
const DEFAULT_PLAYBOOK: &str = "basic_io.json";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Command line for the storage-diags harness.
#[derive(Parser, Debug)]
#[command(name = "storage-diags", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print the harness version and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Config file path (defaults to storage-diags.toml or env override).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Subcommand to run, if any.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Harness subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a diagnostic playbook against devices under test.
    Run(RunCommand),
    /// Evaluate a stored measurement against performance targets.
    Evaluate(EvaluateCommand),
    /// Harness config checks.
    Config {
        /// Config action to perform.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for a diagnostic run.
#[derive(Args, Debug)]
struct RunCommand {
    /// Space-separated device paths.
    #[arg(long, value_name = "DEVICES")]
    duts: String,
    /// Playbook file name inside the configs directory.
    #[arg(long, value_name = "FILE", default_value = DEFAULT_PLAYBOOK)]
    playbook: String,
    /// Root for per-device log directories (overrides config).
    #[arg(long, value_name = "PATH")]
    log_dir: Option<PathBuf>,
}

/// Arguments for offline evaluation.
#[derive(Args, Debug)]
struct EvaluateCommand {
    /// Performance target descriptor.
    #[arg(long, value_name = "FILE")]
    targets: PathBuf,
    /// Load generator JSON output.
    #[arg(long, value_name = "FILE")]
    measurement: PathBuf,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate the configuration.
    Validate,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Message shown on stderr.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// Result type for CLI handlers.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Parses arguments and maps the outcome to an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Routes the parsed command to its handler.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("storage-diags {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        let help = Cli::command().render_help().to_string();
        write_stdout_line(&help).map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Run(command) => command_run(cli.config.as_deref(), &command),
        Commands::Evaluate(command) => command_evaluate(&command),
        Commands::Config {
            command,
        } => command_config(cli.config.as_deref(), &command),
    }
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Executes the `run` command.
fn command_run(config_path: Option<&Path>, command: &RunCommand) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let log_root = resolve_log_root(command.log_dir.as_deref(), &config)?;
    let configs_dir = PathBuf::from(&config.paths.configs_dir);
    let playbook = Playbook::load(&configs_dir.join(&command.playbook))
        .map_err(|err| CliError::new(format!("failed to load playbook: {err}")))?;

    let sink = open_report_sink(&config)?;
    let reporter = TestRunReporter::new(sink, &config.run.test_name, &config.run.test_version);
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemCommandRunner::new());
    let device_config = config.device_config();

    let driver_runner = Arc::clone(&runner);
    let driver_reporter = reporter.clone();
    let mut orchestrator = DiagnosticOrchestrator::new(
        config.orchestrator_config(log_root),
        &command.duts,
        playbook,
        runner,
        reporter,
        |dut| {
            Ok(GenericDeviceOperations::new(
                dut,
                device_config.clone(),
                Arc::clone(&driver_runner),
                driver_reporter.clone(),
            ))
        },
    )
    .map_err(|err| CliError::new(format!("failed to prepare diagnostic run: {err}")))?;

    let mut stdout = std::io::stdout();
    match orchestrator.run_lifecycle(&mut stdout) {
        Ok(summary) if summary.passed() => Ok(ExitCode::SUCCESS),
        Ok(summary) => {
            for verdict in summary.performance.iter().filter(|verdict| !verdict.passed()) {
                let lines = verdict.result.summary_lines().join("; ");
                write_stderr_line(&format!("{} missed performance targets: {lines}", verdict.device))
                    .map_err(|err| CliError::new(output_error("stderr", &err)))?;
            }
            Ok(ExitCode::from(EXIT_TARGETS_FAILED))
        }
        Err(err) => {
            for log in err.logs() {
                write_stderr_line(&format!("captured: {}", log.display()))
                    .map_err(|err| CliError::new(output_error("stderr", &err)))?;
            }
            Err(CliError::new(err.to_string()))
        }
    }
}

/// Picks the log root from the flag, the config, or a fresh temp directory.
fn resolve_log_root(flag: Option<&Path>, config: &HarnessConfig) -> CliResult<PathBuf> {
    if let Some(path) = flag {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = &config.paths.log_root {
        return Ok(PathBuf::from(path));
    }
    let dir = tempfile::Builder::new()
        .prefix("storage-diags-")
        .tempdir()
        .map_err(|err| CliError::new(format!("failed to create log directory: {err}")))?;
    Ok(dir.keep())
}

/// Opens the configured report sink.
fn open_report_sink(config: &HarnessConfig) -> CliResult<Arc<dyn ReportSink>> {
    match (config.report.sink, &config.report.path) {
        (ReportSinkKind::Stdout, _) => Ok(Arc::new(StdoutReportSink)),
        (ReportSinkKind::Stderr, _) => Ok(Arc::new(StderrReportSink)),
        (ReportSinkKind::File, Some(path)) => {
            let sink = FileReportSink::new(Path::new(path))
                .map_err(|err| CliError::new(format!("failed to open report file {path}: {err}")))?;
            Ok(Arc::new(sink))
        }
        (ReportSinkKind::File, None) => {
            Err(CliError::new("report.sink=file requires report.path".to_string()))
        }
    }
}

// ============================================================================
// SECTION: Evaluate Command
// ============================================================================

/// Executes the `evaluate` command.
fn command_evaluate(command: &EvaluateCommand) -> CliResult<ExitCode> {
    let descriptor = TargetDescriptor::load(&command.targets)
        .map_err(|err| CliError::new(format!("failed to load targets: {err}")))?;
    let evaluator = BenchmarkEvaluator::from_descriptor(&descriptor)
        .map_err(|err| CliError::new(format!("invalid targets: {err}")))?;
    let measurement = read_measurement(&command.measurement)?;

    let result = evaluator.evaluate(&measurement);
    let rendered = serde_json::to_string_pretty(&result)
        .map_err(|err| CliError::new(format!("failed to render result: {err}")))?;
    write_stdout_line(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    if result.passed() { Ok(ExitCode::SUCCESS) } else { Ok(ExitCode::from(EXIT_TARGETS_FAILED)) }
}

/// Reads and parses a measurement document with a size limit.
fn read_measurement(path: &Path) -> CliResult<Value> {
    let display = path.display();
    let metadata = fs::metadata(path)
        .map_err(|err| CliError::new(format!("failed to read measurement {display}: {err}")))?;
    if metadata.len() > MAX_MEASUREMENT_BYTES {
        return Err(CliError::new(format!("measurement {display} exceeds size limit")));
    }
    let text = fs::read_to_string(path)
        .map_err(|err| CliError::new(format!("failed to read measurement {display}: {err}")))?;
    serde_json::from_str(&text)
        .map_err(|err| CliError::new(format!("measurement {display} is not valid json: {err}")))
}

// ============================================================================
// SECTION: Config Command
// ============================================================================

/// Handles `config` actions.
fn command_config(config_path: Option<&Path>, command: &ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate => {
            load_config(config_path)?;
            write_stdout_line("config ok")
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Loads and validates the harness configuration.
fn load_config(path: Option<&Path>) -> CliResult<HarnessConfig> {
    HarnessConfig::load(path).map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Writes a failure message to stderr and returns exit code 1.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
