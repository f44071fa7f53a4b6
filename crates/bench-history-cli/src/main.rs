// crates/bench-history-cli/src/main.rs
// ============================================================================
// Module: Bench History CLI Entry Point
// Description: Command dispatcher for benchmark history workflows.
// Purpose: Ingest, export, query, and compare benchmark runs from CI jobs.
// Dependencies: bench-history-config, bench-history-core,
// bench-history-store-sqlite, clap, serde_json, tracing, tracing-subscriber
// ============================================================================

//! ## Overview
//! The `bench-history` binary is the CI-facing surface of the history store.
//! It resolves `bench-history.toml`, installs structured logging on stderr,
//! opens the configured store, and runs one command. Results go to stdout as
//! JSON so pipelines can consume them; failures go to stderr with a non-zero
//! exit code.
//!
//! Security posture: every input file is untrusted and read with a hard size
//! limit before parsing.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use bench_history_config::BenchHistoryConfig;
use bench_history_config::LogFormat;
use bench_history_config::LoggingConfig;
use bench_history_config::StoreConfig;
use bench_history_core::Commit;
use bench_history_core::DEFAULT_ALERT_THRESHOLD;
use bench_history_core::HistoryError;
use bench_history_core::HistoryStore;
use bench_history_core::InMemoryHistoryStore;
use bench_history_core::PYTEST_TOOL;
use bench_history_core::RepoUrl;
use bench_history_core::Run;
use bench_history_core::SuiteName;
use bench_history_core::compare_latest;
use bench_history_core::data_js::MAX_DATA_JS_BYTES;
use bench_history_core::decode_data_js;
use bench_history_core::encode_data_js;
use bench_history_core::extract_pytest_measurements;
use bench_history_core::import_document;
use bench_history_core::parse_pytest_report;
use bench_history_core::pytest::MAX_PYTEST_REPORT_BYTES;
use bench_history_core::validation::MAX_RUN_BYTES;
use bench_history_store_sqlite::SqliteHistoryStore;
use clap::ArgGroup;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use serde_json::json;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a commit metadata file.
const MAX_COMMIT_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "bench-history", version, disable_help_subcommand = true)]
struct Cli {
    /// Config file path (overrides `BENCH_HISTORY_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Ingest one benchmark run into a suite.
    Ingest(IngestCommand),
    /// Print or write a repository's history document.
    Load(LoadCommand),
    /// Print one measurement's series as JSON lines.
    Series(SeriesCommand),
    /// Import an existing `data.js` artifact.
    Import(ImportCommand),
    /// Compare the two most recent runs of a suite.
    Compare(CompareCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for `ingest`.
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("input").required(true).args(["run", "pytest"])))]
struct IngestCommand {
    /// Repository URL.
    #[arg(long, value_name = "URL")]
    repo: String,
    /// Benchmark suite name.
    #[arg(long, value_name = "NAME")]
    suite: String,
    /// Path to a run JSON file (`commit`, `date`, `tool`, `benches`).
    #[arg(long, value_name = "PATH")]
    run: Option<PathBuf>,
    /// Path to a pytest-benchmark JSON report.
    #[arg(long, value_name = "PATH", requires = "commit")]
    pytest: Option<PathBuf>,
    /// Path to commit metadata JSON used with `--pytest`.
    #[arg(long, value_name = "PATH", requires = "pytest")]
    commit: Option<PathBuf>,
    /// Run date in unix milliseconds used with `--pytest` (defaults to now).
    #[arg(long, value_name = "UNIX_MS", requires = "pytest")]
    date: Option<i64>,
    /// Tool label used with `--pytest`.
    #[arg(long, value_name = "NAME", default_value = PYTEST_TOOL, requires = "pytest")]
    tool: String,
}

/// Arguments for `load`.
#[derive(Args, Debug)]
struct LoadCommand {
    /// Repository URL.
    #[arg(long, value_name = "URL")]
    repo: String,
    /// Output format.
    #[arg(long, value_enum, default_value_t = LoadFormat::Json)]
    format: LoadFormat,
    /// Output file (defaults to stdout).
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
}

/// Output formats for `load`.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum LoadFormat {
    /// Pretty-printed JSON document.
    Json,
    /// `window.BENCHMARK_DATA = ...` artifact.
    DataJs,
}

/// Arguments for `series`.
#[derive(Args, Debug)]
struct SeriesCommand {
    /// Repository URL.
    #[arg(long, value_name = "URL")]
    repo: String,
    /// Benchmark suite name.
    #[arg(long, value_name = "NAME")]
    suite: String,
    /// Measurement name.
    #[arg(long, value_name = "MEASUREMENT")]
    name: String,
}

/// Arguments for `import`.
#[derive(Args, Debug)]
struct ImportCommand {
    /// Path to the `data.js` artifact (bare JSON is also accepted).
    #[arg(long = "data-js", value_name = "PATH")]
    data_js: PathBuf,
    /// File runs under this repository instead of the artifact's `repoUrl`.
    #[arg(long, value_name = "URL")]
    repo: Option<String>,
}

/// Arguments for `compare`.
#[derive(Args, Debug)]
struct CompareCommand {
    /// Repository URL.
    #[arg(long, value_name = "URL")]
    repo: String,
    /// Benchmark suite name.
    #[arg(long, value_name = "NAME")]
    suite: String,
    /// Alert when the worsening ratio exceeds this value.
    #[arg(long, value_name = "RATIO", default_value_t = DEFAULT_ALERT_THRESHOLD)]
    threshold: f64,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate the resolved configuration.
    Validate,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying a user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
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

impl From<HistoryError> for CliError {
    fn from(error: HistoryError) -> Self {
        if error.is_retryable() {
            Self::new(format!("{error} (retryable)"))
        } else {
            Self::new(error.to_string())
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let config = BenchHistoryConfig::load(cli.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    init_logging(&config.logging)?;

    match cli.command {
        Commands::Config {
            command: ConfigCommand::Validate,
        } => command_config_validate(&config),
        command => {
            let store = open_store(&config.store)?;
            dispatch(store.as_ref(), command)
        }
    }
}

/// Runs a store-backed command.
fn dispatch(store: &dyn HistoryStore, command: Commands) -> CliResult<ExitCode> {
    match command {
        Commands::Ingest(command) => command_ingest(store, &command),
        Commands::Load(command) => command_load(store, &command),
        Commands::Series(command) => command_series(store, &command),
        Commands::Import(command) => command_import(store, &command),
        Commands::Compare(command) => command_compare(store, &command),
        Commands::Config {
            ..
        } => Err(CliError::new("config commands do not use the store".to_string())),
    }
}

// ============================================================================
// SECTION: Setup
// ============================================================================

/// Installs the stderr tracing subscriber; `RUST_LOG` overrides the level.
fn init_logging(config: &LoggingConfig) -> CliResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));
    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Text => registry.with(fmt::layer().with_writer(std::io::stderr)).try_init(),
        LogFormat::Json => {
            registry.with(fmt::layer().json().with_writer(std::io::stderr)).try_init()
        }
    };
    result.map_err(|err| CliError::new(format!("failed to initialize logging: {err}")))
}

/// Opens the configured history store.
fn open_store(config: &StoreConfig) -> CliResult<Box<dyn HistoryStore>> {
    match config.sqlite_config() {
        Some(sqlite) => {
            let store = SqliteHistoryStore::new(sqlite)
                .map_err(|err| CliError::new(format!("failed to open store: {err}")))?;
            Ok(Box::new(store))
        }
        None => Ok(Box::new(InMemoryHistoryStore::with_lock_timeout(config.busy_timeout_ms))),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes `ingest`.
fn command_ingest(store: &dyn HistoryStore, command: &IngestCommand) -> CliResult<ExitCode> {
    let repo_url = RepoUrl::new(command.repo.as_str());
    let suite = SuiteName::new(command.suite.as_str());
    let run = build_run(command)?;
    let commit_id = run.commit.id.clone();
    let receipt = store.ingest_with_status(&repo_url, &suite, run)?;
    let runs = receipt.document.suite(&suite).map_or(0, <[Run]>::len);
    let summary = json!({
        "repoUrl": repo_url,
        "suite": suite,
        "commit": commit_id,
        "status": receipt.status,
        "runs": runs,
        "lastUpdate": receipt.document.last_update,
    });
    write_json_line(&summary)?;
    Ok(ExitCode::SUCCESS)
}

/// Builds the run to ingest from `--run` or `--pytest` inputs.
fn build_run(command: &IngestCommand) -> CliResult<Run> {
    if let Some(path) = &command.run {
        let bytes = read_input(path, "run", MAX_RUN_BYTES)?;
        return serde_json::from_slice(&bytes).map_err(|err| {
            CliError::new(format!("invalid run file {}: {err}", path.display()))
        });
    }
    let (Some(report_path), Some(commit_path)) = (&command.pytest, &command.commit) else {
        return Err(CliError::new("ingest requires --run or --pytest with --commit".to_string()));
    };
    let report_bytes = read_input(report_path, "pytest report", MAX_PYTEST_REPORT_BYTES)?;
    let report = parse_pytest_report(&report_bytes).map_err(|err| CliError::new(err.to_string()))?;
    let commit_bytes = read_input(commit_path, "commit", MAX_COMMIT_BYTES)?;
    let commit: Commit = serde_json::from_slice(&commit_bytes).map_err(|err| {
        CliError::new(format!("invalid commit file {}: {err}", commit_path.display()))
    })?;
    let date = match command.date {
        Some(date) => date,
        None => unix_millis()?,
    };
    Ok(Run {
        commit,
        date,
        tool: command.tool.clone(),
        benches: extract_pytest_measurements(&report),
    })
}

/// Executes `load`.
fn command_load(store: &dyn HistoryStore, command: &LoadCommand) -> CliResult<ExitCode> {
    let document = store.load(&RepoUrl::new(command.repo.as_str()))?;
    let mut rendered = match command.format {
        LoadFormat::Json => serde_json::to_string_pretty(&document)
            .map_err(|err| CliError::new(format!("failed to serialize document: {err}")))?,
        LoadFormat::DataJs => {
            encode_data_js(&document).map_err(|err| CliError::new(err.to_string()))?
        }
    };
    rendered.push('\n');
    match &command.out {
        Some(path) => {
            fs::write(path, rendered.as_bytes()).map_err(|err| {
                CliError::new(format!("failed to write {}: {err}", path.display()))
            })?;
            info!(path = %path.display(), runs = document.run_count(), "history document written");
        }
        None => write_stdout_bytes(rendered.as_bytes())
            .map_err(|err| CliError::new(output_error("stdout", &err)))?,
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes `series`.
fn command_series(store: &dyn HistoryStore, command: &SeriesCommand) -> CliResult<ExitCode> {
    let series = store.series(
        &RepoUrl::new(command.repo.as_str()),
        &SuiteName::new(command.suite.as_str()),
        &command.name,
    )?;
    for point in &series {
        write_json_line(&point)?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes `import`.
fn command_import(store: &dyn HistoryStore, command: &ImportCommand) -> CliResult<ExitCode> {
    let bytes = read_input(&command.data_js, "data.js", MAX_DATA_JS_BYTES)?;
    let text = std::str::from_utf8(&bytes)
        .map_err(|_| CliError::new("data.js must be utf-8".to_string()))?;
    let document = decode_data_js(text).map_err(|err| CliError::new(err.to_string()))?;
    let repo_override = command.repo.as_deref().map(RepoUrl::new);
    let summary = import_document(store, &document, repo_override.as_ref())?;
    write_json_line(&summary)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `compare`; exits with failure when any alert fires.
fn command_compare(store: &dyn HistoryStore, command: &CompareCommand) -> CliResult<ExitCode> {
    let runs = store.suite_runs(
        &RepoUrl::new(command.repo.as_str()),
        &SuiteName::new(command.suite.as_str()),
    )?;
    let Some(latest) = runs.last() else {
        return Ok(ExitCode::SUCCESS);
    };
    let alerts = compare_latest(&runs, &latest.tool, command.threshold)
        .map_err(|err| CliError::new(err.to_string()))?;
    for alert in &alerts {
        write_json_line(alert)?;
    }
    if alerts.is_empty() { Ok(ExitCode::SUCCESS) } else { Ok(ExitCode::FAILURE) }
}

/// Executes `config validate`.
fn command_config_validate(config: &BenchHistoryConfig) -> CliResult<ExitCode> {
    let backend = if config.store.sqlite_config().is_some() { "sqlite" } else { "memory" };
    write_stdout_line(&format!("config valid (store: {backend})"))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Input Helpers
// ============================================================================

/// Errors returned by bounded file reads.
#[derive(Debug)]
enum ReadLimitError {
    /// File I/O failure.
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let size = file.metadata().map_err(ReadLimitError::Io)?.len();
    let limit = u64::try_from(max_bytes).map_err(|_| ReadLimitError::TooLarge {
        size,
        limit: max_bytes,
    })?;
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let mut limited = file.take(limit.saturating_add(1));
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        return Err(ReadLimitError::TooLarge {
            size: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Reads an input file and maps failures to CLI errors.
fn read_input(path: &Path, kind: &str, max_bytes: usize) -> CliResult<Vec<u8>> {
    read_bytes_with_limit(path, max_bytes).map_err(|err| match err {
        ReadLimitError::Io(err) => {
            CliError::new(format!("failed to read {kind} file {}: {err}", path.display()))
        }
        ReadLimitError::TooLarge {
            size,
            limit,
        } => CliError::new(format!(
            "{kind} file {} exceeds size limit ({size} > {limit})",
            path.display()
        )),
    })
}

/// Returns the current time in unix milliseconds.
fn unix_millis() -> CliResult<i64> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|err| CliError::new(format!("system clock before unix epoch: {err}")))?;
    i64::try_from(elapsed.as_millis())
        .map_err(|_| CliError::new("system clock out of range".to_string()))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes raw bytes to stdout without adding a newline.
fn write_stdout_bytes(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes)
}

/// Writes one compact JSON value followed by a newline.
fn write_json_line<T: serde::Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let line = serde_json::to_string(value)
        .map_err(|err| CliError::new(format!("failed to serialize output: {err}")))?;
    write_stdout_line(&line).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
