use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use wheeler::board::BoardSnapshot;
use wheeler::clock::{Clock, ManualClock, SystemClock};
use wheeler::config::ExamConfig;
use wheeler::doc::TractType;
use wheeler::error::{ConfigError, ErrorCode, TractError};
use wheeler::export::ExportPayload;
use wheeler::project;
use wheeler::store::{self, MemoryStore};
use wheeler::timer::{ExamTimer, TimerRecord};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("cannot read {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("unknown tract type `{0}`; expected LST, TST, HST or FSST")]
    UnknownTractType(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Tract(#[from] TractError),
}

impl ErrorCode for CliError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Read { .. } => "E_READ",
            Self::InvalidJson(_) => "E_JSON",
            Self::UnknownTractType(_) => "E_UNKNOWN_NAME",
            Self::Config(err) => err.error_code(),
            Self::Tract(err) => err.error_code(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "wheeler", about = "Inspect saved Wheeler exam boards and timer records")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Wrap a saved board snapshot in an export payload.
    Export(ExportCommand),
    /// Build a systems tract from the Wheeler lines of a snapshot.
    Tract(TractCommand),
    /// Report the countdown a persisted timer record would resume with.
    Timer(TimerCommand),
}

#[derive(Args, Debug)]
struct ExportCommand {
    snapshot: PathBuf,
    #[arg(long)]
    remaining_ms: Option<i64>,
    /// Export timestamp; defaults to now.
    #[arg(long)]
    exported_at: Option<i64>,
}

#[derive(Args, Debug)]
struct TractCommand {
    snapshot: PathBuf,
    #[arg(long)]
    from: i64,
    #[arg(long)]
    to: i64,
    #[arg(long, default_value = "LST")]
    tract_type: String,
}

#[derive(Args, Debug)]
struct TimerCommand {
    record: PathBuf,
    /// Evaluate at this epoch millisecond instead of now.
    #[arg(long)]
    now: Option<i64>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(code = err.error_code(), %err, "command failed");
            eprintln!("{}: {err}", err.error_code());
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), CliError> {
    let config = ExamConfig::from_env()?;
    match command {
        Command::Export(cmd) => run_export(cmd),
        Command::Tract(cmd) => run_tract(cmd),
        Command::Timer(cmd) => run_timer(cmd, &config),
    }
}

fn run_export(cmd: ExportCommand) -> Result<(), CliError> {
    let snapshot: BoardSnapshot = read_json(&cmd.snapshot)?;
    let exported_at = cmd.exported_at.unwrap_or_else(|| SystemClock.now_ms());
    let payload = ExportPayload::new(snapshot, cmd.remaining_ms, exported_at);

    for (kind, count) in payload.summary() {
        eprintln!("{kind}: {count}");
    }
    eprintln!("file: {}", payload.file_name());
    println!("{}", payload.to_json()?);
    Ok(())
}

fn run_tract(cmd: TractCommand) -> Result<(), CliError> {
    let snapshot: BoardSnapshot = read_json(&cmd.snapshot)?;
    let tract_type = parse_tract_type(&cmd.tract_type)?;
    let tract = project::build_system_tract(&snapshot.wheeler, cmd.from, cmd.to, tract_type, SystemClock.now_ms())?;
    print_json(&serde_json::to_value(&tract)?)
}

fn run_timer(cmd: TimerCommand, config: &ExamConfig) -> Result<(), CliError> {
    let record: TimerRecord = read_json(&cmd.record)?;
    let now = cmd.now.unwrap_or_else(|| SystemClock.now_ms());

    let memory = Rc::new(MemoryStore::new());
    store::save_json(memory.as_ref(), &config.timer.storage_key, &record);
    let mut timer = ExamTimer::new(config.timer.clone(), Rc::new(ManualClock::new(now)), memory);
    let events = timer.restore();

    print_json(&serde_json::json!({
        "remainingMs": timer.remaining_ms(),
        "clock": format_remaining(timer.remaining_ms()),
        "firedWarnings": timer.fired_warnings(),
        "events": events,
    }))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let raw = fs::read_to_string(path).map_err(|source| CliError::Read { path: path.display().to_string(), source })?;
    Ok(serde_json::from_str(&raw)?)
}

fn parse_tract_type(raw: &str) -> Result<TractType, CliError> {
    serde_json::from_value(Value::String(raw.trim().to_ascii_uppercase()))
        .map_err(|_| CliError::UnknownTractType(raw.to_owned()))
}

/// `H:MM:SS` for a millisecond countdown, clamped at zero.
fn format_remaining(ms: i64) -> String {
    let secs = ms.max(0) / 1000;
    format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
