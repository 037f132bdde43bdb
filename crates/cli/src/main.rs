// clientsync CLI - headless client intake and roster reconciliation

mod exit_codes;
mod run;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use clientsync_recon::ReconError;
use exit_codes::{recon_exit_code, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "clientsync")]
#[command(about = "Validate incoming client sheets and merge them into the roster")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate, reconcile and write the client feed
    #[command(after_help = "\
Examples:
  clientsync run
  clientsync run --config intake.toml
  clientsync run --incoming dados.csv --roster sistema.csv --roster-out sistema.csv
  clientsync run --config intake.toml --json --quiet
  CLIENTSYNC_LOOKUP_URL=http://localhost:8080/ws clientsync run")]
    Run(RunArgs),

    /// Check a config file without reading any data
    #[command(after_help = "\
Examples:
  clientsync validate-config intake.toml")]
    ValidateConfig {
        /// Path to the TOML config file
        config: PathBuf,
    },
}

#[derive(clap::Args)]
pub struct RunArgs {
    /// TOML config file; relative paths inside it resolve against its directory
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Incoming clients sheet (.xlsx, .xls, .xlsb, .ods, .csv)
    #[arg(long)]
    pub incoming: Option<PathBuf>,

    /// Roster sheet of existing clients
    #[arg(long)]
    pub roster: Option<PathBuf>,

    /// Worksheet name in the incoming file (first sheet if omitted)
    #[arg(long)]
    pub sheet: Option<String>,

    /// Feed JSON output path
    #[arg(long)]
    pub feed: Option<PathBuf>,

    /// Rejected records report path (.xlsx or .csv)
    #[arg(long)]
    pub rejected: Option<PathBuf>,

    /// Write the reconciled roster to this file
    #[arg(long)]
    pub roster_out: Option<PathBuf>,

    /// Postal-code lookup base URL
    #[arg(long, env = "CLIENTSYNC_LOOKUP_URL")]
    pub lookup_url: Option<String>,

    /// Lookup timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Reference date for the age rule (YYYY-MM-DD, default today)
    #[arg(long, value_name = "DATE", value_parser = parse_date)]
    pub as_of: Option<NaiveDate>,

    /// Print the run summary as JSON instead of the roster table
    #[arg(long)]
    pub json: bool,

    /// Only log warnings and errors
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Exit with code 6 when any record was rejected
    #[arg(long)]
    pub fail_on_rejected: bool,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   debug",
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   release",
        )
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(quiet: bool) {
    let default = if quiet { "clientsync=warn" } else { "clientsync=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => {
            init_tracing(args.quiet);
            run::cmd_run(args)
        }
        Commands::ValidateConfig { config } => run::cmd_validate_config(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Engine error with its registry exit code and, where one helps, a hint.
    pub fn recon(err: ReconError) -> Self {
        let code = recon_exit_code(&err);
        let hint = match &err {
            ReconError::DuplicateIdentity { .. } => {
                Some("each identity number may appear only once in the roster".to_string())
            }
            ReconError::MissingColumn { .. } => {
                Some("column names can be remapped under [columns] in the config".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        Self::recon(err)
    }
}
