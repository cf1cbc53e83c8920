// dentaldash CLI - encounter/sale conciliation reports from exported CSVs

mod conciliate;
mod exit_codes;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use exit_codes::{EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "dentaldash")]
#[command(about = "Dental treatment dashboard: encounter/sale conciliation")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Consolidate encounters and sales from a TOML config file
    #[command(after_help = "\
Examples:
  dentaldash run resinas.toml
  dentaldash run resinas.toml --json
  dentaldash run resinas.toml --page 2 --limit 50 --json
  dentaldash run resinas.toml --output result.json")]
    Run {
        /// Path to the conciliation .toml config file
        config: PathBuf,

        /// Output JSON to stdout instead of only the human summary
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Page to return (1-based); overrides [page].number
        #[arg(long)]
        page: Option<usize>,

        /// Records per page; overrides [page].size
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Validate a conciliation config without running
    #[command(after_help = "\
Examples:
  dentaldash validate resinas.toml")]
    Validate {
        /// Path to the conciliation .toml config file
        config: PathBuf,
    },

    /// Monthly encounter counts and sales totals per treatment code
    #[command(after_help = "\
Examples:
  dentaldash monthly resinas.toml
  dentaldash monthly resinas.toml --json")]
    Monthly {
        /// Path to the conciliation .toml config file
        config: PathBuf,

        /// Output JSON to stdout instead of a text table
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  dentaldash-conciliation ", env!("CARGO_PKG_VERSION"),
    )
}

/// Log records go to stderr; stdout is reserved for `--json` output.
/// Level comes from `DENTALDASH_LOG` (e.g. `debug`, `dentaldash_conciliation=info`).
fn init_logging() {
    let filter = EnvFilter::try_from_env("DENTALDASH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { config, json, output, page, limit } => {
            conciliate::cmd_run(config, json, output, page, limit)
        }
        Commands::Validate { config } => conciliate::cmd_validate(config),
        Commands::Monthly { config, json } => conciliate::cmd_monthly(config, json),
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

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
