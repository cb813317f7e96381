//! Command-line interface for code-chat-viewer.
//!
//! Without a subcommand `ccv` performs one conversion run, the same as
//! `ccv run`. Commands:
//! - `run`: render changed transcripts, organize pages, rewrite the dashboard
//! - `config`: show, locate or initialize the configuration file

mod commands;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};

use crate::config::Config;
use crate::error::Result;

/// Convert Claude Code transcripts into self-contained HTML pages.
#[derive(Debug, Parser)]
#[command(name = "ccv")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to run (default: run).
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to a configuration file.
    #[arg(long, global = true, env = "CCV_CONFIG")]
    pub config: Option<PathBuf>,

    /// Transcript root (overrides `source.projects_path`).
    #[arg(short = 's', long, global = true, env = "CCV_SOURCE")]
    pub source: Option<PathBuf>,

    /// Output root (overrides `output.folder`).
    #[arg(short = 'o', long, global = true, env = "CCV_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress the run report.
    #[arg(short = 'q', long, global = true, env = "CCV_QUIET")]
    pub quiet: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "warn", env = "CCV_LOG_LEVEL")]
    pub log_level: LogLevel,

    /// Log format (text, json).
    #[arg(long, global = true, default_value = "text", env = "CCV_LOG_FORMAT")]
    pub log_format: LogFormat,
}

/// Verbosity of the stderr log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    /// Failures only.
    Error,
    /// Failures and skipped files.
    #[default]
    Warn,
    /// One line per written or moved page.
    Info,
    /// Change decisions and filtering details.
    Debug,
    /// Everything.
    Trace,
}

/// Shape of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Plain text.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl LogLevel {
    /// Directive understood by `EnvFilter`.
    #[must_use]
    pub fn to_filter_string(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Subcommands of `ccv`.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Convert changed transcripts and rebuild the dashboard.
    Run(RunArgs),

    /// View or initialize the configuration.
    #[command(alias = "cfg")]
    Config(ConfigArgs),
}

/// Arguments for the run command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RunArgs {
    /// Days without activity before a chat leaves Active.
    #[arg(long)]
    pub inactive_days: Option<u32>,

    /// Move small inactive chats to the shorts folder.
    #[arg(long)]
    pub shorts: bool,

    /// Move inactive chats to the archive folder.
    #[arg(long)]
    pub archive: bool,

    /// Skip subagent transcripts.
    #[arg(long)]
    pub no_agents: bool,

    /// Classify against this RFC 3339 time instead of the clock.
    #[arg(long, value_parser = parse_now)]
    pub now: Option<DateTime<Utc>>,
}

/// Arguments of `ccv config`.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    /// What to do with the configuration file.
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Actions of `ccv config`.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration.
    Show,

    /// Print where the configuration file is read from.
    Path,

    /// Write a configuration file with default values.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

fn parse_now(value: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 time: {e}"))
}

impl Cli {
    /// Configuration file in effect: `--config` or the default location.
    pub fn config_path(&self) -> Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => crate::config::default_config_path(),
        }
    }

    /// Load the configuration and apply global overrides.
    ///
    /// An explicit `--config` file must exist; the default file is optional.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        if let Some(source) = &self.source {
            config.source.projects_path = source.clone();
        }
        if let Some(output) = &self.output {
            config.output.folder = output.clone();
        }
        Ok(config)
    }
}

/// Initialize the tracing subscriber on stderr.
fn init_logging(cli: &Cli) {
    use tracing_subscriber::{
        fmt::{self, format::FmtSpan},
        layer::SubscriberExt,
        util::SubscriberInitExt,
        EnvFilter,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.to_filter_string()));

    let result = match cli.log_format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
        LogFormat::Text => {
            let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
    };

    if let Err(e) = result {
        eprintln!("Warning: Could not initialize logging: {e}");
    }
}

/// Parse arguments, set up logging and dispatch.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    match &cli.command {
        None => commands::run::run(&cli, &RunArgs::default()),
        Some(Commands::Run(args)) => commands::run::run(&cli, args),
        Some(Commands::Config(args)) => commands::config::run(&cli, args),
    }
}
